pub mod jobs;
pub mod pipeline;
