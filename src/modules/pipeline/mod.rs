pub mod blueprint;
pub mod catalog;
pub mod error;
pub mod orchestrator;
pub mod providers;
pub mod render;
pub mod timeline;

#[cfg(test)]
pub mod testing;
