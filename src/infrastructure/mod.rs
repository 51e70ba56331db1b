pub mod db;
pub mod providers;
pub mod queue;
pub mod storage;
