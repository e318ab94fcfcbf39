pub mod config;
pub mod observability;
pub mod protocol;
pub mod storage;
