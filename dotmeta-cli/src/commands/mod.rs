pub mod common;
pub mod scan;
pub mod tables;
pub mod types;
