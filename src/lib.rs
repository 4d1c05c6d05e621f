pub mod artwork;
pub mod cli;
pub mod config;
pub mod domain;
pub mod notify;
pub mod scan;
pub mod storage;
pub mod workers;
