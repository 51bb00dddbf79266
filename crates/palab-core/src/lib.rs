pub mod config;
pub mod logging;

pub mod bootstrap;
pub mod checksum;
pub mod control;
pub mod downloader;
pub mod fetch;
pub mod retry;
pub mod storage;
pub mod units;
pub mod url_model;
