pub mod app;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fs_util;
pub mod manifest;
pub mod output;
pub mod progress;
pub mod remote;
pub mod sample;
