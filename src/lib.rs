pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod kaggle;
pub mod output;
pub mod paths;
pub mod store;
