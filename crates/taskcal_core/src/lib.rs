pub mod calendar;
pub mod config;
pub mod error;
pub mod group_api;
pub mod model;
pub mod notify;
pub mod query;
pub mod storage;
pub mod task_api;
