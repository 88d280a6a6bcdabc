pub mod actions;
pub mod app;
pub mod buildsys;
pub mod config;
pub mod context;
pub mod contexts;
pub mod error;
pub mod fetch;
pub mod help;
pub mod keys;
pub mod listview;
pub mod logging;
pub mod model;
pub mod notify;
pub mod ui;

pub use error::CoreError;
