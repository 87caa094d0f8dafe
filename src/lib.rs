pub mod api;
pub mod app;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod links;
pub mod location;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;
