pub mod catalog;
pub mod catalog_store;
pub mod cli;
pub mod clipboard_watch;
pub mod collation;
pub mod config;
pub mod coordinator;
pub mod extract;
pub mod logging;
pub mod model;
pub mod notifier;
pub mod present;
pub mod runtime;
pub mod sound;
