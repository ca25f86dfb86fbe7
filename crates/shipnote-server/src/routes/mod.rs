pub mod automation;
pub mod config;
pub mod history;
pub mod templates;
