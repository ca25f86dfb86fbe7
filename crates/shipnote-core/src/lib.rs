pub mod automation;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod io;
pub mod policy;
pub mod render;
pub mod store;
pub mod template;
pub mod types;

pub use error::{Result, ShipnoteError};
