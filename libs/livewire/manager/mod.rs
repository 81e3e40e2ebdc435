//! # LiveWire Manager
//!
//! The application-facing facade: one [`ConnectionManager`] per logical
//! channel, configured through [`ConnectionManagerBuilder`].

pub mod builder;
pub mod manager;

pub use builder::{ConnectionManagerBuilder, DEFAULT_EVENT_CAPACITY};
pub use manager::ConnectionManager;
