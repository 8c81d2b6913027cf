//! Capability module - the browser automation interface consumed by the executor

pub mod traits;

pub use traits::{BrowserSession, SessionFactory};
