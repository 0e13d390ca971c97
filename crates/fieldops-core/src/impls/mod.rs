//! Impls - ports の実装
//!
//! - **LogAlertSink**: alerts go to the `tracing` log
//! - **InMemoryAlertSink**: alerts are collected for inspection (tests, demos)

pub mod log_alert;
pub mod memory_alert;

pub use self::log_alert::LogAlertSink;
pub use self::memory_alert::InMemoryAlertSink;
