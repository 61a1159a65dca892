//! Change detection for dirwatch.
//!
//! A [`Monitor`] owns the retained [`Snapshot`](dirwatch_core::Snapshot) of a
//! directory tree. Each scan is diffed against it, the differences are
//! published as [`ChangeEvent`](dirwatch_core::ChangeEvent)s, and the new
//! snapshot replaces the old one atomically. A [`Scheduler`] drives scans on
//! a fixed interval.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use dirwatch_core::MonitorConfig;
//! use dirwatch_monitor::{Monitor, Scheduler};
//!
//! # async fn run() -> Result<(), dirwatch_monitor::MonitorError> {
//! let monitor = Arc::new(Monitor::new(MonitorConfig::new("/tmp/watched"))?);
//! let mut events = monitor.subscribe();
//!
//! let scheduler = Scheduler::new(monitor.clone());
//! scheduler.start(Duration::from_secs(5))?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event}");
//! }
//! scheduler.stop().await;
//! # Ok(())
//! # }
//! ```

mod diff;
mod error;
mod monitor;
mod scheduler;

pub use diff::{Reconciled, diff, reconcile};
pub use error::MonitorError;
pub use monitor::Monitor;
pub use scheduler::Scheduler;
