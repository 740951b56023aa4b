//! Subscriber capability.
//!
//! A subscriber declares which [`EventKind`]s it cares about and receives
//! matching notifications synchronously, on the notifying thread.
//!
//! ## Rules
//! - `interested` must be pure and cheap; it is called once per subscriber
//!   per notification pass.
//! - `receive` may fail by returning an error or by panicking. Either way the
//!   registry contains the fault, reports it through the error hook and moves
//!   on to the next subscriber.
//! - Blocking inside `receive` stalls only the notifying thread's pass.
//!
//! ## Example
//! ```rust
//! use meteocast::broadcast::Subscriber;
//! use meteocast::error::BoxError;
//! use meteocast::event::{EventKind, EventPayload, EventSource};
//!
//! struct Thermometer;
//!
//! impl Subscriber for Thermometer {
//!     fn name(&self) -> &str { "thermometer" }
//!
//!     fn interested(&self, kind: EventKind) -> bool {
//!         kind == EventKind::TemperatureChanged
//!     }
//!
//!     fn receive(&self, _source: &EventSource, _kind: EventKind, payload: &EventPayload) -> Result<(), BoxError> {
//!         if let Some(t) = payload.as_scalar() {
//!             println!("temperature is now {t:.1}");
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::BoxError;
use crate::event::{EventKind, EventPayload, EventSource};

/// Consumer of broadcast notifications.
///
/// The registry holds subscribers by `Arc` and compares them by instance
/// identity, never by name.
pub trait Subscriber: Send + Sync {
    /// Name used in logs and fault reports. Need not be unique.
    fn name(&self) -> &str;

    /// Whether this subscriber wants notifications of `kind`.
    ///
    /// Default: interested in everything.
    fn interested(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }

    /// Handle one notification.
    fn receive(&self, source: &EventSource, kind: EventKind, payload: &EventPayload) -> Result<(), BoxError>;
}
