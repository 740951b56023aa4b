//! Error types for meteocast.
//!
//! All errors are strongly typed using thiserror. Only validation and
//! execution errors ever reach the caller of a producer or registry
//! operation; faults raised inside subscriber code are wrapped in
//! [`SubscriberFault`] and handed to the registry's error hook instead.
//!
//! ## Lock poisoning
//!
//! Every lock in the crate guards data that is only written by the crate's
//! own non-panicking code: subscriber callbacks and hooks never run while a
//! data lock is held, and the delivery gate guards `()`. A poisoned lock
//! therefore still guards consistent data, so every acquisition recovers the
//! guard and poisoning never surfaces as an error.

use std::sync::{LockResult, PoisonError};

use thiserror::Error;

use crate::event::EventKind;

/// Boxed error returned by subscriber callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Validation errors: rejected synchronously, state is left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A measurement was NaN or infinite.
    #[error("Measurement '{field}' is not finite: {value}")]
    NonFiniteMeasurement {
        /// Field name.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// A field name did not match any tracked field.
    #[error("Unknown measurement field '{name}'")]
    UnknownField {
        /// The name as given.
        name: String,
    },

    /// An event kind name was empty.
    #[error("Event kind cannot be empty")]
    EmptyEventKind,

    /// An event kind name was not in the vocabulary.
    #[error("Unknown event kind '{name}'")]
    UnknownEventKind {
        /// The name as given.
        name: String,
    },

    /// A payload shape was paired with a kind that carries another shape.
    #[error("Payload {payload} does not match event kind {kind}")]
    PayloadMismatch {
        /// The kind being notified.
        kind: EventKind,
        /// Shape of the payload supplied.
        payload: &'static str,
    },

    /// A change threshold was negative or non-finite.
    #[error("Threshold for '{field}' must be finite and non-negative, got {value}")]
    InvalidThreshold {
        /// Field name.
        field: String,
        /// The rejected threshold.
        value: f64,
    },

    /// Any other configuration problem.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
}

/// Execution errors raised by the core's own machinery.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    /// The other end of a channel is gone.
    #[error("Channel disconnected: {path}")]
    Disconnected {
        /// Which channel.
        path: String,
    },

    /// A blocking wait ran out of time.
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        /// How long was waited.
        duration_ms: u64,
    },
}

/// A failure raised from inside subscriber code during a notification pass.
///
/// Contained at per-subscriber granularity and reported through
/// [`RegistryHooks::on_subscriber_error`](crate::broadcast::RegistryHooks::on_subscriber_error).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriberFault {
    /// `receive` returned an error.
    #[error("subscriber '{subscriber}' failed on {kind}: {message}")]
    Failed {
        /// Subscriber name.
        subscriber: String,
        /// Kind being delivered.
        kind: EventKind,
        /// The returned error, rendered.
        message: String,
    },

    /// `interested` or `receive` panicked.
    #[error("subscriber '{subscriber}' panicked on {kind}: {message}")]
    Panicked {
        /// Subscriber name.
        subscriber: String,
        /// Kind being delivered.
        kind: EventKind,
        /// The panic payload, if it was a string.
        message: String,
    },
}

impl SubscriberFault {
    /// Name of the subscriber that raised the fault.
    #[must_use]
    pub fn subscriber(&self) -> &str {
        match self {
            Self::Failed { subscriber, .. } | Self::Panicked { subscriber, .. } => subscriber,
        }
    }

    /// Event kind being delivered when the fault occurred.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Failed { kind, .. } | Self::Panicked { kind, .. } => *kind,
        }
    }

    /// Returns true if the fault was a panic rather than a returned error.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

/// Top-level error type for meteocast.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeteoError {
    /// Input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The operation failed while running.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl MeteoError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

/// Result type alias for meteocast operations.
pub type MeteoResult<T> = Result<T, MeteoError>;

/// Take a lock result, recovering the guard if the lock was poisoned.
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}
