//! Observer trait for user-visible notices and pipeline state changes.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] to surface toasts,
//! drive a spinner, or record events in tests.
//!
//! # Example
//!
//! ```rust
//! use docprompt::{Notice, PipelineConfig, PipelineObserver};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Toasts(Mutex<Vec<String>>);
//!
//! impl PipelineObserver for Toasts {
//!     fn on_notice(&self, notice: &Notice) {
//!         self.0.lock().unwrap().push(notice.message.clone());
//!     }
//! }
//!
//! let config = PipelineConfig::builder()
//!     .observer(Arc::new(Toasts::default()))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing has been invoked yet.
    #[default]
    Idle,
    /// Encoding or the remote call is underway.
    InFlight,
    /// The last invocation failed; no result is held.
    Errored,
    /// The last invocation succeeded; the result is held.
    Completed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineState::Idle => "idle",
            PipelineState::InFlight => "in-flight",
            PipelineState::Errored => "errored",
            PipelineState::Completed => "completed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives pipeline events. All methods default to no-ops.
///
/// Must be `Send + Sync` so one observer can be shared across pipelines.
pub trait PipelineObserver: Send + Sync {
    /// Called on every state transition, with the new state.
    fn on_state_change(&self, state: PipelineState) {
        let _ = state;
    }

    /// Called once per user-visible notice.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }
}

/// The default observer: ignores everything.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type Observer = Arc<dyn PipelineObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        states: AtomicUsize,
        errors: AtomicUsize,
    }

    impl PipelineObserver for Counting {
        fn on_state_change(&self, _state: PipelineState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_notice(&self, notice: &Notice) {
            if notice.level == NoticeLevel::Error {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_state_change(PipelineState::InFlight);
        obs.on_notice(&Notice::error("x"));
    }

    #[test]
    fn counting_observer_receives_events() {
        let obs = Counting {
            states: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };
        obs.on_state_change(PipelineState::InFlight);
        obs.on_state_change(PipelineState::Errored);
        obs.on_notice(&Notice::error("failed"));
        obs.on_notice(&Notice::success("ok"));

        assert_eq!(obs.states.load(Ordering::SeqCst), 2);
        assert_eq!(obs.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn state_display() {
        assert_eq!(PipelineState::InFlight.to_string(), "in-flight");
        assert_eq!(PipelineState::default(), PipelineState::Idle);
    }
}
