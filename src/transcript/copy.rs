//! Copy-affordance state with a transient acknowledgment.

use std::time::{Duration, Instant};

/// How long the "Copied!" acknowledgment is shown before reverting.
pub const ACK_DURATION: Duration = Duration::from_secs(2);

pub const IDLE_LABEL: &str = "Copy";
pub const ACK_LABEL: &str = "Copied!";

/// Tracks the transient acknowledgment shown after a copy.
///
/// Time is passed in rather than read from the clock so the state is a
/// pure function of its inputs and can be tested without sleeping.
#[derive(Debug, Clone, Default)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a copy at `now`. The label reads as acknowledged for the
    /// next [`ACK_DURATION`], then reverts on its own.
    pub fn record(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    /// Whether the acknowledgment is still showing at `now`.
    pub fn is_acknowledging(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.duration_since(at) < ACK_DURATION)
    }

    /// The affordance label at `now`.
    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_acknowledging(now) {
            ACK_LABEL
        } else {
            IDLE_LABEL
        }
    }
}
