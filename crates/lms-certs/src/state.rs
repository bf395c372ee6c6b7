//! # Flow State Machine
//!
//! Both certificate flows walk the same shape:
//!
//! ```text
//! Idle ──▶ Validating ──▶ Querying ──▶ Persisting ──▶ Succeeded
//!              │              │  │          │
//!              │              │  └──────────┼────────▶ Succeeded (lookup only)
//!              ▼              ▼             ▼
//!            Failed         Failed        Failed
//! ```
//!
//! `Succeeded` and `Failed` are terminal. Nothing loops back: a retry is a
//! fresh invocation with a fresh [`FlowTracker`].

use serde::Serialize;
use thiserror::Error;

/// A step of a certificate flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    Idle,
    Validating,
    Querying,
    Persisting,
    Succeeded,
    Failed,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` may follow `self`.
    pub fn can_advance_to(&self, next: FlowState) -> bool {
        use FlowState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Querying)
                | (Validating, Failed)
                | (Querying, Persisting)
                | (Querying, Succeeded)
                | (Querying, Failed)
                | (Persisting, Succeeded)
                | (Persisting, Failed)
        )
    }

    /// Checked transition.
    pub fn advance(self, next: FlowState) -> Result<FlowState, FlowError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(FlowError::InvalidTransition { from: self, to: next })
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Validating => "VALIDATING",
            Self::Querying => "QUERYING",
            Self::Persisting => "PERSISTING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("invalid flow transition: {from} -> {to}")]
    InvalidTransition { from: FlowState, to: FlowState },
}

/// Records the states one flow invocation passed through.
#[derive(Debug, Clone, Serialize)]
pub struct FlowTracker {
    flow: &'static str,
    state: FlowState,
    path: Vec<FlowState>,
}

impl FlowTracker {
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            state: FlowState::Idle,
            path: vec![FlowState::Idle],
        }
    }

    pub fn flow(&self) -> &'static str {
        self.flow
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Every state visited, starting with `Idle`.
    pub fn path(&self) -> &[FlowState] {
        &self.path
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn advance(&mut self, next: FlowState) -> Result<(), FlowError> {
        let from = self.state;
        self.state = from.advance(next)?;
        self.path.push(next);
        tracing::debug!(flow = self.flow, %from, to = %next, "flow transition");
        Ok(())
    }

    /// Advance along a path the flows themselves guarantee is valid.
    pub(crate) fn enter(&mut self, next: FlowState) {
        if let Err(err) = self.advance(next) {
            tracing::error!(flow = self.flow, %err, "flow state machine violated");
        }
    }

    /// Terminate with `Failed`.
    pub(crate) fn fail(&mut self) {
        self.enter(FlowState::Failed);
    }

    /// Terminate with `Succeeded`.
    pub(crate) fn succeed(&mut self) {
        self.enter(FlowState::Succeeded);
    }
}
