// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Pipeline state machine with typed state transitions.
//!
//! Implements the run lifecycle:
//! Init → FetchSource → (MeasureTransform → RecordTransform)* → CommitArtifact
//! → [FetchArtifact → (MeasureInverse → RecordInverse)* → CommitResult] → Done.
//! `Failed` is reachable from every non-terminal state.
//! Invalid transitions result in StateTransitionError.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;

/// Pipeline run states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// Run created, nothing read yet.
    Init,
    /// Reading the plaintext row (Stage A).
    FetchSource,
    /// One sampled forward transform in flight.
    MeasureTransform,
    /// Appending the forward iteration's record or failure.
    RecordTransform,
    /// Writing the last successful artifact (Stage B).
    CommitArtifact,
    /// Reading the committed artifact back.
    FetchArtifact,
    /// One sampled inverse transform in flight.
    MeasureInverse,
    /// Appending the inverse iteration's record or failure.
    RecordInverse,
    /// Writing the recovered plaintext (Stage C).
    CommitResult,
    Done,
    Failed,
}

impl PipelineState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::FetchSource => "FetchSource",
            Self::MeasureTransform => "MeasureTransform",
            Self::RecordTransform => "RecordTransform",
            Self::CommitArtifact => "CommitArtifact",
            Self::FetchArtifact => "FetchArtifact",
            Self::MeasureInverse => "MeasureInverse",
            Self::RecordInverse => "RecordInverse",
            Self::CommitResult => "CommitResult",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }

    /// Done and Failed accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (_, Self::Failed) |
            (Self::Init, Self::FetchSource) |
            // Empty source ends the run
            (Self::FetchSource, Self::MeasureTransform) |
            (Self::FetchSource, Self::Done) |
            // Forward loop
            (Self::MeasureTransform, Self::RecordTransform) |
            (Self::RecordTransform, Self::MeasureTransform) |
            (Self::RecordTransform, Self::CommitArtifact) |
            // Inverse stage is optional
            (Self::CommitArtifact, Self::FetchArtifact) |
            (Self::CommitArtifact, Self::Done) |
            (Self::FetchArtifact, Self::MeasureInverse) |
            (Self::FetchArtifact, Self::Done) |
            // Inverse loop
            (Self::MeasureInverse, Self::RecordInverse) |
            (Self::RecordInverse, Self::MeasureInverse) |
            (Self::RecordInverse, Self::CommitResult) |
            (Self::CommitResult, Self::Done)
        )
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one (algorithm, label) pipeline run.
/// Enforces valid state transitions and tracks timing.
#[derive(Debug)]
pub struct PipelineStateMachine {
    run: String,
    current_state: PipelineState,
    last_transition: Instant,
    transition_count: u64,
}

impl PipelineStateMachine {
    /// Create a new state machine in `Init`. `run` names the run in logs and errors.
    pub fn new(run: impl Into<String>) -> Self {
        Self {
            run: run.into(),
            current_state: PipelineState::Init,
            last_transition: Instant::now(),
            transition_count: 0,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> PipelineState {
        self.current_state
    }

    /// `algorithm/label` name of the run.
    pub fn run(&self) -> &str {
        &self.run
    }

    /// Get time since last transition.
    pub fn time_in_current_state(&self) -> std::time::Duration {
        self.last_transition.elapsed()
    }

    /// Get total number of transitions.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Attempt to transition to a new state.
    /// Returns Ok(()) if successful, or StateTransitionError if invalid.
    pub fn transition_to(&mut self, target: PipelineState) -> Result<(), StateTransitionError> {
        if self.current_state.is_terminal() {
            return Err(StateTransitionError::TerminalState {
                run: self.run.clone(),
                state: self.current_state.name(),
            });
        }

        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                run: self.run.clone(),
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::trace!(
            run = %self.run,
            from = self.current_state.name(),
            to = target.name(),
            "State transition"
        );

        self.current_state = target;
        self.last_transition = Instant::now();
        self.transition_count += 1;

        Ok(())
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if !self.current_state.is_terminal() {
            tracing::debug!(run = %self.run, from = self.current_state.name(), "Run failed");
            self.current_state = PipelineState::Failed;
            self.last_transition = Instant::now();
            self.transition_count += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_state.is_terminal()
    }
}
