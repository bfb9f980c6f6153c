//! Error types for the fusion core.
//!
//! Every failure either rejects a request before any state changes or is
//! reported after the process has been moved to `Stage::Aborted`.

use synthesis_data::{Stage, StructureId};
use thiserror::Error;

/// Why a start request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Disabled,
    UnknownStructure,
    Unpowered,
    AlreadyBusy,
    SameDonor,
    DonorUnavailable,
    /// A donor is already committed to another active process.
    DonorBusy,
    NoValidSlots,
}

impl Rejection {
    /// Player-facing explanation.
    pub fn message(self) -> &'static str {
        match self {
            Rejection::Disabled => "Synthesis is disabled.",
            Rejection::UnknownStructure => "The synthesis station no longer exists.",
            Rejection::Unpowered => "The synthesis station has no power.",
            Rejection::AlreadyBusy => "The synthesis station is already in use.",
            Rejection::SameDonor => "Two different donors are required.",
            Rejection::DonorUnavailable => "Both donors must be alive and present.",
            Rejection::DonorBusy => "A donor is already taking part in another synthesis.",
            Rejection::NoValidSlots => "There is no room for both donors at the station.",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Main error type for fusion operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Start conditions were not met; nothing was mutated.
    #[error("Fusion rejected: {0}")]
    Rejected(Rejection),

    #[error("No fusion process registered for structure {0}")]
    NoProcess(StructureId),

    #[error("Expected stage {expected:?}, found {actual:?}")]
    WrongStage { expected: Stage, actual: Stage },

    #[error("Illegal stage transition {from:?} -> {to:?}")]
    InvalidTransition { from: Stage, to: Stage },

    /// Assembly materials ran short when they were consumed.
    #[error("Assembly materials missing")]
    MaterialsMissing,

    /// The offspring could not be instantiated.
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),
}

/// Result type alias for fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;

impl FusionError {
    #[must_use]
    pub fn synthesis<S: Into<String>>(msg: S) -> Self {
        Self::SynthesisFailed(msg.into())
    }
}
