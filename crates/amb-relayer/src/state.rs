//! # Relay Phase Machine
//!
//! One [`RelayRecord`] per asset. Phases only move along the edges listed
//! in [`RelayPhase::can_transition_to`]; anything else is a
//! [`TransitionError`] and leaves the record untouched.
//!
//! `Confirmed` is final. `Failed` halts automatic progress for the asset;
//! the only way out is an operator retry, which re-enters `Notified`.
//! Shortcuts to `Confirmed` from the middle of the pipeline exist because
//! the mint may be observed on the public ledger at any step.

use amb_core::{AssetId, ContentDigest, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an asset stopped in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The proof service failed after exhausting the proving budget.
    ProofGenerationFailed {
        /// Last prover error.
        detail: String,
    },
    /// A freshly generated proof did not verify locally.
    LocalVerificationFailed {
        /// Verifier output.
        detail: String,
    },
    /// The gate's verifier rejected the proof.
    InvalidProof {
        /// Gate error.
        detail: String,
    },
    /// The proof's public input did not name the asset.
    PublicInputMismatch {
        /// Gate error.
        detail: String,
    },
    /// Submission failed after exhausting the submission budget.
    SubmissionFailed {
        /// Last transport or gate error.
        detail: String,
    },
    /// The mint was submitted but never became visible within the timeout.
    MintNotObserved,
}

impl FailureReason {
    /// Stable label for metrics and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProofGenerationFailed { .. } => "proof_generation_failed",
            Self::LocalVerificationFailed { .. } => "local_verification_failed",
            Self::InvalidProof { .. } => "invalid_proof",
            Self::PublicInputMismatch { .. } => "public_input_mismatch",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::MintNotObserved => "mint_not_observed",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProofGenerationFailed { detail }
            | Self::LocalVerificationFailed { detail }
            | Self::InvalidProof { detail }
            | Self::PublicInputMismatch { detail }
            | Self::SubmissionFailed { detail } => write!(f, "{}: {detail}", self.as_str()),
            Self::MintNotObserved => f.write_str(self.as_str()),
        }
    }
}

/// Where an asset is in the relay pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayPhase {
    /// Not yet seen.
    Idle,
    /// Full approval observed; work queued.
    Notified,
    /// Proof generation in progress.
    Proving,
    /// Proof ready; submitting to the mint gate.
    Submitting,
    /// Submitted; waiting for the mint to become visible.
    Confirming,
    /// The mint is visible on the public ledger.
    Confirmed,
    /// Stopped; needs operator attention.
    Failed {
        /// Cause.
        reason: FailureReason,
    },
}

impl RelayPhase {
    /// Phase name as shown in logs and the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Notified => "NOTIFIED",
            Self::Proving => "PROVING",
            Self::Submitting => "SUBMITTING",
            Self::Confirming => "CONFIRMING",
            Self::Confirmed => "CONFIRMED",
            Self::Failed { .. } => "FAILED",
        }
    }

    /// No automatic progress happens from here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed { .. })
    }

    /// Work for the asset is underway.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Notified | Self::Proving | Self::Submitting | Self::Confirming
        )
    }

    /// Whether the machine has an edge from `self` to `to`.
    pub fn can_transition_to(&self, to: &RelayPhase) -> bool {
        use RelayPhase::*;
        match (self, to) {
            (Idle, Notified) => true,
            (Notified, Proving | Confirmed) => true,
            (Proving, Submitting | Confirmed | Failed { .. }) => true,
            (Submitting, Confirming | Confirmed | Failed { .. }) => true,
            (Confirming, Confirmed | Failed { .. }) => true,
            (Failed { .. }, Notified | Confirmed) => true,
            (Idle, _)
            | (Notified, _)
            | (Proving, _)
            | (Submitting, _)
            | (Confirming, _)
            | (Confirmed, _)
            | (Failed { .. }, _) => false,
        }
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { reason } => write!(f, "FAILED({})", reason.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Rejected phase change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No edge between the two phases.
    #[error("asset {asset_id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Asset.
        asset_id: AssetId,
        /// Current phase name.
        from: &'static str,
        /// Requested phase name.
        to: &'static str,
    },
    /// The asset is already confirmed.
    #[error("asset {asset_id} already confirmed")]
    AlreadyConfirmed {
        /// Asset.
        asset_id: AssetId,
    },
}

/// One entry of a record's phase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase left.
    pub from: String,
    /// Phase entered.
    pub to: String,
    /// When.
    pub at: Timestamp,
}

/// Relayer bookkeeping for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRecord {
    /// The asset.
    pub asset_id: AssetId,
    /// Current phase.
    pub phase: RelayPhase,
    /// Proof generation attempts across the record's lifetime.
    pub proving_attempts: u32,
    /// Submission attempts across the record's lifetime.
    pub submission_attempts: u32,
    /// Most recent error, cleared on confirmation.
    pub last_error: Option<String>,
    /// Fingerprint of the last proof generated.
    pub proof_fingerprint: Option<ContentDigest>,
    /// Public-ledger block that carried the mint, once known.
    pub mint_block: Option<u64>,
    /// Registry event sequence that announced full approval, if any.
    pub source_seq: Option<u64>,
    /// When the record left `Idle`.
    pub created_at: Timestamp,
    /// Last modification.
    pub updated_at: Timestamp,
    /// Every phase change, oldest first.
    pub history: Vec<PhaseTransition>,
}

impl RelayRecord {
    /// A fresh `Idle` record.
    pub fn new(asset_id: AssetId) -> Self {
        let now = Timestamp::now();
        Self {
            asset_id,
            phase: RelayPhase::Idle,
            proving_attempts: 0,
            submission_attempts: 0,
            last_error: None,
            proof_fingerprint: None,
            mint_block: None,
            source_seq: None,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// Move to `to`, recording history.
    pub fn transition(&mut self, to: RelayPhase) -> Result<(), TransitionError> {
        if self.phase == RelayPhase::Confirmed {
            return Err(TransitionError::AlreadyConfirmed {
                asset_id: self.asset_id,
            });
        }
        if !self.phase.can_transition_to(&to) {
            return Err(TransitionError::InvalidTransition {
                asset_id: self.asset_id,
                from: self.phase.as_str(),
                to: to.as_str(),
            });
        }
        let now = Timestamp::now();
        if let RelayPhase::Failed { reason } = &to {
            self.last_error = Some(reason.to_string());
        }
        if to == RelayPhase::Confirmed {
            self.last_error = None;
        }
        self.history.push(PhaseTransition {
            from: self.phase.to_string(),
            to: to.to_string(),
            at: now,
        });
        self.phase = to;
        self.updated_at = now;
        Ok(())
    }

    /// Move to `Failed` with `reason`.
    pub fn fail(&mut self, reason: FailureReason) -> Result<(), TransitionError> {
        self.transition(RelayPhase::Failed { reason })
    }

    /// Failure cause, if failed.
    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.phase {
            RelayPhase::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RelayRecord {
        RelayRecord::new(AssetId(42))
    }

    #[test]
    fn test_happy_path() {
        let mut r = record();
        for p in [
            RelayPhase::Notified,
            RelayPhase::Proving,
            RelayPhase::Submitting,
            RelayPhase::Confirming,
            RelayPhase::Confirmed,
        ] {
            r.transition(p).unwrap();
        }
        assert_eq!(r.phase, RelayPhase::Confirmed);
        assert_eq!(r.history.len(), 5);
        assert_eq!(r.history[0].from, "IDLE");
        assert_eq!(r.history[4].to, "CONFIRMED");
    }

    #[test]
    fn test_cannot_skip_proving() {
        let mut r = record();
        r.transition(RelayPhase::Notified).unwrap();
        let err = r.transition(RelayPhase::Submitting).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                asset_id: AssetId(42),
                from: "NOTIFIED",
                to: "SUBMITTING"
            }
        );
        assert_eq!(r.phase, RelayPhase::Notified);
        assert_eq!(r.history.len(), 1);
    }

    #[test]
    fn test_confirmed_is_final() {
        let mut r = record();
        r.transition(RelayPhase::Notified).unwrap();
        r.transition(RelayPhase::Confirmed).unwrap();
        assert!(matches!(
            r.transition(RelayPhase::Notified),
            Err(TransitionError::AlreadyConfirmed { .. })
        ));
        assert!(r.fail(FailureReason::MintNotObserved).is_err());
    }

    #[test]
    fn test_failed_then_operator_retry() {
        let mut r = record();
        r.transition(RelayPhase::Notified).unwrap();
        r.transition(RelayPhase::Proving).unwrap();
        r.fail(FailureReason::ProofGenerationFailed {
            detail: "prover offline".into(),
        })
        .unwrap();
        assert!(r.phase.is_terminal());
        assert_eq!(r.failure().map(|f| f.as_str()), Some("proof_generation_failed"));
        assert!(r.last_error.as_deref().unwrap().contains("prover offline"));
        assert!(r.transition(RelayPhase::Proving).is_err());
        r.transition(RelayPhase::Notified).unwrap();
        assert!(r.phase.is_in_flight());
    }

    #[test]
    fn test_notified_cannot_fail_directly() {
        let mut r = record();
        r.transition(RelayPhase::Notified).unwrap();
        assert!(r.fail(FailureReason::MintNotObserved).is_err());
    }

    #[test]
    fn test_confirmation_clears_last_error() {
        let mut r = record();
        r.transition(RelayPhase::Notified).unwrap();
        r.transition(RelayPhase::Proving).unwrap();
        r.transition(RelayPhase::Submitting).unwrap();
        r.transition(RelayPhase::Confirming).unwrap();
        r.fail(FailureReason::MintNotObserved).unwrap();
        assert!(r.last_error.is_some());
        r.transition(RelayPhase::Confirmed).unwrap();
        assert!(r.last_error.is_none());
    }

    #[test]
    fn test_phase_serialization() {
        let p = RelayPhase::Failed {
            reason: FailureReason::InvalidProof {
                detail: "rejected".into(),
            },
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["phase"], "FAILED");
        assert_eq!(json["reason"]["kind"], "invalid_proof");
        let back: RelayPhase = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
        assert_eq!(p.to_string(), "FAILED(invalid_proof)");
    }
}
