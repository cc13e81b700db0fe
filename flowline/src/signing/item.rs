//! The item flowing through the signing pipeline.

use crate::errors::FlowlineError;

/// Terminal and non-terminal states of one signing request.
///
/// Only [`SignOutcome::InFlight`] may transition; the first terminal state an
/// item reaches is the one the consumer sees, which makes first-failure-wins
/// structural rather than a convention.
#[derive(Debug)]
pub enum SignOutcome {
    /// Still moving through the pipeline.
    InFlight,
    /// The service produced a signature.
    Signed(String),
    /// The polling deadline expired without a terminal status.
    TimedOut,
    /// A stage failed this item; later stages forward it untouched.
    Failed(FlowlineError),
}

/// One signing request traversing the pipeline.
///
/// Every seeded item reaches the terminal consumer exactly once, carrying
/// either a signature or the first failure it ran into - never both, never
/// silently dropped.
#[derive(Debug)]
pub struct SignItem {
    encode_hash: String,
    tx_id: Option<String>,
    outcome: SignOutcome,
}

impl SignItem {
    /// Creates an in-flight item for one encoded parameter hash.
    pub fn new(encode_hash: impl Into<String>) -> Self {
        Self {
            encode_hash: encode_hash.into(),
            tx_id: None,
            outcome: SignOutcome::InFlight,
        }
    }

    /// The encoded parameter hash this item was seeded with.
    #[must_use]
    pub fn encode_hash(&self) -> &str {
        &self.encode_hash
    }

    /// The job id assigned by the submit step, once known.
    #[must_use]
    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    /// The item's current outcome.
    #[must_use]
    pub fn outcome(&self) -> &SignOutcome {
        &self.outcome
    }

    /// Whether the item can still be advanced by a stage.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self.outcome, SignOutcome::InFlight)
    }

    /// The signature, if the item reached [`SignOutcome::Signed`].
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        match &self.outcome {
            SignOutcome::Signed(signature) => Some(signature),
            _ => None,
        }
    }

    /// The carried error, if the item reached [`SignOutcome::Failed`].
    #[must_use]
    pub fn error(&self) -> Option<&FlowlineError> {
        match &self.outcome {
            SignOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Records the job id assigned by the submit step.
    #[must_use]
    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    /// Transitions to [`SignOutcome::Signed`], if still in flight.
    #[must_use]
    pub fn signed(mut self, signature: impl Into<String>) -> Self {
        if self.is_in_flight() {
            self.outcome = SignOutcome::Signed(signature.into());
        }
        self
    }

    /// Transitions to [`SignOutcome::TimedOut`], if still in flight.
    #[must_use]
    pub fn timed_out(mut self) -> Self {
        if self.is_in_flight() {
            self.outcome = SignOutcome::TimedOut;
        }
        self
    }

    /// Transitions to [`SignOutcome::Failed`], if still in flight.
    ///
    /// A second failure is dropped; the first one wins.
    #[must_use]
    pub fn fail(mut self, error: FlowlineError) -> Self {
        if self.is_in_flight() {
            self.outcome = SignOutcome::Failed(error);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_in_flight() {
        let item = SignItem::new("0x01");
        assert!(item.is_in_flight());
        assert_eq!(item.encode_hash(), "0x01");
        assert!(item.tx_id().is_none());
        assert!(item.signature().is_none());
        assert!(item.error().is_none());
    }

    #[test]
    fn test_first_failure_wins() {
        let item = SignItem::new("0x01")
            .fail(FlowlineError::Transport("first".to_string()))
            .fail(FlowlineError::Transport("second".to_string()));

        let carried = item.error().map(ToString::to_string);
        assert_eq!(carried.as_deref(), Some("transport error: first"));
    }

    #[test]
    fn test_signed_does_not_overwrite_failure() {
        let item = SignItem::new("0x01")
            .fail(FlowlineError::Encoding("broken".to_string()))
            .signed("0xsig");

        assert!(item.signature().is_none());
        assert!(item.error().is_some());
    }

    #[test]
    fn test_timed_out_only_from_in_flight() {
        let item = SignItem::new("0x01").signed("0xsig").timed_out();
        assert_eq!(item.signature(), Some("0xsig"));
    }

    #[test]
    fn test_tx_id_recorded() {
        let item = SignItem::new("0x01").with_tx_id("0xjob");
        assert_eq!(item.tx_id(), Some("0xjob"));
        assert!(item.is_in_flight());
    }
}
