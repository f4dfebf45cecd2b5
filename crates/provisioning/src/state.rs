//! Provisioning state machine.

use serde::{Deserialize, Serialize};

/// The state of one provisioning run.
///
/// State transitions:
/// ```text
/// Authorizing ──► Validating ──► SlugResolving ──► ServiceInserting
///                                                         │
///           PricingInserting ◄────────────────────────────┘
///                  │
///                  └──► BookingRulesInserting ──► Committed
///
/// PricingInserting | BookingRulesInserting ──► RollingBack ──► Failed
/// Authorizing | Validating | SlugResolving | ServiceInserting ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProvisioningState {
    /// Resolving the caller and checking salon access.
    #[default]
    Authorizing,

    /// Validating the three payloads and the category rule.
    Validating,

    /// Computing a slug unique within the salon.
    SlugResolving,

    /// Inserting the service definition.
    ServiceInserting,

    /// Inserting the pricing row.
    PricingInserting,

    /// Inserting the booking rules row.
    BookingRulesInserting,

    /// Deleting rows written before a failed insert.
    RollingBack,

    /// All three rows were written (terminal state).
    Committed,

    /// The run stopped with an error (terminal state).
    Failed,
}

impl ProvisioningState {
    /// Returns true if rows already exist that a failure must remove.
    pub fn needs_rollback(&self) -> bool {
        matches!(
            self,
            ProvisioningState::PricingInserting | ProvisioningState::BookingRulesInserting
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Committed | ProvisioningState::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: ProvisioningState) -> bool {
        use ProvisioningState::*;

        match (self, next) {
            (Authorizing, Validating)
            | (Validating, SlugResolving)
            | (SlugResolving, ServiceInserting)
            | (ServiceInserting, PricingInserting)
            | (PricingInserting, BookingRulesInserting)
            | (BookingRulesInserting, Committed)
            | (RollingBack, Failed) => true,
            (PricingInserting | BookingRulesInserting, RollingBack) => true,
            (Authorizing | Validating | SlugResolving | ServiceInserting, Failed) => true,
            _ => false,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningState::Authorizing => "Authorizing",
            ProvisioningState::Validating => "Validating",
            ProvisioningState::SlugResolving => "SlugResolving",
            ProvisioningState::ServiceInserting => "ServiceInserting",
            ProvisioningState::PricingInserting => "PricingInserting",
            ProvisioningState::BookingRulesInserting => "BookingRulesInserting",
            ProvisioningState::RollingBack => "RollingBack",
            ProvisioningState::Committed => "Committed",
            ProvisioningState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
