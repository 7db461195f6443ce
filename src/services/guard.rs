//! Authorization guards for state-mutating operations
//!
//! Pure functions of the verified session and the on-chain token gate. The
//! holder check runs on every call and is never cached: ownership can change
//! between requests (burn) and must always reflect current chain truth.

use crate::services::contract_reads::TokenGate;
use crate::services::session::Session;

/// Error types for guard checks
#[derive(Debug)]
pub enum GuardError {
    /// No verified session on the request
    Unauthenticated,
    /// Session is valid but the address does not hold the SBT
    Unauthorized,
    /// The address still holds the SBT (burn teardown only)
    StillHolder,
    /// The on-chain read itself failed
    Upstream(String),
}

impl std::fmt::Display for GuardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardError::Unauthenticated => write!(f, "Unauthorized. User is not logged in"),
            GuardError::Unauthorized => {
                write!(f, "Unauthorized. User does not have a soulbound AI SBT")
            }
            GuardError::StillHolder => {
                write!(f, "Shan't delete token for user that still has SBT")
            }
            GuardError::Upstream(msg) => write!(f, "Failed to check token ownership: {}", msg),
        }
    }
}

impl std::error::Error for GuardError {}

/// Gate for every state-mutating operation: the caller must be logged in and
/// currently hold the SBT. Returns the verified wallet address.
pub async fn require_holder(
    session: Option<&Session>,
    gate: &dyn TokenGate,
) -> Result<String, GuardError> {
    let session = session.ok_or(GuardError::Unauthenticated)?;

    let holds = gate
        .holds_token(&session.address)
        .await
        .map_err(|e| GuardError::Upstream(e.to_string()))?;

    if !holds {
        return Err(GuardError::Unauthorized);
    }

    Ok(session.address.clone())
}

/// Gate for burn teardown: the caller must be logged in and must no longer
/// hold the SBT, so live data cannot be deleted out from under a holder.
pub async fn require_non_holder(
    session: Option<&Session>,
    gate: &dyn TokenGate,
) -> Result<String, GuardError> {
    let session = session.ok_or(GuardError::Unauthenticated)?;

    let holds = gate
        .holds_token(&session.address)
        .await
        .map_err(|e| GuardError::Upstream(e.to_string()))?;

    if holds {
        return Err(GuardError::StillHolder);
    }

    Ok(session.address.clone())
}
