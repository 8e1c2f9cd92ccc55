use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Role;

/// State of a match request. Every state other than the two pending ones is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchState {
    /// Waiting for the research side to answer.
    #[serde(rename = "pendiente_unsa")]
    PendingUnsa,
    /// Waiting for the external participant to answer.
    #[serde(rename = "pendiente_externo")]
    PendingExterno,
    #[serde(rename = "aceptado")]
    Accepted,
    #[serde(rename = "rechazado_unsa")]
    RejectedUnsa,
    #[serde(rename = "rechazado_externo")]
    RejectedExterno,
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl MatchState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MatchState::PendingUnsa => "pendiente_unsa",
            MatchState::PendingExterno => "pendiente_externo",
            MatchState::Accepted => "aceptado",
            MatchState::RejectedUnsa => "rechazado_unsa",
            MatchState::RejectedExterno => "rechazado_externo",
            MatchState::Cancelled => "cancelado",
        }
    }

    pub fn parse(s: &str) -> Option<MatchState> {
        match s {
            "pendiente_unsa" => Some(MatchState::PendingUnsa),
            "pendiente_externo" => Some(MatchState::PendingExterno),
            "aceptado" => Some(MatchState::Accepted),
            "rechazado_unsa" => Some(MatchState::RejectedUnsa),
            "rechazado_externo" => Some(MatchState::RejectedExterno),
            "cancelado" => Some(MatchState::Cancelled),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, MatchState::PendingUnsa | MatchState::PendingExterno)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_pending()
    }

    /// Initial state of a request opened by a user of `role`, or `None` when
    /// the role cannot open requests.
    #[must_use]
    pub const fn initial_for(role: Role) -> Option<MatchState> {
        match role {
            Role::Externo => Some(MatchState::PendingUnsa),
            Role::Unsa => Some(MatchState::PendingExterno),
            Role::Admin => None,
        }
    }

    /// The role that is expected to answer a pending request.
    const fn awaiting(self) -> Option<Role> {
        match self {
            MatchState::PendingUnsa => Some(Role::Unsa),
            MatchState::PendingExterno => Some(Role::Externo),
            _ => None,
        }
    }

    /// Applies `action` performed by `party` holding `role`.
    ///
    /// Returns the resulting state, or `None` when the combination is not
    /// allowed. The caller must perform no mutation on `None`.
    #[must_use]
    pub fn apply(self, action: MatchAction, party: Party, role: Role) -> Option<MatchState> {
        match (action, party) {
            (MatchAction::Accept, Party::Recipient) if self.awaiting() == Some(role) => {
                Some(MatchState::Accepted)
            }
            (MatchAction::Reject, Party::Recipient) if self.awaiting() == Some(role) => {
                match self {
                    MatchState::PendingUnsa => Some(MatchState::RejectedUnsa),
                    _ => Some(MatchState::RejectedExterno),
                }
            }
            (MatchAction::Cancel, Party::Requester) if self.is_pending() => {
                Some(MatchState::Cancelled)
            }
            _ => None,
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action a party can take on a pending match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchAction {
    #[serde(rename = "aceptar")]
    Accept,
    #[serde(rename = "rechazar")]
    Reject,
    #[serde(rename = "cancelar")]
    Cancel,
}

impl MatchAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MatchAction::Accept => "aceptar",
            MatchAction::Reject => "rechazar",
            MatchAction::Cancel => "cancelar",
        }
    }

    pub fn parse(s: &str) -> Option<MatchAction> {
        match s {
            "aceptar" => Some(MatchAction::Accept),
            "rechazar" => Some(MatchAction::Reject),
            "cancelar" => Some(MatchAction::Cancel),
            _ => None,
        }
    }
}

impl FromStr for MatchAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MatchAction::parse(s.trim())
            .ok_or_else(|| format!("unknown action '{s}' (expected aceptar, rechazar or cancelar)"))
    }
}

impl fmt::Display for MatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a match request a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Requester,
    Recipient,
}
