// src/models/action.rs
//! Economic actions an assertion can authorize.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The action encoded in an assertion's `sub` claim.
///
/// The kind decides which payload fields must be present and which service
/// endpoint consumes the assertion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Sign the user in to the ecosystem.
    Register,
    /// The app pays the user.
    Earn,
    /// The user pays the app.
    Spend,
    /// The user pays another user.
    PayToUser,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Register => "register",
            ActionKind::Earn => "earn",
            ActionKind::Spend => "spend",
            ActionKind::PayToUser => "pay_to_user",
        }
    }

    /// Whether the action moves funds and therefore needs an offer.
    pub fn requires_offer(&self) -> bool {
        !matches!(self, ActionKind::Register)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_claim_names() {
        assert_eq!(serde_json::to_value(ActionKind::PayToUser).unwrap(), "pay_to_user");
        let kind: ActionKind = serde_json::from_str("\"spend\"").unwrap();
        assert_eq!(kind, ActionKind::Spend);
        assert_eq!(ActionKind::Register.to_string(), "register");
    }
}
