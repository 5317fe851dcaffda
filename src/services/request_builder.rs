// src/services/request_builder.rs
//! Signed request construction.
//!
//! Turns an [`ActionKind`] plus its payload into a signed JWT assertion
//! (`{alg, typ, kid}` header, [`ClaimSet`] payload) that the ecosystem
//! service accepts as proof that the application authorized the action.
//!
//! Submitting the assertion lives in [`crate::services::submission`].

use crate::error::RequestError;
use crate::models::action::ActionKind;
use crate::models::assertion::SignedAssertion;
use crate::models::claims::{ActionFields, ClaimSet, Offer, Party};
use crate::services::submission::CallbackContext;
use crate::utils::crypto::SigningAlgorithm;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use log::debug;

/// Lifetime of every assertion: 24 hours after issuance.
pub const DEFAULT_VALIDITY_SECS: i64 = 86_400;

/// Builds and submits signed action assertions.
///
/// Holds only immutable settings (algorithm, key id, validity window,
/// callback context). The private key is borrowed per call and never
/// stored, so a single builder can serve concurrent requests.
#[derive(Clone)]
pub struct SignedRequestBuilder {
    algorithm: SigningAlgorithm,
    key_id: String,
    validity: Duration,
    pub(crate) callback_context: CallbackContext,
}

impl SignedRequestBuilder {
    /// Creates a builder signing with `algorithm` and advertising `key_id` as
    /// the header `kid`.
    ///
    /// Defaults: 24 hour validity, callbacks run inline on the completing task.
    pub fn new(algorithm: SigningAlgorithm, key_id: impl Into<String>) -> Self {
        SignedRequestBuilder {
            algorithm,
            key_id: key_id.into(),
            validity: Duration::seconds(DEFAULT_VALIDITY_SECS),
            callback_context: CallbackContext::Inline,
        }
    }

    /// Overrides the validity window.
    ///
    /// # Errors
    /// `Configuration` unless `validity` is at least one second, so every
    /// assertion has `exp > iat`.
    pub fn with_validity(mut self, validity: Duration) -> Result<Self, RequestError> {
        if validity.num_seconds() <= 0 {
            return Err(RequestError::Configuration(format!(
                "validity window must be positive, got {}s",
                validity.num_seconds()
            )));
        }
        self.validity = validity;
        Ok(self)
    }

    /// Selects where submission callbacks run.
    pub fn with_callback_context(mut self, context: CallbackContext) -> Self {
        self.callback_context = context;
        self
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Builds a signed assertion for `action`.
    ///
    /// # Arguments
    /// * `action` - The action being authorized
    /// * `issuer_id` - Application id, becomes `iss`
    /// * `subject_user_id` - The signed-in user; becomes `user_id` for
    ///   `register` and the default `sender`/`recipient` user otherwise
    /// * `private_key` - PEM private key matching the builder's algorithm
    /// * `fields` - Action payload; must match the action's shape
    ///
    /// # Errors
    /// - `Configuration` when the issuer, key id or key is missing, or the
    ///   payload does not fit the action
    /// - `Encoding` when the key cannot be parsed or signing fails
    ///
    /// Pure: performs no I/O.
    pub fn build_assertion(
        &self,
        action: ActionKind,
        issuer_id: &str,
        subject_user_id: &str,
        private_key: &[u8],
        fields: ActionFields,
    ) -> Result<SignedAssertion, RequestError> {
        if issuer_id.trim().is_empty() {
            return Err(RequestError::Configuration("issuer id is required".into()));
        }
        if private_key.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::Configuration("private key is required".into()));
        }
        if self.key_id.trim().is_empty() {
            return Err(RequestError::Configuration("key id is required".into()));
        }

        let claims = self.claim_set(action, issuer_id, subject_user_id, fields, Utc::now().timestamp())?;

        let mut header = Header::new(self.algorithm.jwt_algorithm());
        header.kid = Some(self.key_id.clone());

        let key = self.algorithm.encoding_key(private_key)?;
        let token = encode(&header, &claims, &key)
            .map_err(|e| RequestError::Encoding(format!("signing failed: {e}")))?;

        debug!("built {action} assertion for {subject_user_id} (kid {})", self.key_id);
        Ok(SignedAssertion::new(action, token))
    }

    /// Assembles and validates the claim set issued at `issued_at`.
    pub fn claim_set(
        &self,
        action: ActionKind,
        issuer_id: &str,
        subject_user_id: &str,
        fields: ActionFields,
        issued_at: i64,
    ) -> Result<ClaimSet, RequestError> {
        let ActionFields { device_id, offer, sender, recipient } = fields;

        // Only the fields the action carries may be supplied.
        let (takes_offer, takes_sender, takes_recipient) = match action {
            ActionKind::Register => (false, false, false),
            ActionKind::Spend => (true, true, false),
            ActionKind::Earn => (true, false, true),
            ActionKind::PayToUser => (true, true, true),
        };
        for (field, present, allowed) in [
            ("device_id", device_id.is_some(), action == ActionKind::Register),
            ("offer", offer.is_some(), takes_offer),
            ("sender", sender.is_some(), takes_sender),
            ("recipient", recipient.is_some(), takes_recipient),
        ] {
            if present && !allowed {
                return Err(shape_error(action, &format!("must not carry {field}")));
            }
        }

        let mut claims = ClaimSet {
            iss: issuer_id.to_string(),
            iat: issued_at,
            exp: issued_at + self.validity.num_seconds(),
            sub: action,
            user_id: None,
            device_id: None,
            offer: None,
            sender: None,
            recipient: None,
        };

        match action {
            ActionKind::Register => {
                claims.user_id = Some(required_user(subject_user_id, action, "user_id")?);
                claims.device_id = device_id;
            }
            ActionKind::Spend => {
                claims.offer = Some(validated_offer(offer, action)?);
                claims.sender = Some(party_for(sender, subject_user_id, action, "sender")?);
            }
            ActionKind::Earn => {
                claims.offer = Some(validated_offer(offer, action)?);
                claims.recipient = Some(party_for(recipient, subject_user_id, action, "recipient")?);
            }
            ActionKind::PayToUser => {
                claims.offer = Some(validated_offer(offer, action)?);
                claims.sender = Some(party_for(sender, subject_user_id, action, "sender")?);
                // The peer has to be named explicitly.
                let recipient = recipient.ok_or_else(|| shape_error(action, "requires a recipient"))?;
                let peer = recipient.user_id.as_deref().unwrap_or_default();
                if peer.trim().is_empty() {
                    return Err(shape_error(action, "requires recipient.user_id"));
                }
                claims.recipient = Some(recipient);
            }
        }

        Ok(claims)
    }

    /// Verifies `token` with the issuer's public key and returns its claims.
    ///
    /// Checks the signature, `exp` and that `iss` equals `issuer_id`.
    pub fn verify_assertion(
        &self,
        token: &str,
        issuer_id: &str,
        public_key: &[u8],
    ) -> Result<ClaimSet, RequestError> {
        let key = self.algorithm.decoding_key(public_key)?;
        let mut validation = Validation::new(self.algorithm.jwt_algorithm());
        validation.set_issuer(&[issuer_id]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<ClaimSet>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| RequestError::Encoding(format!("verification failed: {e}")))
    }
}

fn shape_error(action: ActionKind, detail: &str) -> RequestError {
    RequestError::Configuration(format!("{action} {detail}"))
}

fn required_user(user_id: &str, action: ActionKind, field: &str) -> Result<String, RequestError> {
    if user_id.trim().is_empty() {
        return Err(shape_error(action, &format!("requires {field}")));
    }
    Ok(user_id.to_string())
}

fn validated_offer(offer: Option<Offer>, action: ActionKind) -> Result<Offer, RequestError> {
    let offer = offer.ok_or_else(|| shape_error(action, "requires an offer"))?;
    if offer.id.trim().is_empty() {
        return Err(shape_error(action, "requires offer.id"));
    }
    if offer.amount == 0 {
        return Err(shape_error(action, "requires a positive offer.amount"));
    }
    Ok(offer)
}

/// The party owned by the subject user; its `user_id` defaults to the subject.
fn party_for(
    party: Option<Party>,
    subject_user_id: &str,
    action: ActionKind,
    field: &str,
) -> Result<Party, RequestError> {
    let mut party = party.ok_or_else(|| shape_error(action, &format!("requires a {field}")))?;
    if party.user_id.is_none() {
        party.user_id = Some(required_user(subject_user_id, action, &format!("{field}.user_id"))?);
    }
    Ok(party)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode_header, Algorithm};
    use serde_json::Value;

    const RSA_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/rsa_private.pem");
    const RSA_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/rsa_public.pem");
    const EC_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/ec_private.pem");
    const EC_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/ec_public.pem");

    fn builder() -> SignedRequestBuilder {
        SignedRequestBuilder::new(SigningAlgorithm::RS512, "rs512_0")
    }

    #[test]
    fn spend_assertion_carries_offer_and_sender() {
        let fields = ActionFields::spend(Offer::new("X1", 10), Party::user("alice"));
        let assertion = builder()
            .build_assertion(ActionKind::Spend, "test-app", "alice", RSA_PRIVATE, fields)
            .unwrap();
        assert_eq!(assertion.action(), ActionKind::Spend);

        let claims = builder().verify_assertion(assertion.as_str(), "test-app", RSA_PUBLIC).unwrap();
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], "spend");
        assert_eq!(value["offer"]["id"], "X1");
        assert_eq!(value["offer"]["amount"], 10);
        assert_eq!(value["sender"]["user_id"], "alice");
        assert_eq!(value.get("recipient"), None);
    }

    #[test]
    fn validity_window_is_one_day() {
        let fields = ActionFields::earn(Offer::new("E1", 3), Party::described("Quiz", "Answered"));
        let assertion = builder()
            .build_assertion(ActionKind::Earn, "test-app", "bob", RSA_PRIVATE, fields)
            .unwrap();
        let claims = builder().verify_assertion(assertion.as_str(), "test-app", RSA_PUBLIC).unwrap();
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!((claims.iat - Utc::now().timestamp()).abs() < 5);
        assert_eq!(claims.recipient.unwrap().user_id.as_deref(), Some("bob"));
    }

    #[test]
    fn round_trip_recovers_claims() {
        let fields = ActionFields::pay_to_user(
            Offer::new("P1", 7),
            Party::described("Gift", "To a friend"),
            Party::user("carol").with_title("Gift").with_description("From a friend"),
        );
        let expected = builder()
            .claim_set(ActionKind::PayToUser, "test-app", "alice", fields.clone(), 0)
            .unwrap();

        let assertion = builder()
            .build_assertion(ActionKind::PayToUser, "test-app", "alice", RSA_PRIVATE, fields)
            .unwrap();
        let decoded = builder().verify_assertion(assertion.as_str(), "test-app", RSA_PUBLIC).unwrap();

        assert_eq!(decoded.offer, expected.offer);
        assert_eq!(decoded.sender, expected.sender);
        assert_eq!(decoded.recipient, expected.recipient);
        assert_eq!(decoded.sub, ActionKind::PayToUser);
    }

    #[test]
    fn header_names_algorithm_and_key() {
        let assertion = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", RSA_PRIVATE, ActionFields::default())
            .unwrap();
        let header = decode_header(assertion.as_str()).unwrap();
        assert_eq!(header.alg, Algorithm::RS512);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.kid.as_deref(), Some("rs512_0"));
    }

    #[test]
    fn register_claims_carry_user_and_device() {
        let claims = builder()
            .claim_set(
                ActionKind::Register,
                "test-app",
                "user_7_0",
                ActionFields::register(Some("device-1".into())),
                100,
            )
            .unwrap();
        let value: Value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["user_id"], "user_7_0");
        assert_eq!(value["device_id"], "device-1");
        assert_eq!(value["iat"], 100);
        assert_eq!(value["exp"], 86_500);
        assert!(value.get("offer").is_none());
    }

    #[test]
    fn es256_keys_are_supported() {
        let es = SignedRequestBuilder::new(SigningAlgorithm::ES256, "es256_0");
        let assertion = es
            .build_assertion(ActionKind::Register, "test-app", "alice", EC_PRIVATE, ActionFields::default())
            .unwrap();
        let claims = es.verify_assertion(assertion.as_str(), "test-app", EC_PUBLIC).unwrap();
        assert_eq!(claims.user_id.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_key_or_issuer_is_a_configuration_error() {
        let err = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", b"", ActionFields::default())
            .unwrap_err();
        assert!(matches!(err, RequestError::Configuration(_)));

        let err = builder()
            .build_assertion(ActionKind::Register, " ", "alice", RSA_PRIVATE, ActionFields::default())
            .unwrap_err();
        assert!(matches!(err, RequestError::Configuration(_)));
    }

    #[test]
    fn whitespace_key_is_a_configuration_error() {
        let err = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", b" \n\t ", ActionFields::default())
            .unwrap_err();
        assert!(matches!(err, RequestError::Configuration(_)), "{err}");
    }

    #[test]
    fn non_positive_validity_is_rejected() {
        assert!(matches!(
            builder().with_validity(Duration::zero()),
            Err(RequestError::Configuration(_))
        ));
        assert!(matches!(
            builder().with_validity(Duration::seconds(-60)),
            Err(RequestError::Configuration(_))
        ));

        let short = builder().with_validity(Duration::seconds(300)).unwrap();
        let claims = short
            .claim_set(ActionKind::Register, "test-app", "alice", ActionFields::default(), 1_000)
            .unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn malformed_or_mismatched_key_is_an_encoding_error() {
        let err = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", b"garbage", ActionFields::default())
            .unwrap_err();
        assert!(matches!(err, RequestError::Encoding(_)));

        let err = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", EC_PRIVATE, ActionFields::default())
            .unwrap_err();
        assert!(matches!(err, RequestError::Encoding(_)));
    }

    #[test]
    fn payload_must_match_action_shape() {
        let b = builder();
        let cases = [
            (ActionKind::Spend, ActionFields::default()),
            (ActionKind::Spend, ActionFields { offer: Some(Offer::new("X1", 10)), ..ActionFields::default() }),
            (ActionKind::Earn, ActionFields::spend(Offer::new("X1", 10), Party::user("alice"))),
            (ActionKind::Spend, ActionFields::spend(Offer::new("", 10), Party::user("alice"))),
            (ActionKind::Spend, ActionFields::spend(Offer::new("X1", 0), Party::user("alice"))),
            (ActionKind::PayToUser, ActionFields::spend(Offer::new("X1", 10), Party::user("alice"))),
            (
                ActionKind::PayToUser,
                ActionFields::pay_to_user(Offer::new("X1", 10), Party::user("alice"), Party::default()),
            ),
            (ActionKind::Register, ActionFields { offer: Some(Offer::new("X1", 1)), ..ActionFields::default() }),
            (ActionKind::Register, ActionFields { sender: Some(Party::user("alice")), ..ActionFields::default() }),
            (ActionKind::Register, ActionFields { recipient: Some(Party::user("bob")), ..ActionFields::default() }),
            (
                ActionKind::Spend,
                ActionFields {
                    recipient: Some(Party::user("mallory")),
                    ..ActionFields::spend(Offer::new("X1", 10), Party::user("alice"))
                },
            ),
            (
                ActionKind::Spend,
                ActionFields {
                    device_id: Some("device-1".into()),
                    ..ActionFields::spend(Offer::new("X1", 10), Party::user("alice"))
                },
            ),
            (
                ActionKind::Earn,
                ActionFields {
                    sender: Some(Party::user("mallory")),
                    ..ActionFields::earn(Offer::new("X1", 10), Party::user("alice"))
                },
            ),
            (
                ActionKind::PayToUser,
                ActionFields {
                    device_id: Some("device-1".into()),
                    ..ActionFields::pay_to_user(Offer::new("X1", 10), Party::user("alice"), Party::user("bob"))
                },
            ),
        ];
        for (action, fields) in cases {
            let err = b.claim_set(action, "test-app", "alice", fields, 0).unwrap_err();
            assert!(matches!(err, RequestError::Configuration(_)), "{action}: {err}");
        }
    }

    #[test]
    fn verification_rejects_foreign_issuer() {
        let assertion = builder()
            .build_assertion(ActionKind::Register, "test-app", "alice", RSA_PRIVATE, ActionFields::default())
            .unwrap();
        assert!(builder().verify_assertion(assertion.as_str(), "other-app", RSA_PUBLIC).is_err());
    }
}
