//! Routing envelopes and the compatibility resolver.
//!
//! A token's payload is wrapped in a routing envelope that names the intended
//! recipient. Three envelope generations exist in the wild and all of them
//! must still decode:
//!
//! 1. **Current** — `{"v": 2, "to": <target>, "payload": {...}}`, where the
//!    target is the recipient's persistent identity (string) or, rarely, a
//!    role number.
//! 2. **Role envelope** — `{"to": <role number>, "payload": {...}}`, no
//!    version marker. Predates persistent identities.
//! 3. **Bare** — the payload object itself, no envelope at all. The target
//!    must be inferred by convention (or refused, for deltas, depending on
//!    the game variant's policy).
//!
//! Decoding classifies the raw value into a [`WireShape`] first and then
//! dispatches to one shape-specific decode path. The shapes are checked in
//! the precedence order above; classification never fails, so full-state
//! decoding is total over all three generations.

use serde_json::Value;

use crate::error::SyncError;
use crate::state::ParticipantId;
use crate::Role;

/// Current envelope version marker.
pub(crate) const WIRE_VERSION: u64 = 2;

/// Who a token is meant for.
///
/// Current-shape tokens address the recipient by persistent identity. Legacy
/// tokens address by role number; where the identity cannot be recovered
/// (delta tokens carry no player table, and a legacy snapshot may predate the
/// guest joining) the target stays role-based and the caller decides what
/// that means for routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The participant with this persistent identity.
    Identity(ParticipantId),
    /// Whichever participant holds this role.
    Role(Role),
}

/// The three historical envelope generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WireShape {
    /// Version-marked envelope with an explicit target.
    Current,
    /// Unversioned envelope with a numeric role target.
    RoleEnvelope,
    /// No envelope; the value is the payload itself.
    Bare,
}

/// A decoded envelope: the shape it arrived in, the target if the shape
/// carries one, and the raw payload for typed deserialization.
pub(crate) struct ResolvedEnvelope {
    pub(crate) shape: WireShape,
    pub(crate) target: Option<Target>,
    pub(crate) payload: Value,
}

/// Wraps a payload value in the current envelope shape.
pub(crate) fn wrap(payload: Value, target: &Target) -> Value {
    let to = match target {
        Target::Identity(id) => Value::String(id.as_str().to_string()),
        Target::Role(role) => Value::from(u64::from(role.index())),
    };
    serde_json::json!({ "v": WIRE_VERSION, "to": to, "payload": payload })
}

/// Classifies a raw decoded value into its envelope generation.
///
/// Precedence: a version marker wins, then an unversioned `to`/`payload`
/// pair, then bare. Values that merely *resemble* an envelope but carry no
/// `payload` field are treated as bare payloads; typed deserialization will
/// surface the schema problem with a better message than the resolver could.
pub(crate) fn classify(value: &Value) -> WireShape {
    let Some(object) = value.as_object() else {
        return WireShape::Bare;
    };
    if object.contains_key("v") && object.contains_key("payload") {
        return WireShape::Current;
    }
    if object.contains_key("to") && object.contains_key("payload") {
        return WireShape::RoleEnvelope;
    }
    WireShape::Bare
}

/// Resolves a raw decoded value into shape, target, and payload — one
/// dispatch over the classified shape, no nested presence-sniffing.
pub(crate) fn resolve(value: Value) -> Result<ResolvedEnvelope, SyncError> {
    match classify(&value) {
        WireShape::Current => resolve_current(value),
        WireShape::RoleEnvelope => resolve_role_envelope(value),
        WireShape::Bare => Ok(ResolvedEnvelope {
            shape: WireShape::Bare,
            target: None,
            payload: value,
        }),
    }
}

fn resolve_current(mut value: Value) -> Result<ResolvedEnvelope, SyncError> {
    let target = target_from_value(value.get("to"))
        .ok_or_else(|| SyncError::schema("current envelope has an unusable `to` field"))?;
    let payload = value
        .get_mut("payload")
        .map(Value::take)
        .ok_or_else(|| SyncError::schema("current envelope has no payload"))?;
    Ok(ResolvedEnvelope {
        shape: WireShape::Current,
        target: Some(target),
        payload,
    })
}

fn resolve_role_envelope(mut value: Value) -> Result<ResolvedEnvelope, SyncError> {
    let role = value
        .get("to")
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Role::from_index)
        .ok_or_else(|| SyncError::schema("legacy envelope has an unusable role number"))?;
    let payload = value
        .get_mut("payload")
        .map(Value::take)
        .ok_or_else(|| SyncError::schema("legacy envelope has no payload"))?;
    tracing::debug!(role = ?role, "decoded legacy role-addressed envelope");
    Ok(ResolvedEnvelope {
        shape: WireShape::RoleEnvelope,
        target: Some(Target::Role(role)),
        payload,
    })
}

fn target_from_value(value: Option<&Value>) -> Option<Target> {
    match value? {
        Value::String(id) => Some(Target::Identity(ParticipantId::new(id.clone()))),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Role::from_index)
            .map(Target::Role),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_current_shape() {
        let value = json!({"v": 2, "to": "pid-guest", "payload": {"turn": 1}});
        assert_eq!(classify(&value), WireShape::Current);
    }

    #[test]
    fn classify_role_envelope_shape() {
        let value = json!({"to": 1, "payload": {"turn": 1}});
        assert_eq!(classify(&value), WireShape::RoleEnvelope);
    }

    #[test]
    fn classify_bare_shape() {
        assert_eq!(classify(&json!({"turn": 1})), WireShape::Bare);
        assert_eq!(classify(&json!([1, 2, 3])), WireShape::Bare);
        // `to` without `payload` is just a payload with a field named `to`.
        assert_eq!(classify(&json!({"to": 1})), WireShape::Bare);
    }

    #[test]
    fn resolve_current_with_identity_target() {
        let value = json!({"v": 2, "to": "pid-guest", "payload": {"turn": 7}});
        let resolved = resolve(value).unwrap();
        assert_eq!(resolved.shape, WireShape::Current);
        assert_eq!(
            resolved.target,
            Some(Target::Identity(ParticipantId::new("pid-guest")))
        );
        assert_eq!(resolved.payload, json!({"turn": 7}));
    }

    #[test]
    fn resolve_current_with_role_target() {
        let value = json!({"v": 2, "to": 0, "payload": {}});
        let resolved = resolve(value).unwrap();
        assert_eq!(resolved.target, Some(Target::Role(Role::Host)));
    }

    #[test]
    fn resolve_current_with_bad_target_fails() {
        let value = json!({"v": 2, "to": [1], "payload": {}});
        assert!(matches!(
            resolve(value),
            Err(SyncError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn resolve_role_envelope() {
        let value = json!({"to": 1, "payload": {"turn": 3}});
        let resolved = resolve(value).unwrap();
        assert_eq!(resolved.shape, WireShape::RoleEnvelope);
        assert_eq!(resolved.target, Some(Target::Role(Role::Guest)));
    }

    #[test]
    fn resolve_role_envelope_with_out_of_range_role_fails() {
        let value = json!({"to": 7, "payload": {}});
        assert!(matches!(
            resolve(value),
            Err(SyncError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn resolve_bare_passes_payload_through() {
        let value = json!({"turn": 3, "status": "in_progress"});
        let resolved = resolve(value.clone()).unwrap();
        assert_eq!(resolved.shape, WireShape::Bare);
        assert_eq!(resolved.target, None);
        assert_eq!(resolved.payload, value);
    }

    #[test]
    fn wrap_then_resolve_roundtrips_both_target_forms() {
        let payload = json!({"turn": 9});

        let id_target = Target::Identity(ParticipantId::new("pid-x"));
        let resolved = resolve(wrap(payload.clone(), &id_target)).unwrap();
        assert_eq!(resolved.target, Some(id_target));
        assert_eq!(resolved.payload, payload);

        let role_target = Target::Role(Role::Guest);
        let resolved = resolve(wrap(payload.clone(), &role_target)).unwrap();
        assert_eq!(resolved.target, Some(role_target));
    }
}
