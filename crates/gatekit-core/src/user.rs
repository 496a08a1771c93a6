// crates/gatekit-core/src/user.rs
// ============================================================================
// Module: Gatekit User
// Description: Identity and attribute bag passed into every evaluation call.
// Purpose: §3 DATA MODEL "User".
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A [`User`] is caller-owned and passed by value into each evaluation call.
//! Its `custom`/`private_attributes` maps are open-ended; field resolution
//! for `user_field` conditions (§4.E) consults both, falling back
//! case-insensitively.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Identity and attribute bag for one evaluation call.
///
/// # Invariants
/// - An [`is_empty_user`](User::is_empty_user) user (no `user_id`, no
///   `custom_ids`) short-circuits public entry points per §7 `EmptyUser`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Primary user identifier. May be empty when `custom_ids` carries the
    /// caller's chosen identity instead.
    #[serde(default)]
    pub user_id: String,
    /// Mapping from id-type name to an opaque identifier string.
    #[serde(default)]
    pub custom_ids: BTreeMap<String, String>,
    /// Email address, if known.
    #[serde(default)]
    pub email: Option<String>,
    /// Caller-observed IP address.
    #[serde(default)]
    pub ip: Option<String>,
    /// Raw User-Agent header value.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// ISO country code, if known (or derived by an `IpCountryLookup`).
    #[serde(default)]
    pub country: Option<String>,
    /// Locale string (e.g. `"en-US"`).
    #[serde(default)]
    pub locale: Option<String>,
    /// Caller application version string, compared via `version_*` operators.
    #[serde(default)]
    pub app_version: Option<String>,
    /// Open-ended custom attribute bag.
    #[serde(default)]
    pub custom: BTreeMap<String, Value>,
    /// Attributes excluded from exposure-event logging but otherwise usable
    /// by condition evaluation.
    #[serde(default)]
    pub private_attributes: BTreeMap<String, Value>,
    /// Environment tier tags (e.g. `{"tier": "staging"}`).
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl User {
    /// Creates a user identified only by `user_id`.
    #[must_use]
    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Returns true when this user has no `user_id` and no `custom_ids`,
    /// triggering the §7 `EmptyUser` short-circuit at public entry points.
    #[must_use]
    pub fn is_empty_user(&self) -> bool {
        self.user_id.is_empty() && self.custom_ids.is_empty()
    }

    /// Resolves `idType` to the identifier used for bucketing (§4.E
    /// `unitID`): the primary `user_id` when `id_type` is empty or
    /// case-insensitively `"userid"`, otherwise a lookup in `custom_ids`
    /// (case-sensitive first, then lowercased), defaulting to `""`.
    #[must_use]
    pub fn unit_id(&self, id_type: &str) -> String {
        if id_type.is_empty() || id_type.eq_ignore_ascii_case("userid") {
            return self.user_id.clone();
        }
        if let Some(value) = self.custom_ids.get(id_type) {
            return value.clone();
        }
        let lowered = id_type.to_ascii_lowercase();
        self.custom_ids.get(&lowered).cloned().unwrap_or_default()
    }

    /// Resolves a `user_field` condition field name against top-level
    /// attributes first, then `custom`, then `private_attributes`
    /// (case-insensitive fallback on each), per §4.E field resolution.
    #[must_use]
    pub fn resolve_field(&self, field: &str) -> Option<Value> {
        if let Some(value) = self.resolve_top_level_field(field) {
            return Some(value);
        }
        let lowered = field.to_ascii_lowercase();
        self.custom
            .get(field)
            .or_else(|| self.custom.get(&lowered))
            .or_else(|| self.private_attributes.get(field))
            .or_else(|| self.private_attributes.get(&lowered))
            .cloned()
    }

    /// Resolves one of the fixed top-level user attributes, matching common
    /// casing aliases (`userID`/`userId`/`user_id` all resolve the same
    /// field).
    fn resolve_top_level_field(&self, field: &str) -> Option<Value> {
        let normalized = field.to_ascii_lowercase().replace(['_', '-'], "");
        match normalized.as_str() {
            "userid" => Some(Value::String(self.user_id.clone())),
            "email" => self.email.clone().map(Value::String),
            "ip" | "ipaddress" => self.ip.clone().map(Value::String),
            "useragent" => self.user_agent.clone().map(Value::String),
            "country" => self.country.clone().map(Value::String),
            "locale" => self.locale.clone().map(Value::String),
            "appversion" => self.app_version.clone().map(Value::String),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_user_detects_no_identity() {
        assert!(User::default().is_empty_user());
        assert!(!User::with_user_id("abc").is_empty_user());
    }

    #[test]
    fn unit_id_falls_back_to_custom_ids() {
        let mut user = User::with_user_id("abc");
        user.custom_ids.insert("stableID".to_string(), "stable-1".to_string());
        assert_eq!(user.unit_id(""), "abc");
        assert_eq!(user.unit_id("userID"), "abc");
        assert_eq!(user.unit_id("stableID"), "stable-1");
        assert_eq!(user.unit_id("missing"), "");
    }

    #[test]
    fn resolve_field_prefers_top_level_then_custom() {
        let mut user = User::with_user_id("abc");
        user.email = Some("a@example.com".to_string());
        user.custom.insert("plan".to_string(), json!("pro"));
        assert_eq!(user.resolve_field("email"), Some(json!("a@example.com")));
        assert_eq!(user.resolve_field("plan"), Some(json!("pro")));
        assert_eq!(user.resolve_field("missing"), None);
    }
}
