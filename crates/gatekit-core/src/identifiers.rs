// crates/gatekit-core/src/identifiers.rs
// ============================================================================
// Module: Gatekit Identifiers
// Description: Newtype wrappers for the named entities that flow through a
// snapshot (spec names, rule ids, group names, id types).
// Purpose: Prevent accidental mixing of bare `String`s across component
// boundaries while keeping wire (de)serialization transparent.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every name that crosses a component boundary (spec store → evaluator,
//! evaluator → exposure logger) is wrapped in a small newtype here instead of
//! passed as a bare `String`. Construction never fails: the wire format
//! permits any non-empty or even empty string for these fields, so these
//! types exist purely for type-safety, not validation.

use std::borrow::Borrow;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps any string-like value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the wrapped value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the wrapped value is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Consumes the identifier, returning the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Name of a feature gate, dynamic config, or layer (the `ConfigSpec.name`
    /// key a snapshot indexes by).
    SpecName
);

string_identifier!(
    /// `Rule.id`, unique within a single spec's rule list.
    RuleId
);

string_identifier!(
    /// `Rule.groupName`, a human label for the matched rule (often an
    /// experiment group name).
    GroupName
);

string_identifier!(
    /// The id-type a rule or condition buckets on (e.g. `"userID"`,
    /// `"stableID"`). Compared case-insensitively against `"userid"` by
    /// [`crate::hashing::unit_id`].
    IdType
);

string_identifier!(
    /// A salt value mixed into the bucketing hash input. Distinct from
    /// [`IdType`] only for documentation clarity; both are opaque strings.
    Salt
);

impl IdType {
    /// Returns true when this id type selects the user's primary `userID`
    /// (empty string, or case-insensitively equal to `"userid"`).
    #[must_use]
    pub fn is_user_id(&self) -> bool {
        self.0.is_empty() || self.0.eq_ignore_ascii_case("userid")
    }
}
