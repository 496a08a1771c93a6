// crates/gatekit-core/src/hashing.rs
// ============================================================================
// Module: Gatekit Hashing & Bucketing
// Description: SHA-256 key hashing, DJB2 identity hashing, and the bucketing
// helpers derived from them.
// Purpose: Single source of truth for every hash the evaluator and spec
// store rely on for determinism.
// Dependencies: base64, sha2
// ============================================================================

//! ## Overview
//! `H(key) := SHA-256(utf8(key))`. Bucketing reads the big-endian `u64` over
//! the first 8 bytes of that digest. Name hashing for exposure/initialize
//! payloads additionally supports an identity passthrough and a DJB2
//! variant, selected by the caller — internal evaluation always uses the
//! SHA-256 variant.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use sha2::Digest;
use sha2::Sha256;

/// Number of membership-token prefix characters retained for id-list and
/// `in_segment_list` membership checks (see [`id_list_token`]).
pub const ID_LIST_TOKEN_LEN: usize = 8;

/// Modulus used for `user_bucket` condition values (§4.E).
pub const USER_BUCKET_MODULUS: i64 = 1000;

/// Modulus used for rule `passPercentage` bucketing (§4.E `passPercent`).
pub const PASS_PERCENTAGE_MODULUS: u64 = 10_000;

/// Computes `H(key) := SHA-256(utf8(key))`, returning the raw 32-byte digest.
#[must_use]
pub fn sha256(key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}

/// Returns the big-endian `u64` formed from the first 8 bytes of `H(key)`,
/// the bucketing primitive every percentage/segment computation is built on.
#[must_use]
pub fn hash_u64(key: &str) -> u64 {
    let digest = sha256(key);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(buf)
}

/// Returns `hash_u64(key) mod PASS_PERCENTAGE_MODULUS`, the value `eval`
/// compares against `passPercentage * 100`.
#[must_use]
pub fn pass_percentage_bucket(key: &str) -> u64 {
    hash_u64(key) % PASS_PERCENTAGE_MODULUS
}

/// Returns the `user_bucket` condition value: `int64(H(key) mod 1000)`.
#[must_use]
pub fn user_bucket_value(key: &str) -> i64 {
    #[allow(
        clippy::cast_possible_wrap,
        reason = "modulus is 1000, value always fits in i64 without wrapping"
    )]
    let bucket = (hash_u64(key) % 1000) as i64;
    bucket
}

/// Computes the 8-character base64(SHA-256) membership token used by id
/// lists and the `in_segment_list`/`not_in_segment_list` operators.
#[must_use]
pub fn id_list_token(id: &str) -> String {
    let digest = sha256(id);
    let encoded = BASE64_STANDARD.encode(digest);
    encoded.chars().take(ID_LIST_TOKEN_LEN).collect()
}

/// Selectable name-hashing strategies for exposure/initialize-bundle output.
/// Internal evaluation never uses this enum directly; it always hashes via
/// [`sha256`]/[`hash_u64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameHashAlgorithm {
    /// Pass the name through unchanged.
    Identity,
    /// base64(SHA-256(name)).
    Sha256,
    /// DJB2(name), rendered as a decimal string.
    Djb2,
}

/// Hashes `name` according to the selected [`NameHashAlgorithm`].
#[must_use]
pub fn hash_name(name: &str, algorithm: NameHashAlgorithm) -> String {
    match algorithm {
        NameHashAlgorithm::Identity => name.to_string(),
        NameHashAlgorithm::Sha256 => BASE64_STANDARD.encode(sha256(name)),
        NameHashAlgorithm::Djb2 => djb2(name).to_string(),
    }
}

/// Computes the DJB2 hash of `value`, used for SDK-key identity comparisons
/// (`hashed_sdk_key_used` verification in §4.C).
#[must_use]
pub fn djb2(value: &str) -> u32 {
    let mut hash: u32 = 5381;
    for byte in value.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u32::from(byte));
    }
    hash
}
