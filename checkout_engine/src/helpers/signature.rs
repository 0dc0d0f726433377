//! # Parameter canonicalization and HMAC signatures
//!
//! Both directions of the provider protocol are signed the same way:
//!
//! * The outbound redirect to the provider's payment page carries our signature over every parameter we send.
//! * Every inbound callback (IPN and browser return) carries the provider's signature over every parameter it sends.
//!
//! The canonical string is built from the parameter map by
//!   1. dropping parameters whose value is empty,
//!   2. sorting by key (byte order),
//!   3. form-url-encoding each key and value (space becomes `+`; only alphanumerics and `*-._` stay literal),
//!   4. joining the pairs as `k=v` with `&`.
//!
//! The hash fields themselves ([`SECURE_HASH`], [`SECURE_HASH_TYPE`]) are never part of the signed string. The
//! signature is `HMAC-SHA512(secret, canonical)`, rendered as lowercase hex.
//!
//! All outbound signing and inbound verification goes through this module. If the two sides ever canonicalize
//! differently, every callback fails verification.
use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use url::form_urlencoded::byte_serialize;

type HmacSha512 = Hmac<Sha512>;

pub const SECURE_HASH: &str = "vnp_SecureHash";
pub const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";
const HASH_FIELDS: [&str; 2] = [SECURE_HASH, SECURE_HASH_TYPE];

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

/// Builds the canonical query string for `params`. Hash fields are *not* removed here; see [`sign`].
pub fn canonicalize(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<String>>()
        .join("&")
}

/// Returns a copy of `params` without the signature fields.
pub fn strip_hash_fields(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params.iter().filter(|(k, _)| !HASH_FIELDS.contains(&k.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn mac_for(params: &BTreeMap<String, String>, secret: &str) -> HmacSha512 {
    let canonical = canonicalize(&strip_hash_fields(params));
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    mac
}

/// Signs every parameter except the hash fields. The result is lowercase hex.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    hex::encode(mac_for(params, secret).finalize().into_bytes())
}

/// Checks the [`SECURE_HASH`] field of `params` against a freshly computed signature.
///
/// The comparison ignores hex case and runs in constant time. A missing or non-hex hash never verifies.
pub fn verify(params: &BTreeMap<String, String>, secret: &str) -> bool {
    let Some(supplied) = params.get(SECURE_HASH) else {
        return false;
    };
    let Ok(supplied) = hex::decode(supplied.trim()) else {
        return false;
    };
    mac_for(params, secret).verify_slice(&supplied).is_ok()
}
