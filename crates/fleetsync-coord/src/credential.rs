//! Expiry extraction from claims-bearing credentials.
//!
//! Revocation needs exactly one fact about a credential: when it would
//! have expired naturally, so the revocation record can expire at the
//! same time (plus a grace period). The credential is expected to be a
//! signed, claims-bearing token in compact form (`header.payload.sig`).
//!
//! Parsing here is NOT validation. The signature is never checked:
//! revocation must work even for tokens this service could not verify,
//! right up to the point where the expiry cannot be determined.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::CoordError;

/// The one claim the revocation path cares about.
#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    /// Expiration time, seconds since the Unix epoch (RFC 7519 `exp`).
    exp: Option<i64>,
}

/// Extracts the expiration claim from a compact signed token.
///
/// # Errors
///
/// Returns `CoordError::MalformedCredential` if the token does not have
/// exactly three segments, the payload segment is not base64url JSON, or
/// the `exp` claim is missing or out of range.
pub fn extract_expiry(raw_credential: &str) -> Result<OffsetDateTime, CoordError> {
    let mut segments = raw_credential.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(CoordError::malformed_credential(
            "expected a three-segment signed token",
        ));
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        CoordError::malformed_credential(format!("payload segment is not base64url: {err}"))
    })?;

    let claims: ExpiryClaims = serde_json::from_slice(&bytes).map_err(|err| {
        CoordError::malformed_credential(format!("payload is not a JSON claims set: {err}"))
    })?;

    let exp = claims
        .exp
        .ok_or_else(|| CoordError::malformed_credential("missing exp claim"))?;

    OffsetDateTime::from_unix_timestamp(exp)
        .map_err(|err| CoordError::malformed_credential(format!("exp claim out of range: {err}")))
}
