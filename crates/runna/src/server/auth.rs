//! Access gate: optional shared-secret check in front of every route.
//!
//! The credential is compared as an opaque byte string against the base64
//! payload of the last token of the `Authorization` header. No
//! username/password split happens.

use crate::server::SharedState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

/// Challenge sent with every denial.
pub const CHALLENGE: &str = "Basic realm=\"401\"";

/// Body of every denial.
pub const DENIED_BODY: &str = "Access denied.";

/// Standard alphabet, padding optional.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Middleware enforcing the configured credential.
///
/// Without a credential every request passes untouched.
pub async fn authorize(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.config().credential.as_deref() else {
        return next.run(request).await;
    };

    if credential_matches(request.headers().get(header::AUTHORIZATION), expected) {
        return next.run(request).await;
    }

    tracing::debug!("Rejected unauthorized request to {}", request.uri().path());
    deny()
}

/// Whether `header` carries exactly `expected`.
///
/// A missing or undecodable header yields an empty credential, which never
/// matches a non-empty `expected`.
pub fn credential_matches(header: Option<&HeaderValue>, expected: &str) -> bool {
    let provided = header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_whitespace().last())
        .and_then(|token| LENIENT_BASE64.decode(token).ok())
        .unwrap_or_default();

    constant_time_eq(&provided, expected.as_bytes())
}

/// Compare two byte strings without an early exit on the first difference.
///
/// Lengths are not hidden.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn deny() -> Response {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, CHALLENGE)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(DENIED_BODY))
        .unwrap_or_else(|_| StatusCode::UNAUTHORIZED.into_response())
}
