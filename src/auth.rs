use crate::config::AdminCredentials;
use crate::routes::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;

const CHALLENGE: &str = r#"Basic realm="Restricted Statistics""#;

pub async fn basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !is_authorized(request.headers(), &state.credentials) {
        tracing::debug!("Rejected admin request");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, CHALLENGE)],
            "401 Unauthorized",
        )
            .into_response();
    }
    next.run(request).await
}

fn is_authorized(headers: &HeaderMap, credentials: &AdminCredentials) -> bool {
    let Some((user, pass)) = basic_credentials(headers) else {
        return false;
    };
    // evaluate both so a wrong user costs the same as a wrong password
    let user_ok = secure_compare(&user, &credentials.user);
    let pass_ok = secure_compare(&pass, &credentials.pass);
    user_ok & pass_ok
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Compares fixed-size digests so neither content nor length leaks through timing.
fn secure_compare(given: &str, expected: &str) -> bool {
    let given = Sha3_256::digest(given.as_bytes());
    let expected = Sha3_256::digest(expected.as_bytes());
    given.as_slice().ct_eq(expected.as_slice()).into()
}
