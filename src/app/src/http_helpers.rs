//! HTTP helper functions for Crux Core
//!
//! This module extracts common HTTP response handling logic from macros
//! into debuggable, testable functions.

use crux_http::{HttpError, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::unwrap_envelope;

/// Join a base URL and an endpoint path with exactly one slash between them
///
/// # Example
/// ```
/// use softpos_demo_core::http_helpers::join_url;
/// let url = join_url("http://localhost:8080/", "/api/v1/public/kernels");
/// assert_eq!(url, "http://localhost:8080/api/v1/public/kernels");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Validates HTTP response.
///
/// Returns `true` if the response status is 2xx.
pub fn is_response_success<T>(response: &Response<T>) -> bool {
    response.status().is_success()
}

/// Extracts error message from HTTP response.
pub fn extract_error_message(action: &str, response: &mut Response<Vec<u8>>) -> String {
    let status = response.status().to_string();

    match response.take_body() {
        Some(body) if body.is_empty() => format!("{action} failed: HTTP {status} (Empty body)"),
        Some(body) => match String::from_utf8(body) {
            Ok(msg) => format!("{action} failed: HTTP {status}: {msg}"),
            Err(e) => format!("{action} failed: HTTP {status} (Invalid UTF-8: {e})"),
        },
        None => format!("{action} failed: HTTP {status} (No body)"),
    }
}

/// Decode a backend JSON body, unwrapping the `{ code, data, message }` envelope.
pub fn decode_backend_json<T: DeserializeOwned>(action: &str, body: &[u8]) -> Result<T, String> {
    let document: Value =
        serde_json::from_slice(body).map_err(|e| format!("{action}: JSON parse error: {e}"))?;

    serde_json::from_value(unwrap_envelope(document))
        .map_err(|e| format!("{action}: unexpected response: {e}"))
}

/// Parse JSON from response body.
///
/// Returns error if response is not successful or JSON parsing fails.
pub fn parse_json_response<T: DeserializeOwned>(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<T, String> {
    if !is_response_success(response) {
        return Err(extract_error_message(action, response));
    }

    match response.take_body() {
        Some(body) => decode_backend_json(action, &body),
        None => Err(format!("{action}: Empty response body")),
    }
}

/// Check response status only (no body parsing).
///
/// For endpoints that return status-only responses.
pub fn check_response_status(action: &str, response: &mut Response<Vec<u8>>) -> Result<(), String> {
    if is_response_success(response) {
        Ok(())
    } else {
        Err(extract_error_message(action, response))
    }
}

/// Extract the raw body from response.
///
/// For binary downloads such as kernel modules.
pub fn extract_bytes_response(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<Vec<u8>, String> {
    if !is_response_success(response) {
        return Err(extract_error_message(action, response));
    }

    match response.take_body() {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(format!("{action}: Empty response body")),
    }
}

/// Map a transport error to a message naming the action
pub fn map_http_error(action: &str, error: HttpError) -> String {
    format!("{action} failed: {error}")
}

/// Process HTTP response result and check status only (no JSON parsing)
pub fn process_status_response(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<(), String> {
    match result {
        Ok(mut response) => check_response_status(action, &mut response),
        Err(e) => Err(map_http_error(action, e)),
    }
}

/// Process HTTP response result and parse JSON
pub fn process_json_response<T: DeserializeOwned>(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<T, String> {
    match result {
        Ok(mut response) => parse_json_response(action, &mut response),
        Err(e) => Err(map_http_error(action, e)),
    }
}

/// Process HTTP response result and return the body bytes
pub fn process_bytes_response(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<Vec<u8>, String> {
    match result {
        Ok(mut response) => extract_bytes_response(action, &mut response),
        Err(e) => Err(map_http_error(action, e)),
    }
}
