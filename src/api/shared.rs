use serde_json::Value;

use super::transport::ApiResponse;
use crate::error::ClientError;

/// Text of a string field of a JSON object body, if present and non-empty.
pub fn field_text(body: Option<&Value>, field: &str) -> Option<String> {
    body?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Maps a non-2xx response to a request error, surfacing the server's
/// `error` field verbatim and falling back to `fallback` otherwise.
pub fn request_error(response: &ApiResponse, fallback: &str) -> ClientError {
    let message = field_text(response.json_value().as_ref(), "error")
        .unwrap_or_else(|| fallback.to_string());
    ClientError::Request {
        status: response.status,
        message,
    }
}
