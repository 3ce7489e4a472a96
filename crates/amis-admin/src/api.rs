//! Response envelopes.
//!
//! The amis frontend expects every reply in one of three shapes:
//!
//! - success: `{"status": 0, "msg": "", "data": ...}`
//! - failure: `{"status": <code>, "msg": "...", "data": {}}`
//! - validation failure: `{"status": 422, "msg": "...", "errors": {"field": "message"}}`

use axum::response::{IntoResponse, Response};
use axum::Json as AxumJson;
use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value as Json};

use amis_admin_core::{AdminError, AdminResult};

/// Wraps `data` in a success envelope.
pub fn success_body<T: Serialize>(data: T) -> AdminResult<Json> {
    Ok(json!({"status": 0, "msg": "", "data": serde_json::to_value(data)?}))
}

/// Builds the failure envelope of `err`.
pub fn failure_body(err: &AdminError) -> Json {
    match err {
        AdminError::Validation(errors) => json!({
            "status": err.status(),
            "msg": err.to_string(),
            "errors": errors.field_errors,
        }),
        _ => json!({
            "status": err.status(),
            "msg": err.to_string(),
            "data": {},
        }),
    }
}

/// Converts an operation result into an HTTP response.
///
/// The HTTP status mirrors the envelope status; success is `200 OK`.
pub fn respond<T: Serialize>(result: AdminResult<T>) -> Response {
    match result.and_then(success_body) {
        Ok(body) => (StatusCode::OK, AxumJson(body)).into_response(),
        Err(err) => failure(&err),
    }
}

/// Converts an error into an HTTP response.
pub fn failure(err: &AdminError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, AxumJson(failure_body(err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use amis_admin_core::ValidationError;

    #[test]
    fn test_success_body() {
        let body = success_body(json!({"total": 0})).unwrap();
        assert_eq!(body, json!({"status": 0, "msg": "", "data": {"total": 0}}));
    }

    #[test]
    fn test_failure_body() {
        let body = failure_body(&AdminError::NotFound("article 9".into()));
        assert_eq!(body["status"], 404);
        assert_eq!(body["data"], json!({}));
        assert!(body["msg"].as_str().unwrap().contains("article 9"));
    }

    #[test]
    fn test_validation_body() {
        let mut errors = ValidationError::new();
        errors.insert("title", "This field is required.");
        let body = failure_body(&AdminError::Validation(errors));
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"], json!({"title": "This field is required."}));
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_respond_status_codes() {
        assert_eq!(respond(Ok(1)).status(), StatusCode::OK);
        let denied: AdminResult<()> = Err(AdminError::PermissionDenied("x".into()));
        assert_eq!(respond(denied).status(), StatusCode::FORBIDDEN);
    }
}
