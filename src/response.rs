//! The JSON envelope wrapped around every successful API response.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A successful response: `{"status": 200, "message": ..., "results": ...}`.
///
/// Summary endpoints also report a `total`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    status: u16,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<f64>,
    results: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 OK response carrying `results`.
    pub fn ok(message: &'static str, results: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message,
            total: None,
            results,
        }
    }

    /// Attach an aggregate total to the response.
    pub fn with_total(mut self, total: f64) -> Self {
        self.total = Some(total);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ApiResponse;

    #[test]
    fn serializes_envelope() {
        let response = ApiResponse::ok("Income summary", vec![1, 2]).with_total(3.0);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": 200,
                "message": "Income summary",
                "total": 3.0,
                "results": [1, 2],
            })
        );
    }

    #[test]
    fn omits_missing_total() {
        let response = ApiResponse::ok("Highest income", Option::<f64>::None);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": 200,
                "message": "Highest income",
                "results": null,
            })
        );
    }
}
