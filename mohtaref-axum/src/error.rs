use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mohtaref_core::errors::SiteError;

/// Handler error: any `anyhow::Error`, rendered as the JSON error shape.
#[derive(Debug)]
pub struct SiteAxumError(pub anyhow::Error);

impl From<anyhow::Error> for SiteAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<SiteError> for SiteAxumError {
    fn from(e: SiteError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for SiteAxumError {
    fn into_response(self) -> Response {
        // Preserve structured fields even when wrapped by anyhow contexts
        let safe = match SiteError::from_anyhow(&self.0) {
            Some(site) => site.sanitize_for_client(),
            None => SiteError::general_error(self.0.to_string()),
        };

        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = ?self.0, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }

        (status, Json(safe.to_json())).into_response()
    }
}
