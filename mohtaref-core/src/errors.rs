//! # Errors
//!
//! Structured errors shared by every crate of the backend.
//!
//! - each kind has a stable status code and class name
//! - a `SiteError` travels inside `anyhow::Error` through the hook pipeline
//! - transports decide how to serialize it (`to_json` gives the HTTP shape)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// A convenience result type for core APIs.
pub type SiteResult<T> = std::result::Result<T, AnyError>;

/// Error classes with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotFound,         // 404
    MethodNotAllowed, // 405
    Timeout,          // 408
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    NotImplemented,   // 501
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Timeout => 408,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// Kebab-cased class name
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
///
/// - `data` carries machine-readable hints (e.g. `requiresFFmpeg`)
/// - `errors` carries per-field validation messages
#[derive(Debug)]
pub struct SiteError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl SiteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `SiteError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&SiteError> {
        err.chain().find_map(|e| e.downcast_ref::<SiteError>())
    }

    /// Kind of an arbitrary error; anything unstructured is a `GeneralError`.
    pub fn kind_of(err: &AnyError) -> ErrorKind {
        Self::from_anyhow(err)
            .map(|e| e.kind)
            .unwrap_or(ErrorKind::GeneralError)
    }

    /// Turn any error into a SiteError:
    /// - if it's already a SiteError, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> SiteError {
        match err.downcast::<SiteError>() {
            Ok(site) => site,
            Err(other) => {
                SiteError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Copy suitable for clients: drops the inner `source`.
    pub fn sanitize_for_client(&self) -> SiteError {
        SiteError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// JSON payload returned to HTTP callers.
    pub fn to_json(&self) -> Value {
        use serde_json::json;

        let mut base = json!({
            "success": false,
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for SiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Bail out of a function returning `anyhow::Result` with a `SiteError`.
#[macro_export]
macro_rules! bail_site {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::SiteError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::SiteError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use serde_json::json;

    #[test]
    fn json_shape_carries_failure_indicator_and_fields() {
        let err = SiteError::unprocessable("Project validation failed")
            .with_errors(json!({"galleryImages": ["at most 4 gallery images"]}));
        let body = err.to_json();

        assert_eq!(body["success"], json!(false));
        assert_eq!(body["name"], "Unprocessable");
        assert_eq!(body["code"], 422);
        assert_eq!(body["className"], "unprocessable");
        assert_eq!(body["errors"]["galleryImages"][0], "at most 4 gallery images");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn site_error_survives_anyhow_context() {
        let err: AnyError = SiteError::not_found("Project not found").into_anyhow();
        let err = Err::<(), _>(err).context("loading project").unwrap_err();

        assert_eq!(SiteError::kind_of(&err), ErrorKind::NotFound);
    }

    #[test]
    fn normalize_wraps_foreign_errors_as_general() {
        let site = SiteError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(site.kind, ErrorKind::GeneralError);
        assert!(site.message.contains("boom"));
        assert!(site.sanitize_for_client().source.is_none());
    }

    fn bails() -> SiteResult<()> {
        bail_site!(conflict, "banner for page {} exists", "home");
    }

    #[test]
    fn bail_macro_builds_formatted_error() {
        let err = bails().unwrap_err();
        let site = SiteError::from_anyhow(&err).unwrap();
        assert_eq!(site.kind, ErrorKind::Conflict);
        assert_eq!(site.message, "banner for page home exists");
    }
}
