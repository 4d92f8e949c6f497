use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::Level;
use utoipa::ToSchema;

pub type AppResult<T> = Result<T, AppError>;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Requested id does not exist in the store.
    NotFound(String),
    /// A lookup argument did not resolve, or resolved to another owner.
    InvalidArgument(String),
    /// A uniqueness constraint was violated at persistence time.
    Conflict(String),
    /// Field validation failures, keyed by field name.
    Validation(BTreeMap<String, String>),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Builds a validation failure for a single field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert(field.into(), message.into());
        AppError::Validation(details)
    }

    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the error kind as exposed in the `exception` field.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            AppError::DatabaseError(_) => "DatabaseError",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidArgument(_) => "InvalidArgument",
            AppError::Conflict(_) => "Conflict",
            AppError::Validation(_) => "ValidationFailure",
            AppError::InternalError(_) => "InternalError",
            AppError::WithContext { .. } => unreachable!("root() never returns a context wrapper"),
        }
    }

    /// HTTP status for this error. Missing ids are reported as 400, not 404,
    /// to keep a uniform bad-request envelope.
    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::NotFound(_) | AppError::InvalidArgument(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Level at which this error is logged, chosen by its root kind so that a
    /// client-caused failure stays below error level whatever context wraps it.
    pub fn log_level(&self) -> Level {
        match self.root() {
            AppError::DatabaseError(_) | AppError::InternalError(_) => Level::ERROR,
            AppError::Conflict(_) => Level::WARN,
            _ => Level::DEBUG,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    ///
    /// Domain errors display their message verbatim.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::InvalidArgument(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Validation(details) => {
                let fields: Vec<String> = details
                    .iter()
                    .map(|(field, msg)| format!("{}: {}", field, msg))
                    .collect();
                write!(f, "Validation failed: {}", fields.join(", "))
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub exception: String,
    pub details: BTreeMap<String, String>,
}

impl ErrorEnvelope {
    fn title_for(status: StatusCode) -> &'static str {
        match status {
            StatusCode::CONFLICT => "Conflict! Consult the documentation...",
            StatusCode::BAD_REQUEST => "Bad request! Consult the documentation...",
            _ => "Internal error! Consult the documentation...",
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Context wrappers are peeled off first; the failure is then logged at the
    /// level of its root kind. Server-side details are replaced with a generic
    /// message.
    fn into_response(self) -> Response {
        let mut trail = Vec::new();
        let mut current = self;
        let err = loop {
            match current {
                AppError::WithContext { source, context } => {
                    trail.push(context);
                    current = *source;
                }
                root => break root,
            }
        };
        let trail = trail.join(" -> ");

        let status = err.status_code();
        let exception = err.kind().to_string();
        let message = match &err {
            AppError::DatabaseError(e) => format!("Database error: {:?}", e),
            other => other.to_string(),
        };
        match err.log_level() {
            Level::ERROR => tracing::error!(context = %trail, "{}", message),
            Level::WARN => tracing::warn!(context = %trail, "{}", message),
            _ => tracing::debug!(context = %trail, "{}", message),
        }

        let details = match err {
            AppError::DatabaseError(_) => {
                BTreeMap::from([("cause".to_string(), "Database error".to_string())])
            }
            AppError::InternalError(_) => {
                BTreeMap::from([("cause".to_string(), "Internal server error".to_string())])
            }
            AppError::Validation(details) => details,
            AppError::Conflict(msg) | AppError::NotFound(msg) | AppError::InvalidArgument(msg) => {
                BTreeMap::from([("cause".to_string(), msg)])
            }
            AppError::WithContext { .. } => unreachable!("context wrappers are unwrapped above"),
        };

        let body = ErrorEnvelope {
            title: ErrorEnvelope::title_for(status).to_string(),
            timestamp: Utc::now(),
            status: status.as_u16(),
            exception,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`.
    ///
    /// Unique violations become `Conflict`; everything else stays a database error.
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique key").to_string();
                return AppError::Conflict(format!(
                    "Unique constraint {} violated",
                    constraint
                ));
            }
        }
        AppError::DatabaseError(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation("path", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::from(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_display_their_message_verbatim() {
        assert_eq!(
            AppError::NotFound("Id 7 not found".to_string()).to_string(),
            "Id 7 not found"
        );
        assert_eq!(
            AppError::InvalidArgument("Contact admin".to_string()).to_string(),
            "Contact admin"
        );
    }

    #[test]
    fn context_chain_keeps_root_kind_and_status() {
        let err: Result<(), AppError> = Err(AppError::Conflict("cpf taken".to_string()));
        let wrapped = err.context("saving customer").unwrap_err();

        assert_eq!(wrapped.kind(), "Conflict");
        assert_eq!(wrapped.status_code(), StatusCode::CONFLICT);
        assert_eq!(wrapped.to_string(), "saving customer: cpf taken");
        assert!(matches!(wrapped.root(), AppError::Conflict(_)));
    }

    #[test]
    fn wrapped_client_errors_are_not_logged_as_errors() {
        let conflict: Result<(), AppError> = Err(AppError::Conflict("cpf taken".to_string()));
        let conflict = conflict.context("inserting customer").unwrap_err();
        assert_eq!(conflict.log_level(), Level::WARN);

        let missing: Result<(), AppError> = Err(AppError::NotFound("Id 1 not found".to_string()));
        let missing = missing
            .context("loading customer")
            .context("updating customer")
            .unwrap_err();
        assert_eq!(missing.log_level(), Level::DEBUG);

        let db = Err::<(), sqlx::Error>(sqlx::Error::RowNotFound)
            .context("listing credits")
            .unwrap_err();
        assert_eq!(db.log_level(), Level::ERROR);
    }

    #[test]
    fn wrapped_conflict_renders_root_envelope() {
        let err: Result<(), AppError> = Err(AppError::Conflict("cpf taken".to_string()));
        let response = err.context("inserting customer").unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_bad_request() {
        let err = AppError::NotFound("Id 1 not found".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "DatabaseError");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_helper_builds_single_field_map() {
        let err = AppError::validation("cpf", "CPF invalid");
        match err {
            AppError::Validation(details) => {
                assert_eq!(details.get("cpf").map(String::as_str), Some("CPF invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
