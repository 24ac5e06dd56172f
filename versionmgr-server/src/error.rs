use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
use versionmgr_compat::{CompatError, ErrorKind};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn with_status<M: Into<String>>(status: StatusCode, message: M) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized<M: Into<String>>(message: M) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        CompatError::MissingField(field).into()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<CompatError> for ApiError {
    fn from(err: CompatError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidInput => ApiError::bad_request(message),
            ErrorKind::NotFound => ApiError::not_found(message),
            ErrorKind::ConfigurationUnavailable | ErrorKind::Internal => {
                ApiError::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_status() {
        let cases = [
            (CompatError::CatalogUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
            (CompatError::CompatibilityUnavailable, StatusCode::INTERNAL_SERVER_ERROR),
            (CompatError::invalid_version("version", "x"), StatusCode::BAD_REQUEST),
            (CompatError::MissingField("name"), StatusCode::BAD_REQUEST),
            (CompatError::ServiceNotFound("a".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
