use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        if e.is_validation() {
            return AppError::BadRequest(message);
        }
        match e {
            DomainError::NotFound(_) => AppError::NotFound(message),
            DomainError::Internal(msg) => AppError::Internal(msg),
            _ => AppError::Conflict(message),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |msg: String| serde_json::json!({ "error": msg });
        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(body(self.to_string())),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(body(self.to_string())),
            AppError::Conflict(_) => HttpResponse::Conflict().json(body(self.to_string())),
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(body(self.to_string())),
            AppError::Internal(detail) => {
                log::error!("request failed: {}", detail);
                HttpResponse::InternalServerError().json(body("Internal server error".to_string()))
            }
        }
    }
}
