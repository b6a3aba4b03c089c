use actix_web::{http::StatusCode, HttpResponse};
use barbershop_booking_api_structs::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarberError {
    #[error("Internal server error")]
    InternalError,
    #[error("Invalid data provided: {0}")]
    BadClientData(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("{0}")]
    Expired(String),
    #[error("{0}")]
    AlreadyUsed(String),
    #[error("{0}")]
    InvalidAction(String),
    #[error("{0}")]
    AlreadyProcessed(String),
    #[error("{0}")]
    NotFound(String),
}

impl BarberError {
    /// Machine readable code put in the `error` field of the response body
    pub fn code(&self) -> &'static str {
        match self {
            Self::InternalError => "server_error",
            Self::BadClientData(_) => "bad_request",
            Self::InvalidToken(_) => "invalid",
            Self::Expired(_) => "expired",
            Self::AlreadyUsed(_) => "used",
            Self::InvalidAction(_) => "invalid_action",
            Self::AlreadyProcessed(_) => "already_processed",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl actix_web::error::ResponseError for BarberError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadClientData(_)
            | Self::Expired(_)
            | Self::AlreadyUsed(_)
            | Self::InvalidAction(_)
            | Self::AlreadyProcessed(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().into(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn token_errors_map_to_client_statuses() {
        assert_eq!(
            BarberError::InvalidToken("".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BarberError::Expired("".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BarberError::AlreadyProcessed("".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BarberError::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(BarberError::AlreadyUsed("".into()).code(), "used");
    }
}
