use std::fmt::{Display, Formatter};

use precios_to_csv::ConvertError;
use worker::{Response, Result};

use crate::models::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conversion(String),
    Validation(String),
    Storage(String),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conversion(_) => "conversion_error",
            Self::Validation(_) => "validation_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::NotFound(message)
            | Self::Conversion(message)
            | Self::Validation(message)
            | Self::Storage(message)
            | Self::Internal(message) => message,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conversion(_) | Self::Validation(_) => 422,
            Self::Storage(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Whether redelivering the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Internal(_))
    }

    pub fn into_response(self) -> Result<Response> {
        let mut response = Response::from_json(&ErrorResponse {
            code: self.code().to_string(),
            message: self.message().to_string(),
        })?;
        response.headers_mut().set("Cache-Control", "no-store")?;
        Ok(response.with_status(self.status_code()))
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<worker::Error> for ApiError {
    fn from(error: worker::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<ConvertError> for ApiError {
    fn from(error: ConvertError) -> Self {
        match error {
            ConvertError::PdfLoad(_)
            | ConvertError::MalformedDate { .. }
            | ConvertError::NoPagesSelected => Self::Conversion(error.to_string()),
            ConvertError::InvalidOption(_) => Self::Validation(error.to_string()),
            ConvertError::Io(_) | ConvertError::Csv(_) | ConvertError::Persist(_) => {
                Self::Internal(error.to_string())
            }
        }
    }
}
