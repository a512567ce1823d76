use std::fmt;
use actix_web::{HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use serde::Serialize;

/// Errors a handler can return, rendered as `{ "error": ... }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Engine(assoc::Error),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(message) | ApiError::NotFound(message) => f.write_str(message),
            ApiError::Engine(assoc::Error::AmbiguousGeneQuery { .. }) => {
                f.write_str("Gene symbol matches multiple genes")
            }
            ApiError::Engine(assoc::Error::NotFound { .. }) => f.write_str("Gene not found"),
            ApiError::Engine(e) => write!(f, "{}", e),
            ApiError::Internal(message) => f.write_str(message),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        use assoc::Error;

        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(e) => match e {
                Error::AmbiguousGeneQuery { .. }
                | Error::UnknownGroup(_)
                | Error::UnknownColumn(_)
                | Error::MalformedFilter(_) => StatusCode::BAD_REQUEST,
                Error::NotFound { .. } => StatusCode::NOT_FOUND,
                Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{:?}", self);
        }
        let message = self.to_string();
        HttpResponse::build(status).json(ErrorBody { error: &message })
    }
}

impl From<assoc::Error> for ApiError {
    fn from(e: assoc::Error) -> Self {
        ApiError::Engine(e)
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let ambiguous = ApiError::from(assoc::Error::AmbiguousGeneQuery {
            query: "BRCA1".to_string(),
            gene_ids: vec!["ENSG1".to_string(), "ENSG2".to_string()],
        });
        assert_eq!(ambiguous.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ambiguous.to_string(), "Gene symbol matches multiple genes");

        let missing_file = ApiError::from(assoc::Error::Io(std::io::ErrorKind::NotFound.into()));
        assert_eq!(missing_file.status_code(), StatusCode::NOT_FOUND);

        let outside_root = assoc::DataLayout::new("/data")
            .gene_variants("ENSG1/../../tmp/secret", "asc")
            .unwrap_err();
        let outside_root = ApiError::from(outside_root);
        assert_eq!(outside_root.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(outside_root.to_string(), "Gene not found");

        let mismatch = ApiError::from(assoc::Error::SchemaMismatch {
            context: "variant".to_string(),
            expected: 7,
            actual: 6,
        });
        assert_eq!(mismatch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
