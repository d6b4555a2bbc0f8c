use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::{DomainError, OrderError};
use crate::store::StoreError;

// ============================================================================
// Service Error Taxonomy
// ============================================================================
//
// Every failure a request can end in maps onto exactly one of these kinds.
// Messages are safe to show to the caller; internal detail only reaches the
// logs.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn order_not_found() -> Self {
        AppError::NotFound("Order not found".to_string())
    }
}

impl From<OrderError> for AppError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::ItemNotFound(_) | OrderError::CatererNotFound => {
                AppError::NotFound(error.to_string())
            }
            OrderError::FieldNotWritable(_) => AppError::Forbidden(error.to_string()),
            OrderError::MissingCartFields
            | OrderError::EmptyItems
            | OrderError::IncompleteLine
            | OrderError::InvalidQuantity(_)
            | OrderError::InvalidServings(_)
            | OrderError::ItemUnavailable(_)
            | OrderError::InvalidStatus(_)
            | OrderError::InvalidOrderType(_)
            | OrderError::InvalidDateFormat
            | OrderError::MissingEventField(_)
            | OrderError::InvalidGuestCount
            | OrderError::NegativeAmount(_)
            | OrderError::AmountOutOfRange(_)
            | OrderError::AmountTooPrecise(_)
            | OrderError::NoChanges
            | OrderError::IllegalTransition { .. } => AppError::Validation(error.to_string()),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Rule(error) => error.into(),
            DomainError::Store(error) => error.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(_) => {
                AppError::Conflict("Could not allocate a unique order number".to_string())
            }
            StoreError::VersionConflict { .. } => {
                AppError::Conflict("Order was modified concurrently, please retry".to_string())
            }
            other => AppError::Internal(other.into()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(source) = self {
            tracing::error!(error = ?source, "Request failed with internal error");
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::access::OrderField;

    #[test]
    fn test_domain_errors_map_to_taxonomy() {
        assert_eq!(
            AppError::from(OrderError::CatererNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(OrderError::ItemUnavailable("Tacos".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(OrderError::FieldNotWritable(OrderField::Status)).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(OrderError::InvalidStatus("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_out_of_range_amounts_are_validation_errors() {
        let error = AppError::from(DomainError::from(OrderError::AmountOutOfRange("total_amount")));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let error = AppError::from(OrderError::AmountTooPrecise("deposit_paid"));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_store_failures_keep_their_kind() {
        let error = AppError::from(DomainError::from(StoreError::Corrupt("bad".into())));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let error = AppError::from(StoreError::Corrupt("status column holds 'zzz'".into()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Internal server error");
    }

    #[test]
    fn test_conflicts_surface_as_conflict() {
        let error = AppError::from(StoreError::Duplicate("order_number".into()));
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert!(!error.to_string().contains("order_number"));
    }
}
