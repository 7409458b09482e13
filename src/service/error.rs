use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Project {0} not found")]
    ProjectNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("{0}")]
    InvalidProjectState(String),

    #[error("Bidding deadline has passed")]
    DeadlinePassed,

    #[error("You have already submitted a bid for this project")]
    DuplicateBid,

    #[error("Another bid has already been accepted for this project")]
    AwardTaken,

    #[error("User {0} is not authorized to perform this action on project {1}")]
    UnauthorizedProjectAccess(Uuid, Uuid),

    #[error("User {0} is not authorized to perform this action on bid {1}")]
    UnauthorizedBidAccess(Uuid, Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::ProjectNotFound(_) | ServiceError::BidNotFound(_) => {
                HttpError::not_found(error.to_string())
            }

            ServiceError::InvalidProjectState(_)
            | ServiceError::DeadlinePassed
            | ServiceError::AwardTaken
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            ServiceError::DuplicateBid => {
                HttpError::unique_constraint_violation(error.to_string())
            }

            ServiceError::UnauthorizedProjectAccess(_, _)
            | ServiceError::UnauthorizedBidAccess(_, _) => {
                HttpError::new("Access denied", StatusCode::FORBIDDEN)
            }

            ServiceError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpError::server_error("Server error")
            }
        }
    }
}
