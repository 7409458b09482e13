use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::ratingmodel::{RatingCategories, RatingType};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingDto {
    #[serde(default)]
    pub project_id: Option<Uuid>,

    pub rated_user_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(min = 10, max = 1000, message = "Review must be between 10 and 1000 characters"))]
    pub review: String,

    pub rating_type: RatingType,

    #[serde(default)]
    pub categories: Option<RatingCategories>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRatingDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,

    #[validate(length(min = 10, max = 1000, message = "Review must be between 10 and 1000 characters"))]
    pub review: Option<String>,

    #[serde(default)]
    pub categories: Option<RatingCategories>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReportRatingDto {
    #[validate(length(min = 1, message = "Report reason is required"))]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_length_bounds_are_enforced() {
        let short: SubmitRatingDto = serde_json::from_value(json!({
            "rated_user_id": "f2b58d9e-3d1c-4dd4-8f6d-02a2a8a7cf55",
            "rating": 4,
            "review": "too short",
            "rating_type": "general"
        }))
        .unwrap();
        assert!(short.validate().is_err());

        let ok: SubmitRatingDto = serde_json::from_value(json!({
            "rated_user_id": "f2b58d9e-3d1c-4dd4-8f6d-02a2a8a7cf55",
            "rating": 4,
            "review": "Delivered on time and kept the site clean.",
            "rating_type": "owner_to_contractor"
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let dto: SubmitRatingDto = serde_json::from_value(json!({
            "rated_user_id": "f2b58d9e-3d1c-4dd4-8f6d-02a2a8a7cf55",
            "rating": 6,
            "review": "Great crew, would absolutely hire again.",
            "rating_type": "general"
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
