use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::models::projectmodel::Bid;
use crate::models::usermodel::User;
use crate::utils::formdata::{de_f64, de_i32, de_opt_f64, de_opt_i32};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitBidDto {
    pub project_id: Uuid,

    #[serde(deserialize_with = "de_f64")]
    #[validate(range(min = 0.01, message = "Bid amount must be positive"))]
    pub amount: f64,

    #[serde(deserialize_with = "de_i32")]
    #[validate(range(min = 1, message = "Timeline must be at least 1 day"))]
    pub timeline: i32,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBidDto {
    #[serde(default, deserialize_with = "de_opt_f64")]
    #[validate(range(min = 0.01, message = "Bid amount must be positive"))]
    pub amount: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_i32")]
    #[validate(range(min = 1, message = "Timeline must be at least 1 day"))]
    pub timeline: Option<i32>,

    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct BidProviderSummaryDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub hourly_rate: Option<BigDecimal>,
}

impl BidProviderSummaryDto {
    pub fn from_user(user: &User) -> Self {
        BidProviderSummaryDto {
            id: user.id.to_string(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            email: user.email.to_owned(),
            skills: user.skills.clone(),
            experience_years: user.experience_years,
            hourly_rate: user.hourly_rate.clone(),
        }
    }
}

/// A bid joined with its provider's public summary, for the owner's list.
#[derive(Debug, Serialize)]
pub struct BidWithProviderDto {
    #[serde(flatten)]
    pub bid: Bid,
    pub service_provider: Option<BidProviderSummaryDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_dto_decodes_multipart_strings() {
        let dto: SubmitBidDto = serde_json::from_value(json!({
            "project_id": "f2b58d9e-3d1c-4dd4-8f6d-02a2a8a7cf55",
            "amount": "1500.50",
            "timeline": "45",
            "message": "Crew available immediately"
        }))
        .unwrap();

        assert_eq!(dto.amount, 1500.50);
        assert_eq!(dto.timeline, 45);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn zero_amount_fails_validation() {
        let dto: SubmitBidDto = serde_json::from_value(json!({
            "project_id": "f2b58d9e-3d1c-4dd4-8f6d-02a2a8a7cf55",
            "amount": "0",
            "timeline": "45"
        }))
        .unwrap();

        assert!(dto.validate().is_err());
    }

    #[test]
    fn update_dto_accepts_partial_fields() {
        let dto: UpdateBidDto = serde_json::from_value(json!({"amount": "900"})).unwrap();
        assert_eq!(dto.amount, Some(900.0));
        assert_eq!(dto.timeline, None);
        assert!(dto.validate().is_ok());
    }
}
