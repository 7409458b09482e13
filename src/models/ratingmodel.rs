use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "rating_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RatingType {
    OwnerToContractor,
    ContractorToOwner,
    General,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "rating_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RatingStatus {
    Pending,
    Approved,
    Rejected,
}

/// Optional per-category scores. Out-of-range entries are dropped at
/// submission time rather than rejected.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RatingCategories {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeliness: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professionalism: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
}

impl RatingCategories {
    /// Keeps only scores within [1, 5].
    pub fn retain_valid(self) -> Self {
        fn keep(score: Option<i32>) -> Option<i32> {
            score.filter(|s| (1..=5).contains(s))
        }

        RatingCategories {
            communication: keep(self.communication),
            quality: keep(self.quality),
            timeliness: keep(self.timeliness),
            professionalism: keep(self.professionalism),
            value: keep(self.value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.communication.is_none()
            && self.quality.is_none()
            && self.timeliness.is_none()
            && self.professionalism.is_none()
            && self.value.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Rating {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub rated_user_id: Uuid,
    pub rater_id: Uuid,
    pub rating: i32,
    pub review: String,
    pub categories: Option<Json<RatingCategories>>,
    pub rating_type: RatingType,
    pub status: RatingStatus,

    pub moderated_by: Option<Uuid>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderation_notes: Option<String>,

    pub helpful_votes: i32,

    pub reported: bool,
    pub report_reason: Option<String>,
    pub reported_by: Option<Uuid>,
    pub reported_at: Option<DateTime<Utc>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_valid_drops_out_of_range_scores() {
        let categories = RatingCategories {
            communication: Some(5),
            quality: Some(0),
            timeliness: Some(6),
            professionalism: Some(1),
            value: None,
        };

        let kept = categories.retain_valid();
        assert_eq!(kept.communication, Some(5));
        assert_eq!(kept.quality, None);
        assert_eq!(kept.timeliness, None);
        assert_eq!(kept.professionalism, Some(1));
        assert_eq!(kept.value, None);
    }

    #[test]
    fn all_invalid_scores_leave_an_empty_set() {
        let categories = RatingCategories {
            communication: Some(9),
            quality: Some(-2),
            ..Default::default()
        };

        assert!(categories.retain_valid().is_empty());
    }
}
