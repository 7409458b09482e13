use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::{BigDecimal, Json};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "project_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Residential,
    Commercial,
    Industrial,
    Infrastructure,
    Renovation,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Live,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "bid_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Reference to a stored upload, kept as JSONB on the owning row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FileRef {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,

    pub location_address: String,
    pub location_city: String,
    pub location_state: String,
    pub location_zip: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,

    pub budget_min: BigDecimal,
    pub budget_max: BigDecimal,
    pub currency: String,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub estimated_duration_days: i32,

    pub area: f64,
    pub floors: i32,
    pub requirements: Vec<String>,
    pub special_requirements: Option<String>,

    pub status: ProjectStatus,
    pub is_public: bool,
    pub bidding_deadline: DateTime<Utc>,
    pub awarded_bid_id: Option<Uuid>,

    pub property_images: Json<Vec<FileRef>>,
    pub boq_documents: Json<Vec<FileRef>>,
    pub drawings: Json<Vec<FileRef>>,
    pub other_documents: Json<Vec<FileRef>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_bidding_open(&self, now: DateTime<Utc>) -> bool {
        self.status == ProjectStatus::Live && now < self.bidding_deadline
    }

    /// Days until the bidding deadline, rounded up. Negative once the
    /// deadline has passed. Computed at read time, never persisted.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> i64 {
        let diff_ms = self
            .bidding_deadline
            .signed_duration_since(now)
            .num_milliseconds();
        (diff_ms as f64 / 86_400_000f64).ceil() as i64
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: Uuid,
    pub project_id: Uuid,
    pub service_provider_id: Uuid,
    pub amount: BigDecimal,
    pub timeline_days: i32,
    pub message: Option<String>,
    pub documents: Json<Vec<FileRef>>,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq)]
pub enum AwardDecision {
    /// The target bid already holds the award; nothing to change.
    AlreadyAwarded,
    /// Proceed: accept the target, reject every sibling, move the
    /// project to in_progress.
    Award,
}

#[derive(Debug, PartialEq)]
pub enum AwardError {
    BidNotFound,
    /// A different bid on this project has already been accepted.
    AwardTaken,
}

/// Decides what accepting `target_bid_id` on a project should do, given the
/// full set of its bids. Must be evaluated with the project row locked so
/// two concurrent accepts cannot both see a clean slate.
pub fn decide_award(
    awarded_bid_id: Option<Uuid>,
    bids: &[Bid],
    target_bid_id: Uuid,
) -> Result<AwardDecision, AwardError> {
    let target = bids
        .iter()
        .find(|bid| bid.id == target_bid_id)
        .ok_or(AwardError::BidNotFound)?;

    if target.status == BidStatus::Accepted {
        return Ok(AwardDecision::AlreadyAwarded);
    }

    let sibling_accepted = bids
        .iter()
        .any(|bid| bid.id != target_bid_id && bid.status == BidStatus::Accepted);

    if sibling_accepted || awarded_bid_id.is_some() {
        return Err(AwardError::AwardTaken);
    }

    Ok(AwardDecision::Award)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bid(id: Uuid, status: BidStatus) -> Bid {
        Bid {
            id,
            project_id: Uuid::new_v4(),
            service_provider_id: Uuid::new_v4(),
            amount: BigDecimal::from(1000),
            timeline_days: 30,
            message: None,
            documents: Json(vec![]),
            status,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn award_accepts_first_pending_bid() {
        let target = Uuid::new_v4();
        let bids = vec![bid(target, BidStatus::Pending), bid(Uuid::new_v4(), BidStatus::Pending)];

        assert_eq!(decide_award(None, &bids, target), Ok(AwardDecision::Award));
    }

    #[test]
    fn reaccepting_awarded_bid_is_a_noop() {
        let target = Uuid::new_v4();
        let bids = vec![bid(target, BidStatus::Accepted), bid(Uuid::new_v4(), BidStatus::Rejected)];

        assert_eq!(
            decide_award(Some(target), &bids, target),
            Ok(AwardDecision::AlreadyAwarded)
        );
    }

    #[test]
    fn accepting_second_bid_after_award_fails() {
        let winner = Uuid::new_v4();
        let loser = Uuid::new_v4();
        let bids = vec![bid(winner, BidStatus::Accepted), bid(loser, BidStatus::Rejected)];

        assert_eq!(
            decide_award(Some(winner), &bids, loser),
            Err(AwardError::AwardTaken)
        );
    }

    #[test]
    fn awarded_marker_alone_blocks_a_new_award() {
        // awarded_bid_id set but the winning bid row not in the slice:
        // still refuse rather than double-award.
        let target = Uuid::new_v4();
        let bids = vec![bid(target, BidStatus::Pending)];

        assert_eq!(
            decide_award(Some(Uuid::new_v4()), &bids, target),
            Err(AwardError::AwardTaken)
        );
    }

    #[test]
    fn unknown_bid_is_not_found() {
        let bids = vec![bid(Uuid::new_v4(), BidStatus::Pending)];

        assert_eq!(
            decide_award(None, &bids, Uuid::new_v4()),
            Err(AwardError::BidNotFound)
        );
    }

    fn project_with_deadline(deadline: DateTime<Utc>, status: ProjectStatus) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Two storey duplex".to_string(),
            description: "Full build".to_string(),
            category: ProjectCategory::Residential,
            location_address: "12 Harbor Rd".to_string(),
            location_city: "Austin".to_string(),
            location_state: "TX".to_string(),
            location_zip: None,
            location_lat: None,
            location_lng: None,
            budget_min: BigDecimal::from(50_000),
            budget_max: BigDecimal::from(120_000),
            currency: "USD".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now() + Duration::days(180),
            estimated_duration_days: 180,
            area: 2400.0,
            floors: 2,
            requirements: vec![],
            special_requirements: None,
            status,
            is_public: true,
            bidding_deadline: deadline,
            awarded_bid_id: None,
            property_images: Json(vec![]),
            boq_documents: Json(vec![]),
            drawings: Json(vec![]),
            other_documents: Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bidding_open_only_while_live_and_before_deadline() {
        let now = Utc::now();
        let open = project_with_deadline(now + Duration::days(5), ProjectStatus::Live);
        let expired = project_with_deadline(now - Duration::hours(1), ProjectStatus::Live);
        let draft = project_with_deadline(now + Duration::days(5), ProjectStatus::Draft);

        assert!(open.is_bidding_open(now));
        assert!(!expired.is_bidding_open(now));
        assert!(!draft.is_bidding_open(now));
    }

    #[test]
    fn days_until_deadline_rounds_up_and_goes_negative() {
        let now = Utc::now();

        let in_36_hours = project_with_deadline(now + Duration::hours(36), ProjectStatus::Live);
        assert_eq!(in_36_hours.days_until_deadline(now), 2);

        let exactly_3_days = project_with_deadline(now + Duration::days(3), ProjectStatus::Live);
        assert_eq!(exactly_3_days.days_until_deadline(now), 3);

        let passed = project_with_deadline(now - Duration::hours(30), ProjectStatus::Live);
        assert_eq!(passed.days_until_deadline(now), -1);
    }
}
