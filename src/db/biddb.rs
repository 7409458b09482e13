// db/biddb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::{BigDecimal, Json};
use sqlx::Error as SqlxError;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::projectmodel::{
    decide_award, AwardDecision, AwardError, Bid, BidStatus, FileRef, Project, ProjectCategory,
    ProjectStatus,
};

/// Marker carried through `sqlx::Error::Protocol` when an award is refused
/// because a sibling bid already holds it.
pub const AWARD_TAKEN: &str = "award_taken";

/// A provider's bid joined with a summary of the project it was placed on.
#[derive(Debug, serde::Serialize, sqlx::FromRow, Clone)]
pub struct ProviderBidRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub service_provider_id: Uuid,
    pub amount: BigDecimal,
    pub timeline_days: i32,
    pub message: Option<String>,
    pub documents: Json<Vec<FileRef>>,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
    pub project_title: String,
    pub project_category: ProjectCategory,
    pub project_status: ProjectStatus,
    pub project_city: String,
    pub project_state: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
    pub owner_email: String,
}

#[derive(Debug)]
pub struct AwardOutcome {
    pub project: Project,
    pub bid: Bid,
    /// True when the target bid already held the award and nothing changed.
    pub already_awarded: bool,
}

#[async_trait]
pub trait BidExt {
    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, SqlxError>;

    async fn get_project_bids(&self, project_id: Uuid) -> Result<Vec<Bid>, SqlxError>;

    async fn get_provider_bid(
        &self,
        project_id: Uuid,
        service_provider_id: Uuid,
    ) -> Result<Option<Bid>, SqlxError>;

    async fn insert_bid(
        &self,
        project_id: Uuid,
        service_provider_id: Uuid,
        amount: BigDecimal,
        timeline_days: i32,
        message: Option<String>,
        documents: Vec<FileRef>,
    ) -> Result<Bid, SqlxError>;

    async fn update_bid(
        &self,
        bid_id: Uuid,
        amount: Option<BigDecimal>,
        timeline_days: Option<i32>,
        message: Option<String>,
        new_documents: Vec<FileRef>,
    ) -> Result<Bid, SqlxError>;

    async fn delete_bid(&self, bid_id: Uuid) -> Result<(), SqlxError>;

    async fn award_bid(&self, project_id: Uuid, bid_id: Uuid) -> Result<AwardOutcome, SqlxError>;

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, SqlxError>;

    async fn get_provider_bids(
        &self,
        service_provider_id: Uuid,
    ) -> Result<Vec<ProviderBidRow>, SqlxError>;
}

#[async_trait]
impl BidExt for DBClient {
    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, SqlxError> {
        sqlx::query_as::<_, Bid>(
            r#"
            SELECT id, project_id, service_provider_id, amount, timeline_days,
                   message, documents, status, submitted_at
            FROM bids
            WHERE id = $1
            "#,
        )
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_project_bids(&self, project_id: Uuid) -> Result<Vec<Bid>, SqlxError> {
        sqlx::query_as::<_, Bid>(
            r#"
            SELECT id, project_id, service_provider_id, amount, timeline_days,
                   message, documents, status, submitted_at
            FROM bids
            WHERE project_id = $1
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_provider_bid(
        &self,
        project_id: Uuid,
        service_provider_id: Uuid,
    ) -> Result<Option<Bid>, SqlxError> {
        sqlx::query_as::<_, Bid>(
            r#"
            SELECT id, project_id, service_provider_id, amount, timeline_days,
                   message, documents, status, submitted_at
            FROM bids
            WHERE project_id = $1 AND service_provider_id = $2
            "#,
        )
        .bind(project_id)
        .bind(service_provider_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_bid(
        &self,
        project_id: Uuid,
        service_provider_id: Uuid,
        amount: BigDecimal,
        timeline_days: i32,
        message: Option<String>,
        documents: Vec<FileRef>,
    ) -> Result<Bid, SqlxError> {
        // The (project_id, service_provider_id) unique constraint is the
        // real duplicate-bid gate; callers translate the violation.
        sqlx::query_as::<_, Bid>(
            r#"
            INSERT INTO bids
            (project_id, service_provider_id, amount, timeline_days, message, documents)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, project_id, service_provider_id, amount, timeline_days,
                      message, documents, status, submitted_at
            "#,
        )
        .bind(project_id)
        .bind(service_provider_id)
        .bind(amount)
        .bind(timeline_days)
        .bind(message)
        .bind(Json(documents))
        .fetch_one(&self.pool)
        .await
    }

    async fn update_bid(
        &self,
        bid_id: Uuid,
        amount: Option<BigDecimal>,
        timeline_days: Option<i32>,
        message: Option<String>,
        new_documents: Vec<FileRef>,
    ) -> Result<Bid, SqlxError> {
        sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET amount = COALESCE($2, amount),
                timeline_days = COALESCE($3, timeline_days),
                message = COALESCE($4, message),
                documents = documents || $5::jsonb
            WHERE id = $1
            RETURNING id, project_id, service_provider_id, amount, timeline_days,
                      message, documents, status, submitted_at
            "#,
        )
        .bind(bid_id)
        .bind(amount)
        .bind(timeline_days)
        .bind(message)
        .bind(Json(new_documents))
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_bid(&self, bid_id: Uuid) -> Result<(), SqlxError> {
        sqlx::query("DELETE FROM bids WHERE id = $1")
            .bind(bid_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn award_bid(&self, project_id: Uuid, bid_id: Uuid) -> Result<AwardOutcome, SqlxError> {
        let mut tx = self.pool.begin().await?;

        // Lock the project row so concurrent accepts serialize here; the
        // decision below is only sound while this lock is held.
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, title, description, category,
                   location_address, location_city, location_state, location_zip,
                   location_lat, location_lng,
                   budget_min, budget_max, currency,
                   start_date, end_date, estimated_duration_days,
                   area, floors, requirements, special_requirements,
                   status, is_public, bidding_deadline, awarded_bid_id,
                   property_images, boq_documents, drawings, other_documents,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(SqlxError::RowNotFound)?;

        let bids = sqlx::query_as::<_, Bid>(
            r#"
            SELECT id, project_id, service_provider_id, amount, timeline_days,
                   message, documents, status, submitted_at
            FROM bids
            WHERE project_id = $1
            ORDER BY submitted_at
            FOR UPDATE
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await?;

        match decide_award(project.awarded_bid_id, &bids, bid_id) {
            Ok(AwardDecision::AlreadyAwarded) => {
                let bid = bids
                    .into_iter()
                    .find(|b| b.id == bid_id)
                    .ok_or(SqlxError::RowNotFound)?;
                tx.commit().await?;

                Ok(AwardOutcome {
                    project,
                    bid,
                    already_awarded: true,
                })
            }
            Ok(AwardDecision::Award) => {
                let bid = sqlx::query_as::<_, Bid>(
                    r#"
                    UPDATE bids
                    SET status = 'accepted'::bid_status
                    WHERE id = $1
                    RETURNING id, project_id, service_provider_id, amount, timeline_days,
                              message, documents, status, submitted_at
                    "#,
                )
                .bind(bid_id)
                .fetch_one(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE bids
                    SET status = 'rejected'::bid_status
                    WHERE project_id = $1 AND id != $2
                    "#,
                )
                .bind(project_id)
                .bind(bid_id)
                .execute(&mut *tx)
                .await?;

                let project = sqlx::query_as::<_, Project>(
                    r#"
                    UPDATE projects
                    SET status = 'in_progress'::project_status,
                        awarded_bid_id = $2,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING id, owner_id, title, description, category,
                              location_address, location_city, location_state, location_zip,
                              location_lat, location_lng,
                              budget_min, budget_max, currency,
                              start_date, end_date, estimated_duration_days,
                              area, floors, requirements, special_requirements,
                              status, is_public, bidding_deadline, awarded_bid_id,
                              property_images, boq_documents, drawings, other_documents,
                              created_at, updated_at
                    "#,
                )
                .bind(project_id)
                .bind(bid_id)
                .fetch_one(&mut *tx)
                .await?;

                tx.commit().await?;

                Ok(AwardOutcome {
                    project,
                    bid,
                    already_awarded: false,
                })
            }
            Err(AwardError::BidNotFound) => Err(SqlxError::RowNotFound),
            Err(AwardError::AwardTaken) => Err(SqlxError::Protocol(AWARD_TAKEN.into())),
        }
    }

    async fn reject_bid(&self, bid_id: Uuid) -> Result<Bid, SqlxError> {
        sqlx::query_as::<_, Bid>(
            r#"
            UPDATE bids
            SET status = 'rejected'::bid_status
            WHERE id = $1
            RETURNING id, project_id, service_provider_id, amount, timeline_days,
                      message, documents, status, submitted_at
            "#,
        )
        .bind(bid_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_provider_bids(
        &self,
        service_provider_id: Uuid,
    ) -> Result<Vec<ProviderBidRow>, SqlxError> {
        sqlx::query_as::<_, ProviderBidRow>(
            r#"
            SELECT b.id, b.project_id, b.service_provider_id, b.amount, b.timeline_days,
                   b.message, b.documents, b.status, b.submitted_at,
                   p.title AS project_title,
                   p.category AS project_category,
                   p.status AS project_status,
                   p.location_city AS project_city,
                   p.location_state AS project_state,
                   u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name,
                   u.email AS owner_email
            FROM bids b
            INNER JOIN projects p ON b.project_id = p.id
            INNER JOIN users u ON p.owner_id = u.id
            WHERE b.service_provider_id = $1
            ORDER BY b.submitted_at DESC
            "#,
        )
        .bind(service_provider_id)
        .fetch_all(&self.pool)
        .await
    }
}
