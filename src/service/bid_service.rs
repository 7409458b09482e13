//! The bid lifecycle engine: submission, updates, withdrawal, award with
//! cascading rejection, and plain rejection. State checks run here; the
//! award itself re-validates inside a locked transaction in the db layer.

use std::sync::Arc;

use chrono::Utc;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::db::biddb::{AwardOutcome, BidExt, AWARD_TAKEN};
use crate::db::db::DBClient;
use crate::db::projectdb::ProjectExt;
use crate::models::projectmodel::{Bid, FileRef, Project, ProjectStatus};
use crate::models::usermodel::User;
use crate::service::access;
use crate::service::error::ServiceError;

#[derive(Debug, Clone)]
pub struct BidService {
    db_client: Arc<DBClient>,
}

impl BidService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        BidService { db_client }
    }

    pub async fn submit_bid(
        &self,
        project_id: Uuid,
        provider: &User,
        amount: f64,
        timeline_days: i32,
        message: Option<String>,
        documents: Vec<FileRef>,
    ) -> Result<Bid, ServiceError> {
        let project = self
            .db_client
            .get_project(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if project.status != ProjectStatus::Live {
            return Err(ServiceError::InvalidProjectState(
                "Project is not accepting bids".to_string(),
            ));
        }

        if Utc::now() > project.bidding_deadline {
            return Err(ServiceError::DeadlinePassed);
        }

        if self
            .db_client
            .get_provider_bid(project_id, provider.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateBid);
        }

        let amount = BigDecimal::try_from(amount)
            .map_err(|_| ServiceError::Validation("Invalid bid amount".to_string()))?;

        // The unique constraint still backstops a racing duplicate that
        // slipped past the pre-check.
        match self
            .db_client
            .insert_bid(
                project_id,
                provider.id,
                amount,
                timeline_days,
                message,
                documents,
            )
            .await
        {
            Ok(bid) => {
                tracing::info!(
                    "Bid {} submitted on project {} by {}",
                    bid.id,
                    project_id,
                    provider.id
                );
                Ok(bid)
            }
            Err(e) if is_unique_violation(&e) => Err(ServiceError::DuplicateBid),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_bid(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        actor: &User,
        amount: Option<f64>,
        timeline_days: Option<i32>,
        message: Option<String>,
        new_documents: Vec<FileRef>,
    ) -> Result<Bid, ServiceError> {
        let (project, bid) = self.load_project_bid(project_id, bid_id).await?;

        if !access::can_manage_bid(actor, &bid) {
            return Err(ServiceError::UnauthorizedBidAccess(actor.id, bid_id));
        }

        if project.status != ProjectStatus::Live {
            return Err(ServiceError::InvalidProjectState(
                "Project is not accepting bid updates".to_string(),
            ));
        }

        let amount = match amount {
            Some(a) => Some(
                BigDecimal::try_from(a)
                    .map_err(|_| ServiceError::Validation("Invalid bid amount".to_string()))?,
            ),
            None => None,
        };

        let updated = self
            .db_client
            .update_bid(bid_id, amount, timeline_days, message, new_documents)
            .await?;

        Ok(updated)
    }

    pub async fn withdraw_bid(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        actor: &User,
    ) -> Result<(), ServiceError> {
        let (project, bid) = self.load_project_bid(project_id, bid_id).await?;

        if !access::can_manage_bid(actor, &bid) {
            return Err(ServiceError::UnauthorizedBidAccess(actor.id, bid_id));
        }

        if project.status != ProjectStatus::Live {
            return Err(ServiceError::InvalidProjectState(
                "Cannot delete bid on closed project".to_string(),
            ));
        }

        self.db_client.delete_bid(bid_id).await?;
        tracing::info!("Bid {} withdrawn from project {}", bid_id, project_id);

        Ok(())
    }

    /// Accepts one bid and rejects every sibling in a single transaction.
    /// Re-accepting the current winner is a no-op; accepting a different
    /// bid once one is accepted fails.
    pub async fn accept_bid(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        actor: &User,
    ) -> Result<AwardOutcome, ServiceError> {
        let project = self
            .db_client
            .get_project(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        if !access::can_manage_project(actor, &project) {
            return Err(ServiceError::UnauthorizedProjectAccess(actor.id, project_id));
        }

        match self.db_client.award_bid(project_id, bid_id).await {
            Ok(outcome) => {
                if !outcome.already_awarded {
                    tracing::info!(
                        "Project {} awarded to bid {} by owner {}",
                        project_id,
                        bid_id,
                        actor.id
                    );
                }
                Ok(outcome)
            }
            Err(sqlx::Error::RowNotFound) => Err(ServiceError::BidNotFound(bid_id)),
            Err(sqlx::Error::Protocol(msg)) if msg == AWARD_TAKEN => {
                Err(ServiceError::AwardTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn reject_bid(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
        actor: &User,
    ) -> Result<Bid, ServiceError> {
        let (project, _bid) = self.load_project_bid(project_id, bid_id).await?;

        if !access::can_manage_project(actor, &project) {
            return Err(ServiceError::UnauthorizedProjectAccess(actor.id, project_id));
        }

        let rejected = self.db_client.reject_bid(bid_id).await?;

        Ok(rejected)
    }

    async fn load_project_bid(
        &self,
        project_id: Uuid,
        bid_id: Uuid,
    ) -> Result<(Project, Bid), ServiceError> {
        let project = self
            .db_client
            .get_project(project_id)
            .await?
            .ok_or(ServiceError::ProjectNotFound(project_id))?;

        let bid = self
            .db_client
            .get_bid(bid_id)
            .await?
            .filter(|bid| bid.project_id == project_id)
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        Ok((project, bid))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(dbe) if dbe.is_unique_violation())
}
