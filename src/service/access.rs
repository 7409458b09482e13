//! Pure authorization decisions. Every function takes the acting user
//! explicitly; nothing here reads request state or touches the database.

use crate::models::messagemodel::Message;
use crate::models::projectmodel::{Bid, BidStatus, Project, ProjectStatus};
use crate::models::usermodel::User;

/// Owners always see their project; everyone else (including anonymous
/// visitors) only when it is live and public.
pub fn can_view_project(actor: Option<&User>, project: &Project) -> bool {
    if let Some(actor) = actor {
        if actor.id == project.owner_id {
            return true;
        }
    }

    project.status == ProjectStatus::Live && project.is_public
}

pub fn can_manage_project(actor: &User, project: &Project) -> bool {
    actor.id == project.owner_id
}

pub fn can_manage_bid(actor: &User, bid: &Bid) -> bool {
    actor.id == bid.service_provider_id
}

/// Project owner, or the provider whose bid was accepted.
pub fn can_rate_in_project(actor: &User, project: &Project, bids: &[Bid]) -> bool {
    if actor.id == project.owner_id {
        return true;
    }

    bids.iter()
        .any(|bid| bid.service_provider_id == actor.id && bid.status == BidStatus::Accepted)
}

pub fn can_mark_message_read(actor: &User, message: &Message) -> bool {
    actor.id == message.recipient_id
}

pub fn can_delete_message(actor: &User, message: &Message) -> bool {
    actor.id == message.sender_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::messagemodel::{MessageStatus, MessageType};
    use crate::models::projectmodel::ProjectCategory;
    use crate::models::usermodel::UserRole;
    use chrono::{Duration, Utc};
    use sqlx::types::{BigDecimal, Json};
    use uuid::Uuid;

    fn user(id: Uuid, role: UserRole) -> User {
        User {
            id,
            email: "someone@example.com".to_string(),
            password: "hash".to_string(),
            role,
            first_name: "Ada".to_string(),
            last_name: "Stone".to_string(),
            phone: "5125550199".to_string(),
            location_address: None,
            location_city: None,
            location_state: None,
            location_zip: None,
            profile_image: None,
            is_verified: false,
            is_active: true,
            company_name: None,
            company_website: None,
            company_description: None,
            skills: None,
            experience_years: None,
            experience_description: None,
            hourly_rate: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn project(owner_id: Uuid, status: ProjectStatus, is_public: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id,
            title: "Garage extension".to_string(),
            description: "Brick and slab".to_string(),
            category: ProjectCategory::Renovation,
            location_address: "4 Elm".to_string(),
            location_city: "Tulsa".to_string(),
            location_state: "OK".to_string(),
            location_zip: None,
            location_lat: None,
            location_lng: None,
            budget_min: BigDecimal::from(5_000),
            budget_max: BigDecimal::from(15_000),
            currency: "USD".to_string(),
            start_date: Utc::now(),
            end_date: Utc::now() + Duration::days(60),
            estimated_duration_days: 60,
            area: 400.0,
            floors: 1,
            requirements: vec![],
            special_requirements: None,
            status,
            is_public,
            bidding_deadline: Utc::now() + Duration::days(14),
            awarded_bid_id: None,
            property_images: Json(vec![]),
            boq_documents: Json(vec![]),
            drawings: Json(vec![]),
            other_documents: Json(vec![]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn bid(project_id: Uuid, provider_id: Uuid, status: BidStatus) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            project_id,
            service_provider_id: provider_id,
            amount: BigDecimal::from(9_000),
            timeline_days: 45,
            message: None,
            documents: Json(vec![]),
            status,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn owner_sees_own_project_in_any_state() {
        let owner = user(Uuid::new_v4(), UserRole::ProjectOwner);
        let draft = project(owner.id, ProjectStatus::Draft, false);

        assert!(can_view_project(Some(&owner), &draft));
    }

    #[test]
    fn live_public_projects_are_visible_to_anyone() {
        let stranger = user(Uuid::new_v4(), UserRole::ServiceProvider);
        let live = project(Uuid::new_v4(), ProjectStatus::Live, true);

        assert!(can_view_project(Some(&stranger), &live));
        assert!(can_view_project(None, &live));
    }

    #[test]
    fn private_or_non_live_projects_are_hidden_from_others() {
        let stranger = user(Uuid::new_v4(), UserRole::ServiceProvider);
        let private_live = project(Uuid::new_v4(), ProjectStatus::Live, false);
        let public_draft = project(Uuid::new_v4(), ProjectStatus::Draft, true);

        assert!(!can_view_project(Some(&stranger), &private_live));
        assert!(!can_view_project(None, &public_draft));
        assert!(!can_view_project(None, &private_live));
    }

    #[test]
    fn only_the_owner_manages_a_project() {
        let owner = user(Uuid::new_v4(), UserRole::ProjectOwner);
        let other = user(Uuid::new_v4(), UserRole::ProjectOwner);
        let p = project(owner.id, ProjectStatus::Live, true);

        assert!(can_manage_project(&owner, &p));
        assert!(!can_manage_project(&other, &p));
    }

    #[test]
    fn rating_requires_ownership_or_an_accepted_bid() {
        let owner = user(Uuid::new_v4(), UserRole::ProjectOwner);
        let winner = user(Uuid::new_v4(), UserRole::ServiceProvider);
        let loser = user(Uuid::new_v4(), UserRole::ServiceProvider);
        let p = project(owner.id, ProjectStatus::InProgress, true);
        let bids = vec![
            bid(p.id, winner.id, BidStatus::Accepted),
            bid(p.id, loser.id, BidStatus::Rejected),
        ];

        assert!(can_rate_in_project(&owner, &p, &bids));
        assert!(can_rate_in_project(&winner, &p, &bids));
        assert!(!can_rate_in_project(&loser, &p, &bids));
    }

    #[test]
    fn message_read_is_recipient_only_and_delete_is_sender_only() {
        let sender = user(Uuid::new_v4(), UserRole::ProjectOwner);
        let recipient = user(Uuid::new_v4(), UserRole::ServiceProvider);
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: "a-b".to_string(),
            sender_id: sender.id,
            recipient_id: recipient.id,
            content: "Can you start Monday?".to_string(),
            message_type: MessageType::Text,
            attachment: None,
            project_id: None,
            is_read: false,
            read_at: None,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        };

        assert!(can_mark_message_read(&recipient, &message));
        assert!(!can_mark_message_read(&sender, &message));
        assert!(can_delete_message(&sender, &message));
        assert!(!can_delete_message(&recipient, &message));
    }
}
