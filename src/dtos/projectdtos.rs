use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::HttpError;
use crate::models::projectmodel::{FileRef, Project, ProjectCategory, ProjectStatus};
use crate::models::usermodel::User;
use crate::utils::formdata::{de_f64, de_i32, de_opt_bool, de_opt_f64, de_opt_i32};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLocationDto {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,

    #[serde(default)]
    pub zip_code: Option<String>,

    #[serde(default, deserialize_with = "de_opt_f64")]
    pub lat: Option<f64>,

    #[serde(default, deserialize_with = "de_opt_f64")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBudgetDto {
    #[serde(deserialize_with = "de_f64")]
    pub min: f64,

    #[serde(deserialize_with = "de_f64")]
    pub max: f64,

    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTimelineDto {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[serde(deserialize_with = "de_i32")]
    pub estimated_duration: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSpecificationsDto {
    #[serde(deserialize_with = "de_f64")]
    pub area: f64,

    #[serde(default, deserialize_with = "de_opt_i32")]
    pub floors: Option<i32>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectDto {
    #[validate(length(min = 1, message = "Project title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Project description is required"))]
    pub description: String,

    pub category: ProjectCategory,

    #[validate]
    pub location: ProjectLocationDto,

    pub budget: ProjectBudgetDto,
    pub timeline: ProjectTimelineDto,
    pub specifications: ProjectSpecificationsDto,

    #[serde(default)]
    pub requirements: Option<Vec<String>>,

    #[serde(default)]
    pub special_requirements: Option<String>,

    pub bidding_deadline: DateTime<Utc>,
}

impl CreateProjectDto {
    /// Field-level validation plus the cross-field invariants, surfacing
    /// every violation in one pass.
    pub fn validate_all(&self) -> Result<(), HttpError> {
        let mut violations: Vec<String> = Vec::new();

        if let Err(errors) = self.validate() {
            violations.push(errors.to_string());
        }

        if self.budget.min < 0.0 {
            violations.push("Minimum budget cannot be negative".to_string());
        }
        if self.budget.max < 0.0 {
            violations.push("Maximum budget cannot be negative".to_string());
        }
        if self.budget.min > self.budget.max {
            violations.push("Minimum budget cannot exceed maximum budget".to_string());
        }
        if self.timeline.start_date >= self.timeline.end_date {
            violations.push("Start date must be before end date".to_string());
        }
        if self.timeline.estimated_duration <= 0 {
            violations.push("Estimated duration must be positive".to_string());
        }
        if self.specifications.area <= 0.0 {
            violations.push("Area must be positive".to_string());
        }
        if let Some(floors) = self.specifications.floors {
            if floors < 1 {
                violations.push("Floors must be at least 1".to_string());
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(HttpError::bad_request(violations.join("; ")))
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, message = "Project title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Project description cannot be empty"))]
    pub description: Option<String>,

    pub category: Option<ProjectCategory>,

    #[serde(default)]
    pub location: Option<UpdateLocationDto>,

    #[serde(default)]
    pub budget: Option<UpdateBudgetDto>,

    #[serde(default)]
    pub timeline: Option<UpdateTimelineDto>,

    #[serde(default)]
    pub specifications: Option<UpdateSpecificationsDto>,

    #[serde(default)]
    pub requirements: Option<Vec<String>>,

    #[serde(default)]
    pub special_requirements: Option<String>,

    #[serde(default, deserialize_with = "de_opt_bool")]
    pub is_public: Option<bool>,

    #[serde(default)]
    pub bidding_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateLocationDto {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateBudgetDto {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub max: Option<f64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateTimelineDto {
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_i32")]
    pub estimated_duration: Option<i32>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateSpecificationsDto {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_i32")]
    pub floors: Option<i32>,
}

/// Query-string filters for the browse endpoint. Plain types only, since
/// the query decoder is not self-describing.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectListQueryDto {
    pub category: Option<ProjectCategory>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<ProjectStatus>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,

    #[validate(range(min = 1))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 50))]
    pub limit: Option<u32>,

    pub my_projects: Option<bool>,
}

#[derive(Debug, Serialize, Clone)]
pub struct OwnerSummaryDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl OwnerSummaryDto {
    pub fn from_user(user: &User) -> Self {
        OwnerSummaryDto {
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            email: user.email.to_owned(),
        }
    }
}

/// Full project plus the derived read-time fields, for the owner's view.
#[derive(Debug, Serialize)]
pub struct ProjectDetailDto {
    #[serde(flatten)]
    pub project: Project,
    pub bid_count: i64,
    pub days_until_deadline: i64,
    pub owner: Option<OwnerSummaryDto>,
}

impl ProjectDetailDto {
    pub fn from_project(project: Project, owner: Option<&User>, bid_count: i64) -> Self {
        let days_until_deadline = project.days_until_deadline(Utc::now());
        ProjectDetailDto {
            project,
            bid_count,
            days_until_deadline,
            owner: owner.map(OwnerSummaryDto::from_user),
        }
    }
}

/// The redacted view served to everyone but the owner: no bids, no awarded
/// bid reference, owner reduced to name and email.
#[derive(Debug, Serialize)]
pub struct PublicProjectDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub location_address: String,
    pub location_city: String,
    pub location_state: String,
    pub location_zip: Option<String>,
    pub budget_min: String,
    pub budget_max: String,
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
    pub bidding_open: bool,
    pub property_images: Vec<FileRef>,
    pub boq_documents: Vec<FileRef>,
    pub drawings: Vec<FileRef>,
    pub other_documents: Vec<FileRef>,
    pub bid_count: i64,
    pub days_until_deadline: i64,
    pub owner: OwnerSummaryDto,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl PublicProjectDto {
    pub fn from_project(project: &Project, owner: &User, bid_count: i64) -> Self {
        let now = Utc::now();
        PublicProjectDto {
            id: project.id.to_string(),
            title: project.title.to_owned(),
            description: project.description.to_owned(),
            category: project.category,
            location_address: project.location_address.to_owned(),
            location_city: project.location_city.to_owned(),
            location_state: project.location_state.to_owned(),
            location_zip: project.location_zip.clone(),
            budget_min: project.budget_min.to_string(),
            budget_max: project.budget_max.to_string(),
            currency: project.currency.to_owned(),
            start_date: project.start_date,
            end_date: project.end_date,
            estimated_duration_days: project.estimated_duration_days,
            area: project.area,
            floors: project.floors,
            requirements: project.requirements.clone(),
            special_requirements: project.special_requirements.clone(),
            status: project.status,
            is_public: project.is_public,
            bidding_deadline: project.bidding_deadline,
            bidding_open: project.is_bidding_open(now),
            property_images: project.property_images.0.clone(),
            boq_documents: project.boq_documents.0.clone(),
            drawings: project.drawings.0.clone(),
            other_documents: project.other_documents.0.clone(),
            bid_count,
            days_until_deadline: project.days_until_deadline(now),
            owner: OwnerSummaryDto::from_user(owner),
            created_at: project.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_create_payload() -> serde_json::Value {
        json!({
            "title": "Steel warehouse",
            "description": "40x60 clear span",
            "category": "industrial",
            "location": {"address": "99 Dock St", "city": "Mobile", "state": "AL"},
            "budget": {"min": "80000", "max": "200000"},
            "timeline": {
                "start_date": "2026-09-01T00:00:00Z",
                "end_date": "2027-03-01T00:00:00Z",
                "estimated_duration": "180"
            },
            "specifications": {"area": "2400", "floors": "1"},
            "bidding_deadline": "2026-08-25T00:00:00Z"
        })
    }

    #[test]
    fn create_dto_decodes_form_shaped_values() {
        let dto: CreateProjectDto = serde_json::from_value(valid_create_payload()).unwrap();
        assert_eq!(dto.budget.min, 80000.0);
        assert_eq!(dto.timeline.estimated_duration, 180);
        assert_eq!(dto.specifications.floors, Some(1));
        assert!(dto.validate_all().is_ok());
    }

    #[test]
    fn cross_field_violations_are_reported_together() {
        let mut payload = valid_create_payload();
        payload["budget"] = json!({"min": "200000", "max": "80000"});
        payload["timeline"]["end_date"] = json!("2026-08-01T00:00:00Z");
        payload["specifications"]["area"] = json!("0");

        let dto: CreateProjectDto = serde_json::from_value(payload).unwrap();
        let err = dto.validate_all().unwrap_err();
        assert!(err.message.contains("Minimum budget cannot exceed maximum budget"));
        assert!(err.message.contains("Start date must be before end date"));
        assert!(err.message.contains("Area must be positive"));
    }

    #[test]
    fn negative_budget_is_rejected() {
        let mut payload = valid_create_payload();
        payload["budget"] = json!({"min": "-5", "max": "10"});

        let dto: CreateProjectDto = serde_json::from_value(payload).unwrap();
        let err = dto.validate_all().unwrap_err();
        assert!(err.message.contains("Minimum budget cannot be negative"));
    }
}
