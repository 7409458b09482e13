use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        biddb::BidExt,
        projectdb::{NewProject, ProjectExt, ProjectListFilter, ProjectPatch},
        userdb::UserExt,
    },
    dtos::{
        biddtos::{BidProviderSummaryDto, BidWithProviderDto},
        projectdtos::{
            CreateProjectDto, ProjectDetailDto, ProjectListQueryDto, PublicProjectDto,
            UpdateProjectDto,
        },
    },
    error::{ErrorMessage, HttpError},
    middleware::{maybe_auth, require_role, JWTAuthMiddeware},
    models::{
        projectmodel::{ProjectStatus, Project},
        usermodel::{User, UserRole},
    },
    service::access,
    utils::{
        formdata::nest_fields,
        upload::{StoredFile, UploadField, PROJECT_FILE_FIELDS},
    },
    AppState,
};

pub fn projects_handler() -> Router {
    Router::new()
        .route("/", get(get_projects).post(create_project))
        .route(
            "/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:project_id/publish", post(publish_project))
        .layer(middleware::from_fn(maybe_auth))
}

fn require_user(auth: &Option<JWTAuthMiddeware>) -> Result<&User, HttpError> {
    auth.as_ref().map(|a| &a.user).ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string())
    })
}

fn file_refs(
    files: &mut std::collections::HashMap<UploadField, Vec<StoredFile>>,
    field: UploadField,
) -> Vec<crate::models::projectmodel::FileRef> {
    files
        .remove(&field)
        .unwrap_or_default()
        .iter()
        .map(|f| f.to_file_ref())
        .collect()
}

pub async fn create_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?.clone();
    require_role(&user, &[UserRole::ProjectOwner])?;

    // Files are validated and stored before the project row is written, so
    // a rejected upload leaves nothing behind.
    let (fields, mut files) = app_state
        .file_intake
        .collect(&mut multipart, PROJECT_FILE_FIELDS)
        .await?;

    let body: CreateProjectDto = serde_json::from_value(nest_fields(fields))
        .map_err(|e| HttpError::bad_request(format!("Invalid project payload: {}", e)))?;

    body.validate_all()?;

    let budget_min = BigDecimal::try_from(body.budget.min)
        .map_err(|_| HttpError::bad_request("Invalid minimum budget"))?;
    let budget_max = BigDecimal::try_from(body.budget.max)
        .map_err(|_| HttpError::bad_request("Invalid maximum budget"))?;

    let project = app_state
        .db_client
        .create_project(NewProject {
            owner_id: user.id,
            title: body.title,
            description: body.description,
            category: body.category,
            location_address: body.location.address,
            location_city: body.location.city,
            location_state: body.location.state,
            location_zip: body.location.zip_code,
            location_lat: body.location.lat,
            location_lng: body.location.lng,
            budget_min,
            budget_max,
            currency: body.budget.currency.unwrap_or_else(|| "USD".to_string()),
            start_date: body.timeline.start_date,
            end_date: body.timeline.end_date,
            estimated_duration_days: body.timeline.estimated_duration,
            area: body.specifications.area,
            floors: body.specifications.floors.unwrap_or(1),
            requirements: body.requirements.unwrap_or_default(),
            special_requirements: body.special_requirements,
            // Projects go straight to the public board on creation.
            status: ProjectStatus::Live,
            is_public: true,
            bidding_deadline: body.bidding_deadline,
            property_images: file_refs(&mut files, UploadField::PropertyImages),
            boq_documents: file_refs(&mut files, UploadField::Boq),
            drawings: file_refs(&mut files, UploadField::Drawings),
            other_documents: file_refs(&mut files, UploadField::OtherDocuments),
        })
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("Project {} created by owner {}", project.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Project created successfully",
            "data": ProjectDetailDto::from_project(project, Some(&user), 0)
        })),
    ))
}

pub async fn get_projects(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Query(query): Query<ProjectListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(10) as i64;
    let offset = ((page - 1) * limit as u32) as i64;

    let my_projects = query.my_projects.unwrap_or(false);
    let actor = auth.as_ref().map(|a| &a.user);

    let filter = ProjectListFilter {
        owner_id: match (my_projects, actor) {
            (true, Some(user)) => Some(user.id),
            _ => None,
        },
        // Anonymous (or not-mine) listings only ever see the public board.
        public_only: !(my_projects && actor.is_some()),
        category: query.category,
        city: query.city.clone(),
        state: query.state.clone(),
        status: query.status,
        min_budget: match query.min_budget {
            Some(b) => Some(
                BigDecimal::try_from(b)
                    .map_err(|_| HttpError::bad_request("Invalid minimum budget"))?,
            ),
            None => None,
        },
        max_budget: match query.max_budget {
            Some(b) => Some(
                BigDecimal::try_from(b)
                    .map_err(|_| HttpError::bad_request("Invalid maximum budget"))?,
            ),
            None => None,
        },
    };

    let projects = app_state
        .db_client
        .get_projects(&filter, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = app_state
        .db_client
        .count_projects(&filter)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut listed = Vec::new();
    for project in projects {
        let bid_count = app_state
            .db_client
            .count_project_bids(project.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        if filter.owner_id.is_some() {
            listed.push(serde_json::to_value(ProjectDetailDto::from_project(
                project, actor, bid_count,
            )));
        } else {
            let owner = app_state
                .db_client
                .get_user(Some(project.owner_id), None)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?
                .ok_or_else(|| HttpError::not_found("Project owner not found"))?;

            listed.push(serde_json::to_value(PublicProjectDto::from_project(
                &project, &owner, bid_count,
            )));
        }
    }

    let listed = listed
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_pages = (total + limit - 1) / limit;

    Ok(Json(serde_json::json!({
        "status": "success",
        "projects": listed,
        "pagination": {
            "current": page,
            "total": total_pages,
            "totalProjects": total,
        }
    })))
}

pub async fn get_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    let actor = auth.as_ref().map(|a| &a.user);

    if !access::can_view_project(actor, &project) {
        return Err(HttpError::forbidden("Access denied"));
    }

    let bid_count = app_state
        .db_client
        .count_project_bids(project.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let is_owner = actor.map_or(false, |user| access::can_manage_project(user, &project));

    if !is_owner {
        let owner = app_state
            .db_client
            .get_user(Some(project.owner_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Project owner not found"))?;

        return Ok(Json(serde_json::json!({
            "status": "success",
            "project": PublicProjectDto::from_project(&project, &owner, bid_count)
        })));
    }

    // The owner also gets the bid list with provider summaries.
    let bids = app_state
        .db_client
        .get_project_bids(project.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut bids_with_providers = Vec::new();
    for bid in bids {
        let provider = app_state
            .db_client
            .get_user(Some(bid.service_provider_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        bids_with_providers.push(BidWithProviderDto {
            bid,
            service_provider: provider.as_ref().map(BidProviderSummaryDto::from_user),
        });
    }

    let actor_user = actor.cloned();

    Ok(Json(serde_json::json!({
        "status": "success",
        "project": ProjectDetailDto::from_project(project, actor_user.as_ref(), bid_count),
        "bids": bids_with_providers
    })))
}

pub async fn update_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?.clone();
    require_role(&user, &[UserRole::ProjectOwner])?;

    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    if !access::can_manage_project(&user, &project) {
        return Err(HttpError::forbidden("Access denied"));
    }

    let (fields, mut files) = app_state
        .file_intake
        .collect(&mut multipart, PROJECT_FILE_FIELDS)
        .await?;

    let body: UpdateProjectDto = serde_json::from_value(nest_fields(fields))
        .map_err(|e| HttpError::bad_request(format!("Invalid project payload: {}", e)))?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    validate_effective_state(&body, &project)?;

    let budget = body.budget.unwrap_or_default();
    let timeline = body.timeline.unwrap_or_default();
    let specifications = body.specifications.unwrap_or_default();
    let location = body.location.unwrap_or_default();

    let budget_min = match budget.min {
        Some(b) => Some(
            BigDecimal::try_from(b)
                .map_err(|_| HttpError::bad_request("Invalid minimum budget"))?,
        ),
        None => None,
    };
    let budget_max = match budget.max {
        Some(b) => Some(
            BigDecimal::try_from(b)
                .map_err(|_| HttpError::bad_request("Invalid maximum budget"))?,
        ),
        None => None,
    };

    let updated = app_state
        .db_client
        .update_project(
            project_id,
            ProjectPatch {
                title: body.title,
                description: body.description,
                category: body.category,
                location_address: location.address,
                location_city: location.city,
                location_state: location.state,
                location_zip: location.zip_code,
                budget_min,
                budget_max,
                start_date: timeline.start_date,
                end_date: timeline.end_date,
                estimated_duration_days: timeline.estimated_duration,
                area: specifications.area,
                floors: specifications.floors,
                requirements: body.requirements,
                special_requirements: body.special_requirements,
                is_public: body.is_public,
                bidding_deadline: body.bidding_deadline,
                new_property_images: file_refs(&mut files, UploadField::PropertyImages),
                new_boq_documents: file_refs(&mut files, UploadField::Boq),
                new_drawings: file_refs(&mut files, UploadField::Drawings),
                new_other_documents: file_refs(&mut files, UploadField::OtherDocuments),
            },
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let bid_count = app_state
        .db_client
        .count_project_bids(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Project updated successfully",
        "data": ProjectDetailDto::from_project(updated, Some(&user), bid_count)
    })))
}

/// A partial update must leave the project's invariants intact, so check
/// the merged (incoming-or-existing) values rather than the patch alone.
/// All violations are surfaced together.
fn validate_effective_state(body: &UpdateProjectDto, project: &Project) -> Result<(), HttpError> {
    let mut violations: Vec<String> = Vec::new();

    let budget = body.budget.clone().unwrap_or_default();
    let timeline = body.timeline.clone().unwrap_or_default();
    let specifications = body.specifications.clone().unwrap_or_default();

    let existing_min = project.budget_min.to_string().parse::<f64>().unwrap_or(0.0);
    let existing_max = project.budget_max.to_string().parse::<f64>().unwrap_or(0.0);
    let effective_min = budget.min.unwrap_or(existing_min);
    let effective_max = budget.max.unwrap_or(existing_max);

    if effective_min < 0.0 || effective_max < 0.0 {
        violations.push("Budget cannot be negative".to_string());
    }
    if effective_min > effective_max {
        violations.push("Minimum budget cannot exceed maximum budget".to_string());
    }

    let effective_start = timeline.start_date.unwrap_or(project.start_date);
    let effective_end = timeline.end_date.unwrap_or(project.end_date);
    if effective_start >= effective_end {
        violations.push("Start date must be before end date".to_string());
    }

    if let Some(duration) = timeline.estimated_duration {
        if duration <= 0 {
            violations.push("Estimated duration must be positive".to_string());
        }
    }
    if let Some(area) = specifications.area {
        if area <= 0.0 {
            violations.push("Area must be positive".to_string());
        }
    }
    if let Some(floors) = specifications.floors {
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

pub async fn delete_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;
    require_role(user, &[UserRole::ProjectOwner])?;

    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    if !access::can_manage_project(user, &project) {
        return Err(HttpError::forbidden("Access denied"));
    }

    // Any submitted bid, whatever its status, pins the project forever.
    let bid_count = app_state
        .db_client
        .count_project_bids(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if bid_count > 0 {
        return Err(HttpError::unique_constraint_violation(
            "Cannot delete project with existing bids",
        ));
    }

    app_state
        .db_client
        .delete_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("Project {} deleted by owner {}", project_id, user.id);

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Project deleted successfully"
    })))
}

pub async fn publish_project(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;
    require_role(user, &[UserRole::ProjectOwner])?;

    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    if !access::can_manage_project(user, &project) {
        return Err(HttpError::forbidden("Access denied"));
    }

    let published = app_state
        .db_client
        .publish_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Project published successfully",
        "data": ProjectDetailDto::from_project(published, Some(user), 0)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::projectdtos::UpdateBudgetDto;
    use crate::models::projectmodel::ProjectCategory;
    use chrono::{Duration, Utc};
    use sqlx::types::Json as SqlxJson;

    fn base_project() -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Retaining wall".to_string(),
            description: "60ft of block wall".to_string(),
            category: ProjectCategory::Other,
            location_address: "1 Hill Rd".to_string(),
            location_city: "Boise".to_string(),
            location_state: "ID".to_string(),
            location_zip: None,
            location_lat: None,
            location_lng: None,
            budget_min: BigDecimal::from(10_000),
            budget_max: BigDecimal::from(20_000),
            currency: "USD".to_string(),
            start_date: now,
            end_date: now + Duration::days(30),
            estimated_duration_days: 30,
            area: 600.0,
            floors: 1,
            requirements: vec![],
            special_requirements: None,
            status: ProjectStatus::Live,
            is_public: true,
            bidding_deadline: now + Duration::days(7),
            awarded_bid_id: None,
            property_images: SqlxJson(vec![]),
            boq_documents: SqlxJson(vec![]),
            drawings: SqlxJson(vec![]),
            other_documents: SqlxJson(vec![]),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_validated_against_merged_state() {
        let project = base_project();

        // Raising only the minimum above the stored maximum must fail.
        let body = UpdateProjectDto {
            budget: Some(UpdateBudgetDto {
                min: Some(50_000.0),
                max: None,
            }),
            ..Default::default()
        };
        assert!(validate_effective_state(&body, &project).is_err());

        // Raising both keeps the invariant.
        let body = UpdateProjectDto {
            budget: Some(UpdateBudgetDto {
                min: Some(50_000.0),
                max: Some(80_000.0),
            }),
            ..Default::default()
        };
        assert!(validate_effective_state(&body, &project).is_ok());
    }

    #[test]
    fn empty_patch_is_valid() {
        let project = base_project();
        assert!(validate_effective_state(&UpdateProjectDto::default(), &project).is_ok());
    }
}
