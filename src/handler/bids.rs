use std::sync::Arc;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{biddb::BidExt, projectdb::ProjectExt, userdb::UserExt},
    dtos::{
        biddtos::{BidProviderSummaryDto, BidWithProviderDto, SubmitBidDto, UpdateBidDto},
        userdtos::Response,
    },
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::access,
    utils::{formdata::nest_fields, upload::UploadField},
    AppState,
};

pub fn bids_handler() -> Router {
    Router::new()
        .route("/", post(submit_bid))
        .route("/project/:project_id", get(get_project_bids))
        .route("/my-bids", get(get_my_bids))
        .route("/:project_id/:bid_id/accept", put(accept_bid))
        .route("/:project_id/:bid_id/reject", put(reject_bid))
        .route("/:project_id/:bid_id", put(update_bid).delete(withdraw_bid))
}

pub async fn submit_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ServiceProvider])?;

    let (fields, mut files) = app_state
        .file_intake
        .collect(&mut multipart, &[UploadField::BidDocuments])
        .await?;

    let body: SubmitBidDto = serde_json::from_value(nest_fields(fields))
        .map_err(|e| HttpError::bad_request(format!("Invalid bid payload: {}", e)))?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let documents = files
        .remove(&UploadField::BidDocuments)
        .unwrap_or_default()
        .iter()
        .map(|f| f.to_file_ref())
        .collect();

    let bid = app_state
        .bid_service
        .submit_bid(
            body.project_id,
            &auth.user,
            body.amount,
            body.timeline,
            body.message,
            documents,
        )
        .await
        .map_err(HttpError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Bid submitted successfully",
            "bid": bid
        })),
    ))
}

pub async fn get_project_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ProjectOwner])?;

    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    if !access::can_manage_project(&auth.user, &project) {
        return Err(HttpError::forbidden("Access denied"));
    }

    let bids = app_state
        .db_client
        .get_project_bids(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_bids = bids.len();

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

    Ok(Json(serde_json::json!({
        "status": "success",
        "bids": bids_with_providers,
        "totalBids": total_bids
    })))
}

pub async fn get_my_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ServiceProvider])?;

    let bids = app_state
        .db_client
        .get_provider_bids(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = bids.len();

    Ok(Json(serde_json::json!({
        "status": "success",
        "bids": bids,
        "total": total
    })))
}

pub async fn accept_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((project_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ProjectOwner])?;

    let outcome = app_state
        .bid_service
        .accept_bid(project_id, bid_id, &auth.user)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Bid accepted successfully",
        "project": {
            "status": outcome.project.status,
            "awardedBid": outcome.bid,
        }
    })))
}

pub async fn reject_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((project_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ProjectOwner])?;

    app_state
        .bid_service
        .reject_bid(project_id, bid_id, &auth.user)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(Response {
        status: "success",
        message: "Bid rejected successfully".to_string(),
    }))
}

pub async fn update_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((project_id, bid_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ServiceProvider])?;

    let (fields, mut files) = app_state
        .file_intake
        .collect(&mut multipart, &[UploadField::BidDocuments])
        .await?;

    let body: UpdateBidDto = serde_json::from_value(nest_fields(fields))
        .map_err(|e| HttpError::bad_request(format!("Invalid bid payload: {}", e)))?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let new_documents = files
        .remove(&UploadField::BidDocuments)
        .unwrap_or_default()
        .iter()
        .map(|f| f.to_file_ref())
        .collect();

    let bid = app_state
        .bid_service
        .update_bid(
            project_id,
            bid_id,
            &auth.user,
            body.amount,
            body.timeline,
            body.message,
            new_documents,
        )
        .await
        .map_err(HttpError::from)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Bid updated successfully",
        "bid": bid
    })))
}

pub async fn withdraw_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path((project_id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth.user, &[UserRole::ServiceProvider])?;

    app_state
        .bid_service
        .withdraw_bid(project_id, bid_id, &auth.user)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(Response {
        status: "success",
        message: "Bid deleted successfully".to_string(),
    }))
}
