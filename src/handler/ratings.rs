use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        biddb::BidExt,
        projectdb::ProjectExt,
        ratingdb::{NewRating, RatingExt},
        userdb::UserExt,
    },
    dtos::{
        ratingdtos::{ReportRatingDto, SubmitRatingDto, UpdateRatingDto},
        userdtos::{RequestQueryDto, UserSummaryDto},
    },
    error::{ErrorMessage, HttpError},
    middleware::{maybe_auth, JWTAuthMiddeware},
    models::{
        projectmodel::ProjectStatus,
        usermodel::User,
    },
    service::access,
    AppState,
};

pub fn ratings_handler() -> Router {
    Router::new()
        .route("/", post(submit_rating))
        .route("/user/:user_id", get(get_user_ratings))
        .route("/project/:project_id", get(get_project_ratings))
        .route("/my-ratings", get(get_my_ratings))
        .route("/:rating_id", put(update_rating).delete(delete_rating))
        .route("/:rating_id/report", post(report_rating))
        .layer(middleware::from_fn(maybe_auth))
}

fn require_user(auth: &Option<JWTAuthMiddeware>) -> Result<&User, HttpError> {
    auth.as_ref().map(|a| &a.user).ok_or_else(|| {
        HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string())
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(dbe) if dbe.is_unique_violation())
}

pub async fn submit_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Json(body): Json<SubmitRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?.clone();

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.rated_user_id == user.id {
        return Err(HttpError::bad_request("Cannot rate yourself"));
    }

    if let Some(project_id) = body.project_id {
        let project = app_state
            .db_client
            .get_project(project_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or_else(|| HttpError::not_found("Project not found"))?;

        if project.status != ProjectStatus::InProgress
            && project.status != ProjectStatus::Completed
        {
            return Err(HttpError::bad_request(
                "Can only rate projects that are in progress or completed",
            ));
        }

        let bids = app_state
            .db_client
            .get_project_bids(project_id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        if !access::can_rate_in_project(&user, &project, &bids) {
            return Err(HttpError::forbidden(
                "You can only rate users involved in this project",
            ));
        }
    }

    let rated_user = app_state
        .db_client
        .get_user(Some(body.rated_user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User to rate not found"))?;

    // One rating per (rater, rated user, project scope); the no-project
    // scope is a value of its own, so general ratings collide too.
    let already_rated = app_state
        .db_client
        .rating_exists(user.id, rated_user.id, body.project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if already_rated {
        return Err(HttpError::unique_constraint_violation(
            "You have already rated this user for this project",
        ));
    }

    let categories = body
        .categories
        .map(|c| c.retain_valid())
        .filter(|c| !c.is_empty());

    let rating = match app_state
        .db_client
        .save_rating(NewRating {
            project_id: body.project_id,
            rated_user_id: rated_user.id,
            rater_id: user.id,
            rating: body.rating,
            review: body.review.trim().to_string(),
            categories,
            rating_type: body.rating_type,
        })
        .await
    {
        Ok(rating) => rating,
        // A concurrent duplicate loses against the unique index.
        Err(e) if is_unique_violation(&e) => {
            return Err(HttpError::unique_constraint_violation(
                "You have already rated this user for this project",
            ));
        }
        Err(e) => return Err(HttpError::server_error(e.to_string())),
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "rating": rating
        })),
    ))
}

pub async fn get_user_ratings(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(pagination): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    pagination
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(10) as i64;
    let offset = ((page - 1) * limit as usize) as i64;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    let aggregate = app_state
        .db_client
        .get_user_rating_aggregate(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let distribution = app_state
        .db_client
        .get_user_rating_distribution(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let reviews = app_state
        .db_client
        .get_user_ratings(user_id, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_reviews = app_state
        .db_client
        .count_user_ratings(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_pages = (total_reviews + limit - 1) / limit;

    Ok(Json(serde_json::json!({
        "status": "success",
        "user": UserSummaryDto::from_user(&user),
        "averageRating": aggregate.average_rating,
        "totalRatings": aggregate.total_ratings,
        "ratingDistribution": distribution,
        "reviews": reviews,
        "pagination": {
            "current": page,
            "total": total_pages,
            "totalReviews": total_reviews,
        }
    })))
}

pub async fn get_project_ratings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;

    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Project not found"))?;

    let bids = app_state
        .db_client
        .get_project_bids(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !access::can_rate_in_project(user, &project, &bids) {
        return Err(HttpError::forbidden("Access denied"));
    }

    let ratings = app_state
        .db_client
        .get_project_ratings(project_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "ratings": ratings
    })))
}

pub async fn get_my_ratings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Query(pagination): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;

    pagination
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(10) as i64;
    let offset = ((page - 1) * limit as usize) as i64;

    let ratings = app_state
        .db_client
        .get_rater_ratings(user.id, limit, offset)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_ratings = app_state
        .db_client
        .count_rater_ratings(user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total_pages = (total_ratings + limit - 1) / limit;

    Ok(Json(serde_json::json!({
        "status": "success",
        "ratings": ratings,
        "pagination": {
            "current": page,
            "total": total_pages,
            "totalRatings": total_ratings,
        }
    })))
}

pub async fn update_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<UpdateRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .db_client
        .get_rating(rating_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Rating not found"))?;

    if rating.rater_id != user.id {
        return Err(HttpError::forbidden("Not authorized to update this rating"));
    }

    let categories = body
        .categories
        .map(|c| c.retain_valid())
        .filter(|c| !c.is_empty());

    let updated = app_state
        .db_client
        .update_rating(
            rating_id,
            body.rating,
            body.review.map(|r| r.trim().to_string()),
            categories,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "rating": updated
    })))
}

pub async fn delete_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(rating_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;

    let rating = app_state
        .db_client
        .get_rating(rating_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Rating not found"))?;

    if rating.rater_id != user.id {
        return Err(HttpError::forbidden("Not authorized to delete this rating"));
    }

    app_state
        .db_client
        .delete_rating(rating_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Rating deleted successfully"
    })))
}

pub async fn report_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<Option<JWTAuthMiddeware>>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<ReportRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user = require_user(&auth)?;

    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .db_client
        .get_rating(rating_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Rating not found"))?;

    if rating.reported && rating.reported_by == Some(user.id) {
        return Err(HttpError::unique_constraint_violation(
            "You have already reported this rating",
        ));
    }

    app_state
        .db_client
        .report_rating(rating_id, user.id, body.reason.trim().to_string())
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Rating reported successfully"
    })))
}
