use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::{UserExt, UserProfilePatch},
    dtos::userdtos::{FilterUserDto, UpdateProfileDto, UserData, UserResponseDto, UserSummaryDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::usermodel::UserRole,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/profile", put(update_profile))
        .route("/:user_id", get(get_user_by_id))
}

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&auth.user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    }))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    body.validate_phone_number()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    // Role-specific sections only apply to the matching role, like at
    // registration.
    let company = body
        .company
        .filter(|_| auth.user.role == UserRole::ProjectOwner)
        .unwrap_or_default();
    let provider = body
        .service_provider
        .filter(|_| auth.user.role == UserRole::ServiceProvider)
        .unwrap_or_default();
    let location = body.location.unwrap_or_default();

    let hourly_rate = match provider.hourly_rate {
        Some(rate) => Some(
            BigDecimal::try_from(rate)
                .map_err(|_| HttpError::bad_request("Invalid hourly rate"))?,
        ),
        None => None,
    };

    let user = app_state
        .db_client
        .update_user_profile(
            auth.user.id,
            UserProfilePatch {
                first_name: body.first_name,
                last_name: body.last_name,
                phone: body.phone,
                location_address: location.address,
                location_city: location.city,
                location_state: location.state,
                location_zip: location.zip_code,
                profile_image: None,
                company_name: company.name,
                company_website: company.website,
                company_description: company.description,
                skills: provider.skills,
                experience_years: provider.experience_years,
                experience_description: provider.experience_description,
                hourly_rate,
            },
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Profile updated successfully",
        "data": UserData { user: FilterUserDto::filter_user(&user) }
    })))
}

pub async fn get_user_by_id(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "user": UserSummaryDto::from_user(&user),
            "phone": user.phone,
            "location_city": user.location_city,
            "location_state": user.location_state,
        }
    })))
}
