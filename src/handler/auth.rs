use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use sqlx::types::BigDecimal;
use validator::Validate;

use crate::{
    db::userdb::{NewUser, UserExt},
    dtos::userdtos::{
        FilterUserDto, LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto,
        UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    models::usermodel::UserRole,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if body.role == UserRole::Admin {
        return Err(HttpError::bad_request("Invalid role"));
    }

    let email = body.email.trim().to_lowercase();

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    // Role-specific profile sections are only honored for the matching role.
    let company = body
        .company
        .filter(|_| body.role == UserRole::ProjectOwner)
        .unwrap_or_default();
    let provider = body
        .service_provider
        .filter(|_| body.role == UserRole::ServiceProvider)
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
        .save_user(NewUser {
            email,
            password: hashed_password,
            role: body.role,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
            location_address: location.address,
            location_city: location.city,
            location_state: location.state,
            location_zip: location.zip_code,
            company_name: company.name,
            company_website: company.website,
            company_description: company.description,
            skills: provider.skills,
            experience_years: provider.experience_years,
            experience_description: provider.experience_description,
            hourly_rate,
        })
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!("New {} registered: {}", user.role.to_str(), user.email);

    let filtered_user = FilterUserDto::filter_user(&user);

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    }))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email.trim().to_lowercase()))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(
        ErrorMessage::WrongCredentials.to_string(),
    ))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    if !user.is_active {
        return Err(HttpError::bad_request(
            ErrorMessage::AccountDeactivated.to_string(),
        ));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage * 60);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    });

    let mut headers = HeaderMap::new();

    headers.append(header::SET_COOKIE, cookie.to_string().parse().unwrap());

    let mut response = response.into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
