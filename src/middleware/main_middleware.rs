use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Extension,
};

use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::userdb::UserExt,
    error::{ErrorMessage, HttpError},
    models::usermodel::{User, UserRole},
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
}

fn extract_token(cookie_jar: &CookieJar, req: &Request) -> Option<String> {
    cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    if auth_value.starts_with("Bearer ") {
                        Some(auth_value[7..].to_owned())
                    } else {
                        None
                    }
                })
        })
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, &req)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let token_details =
        match token::decode_token(token, app_state.env.jwt_secret.as_bytes()) {
            Ok(token_details) => token_details,
            Err(_) => {
                return Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()));
            }
        };

    let user_id = uuid::Uuid::parse_str(&token_details)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|_| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    let user = user
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    if !user.is_active {
        return Err(HttpError::unauthorized(
            ErrorMessage::AccountDeactivated.to_string(),
        ));
    }

    req.extensions_mut().insert(JWTAuthMiddeware { user });

    Ok(next.run(req).await)
}

/// Like `auth`, but anonymous requests pass through with `None` so public
/// endpoints can degrade to the redacted view instead of failing.
pub async fn maybe_auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let mut resolved: Option<JWTAuthMiddeware> = None;

    if let Some(token) = extract_token(&cookie_jar, &req) {
        if let Ok(token_details) =
            token::decode_token(token, app_state.env.jwt_secret.as_bytes())
        {
            if let Ok(user_id) = uuid::Uuid::parse_str(&token_details) {
                if let Ok(Some(user)) = app_state.db_client.get_user(Some(user_id), None).await {
                    if user.is_active {
                        resolved = Some(JWTAuthMiddeware { user });
                    }
                }
            }
        }
    }

    req.extensions_mut().insert(resolved);

    Ok(next.run(req).await)
}

pub fn require_role(user: &User, required_roles: &[UserRole]) -> Result<(), HttpError> {
    if !required_roles.contains(&user.role) {
        return Err(HttpError::new(
            ErrorMessage::PermissionDenied.to_string(),
            StatusCode::FORBIDDEN,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: "worker@example.com".to_string(),
            password: "hash".to_string(),
            role,
            first_name: "Joan".to_string(),
            last_name: "Pratt".to_string(),
            phone: "2105550142".to_string(),
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

    #[test]
    fn role_gate_allows_listed_roles_only() {
        let provider = user_with_role(UserRole::ServiceProvider);

        assert!(require_role(&provider, &[UserRole::ServiceProvider]).is_ok());
        assert!(require_role(&provider, &[UserRole::ProjectOwner]).is_err());
        assert!(require_role(&provider, &[UserRole::ProjectOwner, UserRole::Admin]).is_err());
    }
}
