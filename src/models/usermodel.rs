use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    ProjectOwner,
    ServiceProvider,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::ProjectOwner => "project_owner",
            UserRole::ServiceProvider => "service_provider",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub email: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,

    pub location_address: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,

    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,

    // Project owner fields
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,

    // Service provider fields
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub experience_description: Option<String>,
    pub hourly_rate: Option<BigDecimal>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
