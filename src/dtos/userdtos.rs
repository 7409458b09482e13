use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use validator::{Validate, ValidationError};

use crate::models::usermodel::{User, UserRole};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    #[validate(length(min = 1, max = 255, message = "Address must be between 1-255 characters"))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City must be between 1-100 characters"))]
    pub city: Option<String>,

    #[validate(length(min = 1, max = 100, message = "State must be between 1-100 characters"))]
    pub state: Option<String>,

    pub zip_code: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CompanyDto {
    #[validate(length(min = 1, max = 255, message = "Company name must be between 1-255 characters"))]
    pub name: Option<String>,

    pub website: Option<String>,
    pub description: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ServiceProviderProfileDto {
    pub skills: Option<Vec<String>>,

    #[validate(range(min = 0, max = 80, message = "Experience years must be between 0-80"))]
    pub experience_years: Option<i32>,

    pub experience_description: Option<String>,

    #[validate(range(min = 0.0, message = "Hourly rate cannot be negative"))]
    pub hourly_rate: Option<f64>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    #[validate(
        length(min = 1, message = "Confirm Password is required"),
        must_match(other = "password", message = "passwords do not match")
    )]
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: String,

    pub role: UserRole,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[validate]
    pub location: Option<LocationDto>,

    #[validate]
    pub company: Option<CompanyDto>,

    #[validate]
    pub service_provider: Option<ServiceProviderProfileDto>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[validate(length(min = 10, max = 20, message = "Phone number must be between 10-20 characters"))]
    pub phone: Option<String>,

    #[validate]
    pub location: Option<LocationDto>,

    #[validate]
    pub company: Option<CompanyDto>,

    #[validate]
    pub service_provider: Option<ServiceProviderProfileDto>,
}

// Custom validation for phone numbers
impl UpdateProfileDto {
    pub fn validate_phone_number(&self) -> Result<(), ValidationError> {
        if let Some(phone) = &self.phone {
            // Basic phone number validation - supports international formats
            let phone_regex =
                regex::Regex::new(r"^(\+?[0-9]{1,3}[- ]?)?[0-9]{3}[- ]?[0-9]{3}[- ]?[0-9]{4}$")
                    .map_err(|_| ValidationError::new("Invalid phone regex"))?;

            if !phone_regex.is_match(phone) {
                let mut error = ValidationError::new("invalid_phone");
                error.message = Some(Cow::from(
                    "Phone number must be in a valid format (e.g., +1234567890 or 123-456-7890)",
                ));
                return Err(error);
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: String,
    pub location_address: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub experience_description: Option<String>,
    pub hourly_rate: Option<BigDecimal>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            full_name: user.full_name(),
            phone: user.phone.to_owned(),
            location_address: user.location_address.clone(),
            location_city: user.location_city.clone(),
            location_state: user.location_state.clone(),
            location_zip: user.location_zip.clone(),
            profile_image: user.profile_image.clone(),
            is_verified: user.is_verified,
            is_active: user.is_active,
            company_name: user.company_name.clone(),
            company_website: user.company_website.clone(),
            company_description: user.company_description.clone(),
            skills: user.skills.clone(),
            experience_years: user.experience_years,
            experience_description: user.experience_description.clone(),
            hourly_rate: user.hourly_rate.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The compact identity other users are allowed to see.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSummaryDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub role: String,
}

impl UserSummaryDto {
    pub fn from_user(user: &User) -> Self {
        UserSummaryDto {
            id: user.id.to_string(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            email: user.email.to_owned(),
            profile_image: user.profile_image.clone(),
            role: user.role.to_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_dto_reports_all_violations_at_once() {
        let dto = RegisterUserDto {
            email: "not-an-email".to_string(),
            password: "abc".to_string(),
            password_confirm: "different".to_string(),
            role: UserRole::ServiceProvider,
            first_name: "".to_string(),
            last_name: "Reyes".to_string(),
            phone: "".to_string(),
            location: None,
            company: None,
            service_provider: None,
        };

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("password_confirm"));
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn filter_user_carries_no_password() {
        let serialized = serde_json::to_string(&FilterUserDto {
            id: "x".to_string(),
            email: "a@b.c".to_string(),
            role: "project_owner".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Bell".to_string(),
            full_name: "Ana Bell".to_string(),
            phone: "5555555555".to_string(),
            location_address: None,
            location_city: None,
            location_state: None,
            location_zip: None,
            profile_image: None,
            is_verified: true,
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
        })
        .unwrap();

        assert!(!serialized.contains("password"));
    }
}
