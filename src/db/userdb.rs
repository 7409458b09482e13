// db/userdb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{User, UserRole};

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub location_address: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub experience_description: Option<String>,
    pub hourly_rate: Option<BigDecimal>,
}

#[derive(Debug, Default)]
pub struct UserProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub location_address: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,
    pub profile_image: Option<String>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub company_description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub experience_description: Option<String>,
    pub hourly_rate: Option<BigDecimal>,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        patch: UserProfilePatch,
    ) -> Result<User, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        if let Some(user_id) = user_id {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password, role, first_name, last_name, phone,
                       location_address, location_city, location_state, location_zip,
                       profile_image, is_verified, is_active,
                       company_name, company_website, company_description,
                       skills, experience_years, experience_description, hourly_rate,
                       created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
        } else if let Some(email) = email {
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, email, password, role, first_name, last_name, phone,
                       location_address, location_city, location_state, location_zip,
                       profile_image, is_verified, is_active,
                       company_name, company_website, company_description,
                       skills, experience_years, experience_description, hourly_rate,
                       created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await
        } else {
            Ok(None)
        }
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
            (email, password, role, first_name, last_name, phone,
             location_address, location_city, location_state, location_zip,
             company_name, company_website, company_description,
             skills, experience_years, experience_description, hourly_rate)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id, email, password, role, first_name, last_name, phone,
                      location_address, location_city, location_state, location_zip,
                      profile_image, is_verified, is_active,
                      company_name, company_website, company_description,
                      skills, experience_years, experience_description, hourly_rate,
                      created_at, updated_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.password)
        .bind(new_user.role)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.phone)
        .bind(new_user.location_address)
        .bind(new_user.location_city)
        .bind(new_user.location_state)
        .bind(new_user.location_zip)
        .bind(new_user.company_name)
        .bind(new_user.company_website)
        .bind(new_user.company_description)
        .bind(new_user.skills)
        .bind(new_user.experience_years)
        .bind(new_user.experience_description)
        .bind(new_user.hourly_rate)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        patch: UserProfilePatch,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                location_address = COALESCE($5, location_address),
                location_city = COALESCE($6, location_city),
                location_state = COALESCE($7, location_state),
                location_zip = COALESCE($8, location_zip),
                profile_image = COALESCE($9, profile_image),
                company_name = COALESCE($10, company_name),
                company_website = COALESCE($11, company_website),
                company_description = COALESCE($12, company_description),
                skills = COALESCE($13, skills),
                experience_years = COALESCE($14, experience_years),
                experience_description = COALESCE($15, experience_description),
                hourly_rate = COALESCE($16, hourly_rate),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password, role, first_name, last_name, phone,
                      location_address, location_city, location_state, location_zip,
                      profile_image, is_verified, is_active,
                      company_name, company_website, company_description,
                      skills, experience_years, experience_description, hourly_rate,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.phone)
        .bind(patch.location_address)
        .bind(patch.location_city)
        .bind(patch.location_state)
        .bind(patch.location_zip)
        .bind(patch.profile_image)
        .bind(patch.company_name)
        .bind(patch.company_website)
        .bind(patch.company_description)
        .bind(patch.skills)
        .bind(patch.experience_years)
        .bind(patch.experience_description)
        .bind(patch.hourly_rate)
        .fetch_one(&self.pool)
        .await
    }
}
