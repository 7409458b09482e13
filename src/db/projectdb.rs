// db/projectdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::{BigDecimal, Json};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::projectmodel::{FileRef, Project, ProjectCategory, ProjectStatus};

#[derive(Debug)]
pub struct NewProject {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub location_address: String,
    pub location_city: String,
    pub location_state: String,
    pub location_zip: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub budget_min: BigDecimal,
    pub budget_max: BigDecimal,
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
    pub property_images: Vec<FileRef>,
    pub boq_documents: Vec<FileRef>,
    pub drawings: Vec<FileRef>,
    pub other_documents: Vec<FileRef>,
}

/// Partial update; `None` leaves the column untouched. File groups are
/// appended, never replaced.
#[derive(Debug, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    pub location_address: Option<String>,
    pub location_city: Option<String>,
    pub location_state: Option<String>,
    pub location_zip: Option<String>,
    pub budget_min: Option<BigDecimal>,
    pub budget_max: Option<BigDecimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub estimated_duration_days: Option<i32>,
    pub area: Option<f64>,
    pub floors: Option<i32>,
    pub requirements: Option<Vec<String>>,
    pub special_requirements: Option<String>,
    pub is_public: Option<bool>,
    pub bidding_deadline: Option<DateTime<Utc>>,
    pub new_property_images: Vec<FileRef>,
    pub new_boq_documents: Vec<FileRef>,
    pub new_drawings: Vec<FileRef>,
    pub new_other_documents: Vec<FileRef>,
}

#[derive(Debug, Default, Clone)]
pub struct ProjectListFilter {
    pub owner_id: Option<Uuid>,
    pub public_only: bool,
    pub category: Option<ProjectCategory>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<ProjectStatus>,
    pub min_budget: Option<BigDecimal>,
    pub max_budget: Option<BigDecimal>,
}

#[async_trait]
pub trait ProjectExt {
    async fn create_project(&self, new_project: NewProject) -> Result<Project, sqlx::Error>;

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, sqlx::Error>;

    async fn get_projects(
        &self,
        filter: &ProjectListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error>;

    async fn count_projects(&self, filter: &ProjectListFilter) -> Result<i64, sqlx::Error>;

    async fn update_project(
        &self,
        project_id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, sqlx::Error>;

    async fn delete_project(&self, project_id: Uuid) -> Result<(), sqlx::Error>;

    async fn publish_project(&self, project_id: Uuid) -> Result<Project, sqlx::Error>;

    async fn count_project_bids(&self, project_id: Uuid) -> Result<i64, sqlx::Error>;
}

#[async_trait]
impl ProjectExt for DBClient {
    async fn create_project(&self, new_project: NewProject) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects
            (owner_id, title, description, category,
             location_address, location_city, location_state, location_zip,
             location_lat, location_lng,
             budget_min, budget_max, currency,
             start_date, end_date, estimated_duration_days,
             area, floors, requirements, special_requirements,
             status, is_public, bidding_deadline,
             property_images, boq_documents, drawings, other_documents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            RETURNING id, owner_id, title, description, category,
                      location_address, location_city, location_state, location_zip,
                      location_lat, location_lng,
                      budget_min, budget_max, currency,
                      start_date, end_date, estimated_duration_days,
                      area, floors, requirements, special_requirements,
                      status, is_public, bidding_deadline, awarded_bid_id,
                      property_images, boq_documents, drawings, other_documents,
                      created_at, updated_at
            "#,
        )
        .bind(new_project.owner_id)
        .bind(new_project.title)
        .bind(new_project.description)
        .bind(new_project.category)
        .bind(new_project.location_address)
        .bind(new_project.location_city)
        .bind(new_project.location_state)
        .bind(new_project.location_zip)
        .bind(new_project.location_lat)
        .bind(new_project.location_lng)
        .bind(new_project.budget_min)
        .bind(new_project.budget_max)
        .bind(new_project.currency)
        .bind(new_project.start_date)
        .bind(new_project.end_date)
        .bind(new_project.estimated_duration_days)
        .bind(new_project.area)
        .bind(new_project.floors)
        .bind(new_project.requirements)
        .bind(new_project.special_requirements)
        .bind(new_project.status)
        .bind(new_project.is_public)
        .bind(new_project.bidding_deadline)
        .bind(Json(new_project.property_images))
        .bind(Json(new_project.boq_documents))
        .bind(Json(new_project.drawings))
        .bind(Json(new_project.other_documents))
        .fetch_one(&self.pool)
        .await
    }

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, title, description, category,
                   location_address, location_city, location_state, location_zip,
                   location_lat, location_lng,
                   budget_min, budget_max, currency,
                   start_date, end_date, estimated_duration_days,
                   area, floors, requirements, special_requirements,
                   status, is_public, bidding_deadline, awarded_bid_id,
                   property_images, boq_documents, drawings, other_documents,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_projects(
        &self,
        filter: &ProjectListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, title, description, category,
                   location_address, location_city, location_state, location_zip,
                   location_lat, location_lng,
                   budget_min, budget_max, currency,
                   start_date, end_date, estimated_duration_days,
                   area, floors, requirements, special_requirements,
                   status, is_public, bidding_deadline, awarded_bid_id,
                   property_images, boq_documents, drawings, other_documents,
                   created_at, updated_at
            FROM projects
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND (NOT $2 OR (status = 'live'::project_status AND is_public = true))
              AND ($3::project_category IS NULL OR category = $3)
              AND ($4::text IS NULL OR location_city ILIKE '%' || $4 || '%')
              AND ($5::text IS NULL OR location_state ILIKE '%' || $5 || '%')
              AND ($6::project_status IS NULL OR status = $6)
              AND ($7::numeric IS NULL OR budget_max >= $7)
              AND ($8::numeric IS NULL OR budget_min <= $8)
            ORDER BY created_at DESC
            LIMIT $9 OFFSET $10
            "#,
        )
        .bind(filter.owner_id)
        .bind(filter.public_only)
        .bind(filter.category)
        .bind(filter.city.clone())
        .bind(filter.state.clone())
        .bind(filter.status)
        .bind(filter.min_budget.clone())
        .bind(filter.max_budget.clone())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_projects(&self, filter: &ProjectListFilter) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM projects
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND (NOT $2 OR (status = 'live'::project_status AND is_public = true))
              AND ($3::project_category IS NULL OR category = $3)
              AND ($4::text IS NULL OR location_city ILIKE '%' || $4 || '%')
              AND ($5::text IS NULL OR location_state ILIKE '%' || $5 || '%')
              AND ($6::project_status IS NULL OR status = $6)
              AND ($7::numeric IS NULL OR budget_max >= $7)
              AND ($8::numeric IS NULL OR budget_min <= $8)
            "#,
        )
        .bind(filter.owner_id)
        .bind(filter.public_only)
        .bind(filter.category)
        .bind(filter.city.clone())
        .bind(filter.state.clone())
        .bind(filter.status)
        .bind(filter.min_budget.clone())
        .bind(filter.max_budget.clone())
        .fetch_one(&self.pool)
        .await
    }

    async fn update_project(
        &self,
        project_id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                location_address = COALESCE($5, location_address),
                location_city = COALESCE($6, location_city),
                location_state = COALESCE($7, location_state),
                location_zip = COALESCE($8, location_zip),
                budget_min = COALESCE($9, budget_min),
                budget_max = COALESCE($10, budget_max),
                start_date = COALESCE($11, start_date),
                end_date = COALESCE($12, end_date),
                estimated_duration_days = COALESCE($13, estimated_duration_days),
                area = COALESCE($14, area),
                floors = COALESCE($15, floors),
                requirements = COALESCE($16, requirements),
                special_requirements = COALESCE($17, special_requirements),
                is_public = COALESCE($18, is_public),
                bidding_deadline = COALESCE($19, bidding_deadline),
                property_images = property_images || $20::jsonb,
                boq_documents = boq_documents || $21::jsonb,
                drawings = drawings || $22::jsonb,
                other_documents = other_documents || $23::jsonb,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, description, category,
                      location_address, location_city, location_state, location_zip,
                      location_lat, location_lng,
                      budget_min, budget_max, currency,
                      start_date, end_date, estimated_duration_days,
                      area, floors, requirements, special_requirements,
                      status, is_public, bidding_deadline, awarded_bid_id,
                      property_images, boq_documents, drawings, other_documents,
                      created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.category)
        .bind(patch.location_address)
        .bind(patch.location_city)
        .bind(patch.location_state)
        .bind(patch.location_zip)
        .bind(patch.budget_min)
        .bind(patch.budget_max)
        .bind(patch.start_date)
        .bind(patch.end_date)
        .bind(patch.estimated_duration_days)
        .bind(patch.area)
        .bind(patch.floors)
        .bind(patch.requirements)
        .bind(patch.special_requirements)
        .bind(patch.is_public)
        .bind(patch.bidding_deadline)
        .bind(Json(patch.new_property_images))
        .bind(Json(patch.new_boq_documents))
        .bind(Json(patch.new_drawings))
        .bind(Json(patch.new_other_documents))
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_project(&self, project_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn publish_project(&self, project_id: Uuid) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET status = 'live'::project_status, is_public = true, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, title, description, category,
                      location_address, location_city, location_state, location_zip,
                      location_lat, location_lng,
                      budget_min, budget_max, currency,
                      start_date, end_date, estimated_duration_days,
                      area, floors, requirements, special_requirements,
                      status, is_public, bidding_deadline, awarded_bid_id,
                      property_images, boq_documents, drawings, other_documents,
                      created_at, updated_at
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_project_bids(&self, project_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bids WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await
    }
}
