// db/ratingdb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ratingmodel::{Rating, RatingCategories, RatingType};

#[derive(Debug)]
pub struct NewRating {
    pub project_id: Option<Uuid>,
    pub rated_user_id: Uuid,
    pub rater_id: Uuid,
    pub rating: i32,
    pub review: String,
    pub categories: Option<RatingCategories>,
    pub rating_type: RatingType,
}

#[derive(Debug, sqlx::FromRow)]
pub struct RatingAggregate {
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, serde::Serialize, sqlx::FromRow)]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i64,
}

#[async_trait]
pub trait RatingExt {
    async fn save_rating(&self, new_rating: NewRating) -> Result<Rating, sqlx::Error>;

    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<Rating>, sqlx::Error>;

    async fn rating_exists(
        &self,
        rater_id: Uuid,
        rated_user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error>;

    async fn get_user_ratings(
        &self,
        rated_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Rating>, sqlx::Error>;

    async fn count_user_ratings(&self, rated_user_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn get_user_rating_aggregate(
        &self,
        rated_user_id: Uuid,
    ) -> Result<RatingAggregate, sqlx::Error>;

    async fn get_user_rating_distribution(
        &self,
        rated_user_id: Uuid,
    ) -> Result<Vec<RatingBucket>, sqlx::Error>;

    async fn get_project_ratings(&self, project_id: Uuid) -> Result<Vec<Rating>, sqlx::Error>;

    async fn get_rater_ratings(
        &self,
        rater_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Rating>, sqlx::Error>;

    async fn count_rater_ratings(&self, rater_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn update_rating(
        &self,
        rating_id: Uuid,
        rating: Option<i32>,
        review: Option<String>,
        categories: Option<RatingCategories>,
    ) -> Result<Rating, sqlx::Error>;

    async fn delete_rating(&self, rating_id: Uuid) -> Result<(), sqlx::Error>;

    async fn report_rating(
        &self,
        rating_id: Uuid,
        reported_by: Uuid,
        reason: String,
    ) -> Result<Rating, sqlx::Error>;
}

#[async_trait]
impl RatingExt for DBClient {
    async fn save_rating(&self, new_rating: NewRating) -> Result<Rating, sqlx::Error> {
        // The partial unique index on (rater_id, rated_user_id, project
        // scope) is what makes a concurrent duplicate lose; callers map the
        // violation to a conflict.
        sqlx::query_as::<_, Rating>(
            r#"
            INSERT INTO ratings
            (project_id, rated_user_id, rater_id, rating, review, categories, rating_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, project_id, rated_user_id, rater_id, rating, review,
                      categories, rating_type, status,
                      moderated_by, moderated_at, moderation_notes,
                      helpful_votes, reported, report_reason, reported_by, reported_at,
                      created_at, updated_at
            "#,
        )
        .bind(new_rating.project_id)
        .bind(new_rating.rated_user_id)
        .bind(new_rating.rater_id)
        .bind(new_rating.rating)
        .bind(new_rating.review)
        .bind(new_rating.categories.map(Json))
        .bind(new_rating.rating_type)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, project_id, rated_user_id, rater_id, rating, review,
                   categories, rating_type, status,
                   moderated_by, moderated_at, moderation_notes,
                   helpful_votes, reported, report_reason, reported_by, reported_at,
                   created_at, updated_at
            FROM ratings
            WHERE id = $1
            "#,
        )
        .bind(rating_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn rating_exists(
        &self,
        rater_id: Uuid,
        rated_user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        // IS NOT DISTINCT FROM keeps the no-project scope its own value
        // instead of a wildcard.
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM ratings
                WHERE rater_id = $1
                  AND rated_user_id = $2
                  AND project_id IS NOT DISTINCT FROM $3
            )
            "#,
        )
        .bind(rater_id)
        .bind(rated_user_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_ratings(
        &self,
        rated_user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, project_id, rated_user_id, rater_id, rating, review,
                   categories, rating_type, status,
                   moderated_by, moderated_at, moderation_notes,
                   helpful_votes, reported, report_reason, reported_by, reported_at,
                   created_at, updated_at
            FROM ratings
            WHERE rated_user_id = $1 AND status = 'approved'::rating_status
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(rated_user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_user_ratings(&self, rated_user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM ratings
            WHERE rated_user_id = $1 AND status = 'approved'::rating_status
            "#,
        )
        .bind(rated_user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_rating_aggregate(
        &self,
        rated_user_id: Uuid,
    ) -> Result<RatingAggregate, sqlx::Error> {
        sqlx::query_as::<_, RatingAggregate>(
            r#"
            SELECT COALESCE(AVG(rating), 0)::float8 AS average_rating,
                   COUNT(*) AS total_ratings
            FROM ratings
            WHERE rated_user_id = $1 AND status = 'approved'::rating_status
            "#,
        )
        .bind(rated_user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_rating_distribution(
        &self,
        rated_user_id: Uuid,
    ) -> Result<Vec<RatingBucket>, sqlx::Error> {
        sqlx::query_as::<_, RatingBucket>(
            r#"
            SELECT rating, COUNT(*) AS count
            FROM ratings
            WHERE rated_user_id = $1 AND status = 'approved'::rating_status
            GROUP BY rating
            ORDER BY rating DESC
            "#,
        )
        .bind(rated_user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_project_ratings(&self, project_id: Uuid) -> Result<Vec<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, project_id, rated_user_id, rater_id, rating, review,
                   categories, rating_type, status,
                   moderated_by, moderated_at, moderation_notes,
                   helpful_votes, reported, report_reason, reported_by, reported_at,
                   created_at, updated_at
            FROM ratings
            WHERE project_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_rater_ratings(
        &self,
        rater_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Rating>, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, project_id, rated_user_id, rater_id, rating, review,
                   categories, rating_type, status,
                   moderated_by, moderated_at, moderation_notes,
                   helpful_votes, reported, report_reason, reported_by, reported_at,
                   created_at, updated_at
            FROM ratings
            WHERE rater_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(rater_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_rater_ratings(&self, rater_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings WHERE rater_id = $1")
            .bind(rater_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn update_rating(
        &self,
        rating_id: Uuid,
        rating: Option<i32>,
        review: Option<String>,
        categories: Option<RatingCategories>,
    ) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings
            SET rating = COALESCE($2, rating),
                review = COALESCE($3, review),
                categories = COALESCE($4, categories),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, rated_user_id, rater_id, rating, review,
                      categories, rating_type, status,
                      moderated_by, moderated_at, moderation_notes,
                      helpful_votes, reported, report_reason, reported_by, reported_at,
                      created_at, updated_at
            "#,
        )
        .bind(rating_id)
        .bind(rating)
        .bind(review)
        .bind(categories.map(Json))
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_rating(&self, rating_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(rating_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn report_rating(
        &self,
        rating_id: Uuid,
        reported_by: Uuid,
        reason: String,
    ) -> Result<Rating, sqlx::Error> {
        sqlx::query_as::<_, Rating>(
            r#"
            UPDATE ratings
            SET reported = true,
                report_reason = $3,
                reported_by = $2,
                reported_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, project_id, rated_user_id, rater_id, rating, review,
                      categories, rating_type, status,
                      moderated_by, moderated_at, moderation_notes,
                      helpful_votes, reported, report_reason, reported_by, reported_at,
                      created_at, updated_at
            "#,
        )
        .bind(rating_id)
        .bind(reported_by)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }
}
