use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::dto::{CreateMealRequest, UpdateMealRequest};
use super::repo_types::{Cuisine, DietaryPreference, Meal, MealCategory};

/// Conjunction of optional predicates over active meals. Built from query
/// parameters on the listing endpoint and from stored student preferences
/// on the recommendation endpoint.
#[derive(Debug, Clone, Default)]
pub struct MealFilter {
    pub cuisine: Option<Cuisine>,
    pub cuisines: Option<Vec<Cuisine>>,
    pub category: Option<MealCategory>,
    pub dietary_preference: Option<DietaryPreference>,
    pub min_calories: Option<f64>,
    pub max_calories: Option<f64>,
    pub min_protein: Option<f64>,
}

const MEAL_COLUMNS: &str = r#"id, meal_name, cuisine, category, calories, protein,
    carbohydrates, fats, dietary_preference, serving_size, allergens, ingredients,
    description, image_url, is_active, nutrition_score, popularity, average_rating,
    total_ratings, created_at, updated_at"#;

impl Meal {
    pub async fn create(db: &PgPool, req: &CreateMealRequest) -> anyhow::Result<Meal> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO meals
                (id, meal_name, cuisine, category, calories, protein,
                 carbohydrates, fats, dietary_preference, serving_size, allergens,
                 ingredients, description, image_url, is_active, nutrition_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {MEAL_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(req.meal_name.trim())
        .bind(req.cuisine)
        .bind(req.category)
        .bind(req.calories)
        .bind(req.protein)
        .bind(req.carbohydrates)
        .bind(req.fats)
        .bind(req.dietary_preference)
        .bind(req.serving_size.as_deref())
        .bind(&req.allergens)
        .bind(&req.ingredients)
        .bind(req.description.as_deref())
        .bind(req.image_url.as_deref())
        .bind(req.is_active)
        .bind(req.nutrition_score)
        .fetch_one(db)
        .await?;
        Ok(meal)
    }

    /// Active meals matching the filter, most popular first, ties broken
    /// by average rating.
    pub async fn list(db: &PgPool, filter: &MealFilter) -> anyhow::Result<Vec<Meal>> {
        let meals = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE is_active = TRUE
              AND ($1::cuisine IS NULL OR cuisine = $1)
              AND ($2::cuisine[] IS NULL OR cuisine = ANY($2))
              AND ($3::meal_category IS NULL OR category = $3)
              AND ($4::dietary_preference IS NULL OR dietary_preference = $4)
              AND ($5::double precision IS NULL OR calories >= $5)
              AND ($6::double precision IS NULL OR calories <= $6)
              AND ($7::double precision IS NULL OR protein >= $7)
            ORDER BY popularity DESC, average_rating DESC
            "#,
        ))
        .bind(filter.cuisine)
        .bind(filter.cuisines.as_deref())
        .bind(filter.category)
        .bind(filter.dietary_preference)
        .bind(filter.min_calories)
        .bind(filter.max_calories)
        .bind(filter.min_protein)
        .fetch_all(db)
        .await?;
        Ok(meals)
    }

    /// Lookup by id, soft-deleted rows included.
    pub async fn get_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"#,
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(meal)
    }

    /// Resolve a set of ids in one round trip; missing ids are simply
    /// absent from the result. Soft-deleted rows are included so history
    /// entries keep resolving after a deactivation.
    pub async fn by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Meal>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let meals = sqlx::query_as::<_, Meal>(&format!(
            r#"SELECT {MEAL_COLUMNS} FROM meals WHERE id = ANY($1)"#,
        ))
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(meals)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        req: &UpdateMealRequest,
    ) -> anyhow::Result<Option<Meal>> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals SET
                meal_name          = COALESCE($2, meal_name),
                cuisine            = COALESCE($3, cuisine),
                category           = COALESCE($4, category),
                calories           = COALESCE($5, calories),
                protein            = COALESCE($6, protein),
                carbohydrates      = COALESCE($7, carbohydrates),
                fats               = COALESCE($8, fats),
                dietary_preference = COALESCE($9, dietary_preference),
                serving_size       = COALESCE($10, serving_size),
                allergens          = COALESCE($11, allergens),
                ingredients        = COALESCE($12, ingredients),
                description        = COALESCE($13, description),
                image_url          = COALESCE($14, image_url),
                is_active          = COALESCE($15, is_active),
                nutrition_score    = COALESCE($16, nutrition_score),
                updated_at         = now()
            WHERE id = $1
            RETURNING {MEAL_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(req.meal_name.as_deref().map(str::trim))
        .bind(req.cuisine)
        .bind(req.category)
        .bind(req.calories)
        .bind(req.protein)
        .bind(req.carbohydrates)
        .bind(req.fats)
        .bind(req.dietary_preference)
        .bind(req.serving_size.as_deref())
        .bind(req.allergens.as_deref())
        .bind(req.ingredients.as_deref())
        .bind(req.description.as_deref())
        .bind(req.image_url.as_deref())
        .bind(req.is_active)
        .bind(req.nutrition_score)
        .fetch_optional(db)
        .await?;
        Ok(meal)
    }

    /// Clear the active flag. Idempotent; returns false for an unknown id.
    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"UPDATE meals SET is_active = FALSE, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock the rating fields of one meal for the duration of the
    /// surrounding transaction. Concurrent ratings for the same meal
    /// serialize on this row lock.
    pub async fn rating_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> anyhow::Result<Option<(f64, i32)>> {
        let row = sqlx::query_as::<_, (f64, i32)>(
            r#"SELECT average_rating, total_ratings FROM meals WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn apply_rating_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        average_rating: f64,
        total_ratings: i32,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE meals SET
                average_rating = $2,
                total_ratings  = $3,
                popularity     = popularity + 1,
                updated_at     = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(average_rating)
        .bind(total_ratings)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
