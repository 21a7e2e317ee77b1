use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::meals::repo_types::{Cuisine, DietaryPreference, MealCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_level")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

impl Default for ActivityLevel {
    fn default() -> Self {
        ActivityLevel::Moderate
    }
}

/// What the student wants to eat. An explicit `null` dietary preference is
/// kept as-is; an omitted one defaults to Vegetarian.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub cuisines: Vec<Cuisine>,
    pub dietary_preference: Option<DietaryPreference>,
    pub categories: Vec<MealCategory>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            cuisines: Vec::new(),
            dietary_preference: Some(DietaryPreference::Vegetarian),
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionGoals {
    pub calories_per_day: Option<f64>,
    pub protein_grams_per_day: Option<f64>,
    pub max_calories_per_meal: Option<f64>,
    pub min_protein_per_meal: Option<f64>,
}

/// One student profile, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub preferences: Json<Preferences>,
    pub allergies: Vec<String>,
    pub nutrition_goals: Json<NutritionGoals>,
    pub activity_level: ActivityLevel,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// One row of a student's meal-interaction history. `meal_id` is a weak
/// reference: the meal may have been deactivated or may never resolve.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRow {
    pub meal_id: Uuid,
    pub liked: bool,
    pub consumed_at: OffsetDateTime,
}

#[cfg(test)]
mod defaults_tests {
    use super::*;

    #[test]
    fn test_preferences_default_is_vegetarian() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs.dietary_preference, Some(DietaryPreference::Vegetarian));
        assert!(prefs.cuisines.is_empty());
        assert!(prefs.categories.is_empty());
    }

    #[test]
    fn test_explicit_null_dietary_preference_is_kept() {
        let prefs: Preferences =
            serde_json::from_str(r#"{"dietaryPreference": null}"#).unwrap();
        assert_eq!(prefs.dietary_preference, None);
    }

    #[test]
    fn test_activity_level_default_is_moderate() {
        assert_eq!(ActivityLevel::default(), ActivityLevel::Moderate);
    }

    #[test]
    fn test_nutrition_goals_all_optional() {
        let goals: NutritionGoals = serde_json::from_str("{}").unwrap();
        assert!(goals.calories_per_day.is_none());
        assert!(goals.min_protein_per_meal.is_none());
    }
}
