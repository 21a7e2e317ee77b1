use serde::{Deserialize, Serialize};

use super::repo_types::{Cuisine, DietaryPreference, Meal, MealCategory};
use crate::students::repo_types::Preferences;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    pub meal_name: String,
    pub cuisine: Cuisine,
    pub category: MealCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub dietary_preference: DietaryPreference,
    pub serving_size: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub nutrition_score: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl CreateMealRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.meal_name.trim().is_empty() {
            violations.push("mealName must not be empty".into());
        }
        if self.calories < 0.0 {
            violations.push("calories must be >= 0".into());
        }
        if self.protein < 0.0 {
            violations.push("protein must be >= 0".into());
        }
        if matches!(self.carbohydrates, Some(v) if v < 0.0) {
            violations.push("carbohydrates must be >= 0".into());
        }
        if matches!(self.fats, Some(v) if v < 0.0) {
            violations.push("fats must be >= 0".into());
        }
        if matches!(self.nutrition_score, Some(v) if !(0.0..=10.0).contains(&v)) {
            violations.push("nutritionScore must be between 0 and 10".into());
        }
        violations
    }
}

/// Partial update: only present fields are written, and only present
/// fields are re-validated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMealRequest {
    pub meal_name: Option<String>,
    pub cuisine: Option<Cuisine>,
    pub category: Option<MealCategory>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub dietary_preference: Option<DietaryPreference>,
    pub serving_size: Option<String>,
    pub allergens: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub nutrition_score: Option<f64>,
}

impl UpdateMealRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if matches!(self.meal_name.as_deref(), Some(name) if name.trim().is_empty()) {
            violations.push("mealName must not be empty".into());
        }
        if matches!(self.calories, Some(v) if v < 0.0) {
            violations.push("calories must be >= 0".into());
        }
        if matches!(self.protein, Some(v) if v < 0.0) {
            violations.push("protein must be >= 0".into());
        }
        if matches!(self.carbohydrates, Some(v) if v < 0.0) {
            violations.push("carbohydrates must be >= 0".into());
        }
        if matches!(self.fats, Some(v) if v < 0.0) {
            violations.push("fats must be >= 0".into());
        }
        if matches!(self.nutrition_score, Some(v) if !(0.0..=10.0).contains(&v)) {
            violations.push("nutritionScore must be between 0 and 10".into());
        }
        violations
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealListQuery {
    pub cuisine: Option<Cuisine>,
    pub category: Option<MealCategory>,
    pub dietary_preference: Option<DietaryPreference>,
    pub min_calories: Option<f64>,
    pub max_calories: Option<f64>,
    pub min_protein: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RateMealRequest {
    pub rating: Option<f64>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkImportRequest {
    pub meals: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub meal_type: Option<MealCategory>,
}

fn default_limit() -> usize {
    10
}

// --- responses ---

#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub success: bool,
    pub count: usize,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub meal: Meal,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateMealResponse {
    pub success: bool,
    pub message: String,
    pub new_average_rating: f64,
    pub total_ratings: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportResponse {
    pub success: bool,
    pub message: String,
    pub imported_count: usize,
}

/// A meal with its attached relevance signal, as returned by the
/// recommendation endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedMeal {
    #[serde(flatten)]
    pub meal: Meal,
    pub confidence: f64,
    pub ml_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_recommendation: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub recommendations: Vec<RecommendedMeal>,
    pub student_preferences: Preferences,
    pub total_meals_evaluated: usize,
    pub ml_api_used: bool,
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn valid_create() -> CreateMealRequest {
        CreateMealRequest {
            meal_name: "Idli".into(),
            cuisine: Cuisine::SouthIndian,
            category: MealCategory::Breakfast,
            calories: 120.0,
            protein: 4.0,
            carbohydrates: Some(25.0),
            fats: Some(0.5),
            dietary_preference: DietaryPreference::Vegetarian,
            serving_size: Some("2 pieces".into()),
            allergens: Vec::new(),
            ingredients: vec!["rice".into(), "urad dal".into()],
            description: None,
            image_url: None,
            is_active: true,
            nutrition_score: Some(8.0),
        }
    }

    #[test]
    fn test_valid_create_has_no_violations() {
        assert!(valid_create().validate().is_empty());
    }

    #[test]
    fn test_create_violations_are_enumerated() {
        let mut req = valid_create();
        req.meal_name = "  ".into();
        req.calories = -1.0;
        req.nutrition_score = Some(11.0);
        let violations = req.validate();
        assert_eq!(violations.len(), 3);
        assert!(violations.iter().any(|v| v.contains("mealName")));
        assert!(violations.iter().any(|v| v.contains("calories")));
        assert!(violations.iter().any(|v| v.contains("nutritionScore")));
    }

    #[test]
    fn test_update_only_checks_present_fields() {
        let req = UpdateMealRequest {
            protein: Some(-2.0),
            ..Default::default()
        };
        let violations = req.validate();
        assert_eq!(violations, vec!["protein must be >= 0".to_string()]);
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let err = serde_json::from_str::<CreateMealRequest>(
            r#"{"mealName":"x","cuisine":"Italian","category":"Snack",
                "calories":1,"protein":1,"dietaryPreference":"Vegetarian"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_recommended_meal_flattens_meal_fields() {
        use time::OffsetDateTime;
        use uuid::Uuid;

        let meal = Meal {
            id: Uuid::new_v4(),
            meal_name: "Poha".into(),
            cuisine: Cuisine::General,
            category: MealCategory::Breakfast,
            calories: 180.0,
            protein: 3.0,
            carbohydrates: None,
            fats: None,
            dietary_preference: DietaryPreference::Vegetarian,
            serving_size: None,
            allergens: Vec::new(),
            ingredients: Vec::new(),
            description: None,
            image_url: None,
            is_active: true,
            nutrition_score: None,
            popularity: 0,
            average_rating: 0.0,
            total_ratings: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let entry = RecommendedMeal {
            meal,
            confidence: 0.8,
            ml_recommended: true,
            fallback_recommendation: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"mealName\":\"Poha\""));
        assert!(json.contains("\"confidence\":0.8"));
        assert!(json.contains("\"mlRecommended\":true"));
        assert!(!json.contains("fallbackRecommendation"));
    }
}
