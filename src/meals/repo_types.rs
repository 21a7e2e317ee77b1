use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cuisine")]
pub enum Cuisine {
    #[serde(rename = "North Indian")]
    #[sqlx(rename = "North Indian")]
    NorthIndian,
    #[serde(rename = "South Indian")]
    #[sqlx(rename = "South Indian")]
    SouthIndian,
    #[serde(rename = "Street Food")]
    #[sqlx(rename = "Street Food")]
    StreetFood,
    General,
}

impl sqlx::postgres::PgHasArrayType for Cuisine {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_cuisine")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "meal_category")]
pub enum MealCategory {
    #[serde(rename = "Main Dish")]
    #[sqlx(rename = "Main Dish")]
    MainDish,
    Breakfast,
    Snack,
    #[serde(rename = "Side Dish")]
    #[sqlx(rename = "Side Dish")]
    SideDish,
    Staple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dietary_preference")]
pub enum DietaryPreference {
    Vegetarian,
    #[serde(rename = "Non-Vegetarian")]
    #[sqlx(rename = "Non-Vegetarian")]
    NonVegetarian,
}

/// One servable dish. Rating fields are only ever touched by the rating
/// update; `is_active = false` is the soft-delete marker.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Uuid,
    pub meal_name: String,
    pub cuisine: Cuisine,
    pub category: MealCategory,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub dietary_preference: DietaryPreference,
    pub serving_size: Option<String>,
    pub allergens: Vec<String>,
    pub ingredients: Vec<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub nutrition_score: Option<f64>,
    pub popularity: i32,
    pub average_rating: f64,
    pub total_ratings: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod meal_serde_tests {
    use super::*;

    fn sample() -> Meal {
        Meal {
            id: Uuid::new_v4(),
            meal_name: "Chole Bhature".into(),
            cuisine: Cuisine::NorthIndian,
            category: MealCategory::MainDish,
            calories: 450.0,
            protein: 12.0,
            carbohydrates: Some(55.0),
            fats: None,
            dietary_preference: DietaryPreference::Vegetarian,
            serving_size: Some("1 plate".into()),
            allergens: vec!["gluten".into()],
            ingredients: Vec::new(),
            description: None,
            image_url: None,
            is_active: true,
            nutrition_score: Some(6.5),
            popularity: 3,
            average_rating: 4.25,
            total_ratings: 4,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_meal_serializes_camel_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"mealName\":\"Chole Bhature\""));
        assert!(json.contains("\"dietaryPreference\":\"Vegetarian\""));
        assert!(json.contains("\"averageRating\":4.25"));
        assert!(json.contains("\"isActive\":true"));
    }

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(
            serde_json::to_string(&Cuisine::StreetFood).unwrap(),
            "\"Street Food\""
        );
        assert_eq!(
            serde_json::to_string(&MealCategory::SideDish).unwrap(),
            "\"Side Dish\""
        );
        assert_eq!(
            serde_json::to_string(&DietaryPreference::NonVegetarian).unwrap(),
            "\"Non-Vegetarian\""
        );
        let parsed: Cuisine = serde_json::from_str("\"North Indian\"").unwrap();
        assert_eq!(parsed, Cuisine::NorthIndian);
    }
}
