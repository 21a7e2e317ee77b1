use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{ActivityLevel, NutritionGoals, Preferences, Student};
use crate::meals::repo_types::Meal;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Profile write. This is a whole-document replace keyed by email: every
/// field omitted here reverts to its default on the stored row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub nutrition_goals: NutritionGoals,
    #[serde(default)]
    pub activity_level: ActivityLevel,
}

impl UpsertStudentRequest {
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        match self.email.as_deref().map(str::trim) {
            None | Some("") => violations.push("email is required".into()),
            Some(email) if !is_valid_email(email) => {
                violations.push("email must be a valid address".into())
            }
            Some(_) => {}
        }
        if self.name.as_deref().map(str::trim).unwrap_or("").is_empty() {
            violations.push("name is required".into());
        }

        let goals = &self.nutrition_goals;
        if matches!(goals.calories_per_day, Some(v) if !(1000.0..=5000.0).contains(&v)) {
            violations.push("caloriesPerDay must be between 1000 and 5000".into());
        }
        if matches!(goals.protein_grams_per_day, Some(v) if !(20.0..=200.0).contains(&v)) {
            violations.push("proteinGramsPerDay must be between 20 and 200".into());
        }
        if matches!(goals.max_calories_per_meal, Some(v) if !(100.0..=1000.0).contains(&v)) {
            violations.push("maxCaloriesPerMeal must be between 100 and 1000".into());
        }
        if matches!(goals.min_protein_per_meal, Some(v) if !(5.0..=50.0).contains(&v)) {
            violations.push("minProteinPerMeal must be between 5 and 50".into());
        }
        violations
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub meal_id: Option<String>,
    pub liked: Option<bool>,
}

impl FeedbackRequest {
    /// Both fields are required; the meal id must parse. The referenced
    /// meal itself is never checked for existence (weak reference).
    pub fn validate(&self) -> Result<(Uuid, bool), Vec<String>> {
        let mut violations = Vec::new();
        let meal_id = match self.meal_id.as_deref() {
            None | Some("") => {
                violations.push("mealId and liked (boolean) are required".into());
                None
            }
            Some(raw) => match raw.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(_) => {
                    violations.push("mealId must be a valid id".into());
                    None
                }
            },
        };
        if self.liked.is_none() {
            violations.push("liked (boolean) is required".into());
        }
        match (meal_id, self.liked) {
            (Some(id), Some(liked)) if violations.is_empty() => Ok((id, liked)),
            _ => Err(violations),
        }
    }
}

// --- responses ---

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub student: Student,
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub success: bool,
    pub count: usize,
    pub students: Vec<Student>,
}

/// One history entry with its meal reference resolved. `meal` is null when
/// the referenced meal no longer resolves.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub meal: Option<Meal>,
    pub meal_id: Uuid,
    pub liked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: Student,
    pub meal_history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct StudentProfileResponse {
    pub success: bool,
    pub student: StudentProfile,
}
