use std::cmp::Ordering;

use tracing::{info, warn};

use super::dto::{RecommendQuery, RecommendResponse, RecommendedMeal};
use super::repo::MealFilter;
use super::repo_types::{Meal, MealCategory};
use crate::error::ApiError;
use crate::scorer::{CandidateMeal, ScoreResult};
use crate::state::AppState;
use crate::students::repo_types::Student;

/// Confidence attached to fallback entries, and the threshold a scored
/// meal must clear to survive the success path.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Derive the candidate filter from a student's stored preferences plus
/// the optional per-request category restriction.
fn candidate_filter(student: &Student, meal_type: Option<MealCategory>) -> MealFilter {
    let prefs = &student.preferences.0;
    let goals = &student.nutrition_goals.0;
    MealFilter {
        category: meal_type,
        dietary_preference: prefs.dietary_preference,
        cuisines: if prefs.cuisines.is_empty() {
            None
        } else {
            Some(prefs.cuisines.clone())
        },
        max_calories: goals.max_calories_per_meal,
        min_protein: goals.min_protein_per_meal,
        ..MealFilter::default()
    }
}

fn sort_desc_by_key(entries: &mut [RecommendedMeal], key: impl Fn(&RecommendedMeal) -> f64) {
    // Stable sort: candidates arrive popularity-desc/rating-desc from the
    // store and keep that relative order on equal composite scores.
    entries.sort_by(|a, b| {
        key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal)
    });
}

/// Success path: keep scorer-approved candidates above the confidence
/// threshold, ranked by a blend of confidence and stored rating.
pub(crate) fn rank_scored(
    meals: Vec<Meal>,
    results: &[ScoreResult],
    limit: usize,
) -> Vec<RecommendedMeal> {
    let mut picked: Vec<RecommendedMeal> = meals
        .into_iter()
        .zip(results)
        .filter(|(_, r)| r.recommended && r.confidence > FALLBACK_CONFIDENCE)
        .map(|(meal, r)| RecommendedMeal {
            meal,
            confidence: r.confidence,
            ml_recommended: true,
            fallback_recommendation: None,
        })
        .collect();
    sort_desc_by_key(&mut picked, |e| {
        0.7 * e.confidence + 0.3 * e.meal.average_rating
    });
    picked.truncate(limit);
    picked
}

/// Fallback path: all candidates ranked by stored rating and popularity,
/// each marked as a non-ML recommendation with a fixed confidence.
pub(crate) fn rank_fallback(meals: Vec<Meal>, limit: usize) -> Vec<RecommendedMeal> {
    let mut entries: Vec<RecommendedMeal> = meals
        .into_iter()
        .map(|meal| RecommendedMeal {
            meal,
            confidence: FALLBACK_CONFIDENCE,
            ml_recommended: false,
            fallback_recommendation: Some(true),
        })
        .collect();
    sort_desc_by_key(&mut entries, |e| {
        0.6 * e.meal.average_rating + 0.4 * e.meal.popularity as f64
    });
    entries.truncate(limit);
    entries
}

/// Produce a ranked, bounded recommendation list for one student.
///
/// An unknown student is the only hard error. A failed or malformed
/// scorer call never aborts the request; it only switches the ranking to
/// the fallback branch.
pub async fn recommend_for_student(
    st: &AppState,
    email: &str,
    query: RecommendQuery,
) -> Result<RecommendResponse, ApiError> {
    let student = Student::find_by_email(&st.db, email)
        .await?
        .ok_or(ApiError::NotFound("Student"))?;

    let filter = candidate_filter(&student, query.meal_type);
    let meals = Meal::list(&st.db, &filter).await?;
    let total_evaluated = meals.len();

    if meals.is_empty() {
        return Ok(RecommendResponse {
            success: true,
            message: Some("No meals found matching your preferences".into()),
            recommendations: Vec::new(),
            student_preferences: student.preferences.0,
            total_meals_evaluated: 0,
            ml_api_used: false,
        });
    }

    let candidates: Vec<CandidateMeal> = meals.iter().map(CandidateMeal::from).collect();
    let recommendations = match st.scorer.score_batch(&candidates).await {
        Ok(results) if results.len() == meals.len() => {
            info!(candidates = meals.len(), "ranking with scorer output");
            rank_scored(meals, &results, query.limit)
        }
        Ok(results) => {
            warn!(
                expected = total_evaluated,
                got = results.len(),
                "scorer result count mismatch, using fallback ranking"
            );
            rank_fallback(meals, query.limit)
        }
        Err(e) => {
            warn!(error = %e, "scorer unavailable, using fallback ranking");
            rank_fallback(meals, query.limit)
        }
    };

    let ml_api_used = recommendations
        .first()
        .map(|r| r.ml_recommended)
        .unwrap_or(false);

    Ok(RecommendResponse {
        success: true,
        message: None,
        recommendations,
        student_preferences: student.preferences.0,
        total_meals_evaluated: total_evaluated,
        ml_api_used,
    })
}

#[cfg(test)]
mod ranking_tests {
    use super::*;
    use crate::meals::repo_types::{Cuisine, DietaryPreference, MealCategory};
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn meal(name: &str, average_rating: f64, popularity: i32) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            meal_name: name.into(),
            cuisine: Cuisine::General,
            category: MealCategory::MainDish,
            calories: 300.0,
            protein: 10.0,
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
            popularity,
            average_rating,
            total_ratings: popularity,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn score(recommended: bool, confidence: f64) -> ScoreResult {
        ScoreResult {
            recommended,
            confidence,
        }
    }

    fn names(entries: &[RecommendedMeal]) -> Vec<&str> {
        entries.iter().map(|e| e.meal.meal_name.as_str()).collect()
    }

    #[test]
    fn test_scored_path_filters_threshold_and_rejections() {
        let meals = vec![
            meal("approved", 4.0, 5),
            meal("low-confidence", 5.0, 9),
            meal("rejected", 5.0, 9),
        ];
        let results = [score(true, 0.9), score(true, 0.5), score(false, 0.99)];
        let ranked = rank_scored(meals, &results, 10);
        assert_eq!(names(&ranked), vec!["approved"]);
        assert!(ranked[0].ml_recommended);
        assert_eq!(ranked[0].confidence, 0.9);
        assert!(ranked[0].fallback_recommendation.is_none());
    }

    #[test]
    fn test_scored_path_orders_by_blended_score() {
        // 0.7·confidence + 0.3·rating:
        //   strong-rating: 0.7·0.6 + 0.3·5.0 = 1.92
        //   strong-confidence: 0.7·0.99 + 0.3·2.0 = 1.293
        let meals = vec![meal("strong-confidence", 2.0, 1), meal("strong-rating", 5.0, 1)];
        let results = [score(true, 0.99), score(true, 0.6)];
        let ranked = rank_scored(meals, &results, 10);
        assert_eq!(names(&ranked), vec!["strong-rating", "strong-confidence"]);
    }

    #[test]
    fn test_scored_path_is_stable_on_ties() {
        // Identical composite scores: store order (first, second) is kept.
        let meals = vec![meal("first", 3.0, 2), meal("second", 3.0, 1)];
        let results = [score(true, 0.8), score(true, 0.8)];
        let ranked = rank_scored(meals, &results, 10);
        assert_eq!(names(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn test_scored_path_truncates_to_limit() {
        let meals = (0..5).map(|i| meal(&format!("m{i}"), 3.0, i)).collect();
        let results = vec![score(true, 0.9); 5];
        let ranked = rank_scored(meals, &results, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_fallback_orders_by_rating_and_popularity() {
        // 0.6·rating + 0.4·popularity:
        //   crowd-favourite: 0.6·3.0 + 0.4·10 = 5.8
        //   well-rated: 0.6·5.0 + 0.4·2 = 3.8
        //   unrated: 0.0
        let meals = vec![
            meal("unrated", 0.0, 0),
            meal("well-rated", 5.0, 2),
            meal("crowd-favourite", 3.0, 10),
        ];
        let ranked = rank_fallback(meals, 10);
        assert_eq!(
            names(&ranked),
            vec!["crowd-favourite", "well-rated", "unrated"]
        );
        for entry in &ranked {
            assert!(!entry.ml_recommended);
            assert_eq!(entry.confidence, 0.5);
            assert_eq!(entry.fallback_recommendation, Some(true));
        }
    }

    #[test]
    fn test_fallback_keeps_store_order_on_ties() {
        let meals = vec![meal("older", 4.0, 3), meal("newer", 4.0, 3)];
        let ranked = rank_fallback(meals, 10);
        assert_eq!(names(&ranked), vec!["older", "newer"]);
    }

    #[test]
    fn test_fallback_truncates_to_limit() {
        let meals = (0..7).map(|i| meal(&format!("m{i}"), 2.0, i)).collect::<Vec<_>>();
        assert_eq!(rank_fallback(meals, 3).len(), 3);
    }

    #[test]
    fn test_empty_candidates_rank_empty() {
        assert!(rank_scored(Vec::new(), &[], 10).is_empty());
        assert!(rank_fallback(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_candidate_filter_from_preferences() {
        use crate::students::repo_types::{NutritionGoals, Preferences};
        use sqlx::types::Json;

        let student = Student {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            preferences: Json(Preferences {
                cuisines: vec![Cuisine::SouthIndian],
                dietary_preference: Some(DietaryPreference::Vegetarian),
                categories: Vec::new(),
            }),
            allergies: Vec::new(),
            nutrition_goals: Json(NutritionGoals {
                max_calories_per_meal: Some(400.0),
                ..NutritionGoals::default()
            }),
            activity_level: Default::default(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let filter = candidate_filter(&student, Some(MealCategory::Breakfast));
        assert_eq!(filter.cuisines, Some(vec![Cuisine::SouthIndian]));
        assert_eq!(filter.dietary_preference, Some(DietaryPreference::Vegetarian));
        assert_eq!(filter.category, Some(MealCategory::Breakfast));
        assert_eq!(filter.max_calories, Some(400.0));
        assert_eq!(filter.min_protein, None);
        assert_eq!(filter.cuisine, None);
    }

    #[test]
    fn test_candidate_filter_empty_preferences_do_not_constrain() {
        use crate::students::repo_types::{NutritionGoals, Preferences};
        use sqlx::types::Json;

        let student = Student {
            id: Uuid::new_v4(),
            name: "Ravi".into(),
            email: "ravi@example.com".into(),
            preferences: Json(Preferences {
                cuisines: Vec::new(),
                dietary_preference: None,
                categories: Vec::new(),
            }),
            allergies: Vec::new(),
            nutrition_goals: Json(NutritionGoals::default()),
            activity_level: Default::default(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let filter = candidate_filter(&student, None);
        assert_eq!(filter.cuisines, None);
        assert_eq!(filter.dietary_preference, None);
        assert_eq!(filter.category, None);
        assert_eq!(filter.max_calories, None);
    }
}
