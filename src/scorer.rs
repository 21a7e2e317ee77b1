use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::MlConfig;
use crate::meals::repo_types::{Cuisine, DietaryPreference, Meal, MealCategory};

/// One meal in the shape the prediction service expects.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateMeal {
    pub meal_name: String,
    pub calories: f64,
    pub protein: f64,
    pub cuisine: Cuisine,
    pub category: MealCategory,
    pub diet: DietaryPreference,
}

impl From<&Meal> for CandidateMeal {
    fn from(meal: &Meal) -> Self {
        Self {
            meal_name: meal.meal_name.clone(),
            calories: meal.calories,
            protein: meal.protein,
            cuisine: meal.cuisine,
            category: meal.category,
            diet: meal.dietary_preference,
        }
    }
}

/// Per-meal verdict, positionally aligned with the submitted batch.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ScoreResult {
    pub recommended: bool,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
struct PredictBatchRequest<'a> {
    meals: &'a [CandidateMeal],
}

#[derive(Debug, Deserialize)]
struct PredictBatchResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    results: Option<Vec<ScoreResult>>,
}

impl PredictBatchResponse {
    /// A body without a results array, or with an explicit failure flag,
    /// counts as a failed call. No fallback scores are invented here.
    fn into_results(self) -> anyhow::Result<Vec<ScoreResult>> {
        if self.success == Some(false) {
            anyhow::bail!("scorer reported failure");
        }
        self.results
            .ok_or_else(|| anyhow::anyhow!("scorer response missing results"))
    }
}

#[async_trait]
pub trait ScorerClient: Send + Sync {
    async fn score_batch(&self, meals: &[CandidateMeal]) -> anyhow::Result<Vec<ScoreResult>>;
}

/// HTTP client for the external prediction service.
#[derive(Clone)]
pub struct MlScorer {
    http: reqwest::Client,
    base_url: String,
}

impl MlScorer {
    pub fn new(config: &MlConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build scorer http client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ScorerClient for MlScorer {
    async fn score_batch(&self, meals: &[CandidateMeal]) -> anyhow::Result<Vec<ScoreResult>> {
        let url = format!("{}/predict_batch", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&PredictBatchRequest { meals })
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()
            .context("scorer returned error status")?;

        let body: PredictBatchResponse =
            response.json().await.context("decode scorer response")?;
        body.into_results()
    }
}

#[cfg(test)]
mod scorer_tests {
    use super::*;

    #[test]
    fn test_candidate_wire_shape() {
        let candidate = CandidateMeal {
            meal_name: "Masala Dosa".into(),
            calories: 250.0,
            protein: 6.0,
            cuisine: Cuisine::SouthIndian,
            category: MealCategory::Breakfast,
            diet: DietaryPreference::Vegetarian,
        };
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(json.contains("\"meal_name\":\"Masala Dosa\""));
        assert!(json.contains("\"cuisine\":\"South Indian\""));
        assert!(json.contains("\"category\":\"Breakfast\""));
        assert!(json.contains("\"diet\":\"Vegetarian\""));
    }

    #[test]
    fn test_well_formed_response_decodes_positionally() {
        let body: PredictBatchResponse = serde_json::from_str(
            r#"{"success": true, "results": [
                {"recommended": true, "confidence": 0.92},
                {"recommended": false, "confidence": 0.13}
            ]}"#,
        )
        .unwrap();
        let results = body.into_results().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].recommended);
        assert_eq!(results[1].confidence, 0.13);
    }

    #[test]
    fn test_missing_results_is_a_failure() {
        let body: PredictBatchResponse =
            serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(body.into_results().is_err());
    }

    #[test]
    fn test_explicit_failure_flag_is_a_failure() {
        let body: PredictBatchResponse = serde_json::from_str(
            r#"{"success": false, "results": [{"recommended": true, "confidence": 0.9}]}"#,
        )
        .unwrap();
        assert!(body.into_results().is_err());
    }
}
