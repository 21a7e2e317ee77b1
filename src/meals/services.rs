use anyhow::Context;
use tracing::{debug, warn};
use uuid::Uuid;

use super::dto::CreateMealRequest;
use super::repo_types::Meal;
use crate::state::AppState;
use crate::students::repo_types::Student;

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fold one star value into the running mean. The result is re-rounded to
/// two decimals on every update; the accumulated drift is an accepted
/// property of the stored average.
pub(crate) fn next_rating(average: f64, total: i32, stars: f64) -> (f64, i32) {
    let new_total = total + 1;
    let new_average = round2((average * total as f64 + stars) / new_total as f64);
    (new_average, new_total)
}

/// Apply one rating to a meal and mirror the like/dislike signal into the
/// rater's history. Returns None for an unknown meal id.
///
/// The meal row is locked for the read-compute-write, so concurrent
/// ratings for the same meal serialize rather than lose updates. The
/// history mirror is best-effort: an unknown rater email records nothing
/// and never fails the rating.
pub async fn rate_meal(
    st: &AppState,
    meal_id: Uuid,
    stars: f64,
    rater_email: Option<&str>,
) -> anyhow::Result<Option<(f64, i32)>> {
    let mut tx = st.db.begin().await.context("begin rating tx")?;
    let Some((average, total)) = Meal::rating_for_update(&mut tx, meal_id).await? else {
        return Ok(None);
    };
    let (new_average, new_total) = next_rating(average, total, stars);
    Meal::apply_rating_tx(&mut tx, meal_id, new_average, new_total).await?;
    tx.commit().await.context("commit rating tx")?;

    if let Some(email) = rater_email {
        match Student::find_by_email(&st.db, email).await {
            Ok(Some(student)) => {
                let liked = stars >= 3.0;
                if let Err(e) =
                    Student::record_feedback(&st.db, student.id, meal_id, liked).await
                {
                    warn!(error = %e, %meal_id, email, "history mirror failed");
                }
            }
            Ok(None) => debug!(email, "rater has no profile, skipping history mirror"),
            Err(e) => warn!(error = %e, email, "rater lookup failed"),
        }
    }

    Ok(Some((new_average, new_total)))
}

/// Row-level best-effort import: invalid rows are skipped, valid rows are
/// committed, and the count reflects committed rows only.
pub async fn import_meals(
    st: &AppState,
    rows: Vec<serde_json::Value>,
) -> anyhow::Result<usize> {
    let mut imported = 0;
    for (index, row) in rows.into_iter().enumerate() {
        let req: CreateMealRequest = match serde_json::from_value(row) {
            Ok(req) => req,
            Err(e) => {
                warn!(index, error = %e, "skipping malformed import row");
                continue;
            }
        };
        let violations = req.validate();
        if !violations.is_empty() {
            warn!(index, ?violations, "skipping invalid import row");
            continue;
        }
        match Meal::create(&st.db, &req).await {
            Ok(_) => imported += 1,
            Err(e) => warn!(index, error = %e, "import row insert failed"),
        }
    }
    Ok(imported)
}
