use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::aggregate::{week_id, WeeklyRow};
use crate::error::AppError;
use crate::models::{
    Category, CategoryTotal, ExerciseSummary, RecordRow, SettingRecordRow, UserStats,
};

#[instrument(skip(pool, password))]
pub async fn create_user(pool: &Pool<Sqlite>, user_id: &str, password: &str) -> Result<(), AppError> {
    info!("Creating new user");

    let existing = sqlx::query("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "This user id is already in use.".to_string(),
        ));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    sqlx::query("INSERT INTO users (id, password) VALUES (?, ?)")
        .bind(user_id)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(())
}

/// Returns true only for a known user id with a matching password. A missing
/// user and a wrong password are indistinguishable to the caller.
#[instrument(skip_all)]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    user_id: &str,
    password: &str,
) -> Result<bool, AppError> {
    info!("Authenticating user");

    let hash: Option<String> = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match hash {
        Some(hash) => match bcrypt::verify(password, &hash) {
            Ok(valid) => Ok(valid),
            Err(_) => Ok(false),
        },
        _ => Ok(false),
    }
}

#[instrument(skip(pool, new_password))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: &str,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");

    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Deletes the user's records, exercises, then the user row. Three
/// independent statements; a crash between them leaves partial state.
#[instrument(skip(pool))]
pub async fn delete_user_account(pool: &Pool<Sqlite>, user_id: &str) -> Result<(), AppError> {
    info!("Deleting user account");

    sqlx::query("DELETE FROM exercise_records WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM exercises WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_user_stats(pool: &Pool<Sqlite>, user_id: &str) -> Result<UserStats, AppError> {
    info!("Fetching user stats");

    let registration_date: Option<String> =
        sqlx::query_scalar("SELECT strftime('%Y-%m-%d', created_at) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    let workout_days: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT date(recorded_at)) FROM exercise_records WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(UserStats {
        registration_date,
        workout_days,
    })
}

#[instrument(skip(pool))]
pub async fn get_exercises_by_category(
    pool: &Pool<Sqlite>,
    user_id: &str,
    category: &Category,
) -> Result<Vec<ExerciseSummary>, AppError> {
    info!("Fetching exercises by category");

    let exercises = sqlx::query_as::<_, ExerciseSummary>(
        "SELECT id, name FROM exercises WHERE user_id = ? AND category = ?",
    )
    .bind(user_id)
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    Ok(exercises)
}

#[instrument(skip(pool))]
pub async fn create_exercise(
    pool: &Pool<Sqlite>,
    user_id: &str,
    name: &str,
    category: &Category,
) -> Result<i64, AppError> {
    info!("Creating exercise");

    let res = sqlx::query("INSERT INTO exercises (user_id, name, category) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(name)
        .bind(category.as_str())
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

/// Deletes the exercise's records first, then the exercise itself, both
/// scoped by the owning user.
#[instrument(skip(pool))]
pub async fn delete_exercise(
    pool: &Pool<Sqlite>,
    user_id: &str,
    exercise_id: i64,
) -> Result<(), AppError> {
    info!("Deleting exercise and its records");

    sqlx::query("DELETE FROM exercise_records WHERE user_id = ? AND exercise_id = ?")
        .bind(user_id)
        .bind(exercise_id)
        .execute(pool)
        .await?;

    let res = sqlx::query("DELETE FROM exercises WHERE user_id = ? AND id = ?")
        .bind(user_id)
        .bind(exercise_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Exercise not found.".to_string()));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn record_exercise_set(
    pool: &Pool<Sqlite>,
    user_id: &str,
    exercise_id: i64,
    weight: f64,
    reps: i64,
    recorded_at: NaiveDateTime,
) -> Result<(), AppError> {
    info!("Recording exercise set");

    let owned = sqlx::query("SELECT id FROM exercises WHERE id = ? AND user_id = ?")
        .bind(exercise_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    if owned.is_none() {
        return Err(AppError::NotFound("Exercise not found.".to_string()));
    }

    let total_load = weight * reps as f64;

    sqlx::query(
        "INSERT INTO exercise_records (user_id, exercise_id, weight, reps, total_load, recorded_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(exercise_id)
    .bind(weight)
    .bind(reps)
    .bind(total_load)
    .bind(recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_daily_records(
    pool: &Pool<Sqlite>,
    user_id: &str,
    date: NaiveDate,
) -> Result<Vec<RecordRow>, AppError> {
    info!("Fetching daily records");

    let records = sqlx::query_as::<_, RecordRow>(
        "SELECT e.category, e.name, r.weight, r.reps, r.total_load
         FROM exercise_records r
         JOIN exercises e ON r.exercise_id = e.id
         WHERE r.user_id = ? AND date(r.recorded_at) = ?",
    )
    .bind(user_id)
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[instrument(skip(pool))]
pub async fn get_todays_records(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<RecordRow>, AppError> {
    info!("Fetching today's records");

    let records = sqlx::query_as::<_, RecordRow>(
        "SELECT e.category, e.name, r.weight, r.reps, r.total_load
         FROM exercise_records r
         JOIN exercises e ON r.exercise_id = e.id
         WHERE r.user_id = ? AND date(r.recorded_at) = date('now')",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Daily rows including the record id, for the settings edit/delete view.
#[instrument(skip(pool))]
pub async fn get_daily_records_with_ids(
    pool: &Pool<Sqlite>,
    user_id: &str,
    date: NaiveDate,
) -> Result<Vec<SettingRecordRow>, AppError> {
    info!("Fetching daily records with ids");

    let records = sqlx::query_as::<_, SettingRecordRow>(
        "SELECT r.id, e.category, e.name AS exercise, r.weight, r.reps, r.total_load
         FROM exercise_records r
         JOIN exercises e ON r.exercise_id = e.id
         WHERE r.user_id = ? AND date(r.recorded_at) = ?",
    )
    .bind(user_id)
    .bind(date.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[instrument(skip(pool))]
pub async fn get_available_dates(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<String>, AppError> {
    info!("Fetching available record dates");

    let dates: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT date(recorded_at) AS date
         FROM exercise_records
         WHERE user_id = ?
         ORDER BY date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(dates)
}

#[instrument(skip(pool))]
pub async fn get_category_totals(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<CategoryTotal>, AppError> {
    info!("Fetching per-category totals");

    let totals = sqlx::query_as::<_, CategoryTotal>(
        "SELECT e.category, SUM(r.total_load) AS total_load
         FROM exercise_records r
         JOIN exercises e ON r.exercise_id = e.id
         WHERE r.user_id = ?
         GROUP BY e.category",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(totals)
}

#[instrument(skip(pool))]
pub async fn get_overall_total(pool: &Pool<Sqlite>, user_id: &str) -> Result<f64, AppError> {
    info!("Fetching overall total load");

    let total: f64 = sqlx::query_scalar(
        "SELECT CAST(COALESCE(SUM(total_load), 0) AS REAL)
         FROM exercise_records
         WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

#[derive(sqlx::FromRow)]
struct DayCategoryRow {
    day: String,
    category: String,
    total_load: f64,
}

/// Flat (week, category, total) rows for the weekly history view, summed per
/// bucket and sorted ascending by week. Week ids come from chrono's ISO week
/// so the SQL only groups by calendar day.
#[instrument(skip(pool))]
pub async fn get_weekly_rows(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<WeeklyRow>, AppError> {
    info!("Fetching weekly load rows");

    let rows = sqlx::query_as::<_, DayCategoryRow>(
        "SELECT date(r.recorded_at) AS day, e.category, SUM(r.total_load) AS total_load
         FROM exercise_records r
         JOIN exercises e ON r.exercise_id = e.id
         WHERE r.user_id = ?
         GROUP BY day, e.category
         ORDER BY day ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut buckets: std::collections::BTreeMap<(i64, String), f64> =
        std::collections::BTreeMap::new();
    for row in rows {
        let date = NaiveDate::parse_from_str(&row.day, "%Y-%m-%d")
            .map_err(|e| AppError::Internal(format!("Unparseable record date {}: {}", row.day, e)))?;
        *buckets.entry((week_id(date), row.category)).or_insert(0.0) += row.total_load;
    }

    Ok(buckets
        .into_iter()
        .map(|((week, category), total_load)| WeeklyRow {
            week,
            category,
            total_load,
        })
        .collect())
}

#[instrument(skip(pool))]
pub async fn update_exercise_record(
    pool: &Pool<Sqlite>,
    user_id: &str,
    record_id: i64,
    weight: f64,
    reps: i64,
) -> Result<(), AppError> {
    info!("Updating exercise record");

    let total_load = weight * reps as f64;

    let res = sqlx::query(
        "UPDATE exercise_records
         SET weight = ?, reps = ?, total_load = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(weight)
    .bind(reps)
    .bind(total_load)
    .bind(record_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Record not found.".to_string()));
    }

    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_exercise_record(
    pool: &Pool<Sqlite>,
    user_id: &str,
    record_id: i64,
) -> Result<(), AppError> {
    info!("Deleting exercise record");

    let res = sqlx::query("DELETE FROM exercise_records WHERE id = ? AND user_id = ?")
        .bind(record_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Record not found.".to_string()));
    }

    Ok(())
}
