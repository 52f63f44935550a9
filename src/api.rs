use chrono::{NaiveDate, Utc};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::aggregate::{combine_weekly, WeeklySummary};
use crate::auth::{issue_token, AuthUser};
use crate::config::AppConfig;
use crate::db;
use crate::error::AppError;
use crate::models::{
    Category, CategoryTotal, ExerciseSummary, RecordRow, SettingRecordRow, UserStats,
};
use crate::validation::{validate_password, validate_user_id, ValidateExt};

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = validate_user_id))]
    user_id: String,
    #[validate(custom(function = validate_password))]
    password: String,
    confirm_password: String,
}

#[post("/register", data = "<registration>")]
pub async fn api_register(
    registration: Json<RegisterRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<MessageResponse>>, AppError> {
    registration.validate_app()?;

    if registration.password != registration.confirm_password {
        return Err(AppError::Validation("Passwords do not match.".to_string()));
    }

    db::create_user(db, &registration.user_id, &registration.password).await?;

    Ok(Custom(
        Status::Created,
        Json(MessageResponse::new("Account created.")),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    user_id: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: String,
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Result<Json<LoginResponse>, AppError> {
    // Unknown id and wrong password produce the same response, so login
    // failures never reveal whether a user id exists.
    if !db::authenticate_user(db, &login.user_id, &login.password).await? {
        return Err(AppError::Authentication(
            "User id or password is incorrect.".to_string(),
        ));
    }

    let token = issue_token(&login.user_id, &config.secret_key)?;

    Ok(Json(LoginResponse {
        message: "Login successful.".to_string(),
        token,
        user_id: login.user_id.clone(),
    }))
}

#[get("/measure/exercises/<category>")]
pub async fn api_get_exercises(
    category: &str,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<ExerciseSummary>>, AppError> {
    let category = Category::from_str(category);
    let exercises = db::get_exercises_by_category(db, &user.user_id, &category).await?;

    Ok(Json(exercises))
}

#[derive(Deserialize)]
pub struct CreateExerciseRequest {
    name: String,
    category: Category,
}

#[post("/measure/exercises", data = "<exercise>")]
pub async fn api_add_exercise(
    exercise: Json<CreateExerciseRequest>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<MessageResponse>>, AppError> {
    if exercise.name.trim().is_empty() {
        return Err(AppError::Validation(
            "An exercise name is required.".to_string(),
        ));
    }

    db::create_exercise(db, &user.user_id, exercise.name.trim(), &exercise.category).await?;

    Ok(Custom(
        Status::Created,
        Json(MessageResponse::new("Exercise added.")),
    ))
}

#[delete("/measure/<exercise_id>")]
pub async fn api_delete_exercise(
    exercise_id: i64,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    db::delete_exercise(db, &user.user_id, exercise_id).await?;

    Ok(Json(MessageResponse::new("Exercise deleted.")))
}

#[derive(Deserialize)]
pub struct RecordSetRequest {
    exercise_id: i64,
    weight: f64,
    reps: i64,
}

#[post("/measure", data = "<record>")]
pub async fn api_record_set(
    record: Json<RecordSetRequest>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<MessageResponse>>, AppError> {
    validate_set(record.weight, record.reps)?;

    db::record_exercise_set(
        db,
        &user.user_id,
        record.exercise_id,
        record.weight,
        record.reps,
        Utc::now().naive_utc(),
    )
    .await?;

    Ok(Custom(
        Status::Created,
        Json(MessageResponse::new("Workout set recorded.")),
    ))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DailyLoadSummaryResponse {
    pub records: Vec<RecordRow>,
    #[serde(rename = "totalLoad")]
    pub total_load: f64,
}

#[get("/measure/daily-load-summary")]
pub async fn api_daily_load_summary(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DailyLoadSummaryResponse>, AppError> {
    let records = db::get_todays_records(db, &user.user_id).await?;
    let total_load = records.iter().map(|r| r.total_load).sum();

    Ok(Json(DailyLoadSummaryResponse {
        records,
        total_load,
    }))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DailyHistoryResponse {
    #[serde(rename = "dailyHistory")]
    pub daily_history: Vec<RecordRow>,
}

#[get("/history/daily?<date>")]
pub async fn api_history_daily(
    date: Option<String>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DailyHistoryResponse>, AppError> {
    let date = parse_date(date)?;
    let daily_history = db::get_daily_records(db, &user.user_id, date).await?;

    Ok(Json(DailyHistoryResponse { daily_history }))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DatesResponse {
    pub dates: Vec<String>,
}

#[get("/history/dates")]
pub async fn api_history_dates(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DatesResponse>, AppError> {
    let dates = db::get_available_dates(db, &user.user_id).await?;

    Ok(Json(DatesResponse { dates }))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TotalsResponse {
    #[serde(rename = "categoryTotals")]
    pub category_totals: Vec<CategoryTotal>,
    #[serde(rename = "overallTotal")]
    pub overall_total: f64,
}

#[get("/history/totals")]
pub async fn api_history_totals(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TotalsResponse>, AppError> {
    let category_totals = db::get_category_totals(db, &user.user_id).await?;
    let overall_total = db::get_overall_total(db, &user.user_id).await?;

    Ok(Json(TotalsResponse {
        category_totals,
        overall_total,
    }))
}

#[derive(Serialize)]
pub struct WeeklyDataResponse {
    #[serde(rename = "weeklyData")]
    pub weekly_data: Vec<WeeklySummary>,
}

#[get("/history/weekly")]
pub async fn api_history_weekly(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<WeeklyDataResponse>, AppError> {
    let rows = db::get_weekly_rows(db, &user.user_id).await?;
    let weekly_data = combine_weekly(&rows);

    Ok(Json(WeeklyDataResponse { weekly_data }))
}

#[get("/setting/stats")]
pub async fn api_setting_stats(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<UserStats>, AppError> {
    let stats = db::get_user_stats(db, &user.user_id).await?;

    Ok(Json(stats))
}

#[get("/setting/dates")]
pub async fn api_setting_dates(
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<DatesResponse>, AppError> {
    let dates = db::get_available_dates(db, &user.user_id).await?;

    Ok(Json(DatesResponse { dates }))
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SettingDailyResponse {
    #[serde(rename = "dailyHistory")]
    pub daily_history: Vec<SettingRecordRow>,
}

#[get("/setting/daily?<date>")]
pub async fn api_setting_daily(
    date: Option<String>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SettingDailyResponse>, AppError> {
    let date = parse_date(date)?;
    let daily_history = db::get_daily_records_with_ids(db, &user.user_id, date).await?;

    Ok(Json(SettingDailyResponse { daily_history }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    current_password: String,
    new_password: String,
}

#[put("/setting/account/password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    if !db::authenticate_user(db, &user.user_id, &password.current_password).await? {
        return Err(AppError::Authentication(
            "Current password is incorrect.".to_string(),
        ));
    }

    validate_password(&password.new_password)
        .map_err(|e| AppError::Validation(e.message.map(|m| m.to_string()).unwrap_or_default()))?;

    db::update_user_password(db, &user.user_id, &password.new_password).await?;

    Ok(Json(MessageResponse::new("Password changed.")))
}

#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    password: String,
}

#[delete("/setting/account", data = "<request>")]
pub async fn api_delete_account(
    request: Json<DeleteAccountRequest>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    if !db::authenticate_user(db, &user.user_id, &request.password).await? {
        return Err(AppError::Authentication(
            "Password is incorrect.".to_string(),
        ));
    }

    db::delete_user_account(db, &user.user_id).await?;

    Ok(Json(MessageResponse::new("Account deleted.")))
}

#[derive(Deserialize)]
pub struct UpdateRecordRequest {
    record_id: i64,
    weight: f64,
    reps: i64,
}

#[put("/setting/records", data = "<update>")]
pub async fn api_update_record(
    update: Json<UpdateRecordRequest>,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_set(update.weight, update.reps)?;

    db::update_exercise_record(db, &user.user_id, update.record_id, update.weight, update.reps)
        .await?;

    Ok(Json(MessageResponse::new("Record updated.")))
}

#[delete("/setting/records/<record_id>")]
pub async fn api_delete_record(
    record_id: i64,
    user: AuthUser,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MessageResponse>, AppError> {
    db::delete_exercise_record(db, &user.user_id, record_id).await?;

    Ok(Json(MessageResponse::new("Record deleted.")))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

fn validate_set(weight: f64, reps: i64) -> Result<(), AppError> {
    if !weight.is_finite() || weight <= 0.0 || reps <= 0 {
        return Err(AppError::Validation(
            "Weight and reps must be positive.".to_string(),
        ));
    }
    Ok(())
}

fn parse_date(date: Option<String>) -> Result<NaiveDate, AppError> {
    let date = date.ok_or_else(|| {
        AppError::Validation("A date query parameter is required.".to_string())
    })?;

    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date must be in YYYY-MM-DD format.".to_string()))
}

#[catch(404)]
pub fn not_found_api(_req: &Request) -> Custom<Json<serde_json::Value>> {
    Custom(
        Status::NotFound,
        Json(serde_json::json!({ "error": "Not Found" })),
    )
}

// Rocket reports undeserializable JSON bodies as 422; the API treats them as
// plain bad requests.
#[catch(422)]
pub fn unprocessable_api(_req: &Request) -> Custom<Json<serde_json::Value>> {
    Custom(
        Status::BadRequest,
        Json(serde_json::json!({ "error": "Malformed request body." })),
    )
}

#[catch(500)]
pub fn internal_error_api(_req: &Request) -> Custom<Json<serde_json::Value>> {
    Custom(
        Status::InternalServerError,
        Json(serde_json::json!({ "error": "An unexpected server error occurred." })),
    )
}
