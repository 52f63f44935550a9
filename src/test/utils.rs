use crate::api::LoginResponse;
use crate::config::AppConfig;
use crate::db;
use crate::error::AppError;
use crate::models::Category;
use chrono::{Duration, NaiveDateTime, Utc};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::json;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Once;

static INIT: Once = Once::new();

pub static STANDARD_PASSWORD: &str = "Password123";
pub const TEST_SECRET: &str = "test-secret-key";
pub const TEST_ORIGIN: &str = "http://localhost:3000";

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    exercises: Vec<TestExercise>,
    records: Vec<TestRecord>,
}

pub struct TestUser {
    pub user_id: String,
    pub password: String,
}

pub struct TestExercise {
    pub user_id: String,
    pub name: String,
    pub category: String,
}

pub struct TestRecord {
    pub user_id: String,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: i64,
    pub recorded_at: NaiveDateTime,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(self, user_id: &str) -> Self {
        self.user_with_password(user_id, STANDARD_PASSWORD)
    }

    pub fn user_with_password(mut self, user_id: &str, password: &str) -> Self {
        self.users.push(TestUser {
            user_id: user_id.to_string(),
            password: password.to_string(),
        });
        self
    }

    pub fn exercise(mut self, user_id: &str, name: &str, category: &str) -> Self {
        self.exercises.push(TestExercise {
            user_id: user_id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
        });
        self
    }

    pub fn record(self, user_id: &str, exercise_name: &str, weight: f64, reps: i64) -> Self {
        self.record_at(user_id, exercise_name, weight, reps, Utc::now().naive_utc())
    }

    pub fn record_at(
        mut self,
        user_id: &str,
        exercise_name: &str,
        weight: f64,
        reps: i64,
        recorded_at: NaiveDateTime,
    ) -> Self {
        self.records.push(TestRecord {
            user_id: user_id.to_string(),
            exercise_name: exercise_name.to_string(),
            weight,
            reps,
            recorded_at,
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });

        let pool = SqlitePool::connect("sqlite::memory:").await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        for user in &self.users {
            db::create_user(&pool, &user.user_id, &user.password).await?;
        }

        let mut exercise_id_map: HashMap<(String, String), i64> = HashMap::new();
        for exercise in &self.exercises {
            let id = db::create_exercise(
                &pool,
                &exercise.user_id,
                &exercise.name,
                &Category::from_str(&exercise.category),
            )
            .await?;

            exercise_id_map.insert((exercise.user_id.clone(), exercise.name.clone()), id);
        }

        for record in &self.records {
            let exercise_id = exercise_id_map
                [&(record.user_id.clone(), record.exercise_name.clone())];

            db::record_exercise_set(
                &pool,
                &record.user_id,
                exercise_id,
                record.weight,
                record.reps,
                record.recorded_at,
            )
            .await?;
        }

        Ok(TestDb {
            pool,
            exercise_id_map,
        })
    }
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    exercise_id_map: HashMap<(String, String), i64>,
}

impl TestDb {
    pub fn exercise_id(&self, user_id: &str, name: &str) -> Option<i64> {
        self.exercise_id_map
            .get(&(user_id.to_string(), name.to_string()))
            .copied()
    }

    pub async fn record_ids(&self, user_id: &str) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM exercise_records WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        secret_key: TEST_SECRET.to_string(),
        allowed_origin: TEST_ORIGIN.to_string(),
    }
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let rocket = crate::init_rocket(test_db.pool.clone(), test_config()).await;
    let client = Client::tracked(rocket)
        .await
        .expect("valid rocket instance");
    (client, test_db)
}

pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .user("alice01")
        .user("bobby9")
        .exercise("alice01", "Bench Press", "chest")
        .exercise("alice01", "Deadlift", "back")
        .exercise("bobby9", "Squat", "legs")
        .build()
        .await
        .expect("Failed to build test DB")
}

pub async fn login_test_user(client: &Client, user_id: &str, password: &str) -> String {
    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "user_id": user_id, "password": password }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    let login: LoginResponse = serde_json::from_str(&body).unwrap();
    login.token
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

pub fn days_ago(days: i64) -> NaiveDateTime {
    (Utc::now() - Duration::days(days)).naive_utc()
}
