use chrono::Utc;
use rocket::http::{ContentType, Status};
use serde_json::json;

use crate::api::{DatesResponse, SettingDailyResponse};
use crate::models::UserStats;
use crate::test::utils::{
    bearer, create_standard_test_db, days_ago, login_test_user, setup_test_client, TestDbBuilder,
    STANDARD_PASSWORD,
};

#[rocket::async_test]
async fn stats_report_registration_date_and_workout_days() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .exercise("alice01", "Bench Press", "chest")
        .record_at("alice01", "Bench Press", 60.0, 10, days_ago(2))
        .record_at("alice01", "Bench Press", 60.0, 8, days_ago(2))
        .record_at("alice01", "Bench Press", 62.5, 8, days_ago(1))
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .get("/api/setting/stats")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    let stats: UserStats = serde_json::from_str(&body).unwrap();

    let today = Utc::now().format("%Y-%m-%d").to_string();
    assert_eq!(stats.registration_date.as_deref(), Some(today.as_str()));
    // Two sets on one day and one on another counts as two workout days.
    assert_eq!(stats.workout_days, 2);
}

#[rocket::async_test]
async fn setting_daily_rows_carry_record_ids() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .exercise("alice01", "Bench Press", "chest")
        .record("alice01", "Bench Press", 60.0, 10)
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, test_db) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;
    let record_ids = test_db.record_ids("alice01").await.unwrap();

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let response = client
        .get(format!("/api/setting/daily?date={}", today))
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.unwrap();
    let daily: SettingDailyResponse = serde_json::from_str(&body).unwrap();

    assert_eq!(daily.daily_history.len(), 1);
    assert_eq!(daily.daily_history[0].id, record_ids[0]);
    assert_eq!(daily.daily_history[0].exercise, "Bench Press");
    assert_eq!(daily.daily_history[0].total_load, 600.0);
}

#[rocket::async_test]
async fn password_change_requires_the_current_password() {
    let test_db = create_standard_test_db().await;
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .put("/api/setting/account/password")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(
            json!({ "currentPassword": "WrongPass1", "newPassword": "NewPassword1" }).to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn password_change_rejects_a_weak_new_password() {
    let test_db = create_standard_test_db().await;
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .put("/api/setting/account/password")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(
            json!({ "currentPassword": STANDARD_PASSWORD, "newPassword": "weakpass" }).to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn password_change_takes_effect_immediately() {
    let test_db = create_standard_test_db().await;
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .put("/api/setting/account/password")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(
            json!({ "currentPassword": STANDARD_PASSWORD, "newPassword": "NewPassword1" })
                .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // The old password no longer works.
    let old_login = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "user_id": "alice01", "password": STANDARD_PASSWORD }).to_string())
        .dispatch()
        .await;
    assert_eq!(old_login.status(), Status::Unauthorized);

    let new_token = login_test_user(&client, "alice01", "NewPassword1").await;
    assert!(!new_token.is_empty());
}

#[rocket::async_test]
async fn record_update_recomputes_total_load() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .exercise("alice01", "Bench Press", "chest")
        .record("alice01", "Bench Press", 60.0, 10)
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, test_db) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;
    let record_id = test_db.record_ids("alice01").await.unwrap()[0];

    let response = client
        .put("/api/setting/records")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({ "record_id": record_id, "weight": 70.0, "reps": 5 }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let response = client
        .get(format!("/api/setting/daily?date={}", today))
        .header(bearer(&token))
        .dispatch()
        .await;
    let body = response.into_string().await.unwrap();
    let daily: SettingDailyResponse = serde_json::from_str(&body).unwrap();

    assert_eq!(daily.daily_history[0].weight, 70.0);
    assert_eq!(daily.daily_history[0].reps, 5);
    assert_eq!(daily.daily_history[0].total_load, 350.0);
}

#[rocket::async_test]
async fn record_update_rejects_foreign_and_missing_records() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .user("bobby9")
        .exercise("bobby9", "Squat", "legs")
        .record("bobby9", "Squat", 100.0, 5)
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, test_db) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;
    let foreign_record = test_db.record_ids("bobby9").await.unwrap()[0];

    // Another user's record looks like a missing one.
    let response = client
        .put("/api/setting/records")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({ "record_id": foreign_record, "weight": 1.0, "reps": 1 }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .put("/api/setting/records")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({ "record_id": 999_999, "weight": 1.0, "reps": 1 }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn deleting_a_record_is_permanent() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .exercise("alice01", "Bench Press", "chest")
        .record("alice01", "Bench Press", 60.0, 10)
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, test_db) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;
    let record_id = test_db.record_ids("alice01").await.unwrap()[0];

    let response = client
        .delete(format!("/api/setting/records/{}", record_id))
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let response = client
        .get(format!("/api/setting/daily?date={}", today))
        .header(bearer(&token))
        .dispatch()
        .await;
    let body = response.into_string().await.unwrap();
    let daily: SettingDailyResponse = serde_json::from_str(&body).unwrap();
    assert!(daily.daily_history.is_empty());

    // A second delete reports not found.
    let response = client
        .delete(format!("/api/setting/records/{}", record_id))
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn account_deletion_requires_the_password() {
    let test_db = create_standard_test_db().await;
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .delete("/api/setting/account")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({ "password": "WrongPass1" }).to_string())
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Unauthorized);

    // The account is still usable.
    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;
    assert!(!token.is_empty());
}

#[rocket::async_test]
async fn account_deletion_removes_the_user_and_all_data() {
    let test_db = TestDbBuilder::new()
        .user("alice01")
        .exercise("alice01", "Bench Press", "chest")
        .record("alice01", "Bench Press", 60.0, 10)
        .build()
        .await
        .expect("Failed to build test DB");
    let (client, _) = setup_test_client(test_db).await;

    let token = login_test_user(&client, "alice01", STANDARD_PASSWORD).await;

    let response = client
        .delete("/api/setting/account")
        .header(ContentType::JSON)
        .header(bearer(&token))
        .body(json!({ "password": STANDARD_PASSWORD }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Login now fails with the same generic message as any bad credential.
    let login = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "user_id": "alice01", "password": STANDARD_PASSWORD }).to_string())
        .dispatch()
        .await;
    assert_eq!(login.status(), Status::Unauthorized);
    let body = login.into_string().await.unwrap();
    assert!(body.contains("User id or password is incorrect."));

    // Data queries through the still-valid token come back empty.
    let response = client
        .get("/api/history/dates")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_string().await.unwrap();
    let dates: DatesResponse = serde_json::from_str(&body).unwrap();
    assert!(dates.dates.is_empty());
}
