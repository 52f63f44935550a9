#[macro_use]
extern crate rocket;

mod aggregate;
mod api;
mod auth;
mod config;
mod cors;
mod db;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_add_exercise, api_change_password, api_daily_load_summary, api_delete_account,
    api_delete_exercise, api_delete_record, api_get_exercises, api_history_daily,
    api_history_dates, api_history_totals, api_history_weekly, api_login, api_record_set,
    api_register, api_setting_daily, api_setting_dates, api_setting_stats, api_update_record,
    health, internal_error_api, not_found_api, unprocessable_api,
};
use auth::unauthorized_api;
use config::{load_environment, AppConfig};
use cors::{all_options, Cors};
use rocket::{Build, Rocket};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use telemetry::{init_tracing, TelemetryFairing};
use tracing::{error, info};

#[launch]
async fn rocket() -> _ {
    init_tracing();
    load_environment();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Database migration failed: {}", e);
            std::process::exit(1);
        }
    }

    init_rocket(pool, config).await
}

pub async fn init_rocket(pool: Pool<Sqlite>, config: AppConfig) -> Rocket<Build> {
    info!("Starting workout tracker");

    rocket::build()
        .manage(pool)
        .manage(config)
        .mount(
            "/api",
            routes![
                api_register,
                api_login,
                api_get_exercises,
                api_add_exercise,
                api_delete_exercise,
                api_record_set,
                api_daily_load_summary,
                api_history_daily,
                api_history_dates,
                api_history_totals,
                api_history_weekly,
                api_setting_stats,
                api_setting_dates,
                api_setting_daily,
                api_change_password,
                api_delete_account,
                api_update_record,
                api_delete_record,
                all_options,
                health,
            ],
        )
        .register(
            "/",
            catchers![
                unauthorized_api,
                not_found_api,
                unprocessable_api,
                internal_error_api
            ],
        )
        .attach(Cors)
        .attach(TelemetryFairing)
}
