use std::env;

use actix_web::web;
use sqlx::postgres::PgPool;

use techtrackr_be::AppState;
use techtrackr_be::config::Config;
use techtrackr_be::database::repositories::{ActivityRepository, UserRepository};
use techtrackr_be::services::{ActivityLogger, AuthService};

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost:5432/techtrackr_test".to_string(),
        jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
        jwt_expiration_days: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
    }
}

/// Lazy pool: nothing connects until a query runs, so extractor- and
/// guard-level tests run without a live database.
pub fn lazy_pool(config: &Config) -> PgPool {
    PgPool::connect_lazy(&config.database_url).expect("valid database url")
}

pub fn app_state(config: &Config, pool: &PgPool) -> web::Data<AppState> {
    let user_repository = UserRepository::new(pool.clone());
    let activity_repository = ActivityRepository::new(pool.clone());

    web::Data::new(AppState {
        auth_service: AuthService::new(user_repository, config.clone()),
        activity_logger: ActivityLogger::new(activity_repository.clone()),
        activity_repository,
    })
}
