pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

pub use config::Config;
pub use database::repositories::ActivityRepository;
pub use error::AppError;
pub use services::{ActivityLogger, AuthService};

pub struct AppState {
    pub auth_service: AuthService,
    pub activity_repository: ActivityRepository,
    pub activity_logger: ActivityLogger,
}
