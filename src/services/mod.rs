pub mod activity_logger;
pub mod auth;
pub mod import;
pub mod pay;
pub mod reports;
pub mod workflow;

pub use activity_logger::ActivityLogger;
pub use auth::AuthService;
pub use import::ImportService;
pub use pay::PayService;
pub use reports::ReportService;
pub use workflow::WorkflowService;
