use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use techtrackr_be::database::{
    init_database,
    repositories::{
        ActivityRepository, JobRepository, MileageRateRepository, PayPeriodRepository,
        PlatformRepository, TechnicianRepository, TimeEntryRepository, UserRepository,
    },
};
use techtrackr_be::handlers::{
    auth, imports, jobs, mileage_rates, pay_periods, reports, technicians, time_entries,
};
use techtrackr_be::middleware::RequestId;
use techtrackr_be::services::{
    ActivityLogger, AuthService, ImportService, PayService, ReportService, WorkflowService,
};
use techtrackr_be::{AppState, Config};

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().body("TechTrackr API v1.0")
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("Starting TechTrackr API server...");

    // Load configuration
    let config = Config::from_env()?;
    log::info!(
        "Configuration loaded (environment: {})",
        config.environment
    );

    // Initialize database
    let pool = init_database(&config.database_url).await?;
    log::info!("Database initialized");

    // Initialize repositories and services
    let user_repository = UserRepository::new(pool.clone());
    let technician_repository = TechnicianRepository::new(pool.clone());
    let platform_repository = PlatformRepository::new(pool.clone());
    let job_repository = JobRepository::new(pool.clone());
    let time_entry_repository = TimeEntryRepository::new(pool.clone());
    let pay_period_repository = PayPeriodRepository::new(pool.clone());
    let mileage_rate_repository = MileageRateRepository::new(pool.clone());
    let activity_repository = ActivityRepository::new(pool.clone());

    let auth_service = AuthService::new(user_repository.clone(), config.clone());
    let activity_logger = ActivityLogger::new(activity_repository.clone());
    let workflow_service = WorkflowService::new(pool.clone());
    let pay_service = PayService::new(pool.clone());
    let report_service = ReportService::new(pool.clone());
    let import_service = ImportService::new(pool.clone());

    let app_state = web::Data::new(AppState {
        auth_service,
        activity_repository,
        activity_logger,
    });
    let user_repo_data = web::Data::new(user_repository);
    let technician_repo_data = web::Data::new(technician_repository);
    let platform_repo_data = web::Data::new(platform_repository);
    let job_repo_data = web::Data::new(job_repository);
    let time_entry_repo_data = web::Data::new(time_entry_repository);
    let pay_period_repo_data = web::Data::new(pay_period_repository);
    let mileage_rate_repo_data = web::Data::new(mileage_rate_repository);
    let workflow_data = web::Data::new(workflow_service);
    let pay_service_data = web::Data::new(pay_service);
    let report_service_data = web::Data::new(report_service);
    let import_service_data = web::Data::new(import_service);
    let config_data = web::Data::new(config.clone());

    let server_address = config.server_address();
    log::info!("Server starting on http://{}", server_address);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(user_repo_data.clone())
            .app_data(technician_repo_data.clone())
            .app_data(platform_repo_data.clone())
            .app_data(job_repo_data.clone())
            .app_data(time_entry_repo_data.clone())
            .app_data(pay_period_repo_data.clone())
            .app_data(mileage_rate_repo_data.clone())
            .app_data(workflow_data.clone())
            .app_data(pay_service_data.clone())
            .app_data(report_service_data.clone())
            .app_data(import_service_data.clone())
            .app_data(config_data.clone())
            .wrap(
                Cors::default()
                    .allowed_origin("http://localhost:3000")
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestId)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(hello)
            .service(health)
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(auth::register))
                            .route("/login", web::post().to(auth::login))
                            .route("/me", web::get().to(auth::me))
                            .route("/change-password", web::post().to(auth::change_password)),
                    )
                    .service(
                        web::scope("/technicians")
                            .route("", web::post().to(technicians::create_technician))
                            .route("", web::get().to(technicians::get_technicians))
                            .route("/{id}", web::get().to(technicians::get_technician))
                            .route("/{id}", web::put().to(technicians::update_technician)),
                    )
                    .service(
                        web::scope("/platforms")
                            .route("", web::post().to(jobs::create_platform))
                            .route("", web::get().to(jobs::get_platforms)),
                    )
                    .service(
                        web::scope("/jobs")
                            .route("", web::post().to(jobs::create_job))
                            .route("", web::get().to(jobs::get_jobs))
                            .route("/{id}", web::get().to(jobs::get_job))
                            .route("/{id}", web::put().to(jobs::update_job))
                            .route("/{id}/pay", web::get().to(jobs::get_job_pay)),
                    )
                    .service(
                        web::scope("/time-entries")
                            .route("", web::post().to(time_entries::create_time_entry))
                            .route("", web::get().to(time_entries::list_time_entries))
                            .route("/bulk-submit", web::post().to(time_entries::bulk_submit))
                            .route("/bulk-verify", web::post().to(time_entries::bulk_verify))
                            .route("/my-summary", web::get().to(time_entries::my_summary))
                            .route("/{id}", web::get().to(time_entries::get_time_entry))
                            .route("/{id}", web::put().to(time_entries::update_time_entry))
                            .route("/{id}", web::delete().to(time_entries::delete_time_entry))
                            .route(
                                "/{id}/submit",
                                web::post().to(time_entries::submit_time_entry),
                            )
                            .route(
                                "/{id}/verify",
                                web::post().to(time_entries::verify_time_entry),
                            )
                            .route(
                                "/{id}/reject",
                                web::post().to(time_entries::reject_time_entry),
                            ),
                    )
                    .service(
                        web::scope("/reports")
                            .route("/payroll", web::get().to(reports::payroll_report))
                            .route("/job-billing", web::get().to(reports::job_billing_report))
                            .route(
                                "/technician-hours",
                                web::get().to(reports::technician_hours),
                            )
                            .route("/dashboard", web::get().to(reports::dashboard))
                            .route("/audit-log", web::get().to(reports::audit_log)),
                    )
                    .service(
                        web::scope("/pay-periods")
                            .route("", web::get().to(pay_periods::list_pay_periods))
                            .route("", web::post().to(pay_periods::create_pay_period))
                            .route(
                                "/{id}/close",
                                web::post().to(pay_periods::close_pay_period),
                            ),
                    )
                    .service(
                        web::scope("/mileage-rates")
                            .route("", web::get().to(mileage_rates::list_mileage_rates))
                            .route("", web::post().to(mileage_rates::create_mileage_rate))
                            .route(
                                "/current",
                                web::get().to(mileage_rates::current_mileage_rate),
                            ),
                    )
                    .service(
                        web::scope("/imports")
                            .route(
                                "/work-orders",
                                web::post().to(imports::import_work_orders),
                            )
                            .route(
                                "/work-orders/preview",
                                web::post().to(imports::preview_import),
                            ),
                    ),
            )
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
