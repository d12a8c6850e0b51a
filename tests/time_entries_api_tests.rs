use actix_web::{App, http::StatusCode, test, web};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;

use techtrackr_be::database::repositories::TimeEntryRepository;
use techtrackr_be::handlers::time_entries;
use techtrackr_be::services::{ReportService, WorkflowService};

mod common;

macro_rules! time_entries_app {
    () => {{
        let config = common::test_config();
        let pool = common::lazy_pool(&config);

        let app_state = common::app_state(&config, &pool);
        let entry_repo_data = web::Data::new(TimeEntryRepository::new(pool.clone()));
        let workflow_data = web::Data::new(WorkflowService::new(pool.clone()));
        let report_data = web::Data::new(ReportService::new(pool.clone()));
        let config_data = web::Data::new(config);

        test::init_service(
            App::new()
                .app_data(app_state)
                .app_data(entry_repo_data)
                .app_data(workflow_data)
                .app_data(report_data)
                .app_data(config_data)
                .service(
                    web::scope("/api/v1").service(
                        web::scope("/time-entries")
                            .route("", web::post().to(time_entries::create_time_entry))
                            .route("", web::get().to(time_entries::list_time_entries))
                            .route("/bulk-submit", web::post().to(time_entries::bulk_submit))
                            .route("/bulk-verify", web::post().to(time_entries::bulk_verify))
                            .route("/my-summary", web::get().to(time_entries::my_summary))
                            .route("/{id}", web::get().to(time_entries::get_time_entry))
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
                    ),
                ),
        )
        .await
    }};
}

#[actix_web::test]
#[serial]
async fn create_time_entry_requires_auth() {
    common::setup_test_env();
    let app = time_entries_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/time-entries")
        .set_json(&json!({
            "jobId": "5f1c8a44-0000-0000-0000-000000000001",
            "dateWorked": "2026-01-12",
            "hoursWorked": "8.0"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn list_time_entries_requires_auth() {
    common::setup_test_env();
    let app = time_entries_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/time-entries")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn submit_requires_auth() {
    common::setup_test_env();
    let app = time_entries_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/time-entries/5f1c8a44-0000-0000-0000-000000000001/submit")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn verify_rejects_garbage_token() {
    common::setup_test_env();
    let app = time_entries_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/time-entries/5f1c8a44-0000-0000-0000-000000000001/verify")
        .insert_header(("Authorization", "Bearer not-a-real-token"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
#[serial]
async fn bulk_submit_requires_auth() {
    common::setup_test_env();
    let app = time_entries_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/time-entries/bulk-submit")
        .set_json(&json!({ "entryIds": [] }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
