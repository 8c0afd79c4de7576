use std::sync::Arc;

use actix_web::{test, web, App};
use ctf_stats_logic::{config::Config, store::Store};
use ctf_stats_server::{
    api::{configure_router, AppState},
    auth::BearerAuth,
};

const TOKEN: &str = "test-token";
const TOKEN_HASH: &str = "4c5dc9b7708905f77f5e5d16316b5dfb425e68cb326dcd55a860e90a7707031";

async fn test_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yml");
    std::fs::write(
        &config_path,
        format!(
            "flag_format: \"ctf{{}}\"\napi_token_hash: \"{TOKEN_HASH}\"\nservices:\n  - name: web\n    port: 8080\n    type: http\n"
        ),
    )
    .unwrap();

    let store = Arc::new(Store::connect_in_memory().await.unwrap());
    let config = Arc::new(Config::load(&config_path).unwrap());
    (AppState { store, config }, dir)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .service(
                    web::scope("")
                        .wrap(BearerAuth {
                            config: $state.config.clone(),
                        })
                        .configure(configure_router),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn health_requires_bearer_token() {
    let (state, _dir) = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn health_rejects_wrong_token() {
    let (state, _dir) = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("Authorization", "Bearer wrong-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn health_succeeds_with_valid_token() {
    let (state, _dir) = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("Authorization", format!("Bearer {TOKEN}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn list_services_returns_configured_service() {
    let (state, _dir) = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/services")
        .insert_header(("Authorization", format!("Bearer {TOKEN}")))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["port"], 8080);
}

#[actix_web::test]
async fn get_service_404s_for_unknown_port() {
    let (state, _dir) = test_state().await;
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/services/9999")
        .insert_header(("Authorization", format!("Bearer {TOKEN}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
