/// Diversification simulator client against a mocked allocation API
use rust_investor_api::config::Config;
use rust_investor_api::errors::AppError;
use rust_investor_api::models::{Allocation, AllocationCategory, AllocationEntry};
use rust_investor_api::services::{AllocationRequest, DiversificationService};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(diversification_url: Option<String>) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 3000,
        gemini_api_key: "test_gemini_key".to_string(),
        gemini_model: "gemini-test".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        alpha_vantage_api_key: "test_av_key".to_string(),
        alpha_vantage_base_url: "http://127.0.0.1:9".to_string(),
        history_service_url: "http://127.0.0.1:9/history".to_string(),
        history_service_token: "test_history_token".to_string(),
        diversification_api_url: diversification_url,
        session_idle_secs: 60,
        http_timeout_secs: 5,
    }
}

fn moderate_request() -> AllocationRequest {
    AllocationRequest {
        risk_tolerance: "moderate".to_string(),
        investment_amount: 20000.0,
        asset_interests: vec!["fixedIncome".to_string(), "stocks".to_string()],
    }
}

#[tokio::test]
async fn test_allocation_is_posted_and_decoded() {
    let server = MockServer::start().await;
    let config = create_test_config(Some(server.uri()));

    Mock::given(method("POST"))
        .and(path("/allocations"))
        .and(body_json(json!({
            "risk_tolerance": "moderate",
            "investment_amount": 20000.0,
            "asset_interests": ["fixedIncome", "stocks"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 20000.0,
            "categories": [
                {"name": "Renda Fixa", "value": 14000.0, "percent": 70.0},
                {"name": "Ações", "value": 6000.0, "percent": 30.0}
            ],
            "recent": [
                {"name": "Tesouro Selic 2029", "type": "Renda Fixa", "value": 5000.0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let allocation = DiversificationService::new(&config)
        .fetch_allocation(&moderate_request())
        .await
        .unwrap();

    assert_eq!(
        allocation,
        Allocation {
            total: 20000.0,
            categories: vec![
                AllocationCategory {
                    name: "Renda Fixa".to_string(),
                    value: 14000.0,
                    percent: 70.0,
                },
                AllocationCategory {
                    name: "Ações".to_string(),
                    value: 6000.0,
                    percent: 30.0,
                },
            ],
            recent: vec![AllocationEntry {
                name: "Tesouro Selic 2029".to_string(),
                kind: "Renda Fixa".to_string(),
                value: 5000.0,
            }],
        }
    );
}

#[tokio::test]
async fn test_missing_lists_decode_as_empty() {
    let server = MockServer::start().await;
    let config = create_test_config(Some(server.uri()));

    Mock::given(method("POST"))
        .and(path("/allocations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0.0 })))
        .mount(&server)
        .await;

    let allocation = DiversificationService::new(&config)
        .fetch_allocation(&moderate_request())
        .await
        .unwrap();

    assert_eq!(allocation.total, 0.0);
    assert!(allocation.categories.is_empty());
    assert!(allocation.recent.is_empty());
}

#[tokio::test]
async fn test_error_status_is_external_api_error() {
    let server = MockServer::start().await;
    let config = create_test_config(Some(server.uri()));

    Mock::given(method("POST"))
        .and(path("/allocations"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = DiversificationService::new(&config)
        .fetch_allocation(&moderate_request())
        .await
        .unwrap_err();

    match err {
        AppError::ExternalApiError(msg) => {
            assert!(msg.contains("502"), "unexpected message: {}", msg);
            assert!(msg.contains("upstream down"));
        }
        other => panic!("expected ExternalApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unconfigured_simulator_is_unavailable() {
    let config = create_test_config(None);

    let err = DiversificationService::new(&config)
        .fetch_allocation(&moderate_request())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ServiceUnavailable(_)));
    assert_eq!(
        err.status_code(),
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    );
}
