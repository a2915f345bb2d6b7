//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{eth_analysis, health_check, list_styles, rewrite_handler};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/styles", get(list_styles))

        // Rewrite API
        .route("/rewrite", post(rewrite_handler))

        // Market commentary
        .route("/api/eth/analysis", get(eth_analysis))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use agent_core::{ProviderError, mock::ScriptedProvider};
    use agent_runtime::{Runtime, RuntimeConfig};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use market_analyst::{EthPriceAnalyzer, FixtureDataSource};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app(provider: ScriptedProvider) -> Router {
        let vars: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("REWRITE_MAX_INPUT_CHARS", "200"),
        ]
        .into_iter()
        .collect();
        let mut config =
            RuntimeConfig::from_lookup(|key: &str| vars.get(key).map(|v| (*v).to_string()))
                .unwrap();
        config.pipeline.backoff_base = Duration::from_millis(1);

        let provider = Arc::new(provider);
        let runtime = Runtime::with_provider(config, provider.clone()).unwrap();
        let analyzer = EthPriceAnalyzer::new(provider, Arc::new(FixtureDataSource::default()))
            .with_filter(runtime.filter.clone());

        router(AppState {
            runtime,
            analyzer: Arc::new(analyzer),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_rewrite(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/rewrite")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let app = app(ScriptedProvider::always("I intend to develop an AI agent."));
        let (status, body) = send(
            app,
            post_rewrite(&json!({"text": "i wanna build an ai agent", "style": "professional"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": "I intend to develop an AI agent."}));
    }

    #[tokio::test]
    async fn test_style_defaults_to_professional() {
        let provider = ScriptedProvider::always("Done.");
        let (status, _) = send(app(provider), post_rewrite(&json!({"text": "do it"}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_style_is_bad_request() {
        let (status, body) = send(
            app(ScriptedProvider::always("unused")),
            post_rewrite(&json!({"text": "hello", "style": "pirate"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("pirate"));
    }

    #[tokio::test]
    async fn test_oversized_text_is_bad_request() {
        let (status, _) = send(
            app(ScriptedProvider::always("unused")),
            post_rewrite(&json!({"text": "x".repeat(201)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/rewrite")
            .header("content-type", "application/json")
            .body(Body::from("{\"style\": \"casual\"}"))
            .unwrap();
        let (status, body) = send(app(ScriptedProvider::always("unused")), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_secret_rejected_without_echo() {
        let secret = "sk-abcdefghijklmnopqrstuvwxyz123456";
        let (status, body) = send(
            app(ScriptedProvider::always("unused")),
            post_rewrite(&json!({"text": format!("my key is {secret}")})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body["error"].as_str().unwrap().contains(secret));
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_status() {
        let cases = [
            (ProviderError::RateLimit("slow down".into()), StatusCode::TOO_MANY_REQUESTS),
            (ProviderError::Timeout("late".into()), StatusCode::GATEWAY_TIMEOUT),
            (ProviderError::Auth("bad key".into()), StatusCode::BAD_GATEWAY),
            (ProviderError::Transport("reset".into()), StatusCode::BAD_GATEWAY),
        ];

        for (error, expected) in cases {
            let (status, body) = send(
                app(ScriptedProvider::failing(error)),
                post_rewrite(&json!({"text": "hello there"})),
            )
            .await;
            assert_eq!(status, expected);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(ScriptedProvider::always("ok")), get_req("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "openai");
        assert_eq!(body["provider_reachable"], true);
    }

    #[tokio::test]
    async fn test_list_styles() {
        let (status, body) = send(app(ScriptedProvider::always("ok")), get_req("/api/styles")).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["styles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["casual", "professional", "concise", "friendly"]);
    }

    #[tokio::test]
    async fn test_eth_analysis() {
        let (status, body) = send(
            app(ScriptedProvider::always("ETH is trending higher.")),
            get_req("/api/eth/analysis"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "ETH is trending higher.");
        assert_eq!(body["metrics"]["current_price"], "2040");
    }
}
