pub mod export;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::dashboard::handlers as dashboard;
use crate::evaluation::handlers as evaluation;
use crate::ingestion::handlers as ingestion;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate ingestion
        .route("/api/v1/candidates", post(ingestion::handle_fetch_candidates))
        .route(
            "/api/v1/opening/:opening_id",
            get(ingestion::handle_get_opening),
        )
        // Scoring
        .route(
            "/api/v1/evaluations",
            post(evaluation::handle_create_evaluation),
        )
        // Dashboard
        .route("/api/v1/dashboard", post(dashboard::handle_dashboard))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::extraction::reader::HttpResumeReader;
    use crate::extraction::ExtractorSet;
    use crate::ingestion::hiring_client::HiringClient;
    use crate::ingestion::listing_url::ListingUrlValidator;
    use crate::llm_client::{LlmError, StructuredModel};
    use crate::scoring::scorer::ResumeScorer;

    struct UnreachableModel;

    #[async_trait]
    impl StructuredModel for UnreachableModel {
        async fn generate_json(&self, _prompt: &str, _schema: &Value) -> Result<Value, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    fn test_state() -> AppState {
        let config = Config {
            google_api_key: "test".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            hiring_access_token: "test".to_string(),
            hiring_host: "hiring.base.vn".to_string(),
            job_bands_path: PathBuf::from("/nonexistent/job_descriptions.csv"),
            hard_rubric_path: None,
            scoring_delay: Duration::ZERO,
            llm_max_attempts: 1,
            listing_page_size: 10,
            listing_start_date: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            port: 0,
            rust_log: "info".to_string(),
        };
        let http = reqwest::Client::new();
        AppState {
            hiring: HiringClient::new(http.clone(), &config),
            listing_urls: Arc::new(ListingUrlValidator::new(&config.hiring_host).unwrap()),
            resumes: Arc::new(HttpResumeReader::new(http, ExtractorSet::default())),
            scorer: ResumeScorer::new(Arc::new(UnreachableModel), Duration::ZERO),
            config: Arc::new(config),
        }
    }

    fn multipart_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let boundary = "screener-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = build_router(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_listing_url_rejected_before_any_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/candidates")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"listing_url":"https://example.com/opening/1"}"#))
            .unwrap();
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evaluation_without_candidates_is_rejected() {
        let request = multipart_request("/api/v1/evaluations", &[("jd", "Rust developer")]);
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evaluation_direct_without_jd_is_rejected() {
        let request = multipart_request(
            "/api/v1/evaluations",
            &[
                ("file", "id,name,email,status,cvs,desired_salary\n1,An,a@x,1,https://cdn/a.pdf,700\n"),
                ("jd_source", "direct"),
            ],
        );
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evaluation_opening_with_foreign_listing_url_is_rejected() {
        let request = multipart_request(
            "/api/v1/evaluations",
            &[
                ("listing_url", "https://evil.example/foo/candidates/1?stage=2&junk"),
                ("jd_source", "opening"),
            ],
        );
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_route_builds_from_uploaded_report() {
        let report = "name,job_fit,aggregate_score,verdict\nAn,8,8,Pass\nBinh,6,6,Fail\n";
        let request = multipart_request("/api/v1/dashboard?top_n=1", &[("file", report)]);
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_route_requires_file() {
        let request = multipart_request("/api/v1/dashboard", &[("other", "x")]);
        let response = build_router(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
