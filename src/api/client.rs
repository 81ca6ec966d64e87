//! Dazno Backend Client
//!
//! HTTP client for the dashboard endpoints of the Dazno backend.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::dto::*;
use super::error::ApiError;
use crate::config::ApiConfig;

/// Typed client for the backend's REST API
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
}

impl DashboardClient {
    /// Create a client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_timeout(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ============================================
    // Dashboard data
    // ============================================

    /// `GET /api/metrics`
    pub async fn metrics(&self) -> Result<MetricSnapshot, ApiError> {
        self.get_json("/api/metrics").await
    }

    /// `GET /api/status`
    pub async fn status(&self) -> Result<ServiceStatus, ApiError> {
        self.get_json("/api/status").await
    }

    /// `GET /api/dashboard`; the snapshot shape is not fixed
    pub async fn dashboard(&self) -> Result<Value, ApiError> {
        self.get_json("/api/dashboard").await
    }

    /// `GET /api/recommendations`
    pub async fn recommendations(&self) -> Result<Vec<Recommendation>, ApiError> {
        self.get_json("/api/recommendations").await
    }

    /// `GET /api/health`
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.get_json("/api/health").await
    }

    /// `GET /api/analytics/node`
    pub async fn node_analytics(&self) -> Result<NodeAnalytics, ApiError> {
        self.get_json("/api/analytics/node").await
    }

    /// `GET /api/competitive-analysis`
    pub async fn competitive_analysis(&self) -> Result<Value, ApiError> {
        self.get_json("/api/competitive-analysis").await
    }

    // ============================================
    // Recommendation actions
    // ============================================

    /// `POST /api/actions`
    ///
    /// A 2xx without a body counts as success. The returned response may
    /// still carry `success: false`; deciding what that means is up to
    /// the caller.
    pub async fn submit_action(
        &self,
        recommendation_id: &str,
        action: ActionType,
    ) -> Result<ActionResponse, ApiError> {
        let body = ActionRequest {
            recommendation_id: recommendation_id.to_string(),
            action,
        };

        let response = self.send_post("/api/actions", Some(&body)).await?;
        let response = check_status(response).await?;

        let text = response.text().await.map_err(ApiError::from_transport)?;
        if text.trim().is_empty() {
            return Ok(ActionResponse::accepted());
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /api/recommendations/auto-execute`
    pub async fn auto_execute(
        &self,
        recommendation_id: &str,
        execution_mode: &str,
    ) -> Result<AutoExecuteResponse, ApiError> {
        let body = AutoExecuteRequest {
            recommendation_id: recommendation_id.to_string(),
            execution_mode: execution_mode.to_string(),
        };
        self.post_json("/api/recommendations/auto-execute", &body).await
    }

    /// `POST /api/recommendations/simulate`
    pub async fn simulate(&self, recommendation_id: &str) -> Result<SimulationResult, ApiError> {
        let body = SimulationRequest {
            recommendation_id: recommendation_id.to_string(),
        };
        self.post_json("/api/recommendations/simulate", &body).await
    }

    /// `POST /api/recommendations/schedule`
    pub async fn schedule(
        &self,
        recommendation_id: &str,
        scheduled_time: &str,
    ) -> Result<ScheduleResponse, ApiError> {
        let body = ScheduleRequest {
            recommendation_id: recommendation_id.to_string(),
            scheduled_time: scheduled_time.to_string(),
        };
        self.post_json("/api/recommendations/schedule", &body).await
    }

    /// `GET /api/recommendations/{id}/optimal-time`
    pub async fn optimal_time(&self, recommendation_id: &str) -> Result<OptimalTimeResponse, ApiError> {
        let path = format!(
            "/api/recommendations/{}/optimal-time",
            urlencoding::encode(recommendation_id)
        );
        self.get_json(&path).await
    }

    // ============================================
    // Automation
    // ============================================

    /// `POST /api/automation/mode`
    pub async fn set_automation_mode(&self, mode: &str) -> Result<(), ApiError> {
        let body = AutomationModeRequest {
            mode: mode.to_string(),
        };
        self.post_accepted("/api/automation/mode", &body).await
    }

    /// `POST /api/automation/max-actions`
    pub async fn set_max_actions(&self, max_actions: u32) -> Result<(), ApiError> {
        let body = MaxActionsRequest { max_actions };
        self.post_accepted("/api/automation/max-actions", &body).await
    }

    /// `POST /api/automation/auto-execution`
    pub async fn set_auto_execution(&self, enabled: bool) -> Result<(), ApiError> {
        let body = AutoExecutionToggleRequest { enabled };
        self.post_accepted("/api/automation/auto-execution", &body).await
    }

    /// `GET /api/automation/settings`
    pub async fn automation_settings(&self) -> Result<AutomationSettings, ApiError> {
        self.get_json("/api/automation/settings").await
    }

    /// `POST /api/analysis/force-deep`
    pub async fn force_deep_analysis(&self) -> Result<DeepAnalysisResponse, ApiError> {
        let response = self.send_post::<()>("/api/analysis/force-deep", None).await?;
        read_json(check_status(response).await?).await
    }

    // ============================================
    // Request helpers
    // ============================================

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        read_json(check_status(response).await?).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send_post(path, Some(body)).await?;
        read_json(check_status(response).await?).await
    }

    /// POST where only the status matters
    async fn post_accepted<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.send_post(path, Some(body)).await?;
        check_status(response).await?;
        Ok(())
    }

    async fn send_post<B: Serialize>(&self, path: &str, body: Option<&B>) -> Result<Response, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");

        let request = match body {
            Some(body) => self.client.post(&url).json(body),
            None => self.client.post(&url).header(CONTENT_TYPE, "application/json"),
        };

        request.send().await.map_err(ApiError::from_transport)
    }
}

/// Turn a non-2xx response into [`ApiError::Status`]
///
/// A JSON body with a `message` field supplies the error message.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    tracing::warn!(status = status.as_u16(), message = %message, "Backend returned error");

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(ApiError::from_transport)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DashboardClient {
        DashboardClient::with_timeout(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client =
            DashboardClient::with_timeout("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/status"), "http://localhost:3000/api/status");
    }

    #[tokio::test]
    async fn test_action_rejected_by_backend() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/actions"))
            .and(body_json(json!({"recommendation_id": "42", "action": "Approve"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "insufficient balance"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .submit_action("42", ActionType::Approve)
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("insufficient balance"));
    }

    #[tokio::test]
    async fn test_action_bare_ok_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/actions"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .submit_action("7", ActionType::Reject)
            .await
            .unwrap();
        assert_eq!(response, ActionResponse::accepted());
    }

    #[tokio::test]
    async fn test_non_2xx_carries_backend_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/actions"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"success": false, "message": "already executed"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);

        match client.submit_action("9", ActionType::Approve).await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 409);
                assert_eq!(message, "already executed");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }

        match client.status().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            DashboardClient::with_timeout(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client.metrics().await.unwrap_err();
        assert!(err.is_network());
        assert!(matches!(err, ApiError::Unavailable));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).metrics().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_metrics_and_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current_roi": 15.8,
                "total_channels": 8,
                "fees_earned_24h": "4,200 sats"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"mcp_connected": true, "lnd_connected": false})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);

        let metrics = client.metrics().await.unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics["total_channels"], json!(8));

        let status = client.status().await.unwrap();
        assert!(status.mcp_connected);
        assert!(!status.all_connected());
    }

    #[tokio::test]
    async fn test_recommendation_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/recommendations/auto-execute"))
            .and(body_json(json!({"recommendation_id": "rec-1", "execution_mode": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Executed",
                "roi_impact": 2.5,
                "execution_id": "exec-1",
                "stats": {"actions_today": 4, "success_rate": 97.5, "roi_gained": 3.2}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/recommendations/simulate"))
            .and(body_json(json!({"recommendation_id": "rec-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "recommendation_id": "rec-1",
                "roi_impact": 2.1,
                "success_probability": 88.0,
                "risk_level": "Low",
                "estimated_cost": 2500,
                "timeline": [
                    {"time": "0s", "action": "Validate channel", "probability": 99.0},
                    {"time": "30s", "action": "Broadcast", "probability": 95.0}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/recommendations/rec%2F1/optimal-time"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "optimal_time": "2024-03-01 14:00 UTC",
                "confidence": 0.87,
                "factors": ["Low network congestion"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/recommendations/schedule"))
            .and(body_json(json!({"recommendation_id": "rec-1", "scheduled_time": "2024-03-01 14:00 UTC"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "scheduled_time": "2024-03-01 14:00 UTC"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let executed = client.auto_execute("rec-1", "auto").await.unwrap();
        assert!(executed.success);
        assert_eq!(executed.stats.unwrap().actions_today, 4);

        let simulation = client.simulate("rec-1").await.unwrap();
        assert_eq!(simulation.estimated_cost, 2500);
        assert_eq!(simulation.timeline.len(), 2);

        let optimal = client.optimal_time("rec/1").await.unwrap();
        assert_eq!(optimal.optimal_time, "2024-03-01 14:00 UTC");

        let scheduled = client.schedule("rec-1", &optimal.optimal_time).await.unwrap();
        assert!(scheduled.success);
    }

    #[tokio::test]
    async fn test_automation_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/automation/mode"))
            .and(body_json(json!({"mode": "aggressive"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/automation/max-actions"))
            .and(body_json(json!({"max_actions": 12})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/automation/auto-execution"))
            .and(body_json(json!({"enabled": true})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/analysis/force-deep"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "recommendations_count": 3,
                "analysis_time_ms": 2500,
                "insights": ["Fee optimization opportunity"]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        client.set_automation_mode("aggressive").await.unwrap();
        client.set_max_actions(12).await.unwrap();
        assert!(matches!(
            client.set_auto_execution(true).await,
            Err(ApiError::Status { status: 500, .. })
        ));

        let analysis = client.force_deep_analysis().await.unwrap();
        assert_eq!(analysis.recommendations_count, 3);
    }

    #[tokio::test]
    async fn test_analytics_endpoints() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/analytics/node"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "performance_score": 87.5,
                "roi_current": 15.8,
                "roi_predicted_30d": 18.2,
                "efficiency_score": 91.0,
                "risk_score": 22.0,
                "centrality_score": 64.0,
                "liquidity_score": 78.5,
                "reliability_score": 99.1,
                "growth_potential": 41.0,
                "last_calculated": "2024-03-01T12:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/competitive-analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dazno": {"accuracy": "95%"},
                "competitor": {"accuracy": "85%"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        assert_eq!(client.health().await.unwrap()["status"], json!("healthy"));

        let analytics = client.node_analytics().await.unwrap();
        assert_eq!(analytics.roi_predicted_30d, 18.2);
        assert_eq!(analytics.last_calculated.to_rfc3339(), "2024-03-01T12:00:00+00:00");

        let competitive = client.competitive_analysis().await.unwrap();
        assert_eq!(competitive["competitor"]["accuracy"], json!("85%"));
    }
}
