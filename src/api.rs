//! HTTP surface for the admin editor and the storefront display surfaces.

use std::sync::Arc;

use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{ProgressiveDiscountRule, Promotion, PromotionState};
use crate::domain::events;
use crate::domain::message::MessageRenderer;
use crate::domain::pricing::{applicable_discount, discounted_price, is_active};
use crate::domain::value_objects::Percentage;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::store::PromotionStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PromotionStore>,
    pub renderer: Arc<MessageRenderer>,
    pub reconciler: Option<Reconciler>,
    pub nats: Option<async_nats::Client>,
}

impl AppState {
    pub fn new(store: Arc<PromotionStore>, renderer: MessageRenderer) -> Self {
        Self { store, renderer: Arc::new(renderer), reconciler: None, nats: None }
    }

    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self { self.reconciler = Some(reconciler); self }
    pub fn with_nats(mut self, client: async_nats::Client) -> Self { self.nats = Some(client); self }

    /// Drains pending store events, publishing them when NATS is configured.
    pub async fn publish_events(&self) {
        let pending = self.store.take_events();
        let Some(nats) = &self.nats else { return };
        for event in pending {
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => { tracing::warn!(error = %e, "unserializable promotion event"); continue; }
            };
            if let Err(e) = nats.publish(events::SUBJECT.to_string(), payload.into()).await {
                tracing::warn!(error = %e, "failed to publish promotion event");
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-promotions"})) }))
        .route("/api/v1/promotion", get(get_promotion).put(put_promotion).delete(clear_promotion))
        .route("/api/v1/promotion/discount", get(get_discount))
        .route("/api/v1/promotion/price", get(get_price))
        .route("/api/v1/promotion/message", get(get_message))
        .route("/api/v1/promotion/refresh", post(refresh))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

/// Promotion as submitted by the admin editor.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_window"))]
pub struct PromotionPayload {
    #[serde(default)]
    pub enabled: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    pub global_percentage: Option<f64>,
    #[serde(default)]
    #[validate(custom = "validate_rules")]
    pub progressive_rules: Vec<ProgressiveDiscountRule>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub message_template: Option<String>,
    #[serde(flatten)]
    pub presentation: Map<String, Value>,
}

fn validate_window(payload: &PromotionPayload) -> Result<(), ValidationError> {
    match (payload.start_at, payload.end_at) {
        (Some(start), Some(end)) if start > end => Err(ValidationError::new("start_after_end")),
        _ => Ok(()),
    }
}

fn validate_rules(rules: &[ProgressiveDiscountRule]) -> Result<(), ValidationError> {
    if rules.iter().any(|r| r.threshold.is_sign_negative()) { return Err(ValidationError::new("negative_threshold")); }
    if rules.iter().any(|r| !(0.0..=100.0).contains(&r.percentage)) { return Err(ValidationError::new("percentage_out_of_range")); }
    Ok(())
}

impl From<PromotionPayload> for Promotion {
    fn from(p: PromotionPayload) -> Self {
        Self {
            enabled: p.enabled, global_percentage: p.global_percentage, progressive_rules: p.progressive_rules,
            start_at: p.start_at, end_at: p.end_at, message_template: p.message_template, presentation: p.presentation,
        }
    }
}

#[derive(Debug, Deserialize)] pub struct DiscountParams { pub order_total: Option<Decimal> }
#[derive(Debug, Deserialize)] pub struct PriceParams { pub price: Decimal, pub order_total: Option<Decimal> }
#[derive(Debug, Deserialize)] pub struct MessageParams { pub preview_total: Option<Decimal> }

#[derive(Debug, Serialize)] pub struct DiscountResponse { pub active: bool, pub percentage: Percentage, pub order_total: Decimal }
#[derive(Debug, Serialize)] pub struct PriceResponse { pub original: Decimal, pub discounted: Decimal, pub percentage: Percentage }
#[derive(Debug, Serialize)] pub struct MessageResponse { pub active: bool, pub message: String }

async fn get_promotion(State(s): State<AppState>) -> Result<Json<PromotionState>, (StatusCode, String)> {
    s.store.read().map(Json).ok_or((StatusCode::NOT_FOUND, "No promotion configured".to_string()))
}

async fn put_promotion(State(s): State<AppState>, Json(payload): Json<PromotionPayload>) -> Result<Json<PromotionState>, (StatusCode, String)> {
    payload.validate().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let state = s.store.set(payload.into());
    s.publish_events().await;
    Ok(Json(state))
}

async fn clear_promotion(State(s): State<AppState>) -> StatusCode {
    s.store.clear();
    s.publish_events().await;
    StatusCode::NO_CONTENT
}

async fn get_discount(State(s): State<AppState>, Query(p): Query<DiscountParams>) -> Json<DiscountResponse> {
    let current = s.store.read();
    let promotion = current.as_ref().map(|c| &c.promotion);
    let now = s.store.now();
    let order_total = p.order_total.unwrap_or(Decimal::ZERO);
    Json(DiscountResponse { active: is_active(promotion, now), percentage: applicable_discount(promotion, order_total, now), order_total })
}

async fn get_price(State(s): State<AppState>, Query(p): Query<PriceParams>) -> Json<PriceResponse> {
    let current = s.store.read();
    let promotion = current.as_ref().map(|c| &c.promotion);
    let (order_total, now) = (p.order_total.unwrap_or(p.price), s.store.now());
    let percentage = applicable_discount(promotion, order_total, now);
    Json(PriceResponse { original: p.price, discounted: discounted_price(promotion, p.price, order_total, now), percentage })
}

async fn get_message(State(s): State<AppState>, Query(p): Query<MessageParams>) -> Json<MessageResponse> {
    let now = s.store.now();
    let response = match s.store.read() {
        Some(current) => MessageResponse {
            active: is_active(Some(&current.promotion), now),
            message: s.renderer.render(&current.promotion, p.preview_total.unwrap_or(Decimal::ZERO), now),
        },
        None => MessageResponse { active: false, message: String::new() },
    };
    Json(response)
}

async fn refresh(State(s): State<AppState>) -> Result<Json<ReconcileOutcome>, (StatusCode, String)> {
    let reconciler = s.reconciler.as_ref().ok_or((StatusCode::SERVICE_UNAVAILABLE, "No remote promotion source configured".to_string()))?;
    let outcome = reconciler.reconcile().await;
    s.publish_events().await;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::remote::RemoteSource;
    use crate::store::MemoryLocalStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tower::ServiceExt;

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 11, 29, 12, 0, 0).unwrap() }

    struct StaticRemote(Option<PromotionState>);

    #[async_trait]
    impl RemoteSource for StaticRemote {
        async fn fetch(&self) -> crate::Result<Option<PromotionState>> { Ok(self.0.clone()) }
    }

    fn app_state() -> AppState {
        let store = PromotionStore::open(Arc::new(MemoryLocalStore::new()), Arc::new(ManualClock::new(now())));
        AppState::new(Arc::new(store), MessageRenderer::default())
    }

    fn put(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/promotion")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn tiered() -> Value {
        json!({
            "enabled": true,
            "globalPercentage": 10,
            "progressiveRules": [{ "threshold": 100, "percentage": 5 }, { "threshold": 200, "percentage": 20 }],
            "startAt": (now() - Duration::days(1)).to_rfc3339(),
            "endAt": (now() + Duration::days(1)).to_rfc3339(),
            "messageTemplate": "%OFF% until %END_DATE%, %DAYS_LEFT% days left",
            "bannerColor": "#c0ffee"
        })
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let state = app_state();
        let (status, _) = send(&state, request(Method::GET, "/api/v1/promotion")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, saved) = send(&state, put(tiered())).await;
        assert_eq!(status, StatusCode::OK);
        let updated_at: DateTime<Utc> = serde_json::from_value(saved["updatedAt"].clone()).unwrap();
        assert_eq!(updated_at, now());
        assert_eq!(saved["promotion"]["bannerColor"], json!("#c0ffee"));

        let (status, fetched) = send(&state, request(Method::GET, "/api/v1/promotion")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn test_invalid_payloads_rejected() {
        let state = app_state();
        let (status, _) = send(&state, put(json!({ "enabled": true, "globalPercentage": 120 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let inverted = json!({ "enabled": true, "startAt": now().to_rfc3339(), "endAt": (now() - Duration::days(1)).to_rfc3339() });
        let (status, _) = send(&state, put(inverted)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let bad_rule = json!({ "enabled": true, "progressiveRules": [{ "threshold": -5, "percentage": 10 }] });
        let (status, _) = send(&state, put(bad_rule)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(state.store.read().is_none());
    }

    #[tokio::test]
    async fn test_discount_and_price() {
        let state = app_state();
        send(&state, put(tiered())).await;

        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/discount?order_total=250")).await;
        assert_eq!(body["active"], json!(true));
        assert_eq!(body["percentage"].as_f64(), Some(20.0));

        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/discount?order_total=150")).await;
        assert_eq!(body["percentage"].as_f64(), Some(10.0));

        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/price?price=40&order_total=250")).await;
        let discounted: Decimal = body["discounted"].as_str().unwrap().parse().unwrap();
        assert_eq!(discounted, Decimal::new(32, 0));
    }

    #[tokio::test]
    async fn test_no_promotion_means_full_price() {
        let state = app_state();
        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/price?price=19.99")).await;
        assert_eq!(body["percentage"].as_f64(), Some(0.0));
        let discounted: Decimal = body["discounted"].as_str().unwrap().parse().unwrap();
        assert_eq!(discounted, Decimal::new(1999, 2));

        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/message")).await;
        assert_eq!(body, json!({ "active": false, "message": "" }));
    }

    #[tokio::test]
    async fn test_message() {
        let state = app_state();
        send(&state, put(tiered())).await;
        let (_, body) = send(&state, request(Method::GET, "/api/v1/promotion/message?preview_total=0")).await;
        assert_eq!(body["message"], json!("10% until 11/30/2024, 1 days left"));
    }

    #[tokio::test]
    async fn test_clear() {
        let state = app_state();
        send(&state, put(tiered())).await;
        let (status, _) = send(&state, request(Method::DELETE, "/api/v1/promotion")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&state, request(Method::GET, "/api/v1/promotion")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh() {
        let state = app_state();
        let (status, _) = send(&state, request(Method::POST, "/api/v1/promotion/refresh")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let remote = PromotionState::new(Promotion::storewide(30.0), now() - Duration::hours(1));
        let state = state.clone().with_reconciler(Reconciler::new(state.store.clone(), Arc::new(StaticRemote(Some(remote)))));
        let (status, body) = send(&state, request(Method::POST, "/api/v1/promotion/refresh")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], json!("adopted"));
        assert_eq!(state.store.read().unwrap().promotion.global_percentage, Some(30.0));
    }
}
