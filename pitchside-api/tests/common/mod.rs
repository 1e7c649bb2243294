#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use pitchside_api::{app, AppState};
use pitchside_booking::memory::{MemoryAuditSink, MemoryReservationStore, MemoryTurfCatalog};
use pitchside_booking::{AdminManager, ExpiryReaper, PaymentManager, ReservationManager, SignatureVerifier};
use pitchside_core::events::EventBus;
use pitchside_core::repository::Turf;
use pitchside_core::rules::BookingRules;

pub const TEST_SECRET: &str = "test_secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryReservationStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub turf_id: Uuid,
    pub verifier: SignatureVerifier,
}

/// Engine wired onto in-memory stores, synthetic orders allowed and the
/// test signing secret installed.
pub fn test_app() -> TestApp {
    build_app(BookingRules::default(), true, true)
}

/// No gateway at all: orders cannot be opened and callbacks cannot be
/// verified.
pub fn test_app_no_gateway() -> TestApp {
    build_app(BookingRules::default(), false, false)
}

pub fn test_app_with_rules(rules: BookingRules) -> TestApp {
    build_app(rules, true, true)
}

fn build_app(rules: BookingRules, allow_synthetic: bool, with_verifier: bool) -> TestApp {
    let store = Arc::new(MemoryReservationStore::new());
    let turf = Turf {
        id: Uuid::new_v4(),
        name: "Greenfield Arena".to_string(),
        price_per_hour: 500,
        is_approved: true,
    };
    let turf_id = turf.id;
    let catalog = Arc::new(MemoryTurfCatalog::with_turfs(vec![turf]));
    let audit = Arc::new(MemoryAuditSink::new());
    let events = EventBus::default();
    let verifier = SignatureVerifier::new(TEST_SECRET);

    let reservations = Arc::new(ReservationManager::new(
        store.clone(),
        catalog,
        events.clone(),
        rules.clone(),
    ));
    let payments = Arc::new(PaymentManager::new(
        store.clone(),
        None,
        with_verifier.then(|| verifier.clone()),
        events.clone(),
        allow_synthetic,
        rules.currency.clone(),
    ));
    let admin = Arc::new(AdminManager::new(store.clone(), audit.clone(), events.clone()));
    let reaper = Arc::new(ExpiryReaper::new(store.clone(), rules, events.clone()));

    let state = AppState {
        reservations,
        payments,
        admin,
        reaper,
        events,
        redis: None,
    };

    TestApp {
        router: app(state),
        store,
        audit,
        turf_id,
        verifier,
    }
}

/// Fire one request at the router. `actor` is `(id, role)` for the
/// identity headers; `None` sends an anonymous request.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    actor: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder
            .header("x-actor-id", id)
            .header("x-actor-role", role)
            .header("x-actor-name", format!("Actor {id}"))
            .header("x-actor-email", format!("{id}@example.com"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub fn reservation_body(turf_id: Uuid, date: &str, slots: &[(&str, &str)]) -> Value {
    let slots: Vec<Value> = slots
        .iter()
        .map(|(start, end)| serde_json::json!({ "start_time": start, "end_time": end }))
        .collect();
    serde_json::json!({ "turf_id": turf_id, "date": date, "slots": slots })
}
