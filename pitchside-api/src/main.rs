use std::net::SocketAddr;
use std::sync::Arc;

use pitchside_api::{app, AppState};
use pitchside_booking::{
    AdminManager, ExpiryReaper, PaymentManager, ReservationManager, SideEffectWorker, SignatureVerifier,
};
use pitchside_core::events::EventBus;
use pitchside_core::payment::PaymentProvider;
use pitchside_core::sinks::NotificationSender;
use pitchside_shared::pii::masked_preview;
use pitchside_store::app_config::Config;
use pitchside_store::audit_repo::PgAuditSink;
use pitchside_store::catalog_repo::PgTurfCatalog;
use pitchside_store::events::KafkaAnalyticsSink;
use pitchside_store::gateway::HttpPaymentProvider;
use pitchside_store::notify::{NoopNotifier, SmtpNotifier};
use pitchside_store::receipt::TextReceiptGenerator;
use pitchside_store::reservation_repo::PgReservationStore;
use pitchside_store::{DbClient, EventProducer, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchside_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Pitchside API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis_arc = Arc::new(redis_client);

    let kafka_producer = EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer");

    let events = EventBus::new(100);
    let store = Arc::new(PgReservationStore::new(db.pool.clone()));
    let catalog = Arc::new(PgTurfCatalog::new(db.pool.clone()));
    let audit = Arc::new(PgAuditSink::new(db.pool.clone()));
    let analytics = Arc::new(KafkaAnalyticsSink::new(kafka_producer));
    let receipts = Arc::new(TextReceiptGenerator::new(config.booking.currency.clone()));

    let notifier: Arc<dyn NotificationSender> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(smtp)),
        None => {
            tracing::warn!("No smtp section configured, confirmation mail is disabled");
            Arc::new(NoopNotifier)
        }
    };

    let provider: Option<Arc<dyn PaymentProvider>> = match config.gateway.credentials() {
        Some((key_id, key_secret)) => {
            tracing::info!(
                key_id = %key_id,
                key_secret = %masked_preview(&key_secret),
                "Payment gateway configured"
            );
            Some(Arc::new(HttpPaymentProvider::new(
                config.gateway.base_url.clone(),
                key_id,
                key_secret,
            )))
        }
        None => {
            tracing::warn!(
                allow_synthetic_orders = config.gateway.allow_synthetic_orders,
                "Payment gateway credentials missing"
            );
            None
        }
    };
    let verifier = config
        .gateway
        .key_secret
        .clone()
        .map(|secret| SignatureVerifier::new(secret.into_inner()));

    let reservations = Arc::new(ReservationManager::new(
        store.clone(),
        catalog,
        events.clone(),
        config.booking.clone(),
    ));
    let payments = Arc::new(PaymentManager::new(
        store.clone(),
        provider,
        verifier,
        events.clone(),
        config.gateway.allow_synthetic_orders,
        config.booking.currency.clone(),
    ));
    let admin = Arc::new(AdminManager::new(store.clone(), audit, events.clone()));
    let reaper = Arc::new(ExpiryReaper::new(store, config.booking.clone(), events.clone()));

    let worker = Arc::new(SideEffectWorker::new(events.clone(), notifier, analytics, receipts));
    tokio::spawn(worker.run());
    tokio::spawn(reaper.clone().run());

    let app_state = AppState {
        reservations,
        payments,
        admin,
        reaper,
        events,
        redis: Some(redis_arc),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
