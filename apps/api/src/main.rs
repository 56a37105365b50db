use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use chat_cell::handlers::ChatState;
use chat_cell::services::{
    DedupGuard, FlowEngine, MessageSender, ReminderDispatcher, SessionStore, WebhookOrchestrator,
    WhatsAppGateway,
};
use directory_cell::services::store::{AppointmentStore, SupabaseAppointmentStore};
use notification_cell::{BrevoMailer, Mailer};
use shared_config::AppConfig;

/// How often expired sessions are swept and due reminders dispatched.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Citas Bot API server");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_whatsapp_configured() {
        warn!("WhatsApp credentials missing; outbound messages will fail");
    }

    // Wire the conversation engine
    let store: Arc<dyn AppointmentStore> = Arc::new(SupabaseAppointmentStore::new(&config));
    let sender: Arc<dyn MessageSender> = Arc::new(WhatsAppGateway::new(&config));
    let mailer: Arc<dyn Mailer> = Arc::new(BrevoMailer::new(&config));
    let sessions = Arc::new(SessionStore::new());
    let dedup = Arc::new(DedupGuard::default());

    let engine = Arc::new(FlowEngine::new(
        sessions.clone(),
        store.clone(),
        sender.clone(),
        mailer,
        config.conversation_timeout_minutes,
    ));
    let orchestrator = WebhookOrchestrator::new(&config, dedup.clone(), engine);

    let chat_state = Arc::new(ChatState {
        orchestrator,
        sender: sender.clone(),
    });

    // Background maintenance: session/dedup sweeps and reminder dispatch
    let reminders = ReminderDispatcher::new(store, sender);
    let timeout = chrono::Duration::minutes(config.conversation_timeout_minutes);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            sessions.sweep_expired(timeout).await;
            dedup.sweep();
            if let Err(e) = reminders.run_once().await {
                error!("Reminder pass failed: {:#}", e);
            }
        }
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(Arc::new(config), chat_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
