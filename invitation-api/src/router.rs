use std::{future::ready, sync::Arc};

use axum::{
    extract::State as AxumState,
    http::{Method, StatusCode},
    routing::{get, patch, post},
    Router,
};
use health::HealthRegistry;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api::{admin_endpoint, flags_endpoint, guest_endpoint},
    config::Config,
    flags::{FlagService, FlagStore},
    guests::{MediaService, MessageService, RsvpService},
    kv::Client,
    metrics_utils::{setup_metrics_recorder, track_metrics},
};

#[derive(Clone)]
pub struct State {
    pub store: Arc<dyn Client + Send + Sync>,
    pub flags: FlagService,
    pub rsvps: RsvpService,
    pub media: MediaService,
    pub messages: MessageService,
    pub config: Config,
}

impl State {
    pub fn new(store: Arc<dyn Client + Send + Sync>, config: Config) -> Self {
        State {
            flags: FlagService::new(FlagStore::new(store.clone())),
            rsvps: RsvpService::new(store.clone()),
            media: MediaService::new(store.clone()),
            messages: MessageService::new(store.clone()),
            store,
            config,
        }
    }
}

pub fn router(
    store: Arc<dyn Client + Send + Sync>,
    liveness: HealthRegistry,
    config: Config,
) -> Router {
    let state = State::new(store, config.clone());

    // The admin dashboard and guest page may be served from another origin.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .allow_origin(AllowOrigin::mirror_request());

    let status_router = Router::new()
        .route("/", get(index))
        .route("/api/health", get(guest_endpoint::health))
        .route("/_readiness", get(readiness))
        .route("/_liveness", get(move || ready(liveness.get_status())));

    let public_router = Router::new()
        .route("/api/feature-flags", get(flags_endpoint::list_flags))
        .route("/api/feature-flags/:feature_key", get(flags_endpoint::get_flag))
        .route("/api/rsvp", post(guest_endpoint::submit_rsvp))
        .route(
            "/api/media",
            get(guest_endpoint::approved_media).post(guest_endpoint::submit_media),
        )
        .route(
            "/api/messages",
            get(guest_endpoint::list_messages).post(guest_endpoint::post_message),
        );

    let admin_router = Router::new()
        .route("/api/admin/auth", post(admin_endpoint::authenticate))
        .route(
            "/api/admin/feature-flags/:feature_key",
            patch(admin_endpoint::toggle_flag),
        )
        .route("/api/admin/rsvps", get(admin_endpoint::list_rsvps))
        .route("/api/admin/media", get(admin_endpoint::list_media))
        .route(
            "/api/admin/media/:id/approve",
            patch(admin_endpoint::approve_media),
        );

    let router = Router::new()
        .merge(status_router)
        .merge(
            public_router
                .merge(admin_router)
                .layer(ConcurrencyLimitLayer::new(config.max_concurrency)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(state);

    // Only install the global recorder when asked to; it interferes with tests.
    if config.enable_metrics {
        let recorder_handle = setup_metrics_recorder();
        router.route("/metrics", get(move || ready(recorder_handle.render())))
    } else {
        router
    }
}

/// Ready when the backing store answers a ping.
pub async fn readiness(
    AxumState(state): AxumState<State>,
) -> Result<&'static str, (StatusCode, String)> {
    state.store.ping().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("store unavailable: {e}"),
        )
    })?;
    Ok("ready")
}

pub async fn index() -> &'static str {
    "invitation api"
}
