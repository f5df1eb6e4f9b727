use std::sync::Arc;

use envconfig::Envconfig;
use tokio::signal;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use flag_poller::admin::AdminSession;
use flag_poller::client::ApiClient;
use flag_poller::config::Config;
use flag_poller::gate::guest_page;
use flag_poller::poller::{FlagHandle, FlagPoller};

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

fn render(flags: &FlagHandle) {
    let snapshot = flags.snapshot();
    let sections: Vec<String> = guest_page(|key| snapshot.is_enabled(key))
        .into_iter()
        .map(|section| section.to_string())
        .collect();
    tracing::info!(sections = ?sections, "guest page layout");
}

async fn watch_layout(mut flags: FlagHandle) {
    render(&flags);
    while flags.changed().await {
        render(&flags);
    }
}

#[tokio::main]
async fn main() {
    let config = Config::init_from_env().expect("Invalid configuration:");

    let log_layer = {
        let base_layer = fmt::layer().with_target(true).with_level(true);
        if config.debug {
            base_layer
                .with_ansi(true)
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        } else {
            base_layer
                .json()
                .with_filter(EnvFilter::from_default_env())
                .boxed()
        }
    };
    tracing_subscriber::registry().with(log_layer).init();

    let client = ApiClient::new(config.flags_url.clone());
    let (flags, poller) = FlagPoller::spawn(Arc::new(client.clone()), config.poll_settings());

    if let Some(admin_key) = config.admin_key.clone() {
        match AdminSession::login(client, admin_key, flags.clone()).await {
            Ok(session) => match session.list_rsvps().await {
                Ok(rsvps) => tracing::info!(statistics = ?rsvps.statistics, "rsvp summary"),
                Err(e) => tracing::warn!("could not load rsvps: {}", e.user_message()),
            },
            Err(e) => tracing::error!("admin login failed: {}", e.user_message()),
        }
    }

    tokio::select! {
        _ = watch_layout(flags) => {},
        _ = shutdown() => {},
    }
    poller.abort();
}
