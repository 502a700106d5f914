// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::ConnectionHub;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, InMemorySessionDirectory, NetSettings};
use crate::interface_adapters::utils::ids::CryptoIdGenerator;
use crate::use_cases::{SessionService, SessionSettings};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let app = app(build_state());

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_host(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let service = SessionService::new(
        Arc::new(InMemorySessionDirectory::new()),
        Arc::new(CryptoIdGenerator),
        SessionSettings {
            code_attempts: config::SESSION_CODE_ATTEMPTS,
        },
    );

    let net = NetSettings {
        read_timeout: config::read_timeout(),
        write_timeout: config::write_timeout(),
        outbound_capacity: config::OUTBOUND_CHANNEL_CAPACITY,
        max_invalid_messages: config::MAX_INVALID_MESSAGES,
    };
    tracing::debug!(
        read_timeout_secs = net.read_timeout.as_secs(),
        write_timeout_secs = net.write_timeout.as_secs(),
        "transport configured"
    );

    Arc::new(AppState {
        service: Arc::new(service),
        hub: Arc::new(ConnectionHub::new()),
        net,
    })
}
