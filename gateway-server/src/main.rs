use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use gateway_auth::AuthManager;
use gateway_events::{ConnectionRegistry, RegistryConfig};
use gateway_mcp::{project_catalog, BackendClient, BackendConfig, Dispatcher};
use gateway_server::{router, AppState, Args, LogFormat};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,gateway_server=debug";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal(registry: Arc<ConnectionRegistry>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    // Push streams only end once their sinks close.
    registry.shutdown();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let auth = Arc::new(AuthManager::new(args.auth_config()).context("configure auth manager")?);
    for token in &args.static_tokens {
        auth.provision(token.token.clone(), token.kind, token.description.clone());
    }
    let sweeper = auth.spawn_sweeper();

    let registry = ConnectionRegistry::start(RegistryConfig::default());

    let backend_config = BackendConfig::from_env();
    info!(backend = %backend_config.base_url, "Using project backend");
    let backend = Arc::new(BackendClient::new(backend_config).context("build backend client")?);
    let dispatcher = Arc::new(Dispatcher::with_catalog(project_catalog(backend)));

    let mut state = AppState::new(auth, registry.clone(), dispatcher);
    let mut pruner = None;
    if let Some((max_requests, window)) = args.rate_limit() {
        state = state.with_rate_limit(max_requests, window);
        if let Some(limiter) = state.limiter.clone() {
            pruner = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(window);
                loop {
                    ticker.tick().await;
                    limiter.prune();
                }
            }));
        }
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    info!(addr = %args.bind, "MCP gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(registry.clone()))
    .await
    .context("serve")?;

    registry.shutdown();
    sweeper.abort();
    if let Some(pruner) = pruner {
        pruner.abort();
    }
    info!("MCP gateway stopped");
    Ok(())
}
