use chrono::Utc;
use clap::Parser;

use bustas_core::model::User;
use bustas_server::auth::{TokenIssuer, hash_password};
use bustas_server::cli::{Cli, Command};
use bustas_server::config::{AppConfig, LogFormat, StorageBackend};
use bustas_server::rest::{AppState, create_router};
use bustas_storage::{AccountStore, MemoryStore, PostgresStore, Store};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer().json();
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer().pretty();
            registry.with(fmt_layer).init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Some(Command::Migrate) => run_migrate(&config).await,
        Some(Command::CreateAdmin {
            id,
            email,
            password,
            name,
            surname,
        }) => run_create_admin(&config, id, &email, &password, &name, &surname).await,
        Some(Command::Serve) | None => run_serve(config).await,
    }
}

async fn run_migrate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("running database migrations");
    let store = PostgresStore::connect(&config.database.url).await?;
    store.migrate().await?;
    tracing::info!("migrations completed successfully");
    Ok(())
}

async fn run_create_admin(
    config: &AppConfig,
    id: i64,
    email: &str,
    password: &str,
    name: &str,
    surname: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = PostgresStore::connect(&config.database.url).await?;
    store.migrate().await?;

    let user = User {
        id_user: id,
        name: name.to_string(),
        surname: surname.to_string(),
        email: email.to_string(),
        phone: String::new(),
        password_hash: hash_password(password)?,
        registration_time: Utc::now(),
        profile_picture: None,
    };
    store.insert_user(&user).await?;
    store.insert_administrator(id).await?;

    println!("Administrator created");
    println!("  Id:    {id}");
    println!("  Email: {email}");
    Ok(())
}

async fn run_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(http_addr = %config.http_addr(), "starting bustas server");

    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            serve_with_store(config, MemoryStore::new()).await
        }
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(&config.database.url).await?;
            store.migrate().await?;
            serve_with_store(config, store).await
        }
    }
}

async fn serve_with_store<S: Store>(
    config: AppConfig,
    store: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(store, TokenIssuer::new(&config.auth));
    let router = create_router(state);

    let addr: std::net::SocketAddr = config.http_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "REST server listening");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(());
    tokio::spawn(shutdown_signal(shutdown_tx));

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal(shutdown_tx: tokio::sync::watch::Sender<()>) {
    let ctrl_c = tokio::signal::ctrl_c();

    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => { tracing::info!("received SIGINT"); }
                _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler, using SIGINT only");
            let _ = ctrl_c.await;
            tracing::info!("received SIGINT");
        }
    }

    let _ = shutdown_tx.send(());
}
