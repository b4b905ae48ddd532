//! services/reader/src/bin/clearread.rs

use clearread_core::ports::{DocumentStore, IdentityService};
use reader_lib::{
    adapters::{
        CredentialStore, DbAdapter, HttpConversionAdapter, InMemoryCredentialStore,
        InMemoryDocumentStore, LocalIdentityService,
    },
    command::Command,
    config::Config,
    error::AppError,
    render::render_shell,
    session::{Route, SessionProvider},
    shell::{Flow, Shell},
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting reader...");

    // --- 2. Pick the Storage Backend ---
    let (store, credentials): (Arc<dyn DocumentStore>, Arc<dyn CredentialStore>) =
        match &config.database_url {
            Some(database_url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                let store: Arc<dyn DocumentStore> = db_adapter.clone();
                let credentials: Arc<dyn CredentialStore> = db_adapter;
                (store, credentials)
            }
            None => {
                warn!("DATABASE_URL is not set; documents and accounts live in memory only.");
                let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
                let credentials: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::new());
                (store, credentials)
            }
        };

    // --- 3. Initialize Service Adapters ---
    let identity = Arc::new(LocalIdentityService::new(credentials, &config));
    let conversion = Arc::new(HttpConversionAdapter::new(
        config.api_url.clone(),
        config.http_timeout,
    )?);
    info!(api_url = %config.api_url, "Conversion API configured.");

    // --- 4. Start the Session Provider ---
    let identity_service: Arc<dyn IdentityService> = identity.clone();
    let provider = SessionProvider::start(identity_service.clone());
    identity.restore().await;

    // --- 5. Build the Shared AppState ---
    let app_state = AppState {
        identity: identity_service,
        store,
        conversion,
        session: provider.handle(),
        config: config.clone(),
    };

    // --- 6. Run the Terminal Loop ---
    let result = run(Shell::new(app_state)).await;
    provider.shutdown().await;
    info!("Reader stopped.");
    result
}

async fn run(mut shell: Shell) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    shell.navigate(Route::Home).await;
    shell.set_notice("Type 'help' for the list of commands.");
    loop {
        let frame = format!("\n{}> ", render_shell(&shell));
        stdout.write_all(frame.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match Command::parse(&line) {
            Ok(command) => {
                if shell.apply(command).await == Flow::Quit {
                    break;
                }
            }
            Err(e) => shell.set_notice(e.to_string()),
        }
    }
    Ok(())
}
