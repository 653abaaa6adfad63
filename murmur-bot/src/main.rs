//! murmur-bot - anonymous chat survey service
//!
//! Walks respondents through registration and the active survey over
//! a chat transport. The transport adapter attaches via POST /event.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use murmur_bot::{build_router, AppState};
use murmur_common::{config, db, Anonymizer};

#[derive(Parser, Debug)]
#[command(name = "murmur-bot", version, about = "Anonymous chat survey service")]
struct Args {
    /// Data root folder (overrides MURMUR_ROOT_FOLDER and the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Anonymizer salt (overrides MURMUR_ANONYMOUS_SALT and the config file)
    #[arg(long)]
    salt: Option<String>,

    /// HTTP port for the transport ingress
    #[arg(long, env = "MURMUR_PORT", default_value_t = 5731)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting murmur-bot v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Missing salt is fatal here, never discovered at request time
    let salt = config::resolve_salt(args.salt.as_deref())?;
    let anonymizer = Anonymizer::new(salt)?;

    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), "MURMUR_ROOT_FOLDER")?;
    std::fs::create_dir_all(&root_folder)?;

    let db_path = root_folder.join("murmur.db");
    info!("Database path: {}", db_path.display());

    let pool = db::init_database(&db_path).await?;

    let state = AppState::new(pool, anonymizer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    info!("murmur-bot listening on http://127.0.0.1:{}", args.port);
    info!("Health check: http://127.0.0.1:{}/health", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
