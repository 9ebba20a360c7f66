use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sea_orm::sqlx::ConnectOptions as _;
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sea_orm_migration::MigratorTrait;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use accounts::domain::service::{Service as AccountsService, ServiceConfig as AccountsServiceConfig};
use accounts::infra::storage::migrations::Migrator as AccountsMigrator;
use recipes::domain::service::{Service as RecipesService, ServiceConfig as RecipesServiceConfig};
use recipes::infra::storage::migrations::Migrator as RecipesMigrator;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    // Rebuild DSN with absolute path and normalized slashes
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Pantry Server - recipe management API
#[derive(Parser)]
#[command(name = "pantry-server")]
#[command(about = "Pantry Server - recipe management API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Pantry Server starting");

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Pick the effective database settings, honoring `--mock`.
fn resolve_database(config: &AppConfig, args: &CliArgs) -> DatabaseConfig {
    let mut db_config = config.database.clone().unwrap_or_default();
    if args.mock {
        db_config.url = "sqlite://:memory:".to_string();
    }
    db_config
}

async fn connect_database(db_config: &DatabaseConfig, dsn: &str) -> Result<DatabaseConnection> {
    let mut options = SqliteConnectOptions::from_str(dsn)
        .with_context(|| format!("Invalid database DSN '{}'", dsn))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(
            u64::from(db_config.busy_timeout_ms.unwrap_or(5000)),
        ))
        // Per-statement logs drown the file log at debug level.
        .disable_statement_logging();

    // In-memory databases do not support WAL; a pool of them would also give
    // every connection its own empty database, so cap it at one.
    let max_conns = if dsn == "sqlite::memory:" {
        1
    } else {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        db_config.max_conns.unwrap_or(10)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_conns)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", dsn))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let base_dir = PathBuf::from(&config.server.home_dir);

    let db_config = resolve_database(&config, &args);
    let dsn = absolutize_sqlite_dsn(&db_config.url, &base_dir, true)?;
    tracing::info!(dsn = %dsn, "Connecting to database");
    let db = connect_database(&db_config, &dsn).await?;

    // Accounts owns the users table the recipe schema references, so it
    // migrates first.
    AccountsMigrator::up(&db, None)
        .await
        .context("Failed to apply accounts migrations")?;
    RecipesMigrator::up(&db, None)
        .await
        .context("Failed to apply recipes migrations")?;
    tracing::info!("Database migrations applied");

    let accounts_svc = Arc::new(AccountsService::new(
        db.clone(),
        AccountsServiceConfig::default(),
    ));
    let recipes_svc = Arc::new(RecipesService::new(db, RecipesServiceConfig::default()));

    let timeout = match config.server.timeout_sec {
        0 => Duration::from_secs(30),
        secs => Duration::from_secs(secs),
    };
    let router = build_router(accounts_svc, recipes_svc, timeout);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind {}:{}",
                    config.server.host, config.server.port
                )
            })?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = wait_for_shutdown().await {
                tracing::warn!(error = %e, "Shutdown signal listener failed");
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_router(
    accounts_svc: Arc<AccountsService>,
    recipes_svc: Arc<RecipesService>,
    timeout: Duration,
) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .merge(accounts::api::rest::routes::router(accounts_svc.clone()))
        .merge(recipes::api::rest::routes::router(recipes_svc, accounts_svc))
        .fallback(unknown_route);

    // Middleware order (outermost to innermost):
    // PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace -> Timeout -> CORS -> BodyLimit
    let x_request_id = api_core::request_id::header();

    // 1. If client sent x-request-id, propagate it; otherwise we will set it
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));

    // 2. Generate x-request-id when missing
    router = router.layer(SetRequestIdLayer::new(
        x_request_id,
        api_core::request_id::MakeReqId,
    ));

    // 3. Put request_id into extensions and span
    router = router.layer(from_fn(api_core::request_id::push_req_id_to_extensions));

    // 4. Trace with request_id/status/latency
    router = router.layer(api_core::request_id::create_trace_layer());

    // 5. Timeout layer for handlers
    router = router.layer(TimeoutLayer::new(timeout));

    // 6. CORS layer
    router = router.layer(CorsLayer::permissive());

    // 7. Body limit layer - 16MB default limit
    router = router.layer(RequestBodyLimitLayer::new(16 * 1024 * 1024));

    router
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn unknown_route(uri: axum::http::Uri) -> api_core::problem::ProblemResponse {
    api_core::problem::not_found(format!("No route for {}", uri.path()))
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?; // Ctrl+C
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
            _ = tokio::signal::ctrl_c() => {}, // fallback
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Resolve the DSN the same way `run` would, without creating directories.
    let db_config = resolve_database(&config, &args);
    let dsn = absolutize_sqlite_dsn(&db_config.url, Path::new(&config.server.home_dir), false)?;
    tracing::info!(dsn = %dsn, "Database DSN resolved");

    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_dsn_spellings_collapse() {
        let base = Path::new("/srv/pantry");
        let a = absolutize_sqlite_dsn("sqlite::memory:", base, false).unwrap();
        let b = absolutize_sqlite_dsn("sqlite://:memory:", base, false).unwrap();
        assert_eq!(a, "sqlite::memory:");
        assert_eq!(b, "sqlite::memory:");
    }

    #[test]
    fn relative_path_resolves_against_base_dir() {
        let tmp = tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://data/pantry.db", tmp.path(), false).unwrap();
        assert!(dsn.starts_with("sqlite://"));
        assert!(dsn.ends_with("data/pantry.db"));
        assert!(dsn.contains(&tmp.path().to_string_lossy().replace('\\', "/")));
    }

    #[test]
    fn absolute_path_is_kept() {
        let dsn =
            absolutize_sqlite_dsn("sqlite:///var/lib/pantry.db", Path::new("/ignored"), false)
                .unwrap();
        assert_eq!(dsn, "sqlite:///var/lib/pantry.db");
    }

    #[test]
    fn query_string_survives() {
        let dsn = absolutize_sqlite_dsn(
            "sqlite:///var/lib/pantry.db?mode=rwc",
            Path::new("/ignored"),
            false,
        )
        .unwrap();
        assert_eq!(dsn, "sqlite:///var/lib/pantry.db?mode=rwc");
    }

    #[test]
    fn non_sqlite_dsn_is_rejected() {
        let err = absolutize_sqlite_dsn("postgresql://localhost/pantry", Path::new("/"), false)
            .unwrap_err();
        assert!(err.to_string().contains("sqlite://"));
    }

    #[test]
    fn create_dirs_makes_parent() {
        let tmp = tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://nested/dir/pantry.db", tmp.path(), true).unwrap();
        assert!(tmp.path().join("nested/dir").is_dir());
        assert!(dsn.ends_with("nested/dir/pantry.db"));
    }

    #[test]
    fn mock_flag_overrides_configured_url() {
        let config = AppConfig::default();
        let args = CliArgs {
            config: None,
            port: None,
            print_config: false,
            verbose: 0,
            mock: true,
        };
        let db_config = resolve_database(&config, &args);
        assert_eq!(db_config.url, "sqlite://:memory:");
    }
}
