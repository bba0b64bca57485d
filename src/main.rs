//! Bridge daemon entrypoint: configuration, database pool, migrations, and the HTTP server.

// std
use std::sync::Arc;
// crates.io
use sqlx::postgres::PgPoolOptions;
use thiserror::Error as ThisError;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
// self
use seller_bridge::{
	client::SpApiClient,
	config::BridgeConfig,
	error::ConfigError,
	flows::Bridge,
	oauth::LwaClient,
	server,
	store::PgStore,
};

#[derive(Debug, ThisError)]
enum StartupError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("database connection failed")]
	Database(#[from] sqlx::Error),
	#[error("database migration failed")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("listener could not be bound")]
	Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let config = BridgeConfig::from_env()?;
	let pool = PgPoolOptions::new().max_connections(5).connect(&config.database_url).await?;

	sqlx::migrate!().run(&pool).await?;

	let http = reqwest::Client::builder()
		.timeout(config.http_timeout)
		.redirect(reqwest::redirect::Policy::none())
		.build()
		.map_err(ConfigError::from)?;
	let lwa = LwaClient::new(
		http.clone(),
		config.token_endpoint.clone(),
		config.client_id.clone(),
		config.client_secret.clone(),
	);
	let spapi =
		SpApiClient::new(http, config.api_endpoint.clone(), config.marketplace_id.clone());
	let store = Arc::new(PgStore::new(pool));
	let listen_addr = config.listen_addr;
	let bridge = Arc::new(Bridge::new(store.clone(), store, lwa, spapi, Arc::new(config)));
	let listener = TcpListener::bind(listen_addr).await?;

	tracing::info!(%listen_addr, "seller bridge listening");
	axum::serve(listener, server::router(bridge)).await?;

	Ok(())
}
