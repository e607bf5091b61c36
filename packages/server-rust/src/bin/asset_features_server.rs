//! Asset features server.
//!
//! Run with: `cargo run -p asset-features-server -- --help`

use std::sync::Arc;

use anyhow::Context;
use asset_features_server::config::{LogFormat, ServerArgs};
use asset_features_server::features::SpatialFeatureQueryEngine;
use asset_features_server::network::NetworkModule;
use asset_features_server::repository::ProcedureCaller;
use asset_features_server::service::MapConfigurationAssembler;
use asset_features_server::storage::{PgStore, TableInformation};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,asset_features_server=debug"));

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_logging(args.log_format);
    args.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %args.host,
        port = args.port,
        tls = args.tls_cert.is_some(),
        feature_schema = %args.asset_feature_schema,
        "starting asset features server"
    );

    let database = args.database_config()?;
    let store = Arc::new(
        PgStore::connect(&args.store_options())
            .await
            .context("failed to connect to PostgreSQL")?,
    );

    let caller = ProcedureCaller::new(store.clone(), database);
    let engine = SpatialFeatureQueryEngine::new(store.clone(), store.clone(), args.feature_config());
    let assembler = MapConfigurationAssembler::new(&caller);
    let tables = TableInformation::new(store.clone());

    let mut module = NetworkModule::new(args.network_config(), engine, assembler, tables);
    let port = module.start().await?;
    info!(port, "listening");

    let result = module.serve(shutdown_signal()).await;

    store.close().await;
    info!("server stopped");
    result
}
