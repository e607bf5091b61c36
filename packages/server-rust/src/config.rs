//! Command-line and environment configuration.
//!
//! [`ServerArgs`] is parsed once at startup and split into the per-component
//! configuration values below. Nothing here is global; each component
//! receives its own copy at construction.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use crate::features::FeatureConfig;
use crate::network::{NetworkConfig, TlsConfig};
use crate::storage::FunctionMap;
#[cfg(feature = "postgres")]
use crate::storage::PgStoreOptions;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "asset-features-server", about = "Asset features and map configuration API")]
pub struct ServerArgs {
    // === Database ===
    /// `PostgreSQL` connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Connection pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    pub max_connections: u32,

    /// Schema holding the map configuration stored functions
    #[arg(long, env = "MAP_CONFIGURATION_SCHEMA")]
    pub map_configuration_schema: String,

    /// JSON file mapping logical keys to stored function names
    #[arg(long, env = "MAP_CONFIGURATION_FUNCTION_MAP")]
    pub function_map: PathBuf,

    /// Schema holding the geometry tables
    #[arg(long, env = "ASSET_FEATURE_SCHEMA")]
    pub asset_feature_schema: String,

    #[arg(long, default_value = "geometry")]
    pub geometry_column: String,

    #[arg(long, default_value = "id")]
    pub feature_id_column: String,

    // === HTTP ===
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Allowed CORS origin (repeatable)
    #[arg(long = "cors-origin", default_value = "*")]
    pub cors_origins: Vec<String>,

    #[arg(long, default_value = "30")]
    pub request_timeout_secs: u64,

    /// TLS certificate (PEM); requires --tls-key
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    // === Logging ===
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Where the map configuration functions live and what they are called.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub schema: String,
    pub functions: FunctionMap,
}

impl ServerArgs {
    /// Loads the function map file.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, malformed or empty.
    pub fn database_config(&self) -> anyhow::Result<DatabaseConfig> {
        let functions = FunctionMap::load(&self.function_map)?;
        anyhow::ensure!(
            !functions.is_empty(),
            "function map {} has no entries",
            self.function_map.display()
        );
        Ok(DatabaseConfig {
            schema: self.map_configuration_schema.clone(),
            functions,
        })
    }

    #[must_use]
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            schema: self.asset_feature_schema.clone(),
            geometry_column: self.geometry_column.clone(),
            feature_id_column: self.feature_id_column.clone(),
        }
    }

    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        let tls = match (&self.tls_cert, &self.tls_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        };
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            tls,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn store_options(&self) -> PgStoreOptions {
        PgStoreOptions {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            ..PgStoreOptions::default()
        }
    }

    /// Checks values clap cannot validate on its own.
    ///
    /// # Errors
    ///
    /// Describes the first invalid value.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.max_connections > 0, "--max-connections must be at least 1");
        anyhow::ensure!(
            !self.map_configuration_schema.trim().is_empty(),
            "--map-configuration-schema must not be empty"
        );
        anyhow::ensure!(
            !self.asset_feature_schema.trim().is_empty(),
            "--asset-feature-schema must not be empty"
        );
        if let Some(cert) = &self.tls_cert {
            std::fs::metadata(cert)
                .with_context(|| format!("TLS certificate {} is not readable", cert.display()))?;
        }
        Ok(())
    }
}
