use std::net::IpAddr;

use clap::{Parser, ValueEnum};
use thiserror::Error;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// MongoDB through the official driver.
    Mongo,
    /// In-process collections, lost on restart.
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("set MONGODB_URI, or both DB_USER and DB_PASS")]
    MissingCredentials,
}

/// Runtime settings. Every flag can also come from the environment (or a
/// `.env` file loaded before parsing).
#[derive(Parser, Debug, Clone)]
#[command(name = "jobnest", version, about = "REST backend for the job marketplace")]
pub struct AppConfig {
    #[arg(long, env = "PORT", default_value_t = 9000)]
    pub port: u16,

    #[arg(long, env = "ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    #[arg(long, env = "STORE", value_enum, default_value_t = StoreKind::Mongo)]
    pub store: StoreKind,

    /// Full connection string; takes precedence over the DB_* settings.
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    #[arg(long, env = "DB_CLUSTER", default_value = "cluster0.nghoa.mongodb.net")]
    pub db_cluster: String,

    #[arg(long, env = "DB_NAME", default_value = "job-nestDB")]
    pub db_name: String,

    /// HMAC secret used to sign and verify access tokens.
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Single origin allowed to send credentialed requests. Unset means `*`.
    #[arg(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Reject mutating requests that carry no valid token.
    #[arg(long, env = "ENFORCE_AUTH")]
    pub enforce_auth: bool,
}

impl AppConfig {
    pub fn mongo_uri(&self) -> Result<String, ConfigError> {
        if let Some(uri) = &self.mongodb_uri {
            return Ok(uri.clone());
        }
        match (&self.db_user, &self.db_pass) {
            (Some(user), Some(pass)) => Ok(format!(
                "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
                user, pass, self.db_cluster
            )),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}
