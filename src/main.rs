#[macro_use]
extern crate rocket;

mod app;
mod config;
mod error;
mod jwt;
mod models;
mod repository;
mod routes;
mod services;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{build_rocket, open_store, StartupError};
use crate::config::app_config::AppConfig;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // rocket's own log lines are bridged into the same subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[rocket::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::parse();
    let (jobs, bids) = open_store(&config).await?;
    let _rocket = build_rocket(&config, jobs, bids).launch().await?;
    Ok(())
}
