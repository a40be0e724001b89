use std::sync::Arc;

use rocket::{Build, Rocket};
use thiserror::Error;
use tracing::{error, info};

use crate::config::app_config::{AppConfig, ConfigError, StoreKind};
use crate::config::mongo_config::MongoConnection;
use crate::repository::bid_repository::BidRepository;
use crate::repository::job_repository::JobRepository;
use crate::repository::memory_store::MemoryStore;
use crate::repository::{BidStore, JobStore};
use crate::routes;
use crate::services::cors::Cors;
use crate::services::identity::AuthSettings;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("rocket failed: {0}")]
    Launch(#[from] rocket::Error),
}

/// Opens the configured store. An unreachable or unresolvable database is
/// logged, not fatal: requests fail individually until it comes back.
pub async fn open_store(
    config: &AppConfig,
) -> Result<(Arc<dyn JobStore>, Arc<dyn BidStore>), StartupError> {
    match config.store {
        StoreKind::Memory => {
            info!("using the in-memory store, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let jobs: Arc<dyn JobStore> = store.clone();
            let bids: Arc<dyn BidStore> = store;
            Ok((jobs, bids))
        }
        StoreKind::Mongo => {
            let connection = Arc::new(MongoConnection::new(config.mongo_uri()?, config.db_name.clone()));
            if let Err(e) = connection.client().await {
                error!(error = %e, "error connecting to MongoDB, requests will retry");
            }

            let jobs: Arc<dyn JobStore> = Arc::new(JobRepository::new(connection.clone()));
            let bids: Arc<dyn BidStore> = Arc::new(BidRepository::new(connection));
            Ok((jobs, bids))
        }
    }
}

pub fn build_rocket(
    config: &AppConfig,
    jobs: Arc<dyn JobStore>,
    bids: Arc<dyn BidStore>,
) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", config.address));

    rocket::custom(figment)
        .manage(jobs)
        .manage(bids)
        .manage(AuthSettings::from(config))
        .attach(Cors::new(config.cors_origin.clone()))
        .mount("/", routes::routes())
        .register("/", routes::catchers())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[tokio::test]
    async fn unresolvable_cluster_does_not_stop_startup() {
        let config = AppConfig::parse_from([
            "jobnest",
            "--db-user",
            "solo",
            "--db-pass",
            "secret",
            "--db-cluster",
            "cluster0.does-not-exist.invalid",
        ]);

        let (jobs, bids) = open_store(&config).await.expect("startup continues without the store");
        assert!(jobs.get_all_jobs().await.is_err());
        assert!(bids.find_bids_by_bidder("a@b.com").await.is_err());

        let client = rocket::local::asynchronous::Client::tracked(build_rocket(&config, jobs, bids))
            .await
            .expect("valid rocket instance");
        let response = client.get("/jobs").dispatch().await;
        assert_eq!(response.status(), rocket::http::Status::InternalServerError);
        assert_eq!(client.get("/").dispatch().await.status(), rocket::http::Status::Ok);
    }
}
