pub mod bid_repository;
pub mod job_repository;
pub mod memory_store;

use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::results::InsertOneResult;
use mongodb::Cursor;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::bid::Bid;
use crate::models::job::{Job, JobFilter, JobUpdate};
use crate::models::outcome::{DeleteOutcome, InsertOutcome, UpdateOutcome};

pub const JOBS_COLLECTION: &str = "jobs";
pub const BIDS_COLLECTION: &str = "bids";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("invalid object id: {0}")]
    InvalidId(#[from] mongodb::bson::oid::Error),
    #[error("insert did not report an object id")]
    MissingInsertedId,
    #[error("bid carries no jobId string")]
    MissingJobId,
    #[error("cannot increment non-numeric total_bids")]
    NonNumericCounter,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What happened to a submitted bid.
#[derive(Debug, Clone, PartialEq)]
pub enum BidPlacement {
    Placed(InsertOutcome),
    AlreadyBid,
}

#[rocket::async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: Job) -> Result<InsertOutcome>;
    async fn get_all_jobs(&self) -> Result<Vec<Job>>;
    async fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>>;
    async fn find_job_by_id(&self, id: ObjectId) -> Result<Option<Job>>;
    /// `$set` the given fields, inserting the job under `id` when it is missing.
    async fn upsert_job(&self, id: ObjectId, update: JobUpdate) -> Result<UpdateOutcome>;
    async fn find_jobs_by_buyer(&self, email: &str) -> Result<Vec<Job>>;
    async fn delete_job(&self, id: ObjectId) -> Result<DeleteOutcome>;
}

#[rocket::async_trait]
pub trait BidStore: Send + Sync {
    /// Inserts the bid and bumps the job's `total_bids` as one unit, unless the
    /// bidder already has a bid on that job.
    async fn place_bid(&self, bid: Bid) -> Result<BidPlacement>;
    async fn find_bids_by_bidder(&self, email: &str) -> Result<Vec<Bid>>;
    async fn find_bids_by_buyer(&self, email: &str) -> Result<Vec<Bid>>;
    async fn update_bid_status(&self, id: ObjectId, status: &str) -> Result<UpdateOutcome>;
}

pub(crate) fn inserted(result: InsertOneResult) -> Result<InsertOutcome> {
    result
        .inserted_id
        .as_object_id()
        .map(InsertOutcome::new)
        .ok_or(StoreError::MissingInsertedId)
}

pub(crate) async fn collect<T>(mut cursor: Cursor<T>) -> Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut documents = Vec::new();
    while let Some(document) = cursor.try_next().await? {
        documents.push(document);
    }
    Ok(documents)
}
