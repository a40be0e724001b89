use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure, TRANSIENT_TRANSACTION_ERROR};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::warn;

use crate::config::mongo_config::MongoConnection;
use crate::models::bid::Bid;
use crate::models::job::Job;
use crate::models::outcome::UpdateOutcome;
use crate::repository::{
    collect, inserted, BidPlacement, BidStore, Result, StoreError, BIDS_COLLECTION,
    JOBS_COLLECTION,
};

const DUPLICATE_KEY: i32 = 11000;
const MAX_TRANSACTION_ATTEMPTS: usize = 3;

/// One bid per bidder and job, even when two requests race past the
/// existence check.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let index = IndexModel::builder()
        .keys(doc! { "email": 1, "jobId": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Document>(BIDS_COLLECTION)
        .create_index(index, None)
        .await?;
    Ok(())
}

/// What to do after a failed bid transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureAction {
    AlreadyBid,
    Retry,
    Fail,
}

fn classify_failure(code: Option<i32>, transient: bool, attempt: usize) -> FailureAction {
    if code == Some(DUPLICATE_KEY) {
        FailureAction::AlreadyBid
    } else if transient && attempt < MAX_TRANSACTION_ATTEMPTS {
        FailureAction::Retry
    } else {
        FailureAction::Fail
    }
}

fn server_error_code(error: &mongodb::error::Error) -> Option<i32> {
    match &*error.kind {
        ErrorKind::Write(WriteFailure::WriteError(failure)) => Some(failure.code),
        ErrorKind::Command(failure) => Some(failure.code),
        _ => None,
    }
}

pub struct BidRepository {
    connection: Arc<MongoConnection>,
}

impl BidRepository {
    pub fn new(connection: Arc<MongoConnection>) -> Self {
        BidRepository { connection }
    }

    async fn bids(&self) -> Result<Collection<Bid>> {
        let db = self.connection.database().await?;
        Ok(db.collection::<Bid>(BIDS_COLLECTION))
    }

    async fn place_bid_once(&self, bid: &Bid, job_id: ObjectId) -> Result<BidPlacement> {
        let client = self.connection.client().await?;
        let db = self.connection.database().await?;
        let bids = db.collection::<Bid>(BIDS_COLLECTION);
        let jobs = db.collection::<Job>(JOBS_COLLECTION);

        let mut session = client.start_session(None).await?;
        session.start_transaction(None).await?;

        let (email, bid_job) = bid.bidder_and_job();
        let existing = bids
            .find_one_with_session(doc! { "email": email, "jobId": bid_job }, None, &mut session)
            .await?;
        if existing.is_some() {
            session.abort_transaction().await?;
            return Ok(BidPlacement::AlreadyBid);
        }

        let result = bids.insert_one_with_session(bid, None, &mut session).await?;
        jobs.update_one_with_session(
            doc! { "_id": job_id },
            doc! { "$inc": { "total_bids": 1 } },
            None,
            &mut session,
        )
        .await?;
        session.commit_transaction().await?;

        inserted(result).map(BidPlacement::Placed)
    }
}

#[rocket::async_trait]
impl BidStore for BidRepository {
    async fn place_bid(&self, bid: Bid) -> Result<BidPlacement> {
        let job_id = ObjectId::parse_str(bid.job_id().ok_or(StoreError::MissingJobId)?)?;
        let mut attempt = 1;
        loop {
            match self.place_bid_once(&bid, job_id).await {
                Err(StoreError::Database(error)) => {
                    let transient = error.contains_label(TRANSIENT_TRANSACTION_ERROR);
                    match classify_failure(server_error_code(&error), transient, attempt) {
                        FailureAction::AlreadyBid => return Ok(BidPlacement::AlreadyBid),
                        FailureAction::Retry => {
                            warn!(attempt, job_id = %job_id, error = %error, "retrying bid transaction");
                            attempt += 1;
                        }
                        FailureAction::Fail => return Err(StoreError::Database(error)),
                    }
                }
                outcome => return outcome,
            }
        }
    }

    async fn find_bids_by_bidder(&self, email: &str) -> Result<Vec<Bid>> {
        let filter = doc! { "email": email };
        let cursor = self.bids().await?.find(filter, None).await?;
        collect(cursor).await
    }

    async fn find_bids_by_buyer(&self, email: &str) -> Result<Vec<Bid>> {
        let filter = doc! { "buyer": email };
        let cursor = self.bids().await?.find(filter, None).await?;
        collect(cursor).await
    }

    async fn update_bid_status(&self, id: ObjectId, status: &str) -> Result<UpdateOutcome> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": { "status": status } };
        let result = self.bids().await?.update_one(filter, update, None).await?;
        Ok(result.into())
    }
}
