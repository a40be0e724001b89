use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::Mutex;

use crate::models::bid::Bid;
use crate::models::job::{compare_deadlines, Job, JobFilter, JobUpdate};
use crate::models::outcome::{DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::repository::{BidPlacement, BidStore, JobStore, Result, StoreError};

#[derive(Default)]
struct Collections {
    jobs: Vec<Job>,
    bids: Vec<Bid>,
}

/// Process-local store with the same query semantics as the Mongo
/// repositories. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `$inc: { total_bids: 1 }`: a missing counter starts at 1.
fn increment_total_bids(fields: &mut Document) -> Result<()> {
    let next = match fields.get("total_bids") {
        None | Some(Bson::Null) => Bson::Int32(1),
        Some(Bson::Int32(n)) => Bson::Int32(n + 1),
        Some(Bson::Int64(n)) => Bson::Int64(n + 1),
        Some(Bson::Double(n)) => Bson::Double(n + 1.0),
        Some(_) => return Err(StoreError::NonNumericCounter),
    };
    fields.insert("total_bids", next);
    Ok(())
}

#[rocket::async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, mut job: Job) -> Result<InsertOutcome> {
        let id = *job.id.get_or_insert_with(ObjectId::new);
        self.collections.lock().await.jobs.push(job);
        Ok(InsertOutcome::new(id))
    }

    async fn get_all_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.collections.lock().await.jobs.clone())
    }

    async fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = {
            let collections = self.collections.lock().await;
            collections
                .jobs
                .iter()
                .filter(|job| filter.matches(job))
                .cloned()
                .collect()
        };
        if let Some(order) = filter.sort {
            jobs.sort_by(|a, b| {
                let ordering = compare_deadlines(a, b);
                if order.direction() < 0 {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        Ok(jobs)
    }

    async fn find_job_by_id(&self, id: ObjectId) -> Result<Option<Job>> {
        let collections = self.collections.lock().await;
        Ok(collections.jobs.iter().find(|job| job.id == Some(id)).cloned())
    }

    async fn upsert_job(&self, id: ObjectId, update: JobUpdate) -> Result<UpdateOutcome> {
        let mut collections = self.collections.lock().await;
        if let Some(job) = collections.jobs.iter_mut().find(|job| job.id == Some(id)) {
            let before = job.fields.clone();
            update.apply_to(job);
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(job.fields != before),
                upserted_id: None,
            });
        }

        let mut job = Job {
            id: Some(id),
            fields: Document::new(),
        };
        update.apply_to(&mut job);
        collections.jobs.push(job);
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
        })
    }

    async fn find_jobs_by_buyer(&self, email: &str) -> Result<Vec<Job>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .jobs
            .iter()
            .filter(|job| job.buyer_email() == Some(email))
            .cloned()
            .collect())
    }

    async fn delete_job(&self, id: ObjectId) -> Result<DeleteOutcome> {
        let mut collections = self.collections.lock().await;
        let before = collections.jobs.len();
        if let Some(position) = collections.jobs.iter().position(|job| job.id == Some(id)) {
            collections.jobs.remove(position);
        }
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: (before - collections.jobs.len()) as u64,
        })
    }
}

#[rocket::async_trait]
impl BidStore for MemoryStore {
    async fn place_bid(&self, mut bid: Bid) -> Result<BidPlacement> {
        let job_id = ObjectId::parse_str(bid.job_id().ok_or(StoreError::MissingJobId)?)?;

        // check, increment and insert under one lock
        let mut collections = self.collections.lock().await;
        let key = bid.bidder_and_job();
        if collections.bids.iter().any(|existing| existing.bidder_and_job() == key) {
            return Ok(BidPlacement::AlreadyBid);
        }

        if let Some(job) = collections.jobs.iter_mut().find(|job| job.id == Some(job_id)) {
            increment_total_bids(&mut job.fields)?;
        }
        let id = *bid.id.get_or_insert_with(ObjectId::new);
        collections.bids.push(bid);
        Ok(BidPlacement::Placed(InsertOutcome::new(id)))
    }

    async fn find_bids_by_bidder(&self, email: &str) -> Result<Vec<Bid>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .bids
            .iter()
            .filter(|bid| bid.email() == Some(email))
            .cloned()
            .collect())
    }

    async fn find_bids_by_buyer(&self, email: &str) -> Result<Vec<Bid>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .bids
            .iter()
            .filter(|bid| bid.buyer() == Some(email))
            .cloned()
            .collect())
    }

    async fn update_bid_status(&self, id: ObjectId, status: &str) -> Result<UpdateOutcome> {
        let mut collections = self.collections.lock().await;
        let (matched_count, modified_count) =
            match collections.bids.iter_mut().find(|bid| bid.id == Some(id)) {
                Some(bid) => {
                    let modified = bid.status() != Some(status);
                    bid.fields.insert("status", status);
                    (1, u64::from(modified))
                }
                None => (0, 0),
            };
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn bid(job_id: String) -> Bid {
        Bid::from_submission(doc! { "jobId": job_id, "email": "bidder@example.com" })
    }

    #[tokio::test]
    async fn upsert_inserts_missing_job_under_given_id() {
        let store = MemoryStore::new();
        let id = ObjectId::new();
        let update = JobUpdate::from_body(doc! { "job_title": "Brand new" });

        let outcome = store.upsert_job(id, update).await.expect("upsert");
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.upserted_id, Some(id));

        let stored = store.find_job_by_id(id).await.expect("lookup").expect("job exists");
        assert_eq!(stored.fields, doc! { "job_title": "Brand new" });
    }

    #[tokio::test]
    async fn unchanged_update_reports_no_modification() {
        let store = MemoryStore::new();
        let job = Job::from_submission(doc! { "job_title": "Logo", "deadline": "2024-10-01" });
        let id = store.create_job(job).await.expect("insert").inserted_id;

        let outcome = store
            .upsert_job(id, JobUpdate::from_body(doc! { "job_title": "Logo" }))
            .await
            .expect("update");
        assert_eq!(outcome.matched_count, 1);
        assert_eq!(outcome.modified_count, 0);
        assert_eq!(outcome.upserted_id, None);
    }

    #[tokio::test]
    async fn counter_starts_at_one_when_missing() {
        let store = MemoryStore::new();
        let job_id = store
            .create_job(Job::from_submission(doc! { "job_title": "No counter" }))
            .await
            .expect("insert")
            .inserted_id;

        store.place_bid(bid(job_id.to_hex())).await.expect("placement");
        let job = store.find_job_by_id(job_id).await.expect("lookup").expect("job exists");
        assert_eq!(job.fields.get("total_bids"), Some(&Bson::Int32(1)));
    }

    #[tokio::test]
    async fn bid_on_unknown_job_is_kept_without_counter() {
        let store = MemoryStore::new();
        let placement = store.place_bid(bid(ObjectId::new().to_hex())).await.expect("placement");
        assert!(matches!(placement, BidPlacement::Placed(_)));
        assert_eq!(store.find_bids_by_bidder("bidder@example.com").await.expect("bids").len(), 1);
    }

    #[tokio::test]
    async fn bid_with_malformed_job_id_is_rejected_before_insert() {
        let store = MemoryStore::new();
        assert!(store.place_bid(bid("not-an-object-id".into())).await.is_err());
        let no_job = Bid::from_submission(doc! { "email": "bidder@example.com" });
        assert!(matches!(store.place_bid(no_job).await, Err(StoreError::MissingJobId)));
        assert!(store.find_bids_by_bidder("bidder@example.com").await.expect("bids").is_empty());
    }

    #[tokio::test]
    async fn status_update_on_missing_bid_matches_nothing() {
        let store = MemoryStore::new();
        let outcome = store.update_bid_status(ObjectId::new(), "Rejected").await.expect("update");
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.modified_count, 0);
    }
}
