use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOptions, UpdateOptions};
use mongodb::Collection;

use crate::config::mongo_config::MongoConnection;
use crate::models::job::{Job, JobFilter, JobUpdate};
use crate::models::outcome::{DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::repository::{collect, inserted, JobStore, Result, JOBS_COLLECTION};

pub struct JobRepository {
    connection: Arc<MongoConnection>,
}

impl JobRepository {
    pub fn new(connection: Arc<MongoConnection>) -> Self {
        JobRepository { connection }
    }

    async fn collection(&self) -> Result<Collection<Job>> {
        let db = self.connection.database().await?;
        Ok(db.collection::<Job>(JOBS_COLLECTION))
    }
}

/// Category is an exact match, search a literal case-insensitive title match.
pub(crate) fn filter_document(filter: &JobFilter) -> Document {
    let mut query = Document::new();
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(search) = &filter.search {
        query.insert(
            "job_title",
            doc! { "$regex": regex::escape(search), "$options": "i" },
        );
    }
    query
}

pub(crate) fn find_options(filter: &JobFilter) -> Option<FindOptions> {
    filter.sort.map(|order| {
        FindOptions::builder()
            .sort(doc! { "deadline": order.direction() })
            .build()
    })
}

#[rocket::async_trait]
impl JobStore for JobRepository {
    async fn create_job(&self, job: Job) -> Result<InsertOutcome> {
        let result = self.collection().await?.insert_one(&job, None).await?;
        inserted(result)
    }

    async fn get_all_jobs(&self) -> Result<Vec<Job>> {
        let cursor = self.collection().await?.find(None, None).await?;
        collect(cursor).await
    }

    async fn find_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let cursor = self
            .collection()
            .await?
            .find(filter_document(filter), find_options(filter))
            .await?;
        collect(cursor).await
    }

    async fn find_job_by_id(&self, id: ObjectId) -> Result<Option<Job>> {
        let filter = doc! { "_id": id };
        Ok(self.collection().await?.find_one(filter, None).await?)
    }

    async fn upsert_job(&self, id: ObjectId, update: JobUpdate) -> Result<UpdateOutcome> {
        let filter = doc! { "_id": id };
        let update = doc! { "$set": update.set };
        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .collection()
            .await?
            .update_one(filter, update, options)
            .await?;
        Ok(result.into())
    }

    async fn find_jobs_by_buyer(&self, email: &str) -> Result<Vec<Job>> {
        let filter = doc! { "buyer.email": email };
        let cursor = self.collection().await?.find(filter, None).await?;
        collect(cursor).await
    }

    async fn delete_job(&self, id: ObjectId) -> Result<DeleteOutcome> {
        let filter = doc! { "_id": id };
        let result = self.collection().await?.delete_one(filter, None).await?;
        Ok(result.into())
    }
}
