use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use rocket::serde::json::{Json, Value};
use rocket::State;
use tracing::info;

use crate::error::ApiResult;
use crate::models::job::{Job, JobFilter, JobUpdate, SortOrder};
use crate::models::outcome::{DeleteOutcome, InsertOutcome, UpdateOutcome};
use crate::repository::{JobStore, StoreError};
use crate::services::identity::Identity;

type Jobs = State<Arc<dyn JobStore>>;

pub(crate) fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    Ok(ObjectId::parse_str(id)?)
}

fn wire(jobs: Vec<Job>) -> Json<Vec<Value>> {
    Json(jobs.into_iter().map(Job::into_wire).collect())
}

#[post("/jobs", format = "json", data = "<job>")]
pub async fn create_job(jobs: &Jobs, identity: Identity, job: Json<Document>) -> ApiResult<InsertOutcome> {
    let outcome = jobs.create_job(Job::from_submission(job.into_inner())).await?;
    info!(user = identity.email(), job_id = %outcome.inserted_id, "job posted");
    Ok(Json(outcome))
}

#[get("/jobs")]
pub async fn get_all_jobs(jobs: &Jobs) -> ApiResult<Vec<Value>> {
    Ok(wire(jobs.get_all_jobs().await?))
}

#[get("/all-jobs?<filter>&<search>&<sort>")]
pub async fn search_jobs(
    jobs: &Jobs,
    filter: Option<String>,
    search: Option<String>,
    sort: Option<SortOrder>,
) -> ApiResult<Vec<Value>> {
    let query = JobFilter::new(filter, search, sort);
    Ok(wire(jobs.find_jobs(&query).await?))
}

#[get("/job/<id>")]
pub async fn get_job(jobs: &Jobs, id: &str) -> ApiResult<Option<Value>> {
    let id = parse_id(id)?;
    Ok(Json(jobs.find_job_by_id(id).await?.map(Job::into_wire)))
}

#[put("/job/<id>", format = "json", data = "<update>")]
pub async fn update_job(
    jobs: &Jobs,
    identity: Identity,
    id: &str,
    update: Json<Document>,
) -> ApiResult<UpdateOutcome> {
    let id = parse_id(id)?;
    let outcome = jobs.upsert_job(id, JobUpdate::from_body(update.into_inner())).await?;
    info!(user = identity.email(), job_id = %id, upserted = outcome.upserted_id.is_some(), "job updated");
    Ok(Json(outcome))
}

#[get("/jobs/<email>")]
pub async fn get_jobs_by_buyer(jobs: &Jobs, email: &str) -> ApiResult<Vec<Value>> {
    Ok(wire(jobs.find_jobs_by_buyer(email).await?))
}

#[delete("/job/<id>")]
pub async fn delete_job(jobs: &Jobs, identity: Identity, id: &str) -> ApiResult<DeleteOutcome> {
    let id = parse_id(id)?;
    let outcome = jobs.delete_job(id).await?;
    info!(user = identity.email(), job_id = %id, deleted = outcome.deleted_count, "job deleted");
    Ok(Json(outcome))
}
