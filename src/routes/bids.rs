use std::sync::Arc;

use mongodb::bson::Document;
use rocket::serde::json::{Json, Value};
use rocket::State;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::bid::{Bid, StatusUpdate};
use crate::models::outcome::{InsertOutcome, UpdateOutcome};
use crate::repository::{BidPlacement, BidStore};
use crate::routes::jobs::parse_id;
use crate::services::identity::Identity;

type Bids = State<Arc<dyn BidStore>>;

fn wire(bids: Vec<Bid>) -> Json<Vec<Value>> {
    Json(bids.into_iter().map(Bid::into_wire).collect())
}

#[post("/bids", format = "json", data = "<bid>")]
pub async fn place_bid(bids: &Bids, identity: Identity, bid: Json<Document>) -> ApiResult<InsertOutcome> {
    let bid = Bid::from_submission(bid.into_inner());
    let job_id = bid.job_id().map(str::to_owned);
    match bids.place_bid(bid).await? {
        BidPlacement::Placed(outcome) => {
            info!(user = identity.email(), job_id, bid_id = %outcome.inserted_id, "bid placed");
            Ok(Json(outcome))
        }
        BidPlacement::AlreadyBid => Err(ApiError::AlreadyBid),
    }
}

#[get("/bids/<email>")]
pub async fn get_bids_by_bidder(bids: &Bids, email: &str) -> ApiResult<Vec<Value>> {
    Ok(wire(bids.find_bids_by_bidder(email).await?))
}

#[get("/bid-request/<email>")]
pub async fn get_bid_requests(bids: &Bids, email: &str) -> ApiResult<Vec<Value>> {
    Ok(wire(bids.find_bids_by_buyer(email).await?))
}

#[patch("/bids/<id>", format = "json", data = "<update>")]
pub async fn update_bid_status(
    bids: &Bids,
    identity: Identity,
    id: &str,
    update: Json<StatusUpdate>,
) -> ApiResult<UpdateOutcome> {
    let id = parse_id(id)?;
    let outcome = bids.update_bid_status(id, &update.status).await?;
    info!(user = identity.email(), bid_id = %id, status = %update.status, "bid status changed");
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::error::ALREADY_BID_MESSAGE;
    use crate::routes::test_support::{client, get_json, inserted_id, post_json};

    async fn post_job(client: &rocket::local::asynchronous::Client, owner: &str) -> String {
        let (_, inserted) = post_json(
            client,
            "/jobs",
            json!({
                "job_title": "Mobile app",
                "category": "Web Development",
                "deadline": "2024-12-24",
                "buyer": { "email": owner },
                "total_bids": 0
            }),
        )
        .await;
        inserted_id(&inserted)
    }

    fn bid(job_id: &str, bidder: &str, owner: &str) -> Value {
        json!({
            "jobId": job_id,
            "email": bidder,
            "buyer": owner,
            "price": 420.0,
            "comment": "I can do this",
            "deadline": "2024-12-20",
            "job_title": "Mobile app",
            "category": "Web Development"
        })
    }

    #[rocket::async_test]
    async fn first_bid_counts_and_duplicate_is_rejected() {
        let client = client(&[]).await;
        let job_id = post_job(&client, "owner@example.com").await;

        let (status, inserted) = post_json(&client, "/bids", bid(&job_id, "bidder@example.com", "owner@example.com")).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(inserted["acknowledged"], true);

        let job = get_json(&client, &format!("/job/{}", job_id)).await;
        assert_eq!(job["total_bids"], 1);

        let (status, body) = post_json(&client, "/bids", bid(&job_id, "bidder@example.com", "owner@example.com")).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["message"], ALREADY_BID_MESSAGE);

        let placed = get_json(&client, "/bids/bidder@example.com").await;
        assert_eq!(placed.as_array().map(Vec::len), Some(1));
        assert_eq!(placed[0]["_id"], inserted["insertedId"]);
        assert_eq!(placed[0]["price"], 420.0);
        let job = get_json(&client, &format!("/job/{}", job_id)).await;
        assert_eq!(job["total_bids"], 1);
    }

    #[rocket::async_test]
    async fn concurrent_bids_are_counted_exactly() {
        let client = client(&[]).await;
        let job_id = post_job(&client, "owner@example.com").await;

        let bidders: Vec<String> = (0..16).map(|n| format!("bidder{}@example.com", n)).collect();
        let requests = bidders
            .iter()
            .map(|bidder| post_json(&client, "/bids", bid(&job_id, bidder, "owner@example.com")));
        let results = join_all(requests).await;
        assert!(results.iter().all(|(status, _)| *status == Status::Ok));

        let job = get_json(&client, &format!("/job/{}", job_id)).await;
        assert_eq!(job["total_bids"], 16);
    }

    #[rocket::async_test]
    async fn bids_are_listed_by_bidder_and_by_owner() {
        let client = client(&[]).await;
        let first = post_job(&client, "alice@example.com").await;
        let second = post_job(&client, "bob@example.com").await;

        post_json(&client, "/bids", bid(&first, "carol@example.com", "alice@example.com")).await;
        post_json(&client, "/bids", bid(&second, "carol@example.com", "bob@example.com")).await;
        post_json(&client, "/bids", bid(&first, "dave@example.com", "alice@example.com")).await;

        let carols = get_json(&client, "/bids/carol@example.com").await;
        let carols = carols.as_array().expect("array of bids");
        assert_eq!(carols.len(), 2);
        assert!(carols.iter().all(|bid| bid["email"] == "carol@example.com"));

        let for_alice = get_json(&client, "/bid-request/alice@example.com").await;
        let for_alice = for_alice.as_array().expect("array of bids");
        assert_eq!(for_alice.len(), 2);
        assert!(for_alice.iter().all(|bid| bid["buyer"] == "alice@example.com"));

        let none = get_json(&client, "/bid-request/carol@example.com").await;
        assert_eq!(none, json!([]));
    }

    #[rocket::async_test]
    async fn status_can_be_changed() {
        let client = client(&[]).await;
        let job_id = post_job(&client, "owner@example.com").await;
        let (_, inserted) = post_json(&client, "/bids", bid(&job_id, "bidder@example.com", "owner@example.com")).await;
        let bid_id = inserted_id(&inserted);

        let placed = get_json(&client, "/bids/bidder@example.com").await;
        assert!(placed[0].get("status").is_none());

        let response = client
            .patch(format!("/bids/{}", bid_id))
            .header(ContentType::JSON)
            .body(json!({ "status": "In Progress" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let outcome: Value = response.into_json().await.expect("update result");
        assert_eq!(outcome["matchedCount"], 1);
        assert_eq!(outcome["modifiedCount"], 1);

        let requests = get_json(&client, "/bid-request/owner@example.com").await;
        assert_eq!(requests[0]["status"], "In Progress");
    }

    #[rocket::async_test]
    async fn bids_keep_extra_fields_and_malformed_job_ids_fail() {
        let client = client(&[]).await;
        let job_id = post_job(&client, "owner@example.com").await;

        let mut submitted = bid(&job_id, "bidder@example.com", "owner@example.com");
        submitted["price"] = json!("420");
        submitted["portfolio"] = json!({ "links": ["http://a", "http://b"] });
        let (status, _) = post_json(&client, "/bids", submitted.clone()).await;
        assert_eq!(status, Status::Ok);

        let placed = get_json(&client, "/bids/bidder@example.com").await;
        assert_eq!(placed[0]["price"], "420");
        assert_eq!(placed[0]["portfolio"], submitted["portfolio"]);
        assert!(placed[0]["_id"].is_string());

        let (status, body) = post_json(&client, "/bids", bid("not-an-id", "other@example.com", "owner@example.com")).await;
        assert_eq!(status, Status::InternalServerError);
        assert_eq!(body["message"], "internal server error");
        assert_eq!(get_json(&client, "/bids/other@example.com").await, json!([]));
    }
}
