use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::wire::document_to_json;

/// A bidder's offer on a job, stored exactly as submitted. `email` is the
/// bidder, `jobId` the job and `buyer` a snapshot of the owner's email.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Bid {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub fields: Document,
}

impl Bid {
    pub fn from_submission(mut fields: Document) -> Self {
        let id = match fields.remove("_id") {
            Some(Bson::ObjectId(id)) => Some(id),
            Some(Bson::String(hex)) => ObjectId::parse_str(&hex).ok(),
            _ => None,
        };
        Bid { id, fields }
    }

    /// The pair that identifies one bidder's bid on one job. Missing values
    /// compare as null, like the store's equality match.
    pub fn bidder_and_job(&self) -> (Bson, Bson) {
        let value = |key: &str| self.fields.get(key).cloned().unwrap_or(Bson::Null);
        (value("email"), value("jobId"))
    }

    pub fn job_id(&self) -> Option<&str> {
        self.fields.get_str("jobId").ok()
    }

    pub fn email(&self) -> Option<&str> {
        self.fields.get_str("email").ok()
    }

    pub fn buyer(&self) -> Option<&str> {
        self.fields.get_str("buyer").ok()
    }

    pub fn status(&self) -> Option<&str> {
        self.fields.get_str("status").ok()
    }

    pub fn into_wire(self) -> Value {
        let mut document = Document::new();
        if let Some(id) = self.id {
            document.insert("_id", id);
        }
        for (key, value) in self.fields {
            document.insert(key, value);
        }
        document_to_json(document)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusUpdate {
    pub status: String,
}
