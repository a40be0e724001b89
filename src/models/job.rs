use std::cmp::Ordering;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use rocket::FromFormField;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::wire::document_to_json;

/// A posted job. The collection is schema-less: whatever the client submits
/// is stored and returned as is. The typed accessors only read the fields
/// the routes query on.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub fields: Document,
}

impl Job {
    /// Builds a job from a request body. A client `_id` is kept only when it
    /// is a valid ObjectId; otherwise the store assigns one.
    pub fn from_submission(mut fields: Document) -> Self {
        let id = match fields.remove("_id") {
            Some(Bson::ObjectId(id)) => Some(id),
            Some(Bson::String(hex)) => ObjectId::parse_str(&hex).ok(),
            _ => None,
        };
        Job { id, fields }
    }

    pub fn job_title(&self) -> Option<&str> {
        self.fields.get_str("job_title").ok()
    }

    pub fn category(&self) -> Option<&str> {
        self.fields.get_str("category").ok()
    }

    pub fn deadline(&self) -> Option<&Bson> {
        self.fields.get("deadline")
    }

    pub fn buyer_email(&self) -> Option<&str> {
        self.fields
            .get_document("buyer")
            .ok()
            .and_then(|buyer| buyer.get_str("email").ok())
    }

    /// JSON body with `_id` first, as the store returns it.
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

/// Body of `PUT /job/<id>`: every field is forwarded to `$set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub set: Document,
}

impl JobUpdate {
    /// `_id` is immutable in the store, so it never takes part in an update.
    pub fn from_body(mut set: Document) -> Self {
        set.remove("_id");
        JobUpdate { set }
    }

    /// Applies `$set` semantics, including dotted paths like `buyer.email`.
    pub fn apply_to(&self, job: &mut Job) {
        for (path, value) in &self.set {
            set_path(&mut job.fields, path, value.clone());
        }
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(child)) = document.get_mut(head) {
                set_path(child, rest, value);
            }
        }
    }
}

#[derive(FromFormField, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Sort direction as understood by the document store.
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Query behind `/all-jobs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

impl JobFilter {
    /// Empty query strings count as absent.
    pub fn new(category: Option<String>, search: Option<String>, sort: Option<SortOrder>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        JobFilter {
            category: non_empty(category),
            search: non_empty(search),
            sort,
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |category| job.category() == Some(category));
        let search_ok = self.search.as_ref().map_or(true, |search| {
            job.job_title()
                .map_or(false, |title| title.to_lowercase().contains(&search.to_lowercase()))
        });
        category_ok && search_ok
    }
}

/// Ascending deadline order: missing values first, then numbers, then
/// strings, then anything else, mirroring the store's cross-type ordering.
pub fn compare_deadlines(a: &Job, b: &Job) -> Ordering {
    fn rank(value: Option<&Bson>) -> u8 {
        match value {
            None | Some(Bson::Null) => 0,
            Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
            Some(Bson::String(_)) => 2,
            Some(_) => 3,
        }
    }
    fn number(value: Option<&Bson>) -> f64 {
        match value {
            Some(Bson::Int32(n)) => f64::from(*n),
            Some(Bson::Int64(n)) => *n as f64,
            Some(Bson::Double(n)) => *n,
            _ => 0.0,
        }
    }

    let (left, right) = (a.deadline(), b.deadline());
    rank(left).cmp(&rank(right)).then_with(|| match (left, right) {
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        _ => number(left).partial_cmp(&number(right)).unwrap_or(Ordering::Equal),
    })
}
