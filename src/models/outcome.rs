use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::serialize_object_id_as_hex_string;
use mongodb::results::{DeleteResult, UpdateResult};
use serde::{Serialize, Serializer};

// Write results keep the camelCase shape the document store reports, with
// ids as plain hex strings.

fn serialize_optional_object_id<S: Serializer>(
    id: &Option<ObjectId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_some(&id.to_hex()),
        None => serializer.serialize_none(),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_object_id_as_hex_string")]
    pub inserted_id: ObjectId,
}

impl InsertOutcome {
    pub fn new(inserted_id: ObjectId) -> Self {
        InsertOutcome {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(serialize_with = "serialize_optional_object_id")]
    pub upserted_id: Option<ObjectId>,
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.and_then(|id| id.as_object_id()),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl From<DeleteResult> for DeleteOutcome {
    fn from(result: DeleteResult) -> Self {
        DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        }
    }
}
