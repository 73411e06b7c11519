use lazarus_store::StoreError;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("malformed record \"{key}\": {source}")]
    Json {
        key: String,
        source: serde_json::Error,
    },

    #[error("service not found in catalog for service id \"{service_id}\"")]
    ServiceNotFound { service_id: String },

    #[error("plan not found for plan id \"{plan_id}\" of service \"{service_id}\" in the catalog")]
    PlanNotFound { service_id: String, plan_id: String },
}
