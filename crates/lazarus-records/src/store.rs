//! Keyed persistence of instances and bindings.
//!
//! Records are stored as JSON under `instances:{id}` and `bindings:{id}`,
//! passed through the configured [`Codec`] on the way in and out. Reads check
//! the record's references against the catalog so a caller never receives an
//! instance whose service or plan has been withdrawn.

use std::sync::Arc;

use lazarus_store::SharedStore;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    catalog::Catalog,
    codec::Codec,
    error::RecordError,
    record::{Binding, Instance},
};

pub struct RecordStore {
    store: SharedStore,
    catalog: Arc<Catalog>,
    codec: Arc<dyn Codec>,
}

impl RecordStore {
    pub fn new(store: SharedStore, catalog: Arc<Catalog>, codec: Arc<dyn Codec>) -> Self {
        Self {
            store,
            catalog,
            codec,
        }
    }

    pub async fn write_instance(&self, instance: &Instance) -> Result<(), RecordError> {
        self.write(&instance_key(&instance.instance_id), instance).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_instance(&self, instance_id: &str) -> Result<Option<Instance>, RecordError> {
        let Some(mut instance) = self.read::<Instance>(&instance_key(instance_id)).await? else {
            return Ok(None);
        };
        let service = self.catalog.service(&instance.service_id).ok_or_else(|| {
            RecordError::ServiceNotFound {
                service_id: instance.service_id.clone(),
            }
        })?;
        let plan = service
            .plan(&instance.plan_id)
            .ok_or_else(|| RecordError::PlanNotFound {
                service_id: instance.service_id.clone(),
                plan_id: instance.plan_id.clone(),
            })?;
        instance.plan = Some(plan.clone());
        instance.service = Some(service.clone());
        Ok(Some(instance))
    }

    pub async fn delete_instance(&self, instance_id: &str) -> Result<bool, RecordError> {
        Ok(self.store.delete(&instance_key(instance_id)).await?)
    }

    pub async fn write_binding(&self, binding: &Binding) -> Result<(), RecordError> {
        self.write(&binding_key(&binding.binding_id), binding).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_binding(&self, binding_id: &str) -> Result<Option<Binding>, RecordError> {
        let Some(binding) = self.read::<Binding>(&binding_key(binding_id)).await? else {
            return Ok(None);
        };
        if self.catalog.service(&binding.service_id).is_none() {
            return Err(RecordError::ServiceNotFound {
                service_id: binding.service_id,
            });
        }
        Ok(Some(binding))
    }

    pub async fn delete_binding(&self, binding_id: &str) -> Result<bool, RecordError> {
        Ok(self.store.delete(&binding_key(binding_id)).await?)
    }

    pub async fn test_connection(&self) -> Result<(), RecordError> {
        Ok(self.store.ping().await?)
    }

    async fn write<T: Serialize>(&self, key: &str, record: &T) -> Result<(), RecordError> {
        let json = serde_json::to_vec(record).map_err(|source| RecordError::Json {
            key: key.to_string(),
            source,
        })?;
        let sealed = self.codec.encrypt(&json)?;
        self.store.set(key, &sealed).await?;
        debug!(key, "record written");
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RecordError> {
        let Some(sealed) = self.store.get(key).await? else {
            return Ok(None);
        };
        let json = self.codec.decrypt(&sealed)?;
        let record = serde_json::from_slice(&json).map_err(|source| RecordError::Json {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(record))
    }
}

fn instance_key(id: &str) -> String {
    format!("instances:{id}")
}

fn binding_key(id: &str) -> String {
    format!("bindings:{id}")
}

#[cfg(test)]
mod tests {
    use lazarus_store::{MemoryStore, Store};
    use serde_json::json;

    use super::*;
    use crate::{
        catalog::{Plan, Service},
        codec::{CodecError, NoopCodec},
    };

    /// Reverses the bytes, enough to prove the codec is applied both ways.
    struct Reverse;

    impl Codec for Reverse {
        fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, CodecError> {
            Ok(plain.iter().rev().copied().collect())
        }

        fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>, CodecError> {
            self.encrypt(cipher)
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new([
            Service::new("svc", "Service").with_plan(Plan::new("basic", "Basic"))
        ]))
    }

    fn records(store: &MemoryStore, codec: Arc<dyn Codec>) -> RecordStore {
        RecordStore::new(Arc::new(store.clone()), catalog(), codec)
    }

    #[tokio::test]
    async fn instance_lifecycle() {
        let store = MemoryStore::new();
        let records = records(&store, Arc::new(NoopCodec));
        let mut instance = Instance::new("i1", "svc", "basic");
        instance.parameters = json!({ "location": "eastus" });

        records.write_instance(&instance).await.unwrap();
        let got = records.get_instance("i1").await.unwrap().unwrap();
        assert_eq!(got.parameters, json!({ "location": "eastus" }));
        assert_eq!(got.service.as_ref().map(|s| s.id.as_str()), Some("svc"));
        assert_eq!(got.plan.as_ref().map(|p| p.id.as_str()), Some("basic"));

        assert!(records.delete_instance("i1").await.unwrap());
        assert!(!records.delete_instance("i1").await.unwrap());
        assert!(records.get_instance("i1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stored_bytes_pass_through_codec() {
        let store = MemoryStore::new();
        let records = records(&store, Arc::new(Reverse));
        records
            .write_binding(&Binding::new("b1", "i1", "svc"))
            .await
            .unwrap();

        let raw = store.get("bindings:b1").await.unwrap().unwrap();
        assert_eq!(raw.last(), Some(&b'{'));
        let got = records.get_binding("b1").await.unwrap().unwrap();
        assert_eq!(got.instance_id, "i1");
    }

    #[tokio::test]
    async fn unknown_references_are_rejected() {
        let store = MemoryStore::new();
        let records = records(&store, Arc::new(NoopCodec));
        records
            .write_instance(&Instance::new("i1", "gone", "basic"))
            .await
            .unwrap();
        records
            .write_instance(&Instance::new("i2", "svc", "gone"))
            .await
            .unwrap();
        records
            .write_binding(&Binding::new("b1", "i1", "gone"))
            .await
            .unwrap();

        assert!(matches!(
            records.get_instance("i1").await,
            Err(RecordError::ServiceNotFound { service_id }) if service_id == "gone"
        ));
        assert!(matches!(
            records.get_instance("i2").await,
            Err(RecordError::PlanNotFound { plan_id, .. }) if plan_id == "gone"
        ));
        assert!(matches!(
            records.get_binding("b1").await,
            Err(RecordError::ServiceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_record_names_its_key() {
        let store = MemoryStore::new();
        store.set("instances:bad", b"{not json").await.unwrap();
        let err = records(&store, Arc::new(NoopCodec))
            .get_instance("bad")
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Json { ref key, .. } if key == "instances:bad"));
    }

    #[tokio::test]
    async fn connection_probe() {
        let store = MemoryStore::new();
        records(&store, Arc::new(NoopCodec))
            .test_connection()
            .await
            .unwrap();
    }
}
