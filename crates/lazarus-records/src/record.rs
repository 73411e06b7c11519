use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{Plan, Service};

/// A provisioned service instance.
///
/// `service` and `plan` are resolved from the catalog on read and are never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub service_id: String,
    pub plan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub details: Value,
    #[serde(skip)]
    pub service: Option<Service>,
    #[serde(skip)]
    pub plan: Option<Plan>,
}

impl Instance {
    pub fn new(
        instance_id: impl Into<String>,
        service_id: impl Into<String>,
        plan_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            service_id: service_id.into(),
            plan_id: plan_id.into(),
            alias: None,
            status: String::new(),
            parameters: Value::Null,
            details: Value::Null,
            service: None,
            plan: None,
        }
    }
}

/// Credentials issued against an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub binding_id: String,
    pub instance_id: String,
    pub service_id: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub details: Value,
}

impl Binding {
    pub fn new(
        binding_id: impl Into<String>,
        instance_id: impl Into<String>,
        service_id: impl Into<String>,
    ) -> Self {
        Self {
            binding_id: binding_id.into(),
            instance_id: instance_id.into(),
            service_id: service_id.into(),
            parameters: Value::Null,
            details: Value::Null,
        }
    }
}
