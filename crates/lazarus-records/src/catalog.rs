use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
}

impl Plan {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

impl Service {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            plans: Vec::new(),
        }
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plans.push(plan);
        self
    }

    pub fn plan(&self, id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }
}

/// Services a record may reference, keyed by service id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    services: HashMap<String, Service>,
}

impl Catalog {
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    #[inline]
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        let catalog = Catalog::new([
            Service::new("svc-a", "A").with_plan(Plan::new("basic", "Basic")),
            Service::new("svc-b", "B"),
        ]);

        let a = catalog.service("svc-a").unwrap();
        assert_eq!(a.plan("basic").map(|p| p.name.as_str()), Some("Basic"));
        assert!(a.plan("premium").is_none());
        assert!(catalog.service("svc-b").is_some_and(|b| b.plans.is_empty()));
        assert!(catalog.service("svc-c").is_none());
    }
}
