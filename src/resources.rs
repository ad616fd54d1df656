//! Hotel-owned resources
//!
//! Ownership checks only need to know which hotel a resource belongs to.
//! Each resource type registers a typed lookup at startup; the guard never
//! guesses at storage from URL text alone.

use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Finds the owning hotel of a resource by id
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// `Ok(None)` when no resource has this id
    async fn hotel_id_of(&self, id: &str) -> Result<Option<String>, AppError>;
}

/// Resource name → lookup, keyed case-insensitively by singular name
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    lookups: HashMap<String, Arc<dyn ResourceLookup>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: &str, lookup: Arc<dyn ResourceLookup>) -> Self {
        self.lookups.insert(name.to_ascii_lowercase(), lookup);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ResourceLookup>> {
        self.lookups.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lookups.keys().map(String::as_str)
    }
}

/// Position of the collection segment in `/api/v1/<resources>/...`
const RESOURCE_SEGMENT: usize = 3;

/// Singular resource name for a request path, e.g. `/api/v1/bills/42` → `bill`.
pub fn resource_name_from_path(path: &str) -> Option<String> {
    let segment = path.split('/').nth(RESOURCE_SEGMENT)?;
    if segment.is_empty() {
        return None;
    }
    let singular = segment.strip_suffix('s').unwrap_or(segment);
    Some(singular.to_ascii_lowercase())
}

/// First path parameter whose name contains "id", ignoring case
pub fn resource_id_param<'a, I>(params: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    params
        .into_iter()
        .find(|(key, _)| key.to_ascii_lowercase().contains("id"))
        .map(|(_, value)| value)
}

/// In-memory resource table (id → hotel id)
#[derive(Default)]
pub struct MemoryResourceStore {
    owners: RwLock<HashMap<String, String>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: &str, hotel_id: &str) {
        self.owners
            .write()
            .await
            .insert(id.to_string(), hotel_id.to_string());
    }
}

#[async_trait]
impl ResourceLookup for MemoryResourceStore {
    async fn hotel_id_of(&self, id: &str) -> Result<Option<String>, AppError> {
        Ok(self.owners.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_name_from_path() {
        assert_eq!(resource_name_from_path("/api/v1/bills/42").as_deref(), Some("bill"));
        assert_eq!(resource_name_from_path("/api/v1/Tables/7").as_deref(), Some("table"));
        assert_eq!(resource_name_from_path("/api/v1/staff/7").as_deref(), Some("staff"));
        assert_eq!(resource_name_from_path("/api/v1/").as_deref(), None);
        assert_eq!(resource_name_from_path("/health").as_deref(), None);
    }

    #[test]
    fn test_resource_id_param() {
        let params = [("hotel", "h1"), ("billId", "b1")];
        assert_eq!(resource_id_param(params), Some("b1"));

        let params = [("ID", "x")];
        assert_eq!(resource_id_param(params), Some("x"));

        let params = [("name", "x")];
        assert_eq!(resource_id_param(params), None);
    }

    #[tokio::test]
    async fn test_registry_is_case_insensitive() {
        let bills = Arc::new(MemoryResourceStore::new());
        bills.insert("b1", "h1").await;
        let registry = ResourceRegistry::new().register("Bill", bills);

        let lookup = registry.get("bill").unwrap();
        assert_eq!(lookup.hotel_id_of("b1").await.unwrap().as_deref(), Some("h1"));
        assert_eq!(lookup.hotel_id_of("b2").await.unwrap(), None);
        assert!(registry.get("table").is_none());
    }
}
