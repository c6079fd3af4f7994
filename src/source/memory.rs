use super::RecordSource;
use crate::core::record::{Candidate, EntityType, RecordId};
use crate::error::{LookupError, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLink {
    pub owner_record_id: RecordId,
    pub selected_record_id: RecordId,
    pub entity_type: EntityType,
}

/// In-process record store, used by the demo binary and by tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: IndexMap<EntityType, Vec<Candidate>>,
    limit: Option<usize>,
    latency: Duration,
    fail_search: AtomicBool,
    fail_persist: AtomicBool,
    links: Mutex<Vec<PersistedLink>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `{"Account": [{"id": "...", "displayFields": {...}}], ...}`.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(source.as_str())
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let records: IndexMap<EntityType, Vec<Candidate>> = serde_json::from_str(source)?;
        Ok(Self {
            records,
            ..Self::default()
        })
    }

    pub fn with_record(mut self, entity_type: impl Into<EntityType>, record: Candidate) -> Self {
        self.records
            .entry(entity_type.into())
            .or_default()
            .push(record);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn links(&self) -> Vec<PersistedLink> {
        match self.links.lock() {
            Ok(links) => links.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }

    fn records_of(&self, entity_type: &EntityType) -> &[Candidate] {
        self.records
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl RecordSource for MemorySource {
    fn search(&self, term: &str, entity_type: &EntityType) -> Result<Vec<Candidate>> {
        self.simulate_latency();
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(LookupError::source(format!(
                "search for '{term}' in {entity_type} is unavailable"
            )));
        }
        let matches = self
            .records_of(entity_type)
            .iter()
            .filter(|record| record.matches(term))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matches)
    }

    fn fetch_default(
        &self,
        record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<Option<Candidate>> {
        self.simulate_latency();
        Ok(self
            .records_of(entity_type)
            .iter()
            .find(|record| &record.id == record_id)
            .cloned())
    }

    fn persist_selection(
        &self,
        owner_record_id: &RecordId,
        selected_record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<()> {
        self.simulate_latency();
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(LookupError::source(format!(
                "cannot link {selected_record_id} to {owner_record_id}"
            )));
        }
        let link = PersistedLink {
            owner_record_id: owner_record_id.clone(),
            selected_record_id: selected_record_id.clone(),
            entity_type: entity_type.clone(),
        };
        match self.links.lock() {
            Ok(mut links) => links.push(link),
            Err(poisoned) => poisoned.into_inner().push(link),
        }
        Ok(())
    }
}
