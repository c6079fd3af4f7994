//! Record sources the lookup queries, preloads from, and persists to.
//!
//! Calls are blocking; the runtime runs each one on a worker thread and
//! feeds the result back to the state machine on the UI thread.

pub mod http;
pub mod memory;

use crate::core::record::{Candidate, EntityType, RecordId};
use crate::error::Result;

pub use http::HttpSource;
pub use memory::MemorySource;

pub trait RecordSource: Send + Sync {
    /// May be called with an empty term and with overlapping requests.
    fn search(&self, term: &str, entity_type: &EntityType) -> Result<Vec<Candidate>>;

    fn fetch_default(
        &self,
        record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<Option<Candidate>>;

    fn persist_selection(
        &self,
        owner_record_id: &RecordId,
        selected_record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<()>;
}
