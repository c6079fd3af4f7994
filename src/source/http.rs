use super::RecordSource;
use crate::core::record::{Candidate, EntityType, RecordId};
use crate::error::{LookupError, Result};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-over-HTTP record source.
///
/// - `GET  {base}/search?term=..&entity_type=..` -> `[Candidate]`
/// - `GET  {base}/records?id=..&entity_type=..`  -> `Candidate`, 404 means none
/// - `POST {base}/links` with [`LinkRequest`]      -> any 2xx
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
pub struct LinkRequest<'a> {
    pub owner_record_id: &'a str,
    pub selected_record_id: &'a str,
    pub entity_type: &'a str,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Ids travel as query parameters so ureq escapes them.
    fn default_request(&self, record_id: &RecordId, entity_type: &EntityType) -> ureq::Request {
        self.agent
            .get(self.url("records").as_str())
            .query("id", record_id.as_str())
            .query("entity_type", entity_type.as_str())
    }
}

impl RecordSource for HttpSource {
    fn search(&self, term: &str, entity_type: &EntityType) -> Result<Vec<Candidate>> {
        let body = self
            .agent
            .get(self.url("search").as_str())
            .query("term", term)
            .query("entity_type", entity_type.as_str())
            .call()?
            .into_string()?;
        Ok(serde_json::from_str(body.as_str())?)
    }

    fn fetch_default(
        &self,
        record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<Option<Candidate>> {
        match self.default_request(record_id, entity_type).call() {
            Ok(response) => {
                let body = response.into_string()?;
                Ok(serde_json::from_str(body.as_str())?)
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(LookupError::from(err)),
        }
    }

    fn persist_selection(
        &self,
        owner_record_id: &RecordId,
        selected_record_id: &RecordId,
        entity_type: &EntityType,
    ) -> Result<()> {
        let payload = serde_json::to_string(&LinkRequest {
            owner_record_id: owner_record_id.as_str(),
            selected_record_id: selected_record_id.as_str(),
            entity_type: entity_type.as_str(),
        })?;
        self.agent
            .post(self.url("links").as_str())
            .set("Content-Type", "application/json")
            .send_string(payload.as_str())?;
        Ok(())
    }
}
