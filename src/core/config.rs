use crate::core::record::{EntityType, RecordId};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Per-instance configuration, read at mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub label: String,
    pub placeholder: String,
    pub icon_name: String,
    pub entity_type: EntityType,
    /// Empty string is treated the same as absent.
    pub default_record_id: Option<RecordId>,
    pub owner_record_id: Option<RecordId>,
    pub debounce_ms: u64,
    pub auto_persist_on_pick: bool,
    pub title_field: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            label: "Custom Account Lookup".to_string(),
            placeholder: "search...".to_string(),
            icon_name: "standard:account".to_string(),
            entity_type: EntityType::from("Account"),
            default_record_id: None,
            owner_record_id: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            auto_persist_on_pick: false,
            title_field: "Name".to_string(),
        }
    }
}

impl LookupConfig {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Loads JSON for `.json` files and YAML for everything else.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(source.as_str())
        } else {
            Self::from_yaml_str(source.as_str())
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_icon_name(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = icon_name.into();
        self
    }

    pub fn with_default_record_id(mut self, record_id: impl Into<RecordId>) -> Self {
        self.default_record_id = Some(record_id.into());
        self
    }

    pub fn with_owner_record_id(mut self, record_id: impl Into<RecordId>) -> Self {
        self.owner_record_id = Some(record_id.into());
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_auto_persist_on_pick(mut self, enabled: bool) -> Self {
        self.auto_persist_on_pick = enabled;
        self
    }

    pub fn with_title_field(mut self, field: impl Into<String>) -> Self {
        self.title_field = field.into();
        self
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn default_record_id(&self) -> Option<&RecordId> {
        self.default_record_id
            .as_ref()
            .filter(|id| !id.as_str().trim().is_empty())
    }

    pub fn owner_record_id(&self) -> Option<&RecordId> {
        self.owner_record_id
            .as_ref()
            .filter(|id| !id.as_str().trim().is_empty())
    }
}
