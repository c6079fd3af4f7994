use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(RecordId);
string_id!(EntityType);

/// A record returned by a search, or preloaded as the default selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(alias = "Id")]
    pub id: RecordId,
    #[serde(default)]
    pub display_fields: IndexMap<String, String>,
}

impl Candidate {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            display_fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.display_fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.display_fields.get(name).map(String::as_str)
    }

    /// Preferred field, then the first field the server sent, then the id.
    pub fn title(&self, preferred_field: &str) -> &str {
        self.field(preferred_field)
            .or_else(|| self.display_fields.values().next().map(String::as_str))
            .unwrap_or_else(|| self.id.as_str())
    }

    /// Case-insensitive substring match over every display field.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.display_fields
            .values()
            .any(|value| value.to_lowercase().contains(needle.as_str()))
    }
}
