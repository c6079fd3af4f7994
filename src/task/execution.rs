use crate::core::record::{Candidate, EntityType, RecordId};
use crate::error::LookupError;
use crate::source::RecordSource;

/// A collaborator call, tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Search {
        generation: u64,
        term: String,
        entity_type: EntityType,
    },
    FetchDefault {
        generation: u64,
        record_id: RecordId,
        entity_type: EntityType,
    },
    Persist {
        generation: u64,
        owner_record_id: RecordId,
        selected_record_id: RecordId,
        entity_type: EntityType,
    },
}

impl SourceRequest {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Search { generation, .. }
            | Self::FetchDefault { generation, .. }
            | Self::Persist { generation, .. } => *generation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::FetchDefault { .. } => "fetch_default",
            Self::Persist { .. } => "persist",
        }
    }
}

#[derive(Debug)]
pub enum SourceCompletion {
    Search {
        generation: u64,
        result: Result<Vec<Candidate>, LookupError>,
    },
    FetchDefault {
        generation: u64,
        result: Result<Option<Candidate>, LookupError>,
    },
    Persist {
        generation: u64,
        selected_record_id: RecordId,
        result: Result<(), LookupError>,
    },
}

impl SourceCompletion {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Search { generation, .. }
            | Self::FetchDefault { generation, .. }
            | Self::Persist { generation, .. } => *generation,
        }
    }
}

pub fn execute_request(source: &dyn RecordSource, request: SourceRequest) -> SourceCompletion {
    match request {
        SourceRequest::Search {
            generation,
            term,
            entity_type,
        } => SourceCompletion::Search {
            generation,
            result: source.search(term.as_str(), &entity_type),
        },
        SourceRequest::FetchDefault {
            generation,
            record_id,
            entity_type,
        } => SourceCompletion::FetchDefault {
            generation,
            result: source.fetch_default(&record_id, &entity_type),
        },
        SourceRequest::Persist {
            generation,
            owner_record_id,
            selected_record_id,
            entity_type,
        } => {
            let result =
                source.persist_selection(&owner_record_id, &selected_record_id, &entity_type);
            SourceCompletion::Persist {
                generation,
                selected_record_id,
                result,
            }
        }
    }
}
