pub mod core;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;
pub mod task;
pub mod terminal;
pub mod ui;
pub mod widgets;

pub use core::config::LookupConfig;
pub use core::record::{Candidate, EntityType, RecordId};
pub use error::{LookupError, Result};
pub use runtime::LookupRuntime;
pub use source::RecordSource;
pub use widgets::LookupField;
pub use widgets::lookup::{LookupState, Mode};
