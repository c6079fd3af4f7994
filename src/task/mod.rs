pub mod execution;
pub mod executor;
pub mod run_state;

pub use execution::{SourceCompletion, SourceRequest};
pub use executor::TaskExecutor;
pub use run_state::Generations;
