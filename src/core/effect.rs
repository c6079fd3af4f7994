use crate::runtime::event::{LookupUpdate, Toast};
use crate::runtime::scheduler::SchedulerCommand;
use crate::task::SourceRequest;

/// Side effects produced by the lookup state machine, applied by the runtime
/// in the order they were emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Schedule(SchedulerCommand),
    Dispatch(SourceRequest),
    Notify(LookupUpdate),
    Toast(Toast),
    RequestRender,
}
