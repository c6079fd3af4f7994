use crate::core::record::Candidate;
use crate::terminal::TerminalEvent;

/// Events delivered by the scheduler once their delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    CommitTerm { term: String },
}

/// The outbound notification sent on every selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupUpdate {
    pub selected_record: Option<Candidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Success,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: ToastVariant::Error,
        }
    }
}

/// Everything the embedding context can observe besides the rendered field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    LookupUpdate(LookupUpdate),
    Toast(Toast),
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Terminal(TerminalEvent),
    Timer(TimerEvent),
}
