//! Search/selection state machine behind the lookup field.
//!
//! Every operation mutates the state synchronously and returns the effects
//! the runtime must apply, in order. Collaborator results come back through
//! [`LookupState::apply_completion`] and are reconciled by generation.

use crate::core::config::LookupConfig;
use crate::core::effect::Effect;
use crate::core::record::{Candidate, EntityType, RecordId};
use crate::error::{FailureKind, LookupError, LookupFailure, Result};
use crate::runtime::event::{LookupUpdate, TimerEvent, Toast};
use crate::runtime::scheduler::SchedulerCommand;
use crate::task::{Generations, SourceCompletion, SourceRequest};

pub const COMMIT_KEY: &str = "lookup.commit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Searching,
    Selected,
}

impl Mode {
    pub fn search_box_visible(self) -> bool {
        self == Self::Searching
    }

    pub fn pill_visible(self) -> bool {
        self == Self::Selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectOrigin {
    Pick,
    Default,
}

impl SelectOrigin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Pick => "pick",
            Self::Default => "default",
        }
    }
}

pub struct LookupState {
    config: LookupConfig,
    entity_type: EntityType,
    raw_input: String,
    committed_term: String,
    candidates: Vec<Candidate>,
    has_records: bool,
    is_search_loading: bool,
    results_open: bool,
    selection: Option<Candidate>,
    searches: Generations,
    default_load: Generations,
    persist_sequence: u64,
    mounted: bool,
    torn_down: bool,
    last_failure: Option<LookupFailure>,
}

impl LookupState {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            entity_type: config.entity_type.clone(),
            config,
            raw_input: String::new(),
            committed_term: String::new(),
            candidates: Vec::new(),
            has_records: true,
            is_search_loading: false,
            results_open: false,
            selection: None,
            searches: Generations::default(),
            default_load: Generations::default(),
            persist_sequence: 0,
            mounted: false,
            torn_down: false,
            last_failure: None,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn mode(&self) -> Mode {
        if self.selection.is_some() {
            Mode::Selected
        } else {
            Mode::Searching
        }
    }

    pub fn selection(&self) -> Option<&Candidate> {
        self.selection.as_ref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.as_slice()
    }

    pub fn raw_input(&self) -> &str {
        self.raw_input.as_str()
    }

    pub fn committed_term(&self) -> &str {
        self.committed_term.as_str()
    }

    pub fn is_search_loading(&self) -> bool {
        self.is_search_loading
    }

    pub fn has_records(&self) -> bool {
        self.has_records
    }

    pub fn results_open(&self) -> bool {
        self.results_open && self.mode() == Mode::Searching
    }

    pub fn last_failure(&self) -> Option<&LookupFailure> {
        self.last_failure.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether the explicit "link record" action applies to the current state.
    pub fn can_persist(&self) -> bool {
        self.selection.is_some()
            && !self.config.auto_persist_on_pick
            && self.config.owner_record_id().is_some()
    }

    /// Starts the default-record preload, if configured, and the initial search.
    pub fn mount(&mut self) -> Vec<Effect> {
        if self.mounted || self.torn_down {
            return Vec::new();
        }
        self.mounted = true;

        let mut effects = Vec::new();
        if let Some(record_id) = self.config.default_record_id().cloned() {
            let generation = self.default_load.next();
            tracing::debug!(%record_id, generation, "preloading default record");
            effects.push(Effect::Dispatch(SourceRequest::FetchDefault {
                generation,
                record_id,
                entity_type: self.entity_type.clone(),
            }));
        }
        effects.push(self.issue_search());
        effects.push(Effect::RequestRender);
        effects
    }

    /// Called on every keystroke. The spinner shows immediately; the search
    /// term is committed only after the debounce delay.
    pub fn on_key_input(&mut self, raw_value: impl Into<String>) -> Vec<Effect> {
        if self.torn_down || self.mode() == Mode::Selected {
            return Vec::new();
        }
        self.raw_input = raw_value.into();
        self.is_search_loading = true;
        self.results_open = true;

        let event = TimerEvent::CommitTerm {
            term: self.raw_input.clone(),
        };
        let delay = self.config.debounce_delay();
        let command = if delay.is_zero() {
            SchedulerCommand::EmitNow(event)
        } else {
            SchedulerCommand::Debounce {
                key: COMMIT_KEY.to_string(),
                delay,
                event,
            }
        };
        vec![Effect::Schedule(command), Effect::RequestRender]
    }

    pub fn on_timer(&mut self, event: TimerEvent) -> Vec<Effect> {
        match event {
            TimerEvent::CommitTerm { term } => self.commit_term(term),
        }
    }

    pub fn commit_term(&mut self, term: String) -> Vec<Effect> {
        if self.torn_down || self.mode() == Mode::Selected {
            return Vec::new();
        }
        if term == self.committed_term {
            if self.searches.is_pending() {
                return Vec::new();
            }
            self.is_search_loading = false;
            return vec![Effect::RequestRender];
        }
        tracing::debug!(term = %term, "search term committed");
        self.committed_term = term;
        vec![self.issue_search(), Effect::RequestRender]
    }

    /// Live reconfiguration of the entity type; re-queries while searching.
    pub fn set_entity_type(&mut self, entity_type: impl Into<EntityType>) -> Vec<Effect> {
        let entity_type = entity_type.into();
        if self.torn_down || entity_type == self.entity_type {
            return Vec::new();
        }
        tracing::debug!(from = %self.entity_type, to = %entity_type, "entity type changed");
        self.entity_type = entity_type;
        // A default fetched for the previous entity type no longer applies.
        self.default_load.invalidate();
        if self.mode() == Mode::Selected {
            return Vec::new();
        }
        vec![self.issue_search(), Effect::RequestRender]
    }

    pub fn open_results(&mut self) -> bool {
        if self.torn_down || self.results_open || self.mode() == Mode::Selected {
            return false;
        }
        self.results_open = true;
        true
    }

    pub fn close_results(&mut self) -> bool {
        if !self.results_open {
            return false;
        }
        self.results_open = false;
        true
    }

    /// Selects a record from the current result list.
    pub fn pick(&mut self, record_id: &str) -> Result<Vec<Effect>> {
        if self.torn_down {
            return Err(LookupError::TornDown);
        }
        if self.selection.is_some() {
            return Err(LookupError::SelectionPresent);
        }
        let record = self
            .candidates
            .iter()
            .find(|candidate| candidate.id.as_str() == record_id)
            .cloned()
            .ok_or_else(|| LookupError::CandidateNotFound(record_id.to_string()))?;
        Ok(self.select(record, SelectOrigin::Pick))
    }

    /// Clears the selection locally and notifies the host. Nothing is
    /// persisted; unlinking server-side is a separate action.
    pub fn remove(&mut self) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        let Some(removed) = self.selection.take() else {
            return Vec::new();
        };
        tracing::info!(record_id = %removed.id, "selection removed");
        self.last_failure = None;
        self.raw_input.clear();
        self.committed_term.clear();
        self.candidates.clear();
        self.results_open = false;

        vec![
            Effect::Notify(LookupUpdate {
                selected_record: None,
            }),
            self.issue_search(),
            Effect::RequestRender,
        ]
    }

    /// Links the selected record to the owning record.
    ///
    /// This is an optimistic update: the selection is already visible to the
    /// host and stays in place whatever the outcome. A failure is only
    /// reported through an error toast, so the local selection and the
    /// persisted link can disagree until the user retries.
    pub fn persist_selection(&mut self) -> Result<Vec<Effect>> {
        if self.torn_down {
            return Err(LookupError::TornDown);
        }
        let record = self
            .selection
            .clone()
            .ok_or(LookupError::NothingSelected)?;
        let request = self.persist_request(&record.id)?;
        Ok(vec![Effect::Dispatch(request)])
    }

    pub fn apply_completion(&mut self, completion: SourceCompletion) -> Vec<Effect> {
        if self.torn_down {
            tracing::debug!(
                generation = completion.generation(),
                "ignoring completion after teardown"
            );
            return Vec::new();
        }
        match completion {
            SourceCompletion::Search { generation, result } => {
                self.apply_search(generation, result)
            }
            SourceCompletion::FetchDefault { generation, result } => {
                self.apply_default(generation, result)
            }
            SourceCompletion::Persist {
                generation,
                selected_record_id,
                result,
            } => self.apply_persist(generation, selected_record_id, result),
        }
    }

    pub fn teardown(&mut self) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        self.searches.invalidate();
        self.default_load.invalidate();
        self.is_search_loading = false;
        vec![Effect::Schedule(SchedulerCommand::Cancel {
            key: COMMIT_KEY.to_string(),
        })]
    }

    fn issue_search(&mut self) -> Effect {
        let generation = self.searches.next();
        self.is_search_loading = true;
        tracing::debug!(
            generation,
            term = %self.committed_term,
            entity_type = %self.entity_type,
            "issuing search"
        );
        Effect::Dispatch(SourceRequest::Search {
            generation,
            term: self.committed_term.clone(),
            entity_type: self.entity_type.clone(),
        })
    }

    fn select(&mut self, record: Candidate, origin: SelectOrigin) -> Vec<Effect> {
        tracing::info!(record_id = %record.id, origin = origin.as_str(), "record selected");
        self.selection = Some(record.clone());
        self.last_failure = None;

        let mut effects = vec![Effect::Notify(LookupUpdate {
            selected_record: Some(record.clone()),
        })];

        if origin == SelectOrigin::Pick && self.config.auto_persist_on_pick {
            match self.persist_request(&record.id) {
                Ok(request) => effects.push(Effect::Dispatch(request)),
                Err(err) => {
                    tracing::warn!(record_id = %record.id, error = %err, "auto-persist skipped")
                }
            }
        }

        self.raw_input.clear();
        self.committed_term.clear();
        self.candidates.clear();
        self.is_search_loading = false;
        self.results_open = false;
        self.searches.invalidate();
        self.default_load.invalidate();

        effects.push(Effect::Schedule(SchedulerCommand::Cancel {
            key: COMMIT_KEY.to_string(),
        }));
        effects.push(Effect::RequestRender);
        effects
    }

    fn persist_request(&mut self, selected_record_id: &RecordId) -> Result<SourceRequest> {
        let owner_record_id = self
            .config
            .owner_record_id()
            .cloned()
            .ok_or(LookupError::MissingOwner)?;
        self.persist_sequence = self.persist_sequence.saturating_add(1);
        tracing::info!(
            owner = %owner_record_id,
            record_id = %selected_record_id,
            "persisting selection"
        );
        Ok(SourceRequest::Persist {
            generation: self.persist_sequence,
            owner_record_id,
            selected_record_id: selected_record_id.clone(),
            entity_type: self.entity_type.clone(),
        })
    }

    fn apply_search(
        &mut self,
        generation: u64,
        result: std::result::Result<Vec<Candidate>, LookupError>,
    ) -> Vec<Effect> {
        if !self.searches.finish(generation) {
            tracing::debug!(
                generation,
                latest = self.searches.latest(),
                "discarding stale search response"
            );
            return Vec::new();
        }
        self.is_search_loading = false;
        match result {
            Ok(records) => {
                self.has_records = !records.is_empty();
                self.candidates = records;
                self.clear_failure(FailureKind::Search);
            }
            Err(err) => {
                self.candidates.clear();
                self.has_records = false;
                self.report(FailureKind::Search, &err);
            }
        }
        vec![Effect::RequestRender]
    }

    fn apply_default(
        &mut self,
        generation: u64,
        result: std::result::Result<Option<Candidate>, LookupError>,
    ) -> Vec<Effect> {
        if !self.default_load.finish(generation) {
            tracing::debug!(generation, "discarding superseded default record");
            return Vec::new();
        }
        match result {
            Ok(Some(record)) => self.select(record, SelectOrigin::Default),
            Ok(None) => {
                let missing = self
                    .config
                    .default_record_id()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                self.report(
                    FailureKind::DefaultLoad,
                    &LookupError::source(format!("default record '{missing}' not found")),
                );
                Vec::new()
            }
            Err(err) => {
                self.report(FailureKind::DefaultLoad, &err);
                Vec::new()
            }
        }
    }

    fn apply_persist(
        &mut self,
        generation: u64,
        selected_record_id: RecordId,
        result: std::result::Result<(), LookupError>,
    ) -> Vec<Effect> {
        match result {
            Ok(()) => {
                tracing::info!(generation, record_id = %selected_record_id, "selection persisted");
                self.clear_failure(FailureKind::Persistence);
                vec![
                    Effect::Toast(Toast::success(
                        "Success",
                        format!("{} linked successfully", self.entity_type),
                    )),
                    Effect::RequestRender,
                ]
            }
            Err(err) => {
                self.report(FailureKind::Persistence, &err);
                vec![
                    Effect::Toast(Toast::error("Error", "Error saving record")),
                    Effect::RequestRender,
                ]
            }
        }
    }

    fn report(&mut self, kind: FailureKind, err: &LookupError) {
        match kind {
            FailureKind::Persistence => tracing::error!(
                failure = %kind,
                entity_type = %self.entity_type,
                error = %err,
                "lookup collaborator failed"
            ),
            FailureKind::Search | FailureKind::DefaultLoad => tracing::warn!(
                failure = %kind,
                entity_type = %self.entity_type,
                error = %err,
                "lookup collaborator failed"
            ),
        }
        self.last_failure = Some(LookupFailure::new(kind, err));
    }

    /// A newer success only clears a failure of the same kind.
    fn clear_failure(&mut self, kind: FailureKind) {
        if self.last_failure.as_ref().is_some_and(|failure| failure.kind == kind) {
            self.last_failure = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{COMMIT_KEY, LookupState, Mode};
    use crate::core::config::LookupConfig;
    use crate::core::effect::Effect;
    use crate::core::record::Candidate;
    use crate::error::{FailureKind, LookupError};
    use crate::runtime::event::{LookupUpdate, Toast, ToastVariant};
    use crate::runtime::scheduler::{Scheduler, SchedulerCommand};
    use crate::task::{SourceCompletion, SourceRequest};
    use std::time::{Duration, Instant};

    struct Harness {
        state: LookupState,
        scheduler: Scheduler,
        now: Instant,
        dispatched: Vec<SourceRequest>,
        notifications: Vec<LookupUpdate>,
        toasts: Vec<Toast>,
    }

    impl Harness {
        fn new(config: LookupConfig) -> Self {
            Self {
                state: LookupState::new(config),
                scheduler: Scheduler::new(),
                now: Instant::now(),
                dispatched: Vec::new(),
                notifications: Vec::new(),
                toasts: Vec::new(),
            }
        }

        fn mounted(config: LookupConfig) -> Self {
            let mut harness = Self::new(config);
            let effects = harness.state.mount();
            harness.apply(effects);
            harness
        }

        fn apply(&mut self, effects: Vec<Effect>) {
            for effect in effects {
                match effect {
                    Effect::Schedule(command) => self.scheduler.schedule(command, self.now),
                    Effect::Dispatch(request) => self.dispatched.push(request),
                    Effect::Notify(update) => self.notifications.push(update),
                    Effect::Toast(toast) => self.toasts.push(toast),
                    Effect::RequestRender => {}
                }
                self.assert_single_mode();
            }
        }

        fn assert_single_mode(&self) {
            let mode = self.state.mode();
            assert!(mode.search_box_visible() != mode.pill_visible());
        }

        fn key(&mut self, raw: &str) {
            let effects = self.state.on_key_input(raw);
            self.apply(effects);
        }

        fn advance(&mut self, ms: u64) {
            self.now += Duration::from_millis(ms);
            for event in self.scheduler.drain_ready(self.now) {
                let effects = self.state.on_timer(event);
                self.apply(effects);
            }
        }

        fn searches(&self) -> Vec<(u64, String)> {
            self.dispatched
                .iter()
                .filter_map(|request| match request {
                    SourceRequest::Search {
                        generation, term, ..
                    } => Some((*generation, term.clone())),
                    _ => None,
                })
                .collect()
        }

        fn last_search_generation(&self) -> u64 {
            self.searches()
                .last()
                .map(|(generation, _)| *generation)
                .expect("a search should have been issued")
        }

        fn respond_search(&mut self, generation: u64, result: Result<Vec<Candidate>, LookupError>) {
            let effects = self
                .state
                .apply_completion(SourceCompletion::Search { generation, result });
            self.apply(effects);
        }

        fn persist_requests(&self) -> usize {
            self.dispatched
                .iter()
                .filter(|request| matches!(request, SourceRequest::Persist { .. }))
                .count()
        }
    }

    fn acme() -> Candidate {
        Candidate::new("001A").with_field("Name", "Acme")
    }

    fn globex() -> Candidate {
        Candidate::new("001B").with_field("Name", "Globex")
    }

    fn initech() -> Candidate {
        Candidate::new("001D").with_field("Name", "Initech")
    }

    fn with_results(config: LookupConfig) -> Harness {
        let mut harness = Harness::mounted(config);
        let generation = harness.last_search_generation();
        harness.respond_search(generation, Ok(vec![acme(), globex()]));
        harness
    }

    #[test]
    fn mount_issues_initial_empty_search() {
        let harness = Harness::mounted(LookupConfig::default());
        assert_eq!(harness.searches(), vec![(1, String::new())]);
        assert!(harness.state.is_search_loading());
        assert_eq!(harness.state.mode(), Mode::Searching);
    }

    #[test]
    fn keystrokes_within_delay_commit_once_with_last_value() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let before = harness.searches().len();

        harness.key("a");
        assert!(harness.state.is_search_loading());
        harness.advance(100);
        harness.key("ac");
        harness.advance(100);
        harness.key("acm");
        harness.advance(299);
        assert_eq!(harness.searches().len(), before);
        assert_eq!(harness.state.committed_term(), "");
        assert_eq!(harness.state.raw_input(), "acm");

        harness.advance(1);
        let searches = harness.searches();
        assert_eq!(searches.len(), before + 1);
        assert_eq!(searches.last().map(|(_, term)| term.as_str()), Some("acm"));
        assert_eq!(harness.state.committed_term(), "acm");
        assert_eq!(harness.scheduler.pending(), 0);
    }

    #[test]
    fn zero_delay_commits_on_next_drain() {
        let mut harness = Harness::mounted(LookupConfig::default().with_debounce_ms(0));
        harness.key("g");
        harness.advance(0);
        assert_eq!(harness.state.committed_term(), "g");
    }

    #[test]
    fn older_response_arriving_last_is_discarded() {
        let mut harness = Harness::mounted(LookupConfig::default());
        harness.key("a");
        harness.advance(300);
        let first = harness.last_search_generation();
        harness.key("gl");
        harness.advance(300);
        let second = harness.last_search_generation();
        assert!(second > first);

        harness.respond_search(second, Ok(vec![globex()]));
        harness.respond_search(first, Ok(vec![acme()]));

        assert_eq!(harness.state.candidates(), &[globex()]);
        assert!(!harness.state.is_search_loading());
        assert!(harness.state.last_failure().is_none());
    }

    #[test]
    fn pick_selects_notifies_and_clears_results() {
        let mut harness = with_results(LookupConfig::default());
        harness.key("ac");

        let effects = harness.state.pick("001A").expect("pick should succeed");
        assert!(matches!(effects.first(), Some(Effect::Notify(_))));
        assert!(effects.contains(&Effect::Schedule(SchedulerCommand::Cancel {
            key: COMMIT_KEY.to_string(),
        })));
        harness.apply(effects);

        assert_eq!(harness.state.selection().map(|s| s.id.as_str()), Some("001A"));
        assert_eq!(
            harness.notifications,
            vec![LookupUpdate {
                selected_record: Some(acme()),
            }]
        );
        assert!(harness.state.candidates().is_empty());
        assert_eq!(harness.state.raw_input(), "");
        assert_eq!(harness.state.committed_term(), "");
        assert_eq!(harness.state.mode(), Mode::Selected);
        assert!(!harness.state.results_open());
        assert_eq!(harness.scheduler.pending(), 0);
        assert_eq!(harness.persist_requests(), 0);
    }

    #[test]
    fn remove_returns_to_searching_and_notifies_empty_selection() {
        let mut harness = with_results(LookupConfig::default());
        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        let searches_before = harness.searches().len();

        let effects = harness.state.remove();
        harness.apply(effects);

        assert!(harness.state.selection().is_none());
        assert_eq!(
            harness.notifications.last(),
            Some(&LookupUpdate {
                selected_record: None
            })
        );
        assert_eq!(harness.state.raw_input(), "");
        assert_eq!(harness.state.committed_term(), "");
        assert_eq!(harness.state.mode(), Mode::Searching);
        assert_eq!(harness.searches().len(), searches_before + 1);
        assert_eq!(harness.persist_requests(), 0);
    }

    #[test]
    fn remove_without_selection_emits_nothing() {
        let mut harness = Harness::mounted(LookupConfig::default());
        assert!(harness.state.remove().is_empty());
        assert!(harness.notifications.is_empty());
    }

    #[test]
    fn default_record_preloads_into_selected_mode() {
        let mut harness = Harness::mounted(
            LookupConfig::default()
                .with_default_record_id("001D")
                .with_owner_record_id("500X")
                .with_auto_persist_on_pick(true),
        );
        let generation = harness
            .dispatched
            .iter()
            .find_map(|request| match request {
                SourceRequest::FetchDefault {
                    generation,
                    record_id,
                    ..
                } if record_id.as_str() == "001D" => Some(*generation),
                _ => None,
            })
            .expect("default fetch should be dispatched on mount");

        let effects = harness.state.apply_completion(SourceCompletion::FetchDefault {
            generation,
            result: Ok(Some(initech())),
        });
        harness.apply(effects);

        assert_eq!(harness.state.mode(), Mode::Selected);
        assert_eq!(harness.state.selection().map(|s| s.id.as_str()), Some("001D"));
        assert_eq!(harness.notifications.len(), 1);
        assert_eq!(harness.persist_requests(), 0);
    }

    #[test]
    fn missing_or_failed_default_stays_searching() {
        for result in [Ok(None), Err(LookupError::source("offline"))] {
            let mut harness =
                Harness::mounted(LookupConfig::default().with_default_record_id("001D"));
            let effects = harness
                .state
                .apply_completion(SourceCompletion::FetchDefault {
                    generation: 1,
                    result,
                });
            harness.apply(effects);
            assert_eq!(harness.state.mode(), Mode::Searching);
            assert!(harness.notifications.is_empty());
            assert_eq!(
                harness.state.last_failure().map(|failure| failure.kind),
                Some(FailureKind::DefaultLoad)
            );
        }
    }

    #[test]
    fn default_arriving_after_user_pick_is_discarded() {
        let mut harness = Harness::mounted(LookupConfig::default().with_default_record_id("001D"));
        let generation = harness.last_search_generation();
        harness.respond_search(generation, Ok(vec![acme(), globex()]));
        let effects = harness.state.pick("001B").expect("pick");
        harness.apply(effects);

        let effects = harness.state.apply_completion(SourceCompletion::FetchDefault {
            generation: 1,
            result: Ok(Some(initech())),
        });
        assert!(effects.is_empty());
        assert_eq!(harness.state.selection().map(|s| s.id.as_str()), Some("001B"));
        assert_eq!(harness.notifications.len(), 1);
    }

    #[test]
    fn persistence_failure_keeps_selection() {
        let mut harness = with_results(
            LookupConfig::default()
                .with_owner_record_id("500X")
                .with_auto_persist_on_pick(true),
        );
        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);

        let persisted = harness
            .dispatched
            .iter()
            .find_map(|request| match request {
                SourceRequest::Persist {
                    generation,
                    selected_record_id,
                    owner_record_id,
                    ..
                } => Some((*generation, selected_record_id.clone(), owner_record_id.clone())),
                _ => None,
            })
            .expect("auto persist should dispatch");
        assert_eq!(persisted.1.as_str(), "001A");
        assert_eq!(persisted.2.as_str(), "500X");

        let notifications_before = harness.notifications.len();
        let effects = harness.state.apply_completion(SourceCompletion::Persist {
            generation: persisted.0,
            selected_record_id: persisted.1,
            result: Err(LookupError::source("validation rule failed")),
        });
        harness.apply(effects);

        assert_eq!(harness.state.mode(), Mode::Selected);
        assert_eq!(harness.state.selection().map(|s| s.id.as_str()), Some("001A"));
        assert_eq!(harness.notifications.len(), notifications_before);
        assert_eq!(harness.toasts.len(), 1);
        assert_eq!(harness.toasts[0].variant, ToastVariant::Error);
        assert_eq!(harness.toasts[0].message, "Error saving record");
    }

    #[test]
    fn explicit_persist_reports_success() {
        let mut harness = with_results(LookupConfig::default().with_owner_record_id("500X"));
        let effects = harness.state.pick("001B").expect("pick");
        harness.apply(effects);
        assert_eq!(harness.persist_requests(), 0);
        assert!(harness.state.can_persist());

        let effects = harness.state.persist_selection().expect("persist");
        harness.apply(effects);
        assert_eq!(harness.persist_requests(), 1);

        let effects = harness.state.apply_completion(SourceCompletion::Persist {
            generation: 1,
            selected_record_id: "001B".into(),
            result: Ok(()),
        });
        harness.apply(effects);
        assert_eq!(
            harness.toasts,
            vec![Toast::success("Success", "Account linked successfully")]
        );
    }

    #[test]
    fn persist_requires_selection_and_owner() {
        let mut harness = with_results(LookupConfig::default());
        assert!(matches!(
            harness.state.persist_selection(),
            Err(LookupError::NothingSelected)
        ));
        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        assert!(!harness.state.can_persist());
        assert!(matches!(
            harness.state.persist_selection(),
            Err(LookupError::MissingOwner)
        ));
    }

    #[test]
    fn empty_term_commit_yields_defined_list() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let initial = harness.last_search_generation();
        harness.respond_search(initial, Ok(vec![acme(), globex()]));

        harness.key("x");
        harness.advance(300);
        let narrowed = harness.last_search_generation();
        harness.respond_search(narrowed, Ok(Vec::new()));
        assert!(!harness.state.has_records());

        harness.key("");
        harness.advance(300);
        let (generation, term) = harness.searches().last().cloned().expect("search");
        assert_eq!(term, "");
        harness.respond_search(generation, Ok(vec![acme(), globex()]));
        assert_eq!(harness.state.candidates().len(), 2);
        assert!(harness.state.has_records());
        assert!(harness.state.last_failure().is_none());
    }

    #[test]
    fn recommitting_same_term_clears_spinner() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let initial = harness.last_search_generation();
        harness.respond_search(initial, Ok(vec![acme()]));
        let searches_before = harness.searches().len();

        harness.key("a");
        harness.advance(100);
        harness.key("");
        assert!(harness.state.is_search_loading());
        harness.advance(300);

        assert_eq!(harness.searches().len(), searches_before);
        assert!(!harness.state.is_search_loading());
    }

    #[test]
    fn search_failure_empties_list_without_retry() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let generation = harness.last_search_generation();
        let searches_before = harness.searches().len();
        harness.respond_search(generation, Err(LookupError::Transport("timed out".into())));

        assert!(harness.state.candidates().is_empty());
        assert!(!harness.state.has_records());
        assert!(!harness.state.is_search_loading());
        assert_eq!(harness.searches().len(), searches_before);
        assert_eq!(
            harness.state.last_failure().map(|failure| failure.kind),
            Some(FailureKind::Search)
        );
        assert!(harness.toasts.is_empty());
    }

    #[test]
    fn successful_search_clears_earlier_search_failure() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let failed = harness.last_search_generation();
        harness.respond_search(failed, Err(LookupError::source("offline")));
        assert!(harness.state.last_failure().is_some());

        let effects = harness.state.commit_term("ac".to_string());
        harness.apply(effects);
        let generation = harness.last_search_generation();
        harness.respond_search(generation, Ok(vec![acme()]));

        assert_eq!(harness.state.candidates(), &[acme()]);
        assert!(harness.state.last_failure().is_none());
    }

    #[test]
    fn search_success_keeps_default_load_failure() {
        let mut harness = Harness::mounted(LookupConfig::default().with_default_record_id("001D"));
        let effects = harness.state.apply_completion(SourceCompletion::FetchDefault {
            generation: 1,
            result: Err(LookupError::source("offline")),
        });
        harness.apply(effects);
        let generation = harness.last_search_generation();
        harness.respond_search(generation, Ok(vec![acme()]));

        assert_eq!(
            harness.state.last_failure().map(|failure| failure.kind),
            Some(FailureKind::DefaultLoad)
        );

        harness.state.open_results();
        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        assert!(harness.state.last_failure().is_none());
    }

    #[test]
    fn in_flight_search_is_discarded_after_pick() {
        let mut harness = with_results(LookupConfig::default());
        harness.key("glo");
        harness.advance(300);
        let in_flight = harness.last_search_generation();

        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        harness.respond_search(in_flight, Ok(vec![globex()]));

        assert!(harness.state.candidates().is_empty());
        assert_eq!(harness.state.mode(), Mode::Selected);
    }

    #[test]
    fn pending_commit_never_fires_after_pick() {
        let mut harness = with_results(LookupConfig::default());
        harness.key("glo");
        let effects = harness.state.pick("001B").expect("pick");
        harness.apply(effects);
        let searches_before = harness.searches().len();

        harness.advance(1_000);
        assert_eq!(harness.searches().len(), searches_before);
        assert_eq!(harness.state.committed_term(), "");
    }

    #[test]
    fn pick_rejects_unknown_or_second_selection() {
        let mut harness = with_results(LookupConfig::default());
        assert!(matches!(
            harness.state.pick("999"),
            Err(LookupError::CandidateNotFound(id)) if id == "999"
        ));
        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        assert!(matches!(
            harness.state.pick("001B"),
            Err(LookupError::SelectionPresent)
        ));
        assert!(harness.state.on_key_input("x").is_empty());
    }

    #[test]
    fn entity_type_change_requeries() {
        let mut harness = Harness::mounted(LookupConfig::default());
        assert!(harness.state.set_entity_type("Account").is_empty());
        let effects = harness.state.set_entity_type("Contact");
        harness.apply(effects);
        let last = harness.dispatched.last().expect("search dispatched");
        assert!(matches!(
            last,
            SourceRequest::Search { entity_type, .. } if entity_type.as_str() == "Contact"
        ));
    }

    #[test]
    fn default_for_previous_entity_type_is_discarded() {
        let mut harness = Harness::mounted(LookupConfig::default().with_default_record_id("001D"));
        let effects = harness.state.set_entity_type("Contact");
        harness.apply(effects);

        let effects = harness.state.apply_completion(SourceCompletion::FetchDefault {
            generation: 1,
            result: Ok(Some(initech())),
        });
        assert!(effects.is_empty());
        assert_eq!(harness.state.mode(), Mode::Searching);
        assert!(harness.notifications.is_empty());
    }

    #[test]
    fn teardown_cancels_pending_commit_and_ignores_late_events() {
        let mut harness = Harness::mounted(LookupConfig::default());
        let generation = harness.last_search_generation();
        harness.key("ac");
        let effects = harness.state.teardown();
        harness.apply(effects);
        assert_eq!(harness.scheduler.pending(), 0);

        harness.advance(1_000);
        assert_eq!(harness.state.committed_term(), "");
        assert!(harness.state.on_key_input("acme").is_empty());
        assert!(
            harness
                .state
                .apply_completion(SourceCompletion::Search {
                    generation,
                    result: Ok(vec![acme()]),
                })
                .is_empty()
        );
        assert!(matches!(harness.state.pick("001A"), Err(LookupError::TornDown)));
    }

    #[test]
    fn dropdown_opens_only_while_searching() {
        let mut harness = with_results(LookupConfig::default());
        assert!(harness.state.open_results());
        assert!(harness.state.results_open());
        assert!(harness.state.close_results());
        assert!(!harness.state.close_results());

        let effects = harness.state.pick("001A").expect("pick");
        harness.apply(effects);
        assert!(!harness.state.open_results());
        assert!(!harness.state.results_open());
    }
}
