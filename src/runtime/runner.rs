use crate::core::effect::Effect;
use crate::runtime::event::{AppEvent, HostEvent, Toast};
use crate::runtime::scheduler::Scheduler;
use crate::source::RecordSource;
use crate::task::{SourceCompletion, TaskExecutor};
use crate::terminal::{KeyCode, KeyEvent, Terminal, TerminalEvent, TerminalSize};
use crate::ui::renderer::{RenderFrame, Renderer};
use crate::widgets::LookupField;
use crate::widgets::traits::{InteractionResult, Interactive};
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_millis(120);
const BUSY_POLL: Duration = Duration::from_millis(30);

/// Drives one lookup field: routes input, fires debounced timers, runs
/// source calls off-thread and applies the effects the field emits.
pub struct LookupRuntime {
    field: LookupField,
    scheduler: Scheduler,
    executor: TaskExecutor,
    host_events: VecDeque<HostEvent>,
    last_toast: Option<Toast>,
    render_requested: bool,
    should_exit: bool,
}

impl LookupRuntime {
    pub fn new(field: LookupField, source: Arc<dyn RecordSource>) -> Self {
        Self {
            field,
            scheduler: Scheduler::new(),
            executor: TaskExecutor::new(source),
            host_events: VecDeque::new(),
            last_toast: None,
            render_requested: false,
            should_exit: false,
        }
    }

    pub fn field(&self) -> &LookupField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut LookupField {
        &mut self.field
    }

    pub fn last_toast(&self) -> Option<&Toast> {
        self.last_toast.as_ref()
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn mount(&mut self, now: Instant) {
        let effects = self.field.mount();
        self.apply_effects(effects, now);
    }

    /// Ctrl+C always quits; Esc quits once the field no longer wants it.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.is_ctrl_char('c') {
            self.should_exit = true;
            return;
        }
        let result = self.field.on_key(key);
        if !result.handled && key.code == KeyCode::Esc {
            self.should_exit = true;
            return;
        }
        self.apply_interaction(result, now);
    }

    pub fn tick(&mut self, now: Instant) {
        let result = self.field.on_tick();
        self.apply_interaction(result, now);
    }

    pub fn dispatch(&mut self, event: AppEvent, now: Instant) {
        match event {
            AppEvent::Terminal(TerminalEvent::Key(key)) => self.handle_key(key, now),
            AppEvent::Terminal(TerminalEvent::Tick) => self.tick(now),
            AppEvent::Terminal(TerminalEvent::Resize(_)) => self.render_requested = true,
            AppEvent::Timer(timer) => {
                let effects = self.field.on_timer(timer);
                self.apply_effects(effects, now);
            }
        }
    }

    /// Fires due timers and applies finished source calls. Returns whether
    /// anything was processed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut progressed = false;
        for event in self.scheduler.drain_ready(now) {
            progressed = true;
            self.dispatch(AppEvent::Timer(event), now);
        }
        for completion in self.executor.drain_ready() {
            progressed = true;
            self.deliver(completion, now);
        }
        progressed
    }

    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let timeout = self.scheduler.poll_timeout(now, TICK_INTERVAL);
        if self.executor.in_flight() > 0 {
            return timeout.min(BUSY_POLL);
        }
        timeout
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.pending() == 0 && self.executor.in_flight() == 0
    }

    /// Pumps until no timer or source call is outstanding.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            self.pump(now);
            if self.is_idle() {
                return true;
            }
            if now >= deadline {
                return false;
            }
            let wait = self
                .scheduler
                .poll_timeout(now, BUSY_POLL)
                .min(deadline.saturating_duration_since(now));
            if self.executor.in_flight() > 0 {
                if let Some(completion) = self.executor.wait_ready(wait) {
                    self.deliver(completion, Instant::now());
                }
            } else {
                std::thread::sleep(wait);
            }
        }
    }

    pub fn drain_host_events(&mut self) -> Vec<HostEvent> {
        self.host_events.drain(..).collect()
    }

    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    pub fn teardown(&mut self, now: Instant) {
        let effects = self.field.teardown();
        self.apply_effects(effects, now);
        self.scheduler.clear();
        let abandoned = self.executor.in_flight();
        if abandoned > 0 {
            tracing::debug!(abandoned, "source calls still running at teardown");
        }
    }

    pub fn render(&self, size: TerminalSize) -> RenderFrame {
        Renderer::render(&self.field, self.last_toast.as_ref(), size)
    }

    pub fn run(
        &mut self,
        terminal: &mut Terminal,
        mut on_host_event: impl FnMut(HostEvent),
    ) -> io::Result<()> {
        terminal.enter()?;

        let run_result = (|| -> io::Result<()> {
            self.mount(Instant::now());
            let focused = self.field.on_focus();
            self.apply_interaction(focused, Instant::now());
            terminal.render_frame(&self.render(terminal.size()))?;

            while !self.should_exit {
                self.pump(Instant::now());
                for event in self.drain_host_events() {
                    on_host_event(event);
                }
                if self.take_render_request() {
                    terminal.render_frame(&self.render(terminal.size()))?;
                }

                let timeout = self.poll_timeout(Instant::now());
                let event = terminal.poll_event(timeout)?;
                if let TerminalEvent::Resize(size) = event {
                    terminal.set_size(size);
                }
                self.dispatch(AppEvent::Terminal(event), Instant::now());
            }

            Ok(())
        })();

        self.teardown(Instant::now());
        for event in self.drain_host_events() {
            on_host_event(event);
        }
        let exit_result = terminal.exit();
        run_result.and(exit_result)
    }

    fn deliver(&mut self, completion: SourceCompletion, now: Instant) {
        let effects = self.field.apply_completion(completion);
        self.apply_effects(effects, now);
    }

    fn apply_interaction(&mut self, result: InteractionResult, now: Instant) {
        self.render_requested |= result.request_render;
        self.apply_effects(result.effects, now);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>, now: Instant) {
        for effect in effects {
            match effect {
                Effect::Schedule(cmd) => self.scheduler.schedule(cmd, now),
                Effect::Dispatch(request) => self.executor.spawn(request),
                Effect::Notify(update) => {
                    tracing::debug!(
                        selected = update
                            .selected_record
                            .as_ref()
                            .map(|record| record.id.as_str())
                            .unwrap_or("none"),
                        "lookup update"
                    );
                    self.host_events.push_back(HostEvent::LookupUpdate(update));
                }
                Effect::Toast(toast) => {
                    self.last_toast = Some(toast.clone());
                    self.host_events.push_back(HostEvent::Toast(toast));
                }
                Effect::RequestRender => self.render_requested = true,
            }
        }
    }
}
