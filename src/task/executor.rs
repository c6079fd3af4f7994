use crate::source::RecordSource;
use crate::task::execution::{SourceCompletion, SourceRequest, execute_request};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

pub struct TaskExecutor {
    source: Arc<dyn RecordSource>,
    completion_tx: Sender<SourceCompletion>,
    completion_rx: Receiver<SourceCompletion>,
    in_flight: usize,
}

impl TaskExecutor {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel::<SourceCompletion>();
        Self {
            source,
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    pub fn spawn(&mut self, request: SourceRequest) {
        let completion_tx = self.completion_tx.clone();
        let source = Arc::clone(&self.source);
        tracing::debug!(
            kind = request.kind(),
            generation = request.generation(),
            "dispatching record source call"
        );
        self.in_flight = self.in_flight.saturating_add(1);
        std::thread::spawn(move || {
            let completion = execute_request(source.as_ref(), request);
            let _ = completion_tx.send(completion);
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn drain_ready(&mut self) -> Vec<SourceCompletion> {
        let mut out = Vec::<SourceCompletion>::new();
        loop {
            match self.completion_rx.try_recv() {
                Ok(completion) => out.push(completion),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    /// Blocks until one completion arrives or `timeout` elapses.
    pub fn wait_ready(&mut self, timeout: Duration) -> Option<SourceCompletion> {
        match self.completion_rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
