/// Monotonic generation counter for one kind of request.
///
/// Every issued request takes the next generation. A completion is applied
/// only while its generation is still the latest one issued; `invalidate`
/// retires everything in flight without issuing a new request.
#[derive(Debug, Clone, Default)]
pub struct Generations {
    sequence: u64,
    in_flight: Option<u64>,
}

impl Generations {
    pub fn next(&mut self) -> u64 {
        self.sequence = self.sequence.saturating_add(1);
        self.in_flight = Some(self.sequence);
        self.sequence
    }

    pub fn latest(&self) -> u64 {
        self.sequence
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.sequence && self.in_flight == Some(generation)
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Marks the current generation as answered. Returns false for stale tokens.
    pub fn finish(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.in_flight = None;
        true
    }

    pub fn invalidate(&mut self) {
        self.sequence = self.sequence.saturating_add(1);
        self.in_flight = None;
    }
}
