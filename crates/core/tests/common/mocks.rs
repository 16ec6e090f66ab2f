use mockall::mock;
use tomasim_core::core::pipeline::tracker::{Stage, Tracker};

mock! {
    pub Tracker {}

    impl Tracker for Tracker {
        fn update(&mut self, stage: Stage, pc: u64);
        fn begin_cycle(&mut self, cycle: u64);
        fn squash(&mut self, pc: u64);
    }
}

/// Tracker that keeps every notification, tagged with its cycle.
#[derive(Debug, Default)]
pub struct Recorder {
    pub cycle: u64,
    pub events: Vec<(u64, Stage, u64)>,
    pub squashed: Vec<u64>,
}

impl Recorder {
    /// Addresses that reached `stage`, in notification order.
    pub fn pcs(&self, stage: Stage) -> Vec<u64> {
        self.events
            .iter()
            .filter(|(_, s, _)| *s == stage)
            .map(|&(_, _, pc)| pc)
            .collect()
    }

    /// Cycles in which `stage` was reported.
    pub fn cycles(&self, stage: Stage) -> Vec<u64> {
        self.events
            .iter()
            .filter(|(_, s, _)| *s == stage)
            .map(|&(c, _, _)| c)
            .collect()
    }
}

impl Tracker for Recorder {
    fn update(&mut self, stage: Stage, pc: u64) {
        self.events.push((self.cycle, stage, pc));
    }

    fn begin_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    fn squash(&mut self, pc: u64) {
        self.squashed.push(pc);
    }
}
