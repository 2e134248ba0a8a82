//! Recording pins and tick source for host tests.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::v2::OutputPin;

use crate::support::TickSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

#[derive(Default)]
struct Inner {
    now: Cell<u32>,
    events: RefCell<Vec<(u32, usize, Level)>>,
}

/// Shared write log for every pin of one test rig.
#[derive(Clone, Default)]
pub struct PinLog(Rc<Inner>);

impl PinLog {
    pub fn set_time(&self, now: u32) {
        self.0.now.set(now);
    }

    pub fn events(&self) -> Vec<(usize, Level)> {
        self.0
            .events
            .borrow()
            .iter()
            .map(|&(_, id, level)| (id, level))
            .collect()
    }

    pub fn timed_events(&self) -> Vec<(u32, usize, Level)> {
        self.0.events.borrow().clone()
    }

    pub fn events_for(&self, id: usize) -> Vec<(u32, Level)> {
        self.0
            .events
            .borrow()
            .iter()
            .filter(|&&(_, pin, _)| pin == id)
            .map(|&(t, _, level)| (t, level))
            .collect()
    }

    pub fn clear(&self) {
        self.0.events.borrow_mut().clear();
    }
}

pub struct MockPin {
    id: usize,
    log: PinLog,
}

impl MockPin {
    pub fn new(id: usize, log: &PinLog) -> Self {
        Self {
            id,
            log: log.clone(),
        }
    }

    fn record(&mut self, level: Level) {
        let now = self.log.0.now.get();
        self.log.0.events.borrow_mut().push((now, self.id, level));
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(Level::High);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockTick {
    running: Rc<Cell<bool>>,
    starts: Rc<Cell<u32>>,
    stops: Rc<Cell<u32>>,
}

impl MockTick {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn starts(&self) -> u32 {
        self.starts.get()
    }

    pub fn stops(&self) -> u32 {
        self.stops.get()
    }
}

impl TickSource for MockTick {
    fn start(&mut self) {
        self.running.set(true);
        self.starts.set(self.starts.get() + 1);
    }

    fn stop(&mut self) {
        self.running.set(false);
        self.stops.set(self.stops.get() + 1);
    }
}
