use fugit_timer::ExtU32;

use crate::config;

/// Periodic tick that only runs while a movement is in flight.
pub trait TickSource {
    fn start(&mut self);
    fn stop(&mut self);
}

pub struct Timer<TIM> {
    timer: TIM,
    interval: fugit_timer::Duration<u32, 1, 1_000_000>,
}

impl<TIM> Timer<TIM> {
    pub fn new(timer: TIM) -> Self {
        Self {
            timer,
            interval: config::PPM_TICK_US.micros(),
        }
    }

    pub fn with_interval(timer: TIM, interval: fugit_timer::Duration<u32, 1, 1_000_000>) -> Self {
        Self { timer, interval }
    }

    pub fn interval(&self) -> fugit_timer::Duration<u32, 1, 1_000_000> {
        self.interval
    }

    pub fn free(self) -> TIM {
        self.timer
    }
}

impl<TIM> TickSource for Timer<TIM>
where
    TIM: fugit_timer::Timer<1_000_000>,
{
    fn start(&mut self) {
        let _ = self.timer.start(self.interval);
    }

    fn stop(&mut self) {
        let _ = self.timer.cancel();
    }
}
