use embedded_hal::digital::v2::OutputPin;

use crate::config;

/// Blinking status LED, toggled from a periodic task.
pub struct Heartbeat<P> {
    led: P,
    lit: bool,
    interval_ms: u32,
}

impl<P: OutputPin> Heartbeat<P> {
    pub fn new(led: P) -> Self {
        Self::with_interval(led, config::HEARTBEAT_MS)
    }

    pub fn with_interval(mut led: P, interval_ms: u32) -> Self {
        let _ = led.set_low();
        Self {
            led,
            lit: false,
            interval_ms,
        }
    }

    /// Flip the LED, returns the time until the next toggle, ms.
    pub fn toggle(&mut self) -> u32 {
        self.lit = !self.lit;
        let _ = if self.lit {
            self.led.set_high()
        } else {
            self.led.set_low()
        };
        self.interval_ms
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
