//! Software PPM for up to eight servo lines sharing one frame counter.
//!
//! Each tick either counts the frame down or, at the frame boundary, reloads
//! every selected channel from its target width. A channel goes high at the
//! boundary (when pulses are allowed) and low once its own countdown runs out.

use embedded_hal::digital::v2::OutputPin;

use super::channel::{Channel, ChannelId, PulseWidth, Segments};
use crate::config;

pub struct PulseGenerator<P> {
    channels: [Channel<P>; ChannelId::COUNT],
    period: u8,
}

impl<P: OutputPin> PulseGenerator<P> {
    pub fn new(outputs: [Option<P>; ChannelId::COUNT]) -> Self {
        Self {
            channels: outputs.map(Channel::new),
            period: config::PPM_PERIOD,
        }
    }

    /// Advance one tick for the channels in `group`.
    ///
    /// `start_pulses` controls whether a frame boundary raises the outputs;
    /// channels outside `group` are not touched.
    pub fn run(&mut self, group: Segments, start_pulses: bool) {
        let selected = self
            .channels
            .iter_mut()
            .zip(ChannelId::ALL)
            .filter(|(_, id)| group.contains(id.mask()))
            .map(|(ch, _)| ch);

        if self.period > 0 {
            self.period -= 1;
            for ch in selected {
                if ch.countdown > 0 {
                    ch.countdown -= 1;
                }
                if ch.countdown == 0 {
                    ch.set_low();
                }
            }
        } else {
            self.period = config::PPM_PERIOD;
            for ch in selected {
                ch.countdown = ch.target.ticks();
                if start_pulses {
                    ch.set_high();
                }
            }
        }
    }

    /// Drive the channels in `mask` low and drop any pulse they have in progress.
    pub fn release(&mut self, mask: Segments) {
        for (ch, id) in self.channels.iter_mut().zip(ChannelId::ALL) {
            if mask.contains(id.mask()) {
                ch.countdown = 0;
                ch.set_low();
            }
        }
    }

    pub fn release_all(&mut self) {
        self.release(Segments::all());
    }

    pub fn set_target(&mut self, id: ChannelId, width: PulseWidth) {
        self.channels[id.index()].target = width;
    }

    pub fn target(&self, id: ChannelId) -> PulseWidth {
        self.channels[id.index()].target
    }

    pub fn channel(&self, id: ChannelId) -> &Channel<P> {
        &self.channels[id.index()]
    }

    /// Targets for every channel in `pattern` become SHOWN, the rest HIDDEN.
    pub fn apply_pattern(&mut self, pattern: Segments) {
        for (ch, id) in self.channels.iter_mut().zip(ChannelId::ALL) {
            ch.target = if pattern.contains(id.mask()) {
                PulseWidth::SHOWN
            } else {
                PulseWidth::HIDDEN
            };
        }
    }
}
