use bitflags::bitflags;
use embedded_hal::digital::v2::OutputPin;

use crate::config;

bitflags! {
    /// Channel selection, bit `n` is [`ChannelId`] with index `n`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Segments: u8 {
        const A = 0b0000_0001;
        const B = 0b0000_0010;
        const C = 0b0000_0100;
        const D = 0b0000_1000;
        const E = 0b0001_0000;
        const F = 0b0010_0000;
        const G = 0b0100_0000;
        /// Arrow flag
        const H = 0b1000_0000;

        const DIGIT = 0b0111_1111;
        const ARROW = 0b1000_0000;
        const HORIZONTAL = 0b0100_1001;
        const VERTICAL = 0b0011_0110;
        /// Panels shared by neighbouring shapes, retracted before a full move
        const CLEAR = 0b0010_0010;
        const NONE = 0b0000_0000;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelId {
    A = 0,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl ChannelId {
    pub const COUNT: usize = 8;

    pub const ALL: [ChannelId; Self::COUNT] = [
        ChannelId::A,
        ChannelId::B,
        ChannelId::C,
        ChannelId::D,
        ChannelId::E,
        ChannelId::F,
        ChannelId::G,
        ChannelId::H,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn mask(self) -> Segments {
        Segments::from_bits_retain(1 << self.index())
    }
}

/// Servo pulse width in PPM ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PulseWidth(u8);

impl PulseWidth {
    pub const SHOWN: PulseWidth = PulseWidth(config::PPM_SEG_SHOWN);
    pub const HIDDEN: PulseWidth = PulseWidth(config::PPM_SEG_HIDDEN);
    pub const CLEAR_TRANSIT: PulseWidth = PulseWidth(config::PPM_SEG_CLEAR);
    pub const CALIBRATE: PulseWidth = PulseWidth(config::PPM_SEG_CALIBRATE);

    /// Raw width, clamped so a pulse always fits in one frame.
    pub fn from_ticks(ticks: u8) -> Self {
        PulseWidth(ticks.min(config::PPM_PERIOD))
    }

    #[inline]
    pub fn ticks(self) -> u8 {
        self.0
    }
}

/// One servo line: the bound output (if any) and its PPM bookkeeping.
pub struct Channel<P> {
    output: Option<P>,
    pub(crate) target: PulseWidth,
    pub(crate) countdown: u8,
    high: bool,
}

impl<P: OutputPin> Channel<P> {
    pub fn new(output: Option<P>) -> Self {
        let mut ch = Self {
            output,
            target: PulseWidth::SHOWN,
            countdown: 0,
            high: true,
        };
        ch.set_low();
        ch
    }

    pub fn is_bound(&self) -> bool {
        self.output.is_some()
    }

    /// Last level written to the output, `false` for unbound channels.
    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn target(&self) -> PulseWidth {
        self.target
    }

    pub(crate) fn set_high(&mut self) {
        if let Some(pin) = self.output.as_mut() {
            if !self.high {
                let _ = pin.set_high();
                self.high = true;
            }
        }
    }

    pub(crate) fn set_low(&mut self) {
        match self.output.as_mut() {
            Some(pin) if self.high => {
                let _ = pin.set_low();
                self.high = false;
            }
            Some(_) => {}
            None => self.high = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mock::{Level, MockPin, PinLog};

    #[test]
    fn channel_masks_follow_index() {
        assert_eq!(ChannelId::A.mask(), Segments::A);
        assert_eq!(ChannelId::H.mask(), Segments::ARROW);
        let all = ChannelId::ALL
            .iter()
            .fold(Segments::NONE, |acc, ch| acc | ch.mask());
        assert_eq!(all, Segments::all());
    }

    #[test]
    fn groups_partition_the_digit() {
        assert_eq!(Segments::HORIZONTAL | Segments::VERTICAL, Segments::DIGIT);
        assert!((Segments::HORIZONTAL & Segments::VERTICAL).is_empty());
        assert!(Segments::VERTICAL.contains(Segments::CLEAR));
    }

    #[test]
    fn raw_width_is_clamped_to_frame() {
        assert_eq!(PulseWidth::from_ticks(20).ticks(), 20);
        assert_eq!(
            PulseWidth::from_ticks(u8::MAX).ticks(),
            crate::config::PPM_PERIOD
        );
    }

    #[test]
    fn new_channel_starts_low_and_only_writes_on_change() {
        let log = PinLog::default();
        let mut ch = Channel::new(Some(MockPin::new(0, &log)));
        assert!(!ch.is_high());

        ch.set_high();
        ch.set_high();
        ch.set_low();
        ch.set_low();

        assert_eq!(
            log.events(),
            vec![(0, Level::Low), (0, Level::High), (0, Level::Low)]
        );
    }

    #[test]
    fn unbound_channel_is_a_sink() {
        let mut ch: Channel<MockPin> = Channel::new(None);
        ch.set_high();
        assert!(!ch.is_high());
        assert!(!ch.is_bound());
    }
}
