//! Scoreboard node: ties the digit to its bus address and handles the
//! decoded requests the datalink hands over.
//!
//! After power-up every channel is driven to its calibration width and score
//! updates are held off until [`Node::end_calibration`], so a freshly mounted
//! servo can be trimmed before the first real movement.

mod address;
mod frames;

pub use address::{sample_address, AddressError, NodeIndex};
pub use frames::{
    encode_version, FrameError, ScoreFrame, ServoCommand, StatusReply, BITE_OK,
    SCORE_FRAME_LEN, SERVO_COMMAND_LEN, STATUS_RESOLVE_ADDRESS, VERSION_REPLY_LEN,
};

use embedded_hal::digital::v2::OutputPin;

use crate::display::{FlipDisplay, PulseWidth, Segments, SequencerConfig};
use crate::support::TickSource;
use crate::{log_debug, log_info, log_warn};

/// Display config for a node at `address`; unknown addresses get no stagger.
pub fn sequencer_config(address: u8) -> SequencerConfig {
    let delay = NodeIndex::resolve(address).map_or(0, NodeIndex::delay);
    SequencerConfig::default().with_node_delay(delay)
}

pub struct Node<P, T, N> {
    display: FlipDisplay<P, T, N>,
    address: u8,
    index: Option<NodeIndex>,
    calibrating: bool,
}

impl<P, T, N> Node<P, T, N>
where
    P: OutputPin,
    T: TickSource,
    N: FnMut(u8),
{
    pub fn new(display: FlipDisplay<P, T, N>, address: u8) -> Self {
        let mut node = Self {
            display,
            address: 0,
            index: None,
            calibrating: false,
        };
        node.set_address(address);
        node
    }

    /// Move every servo to its calibration width and hold off bus commands.
    pub fn start(&mut self) {
        log_info!("node: calibrating");
        self.calibrating = true;
        self.display
            .debug_servo(Segments::DIGIT | Segments::ARROW, PulseWidth::CALIBRATE);
    }

    pub fn end_calibration(&mut self) {
        if self.calibrating {
            log_info!("node: calibration window closed");
            self.calibrating = false;
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    pub fn set_address(&mut self, address: u8) {
        self.address = address;
        self.index = match NodeIndex::resolve(address) {
            Ok(index) => {
                log_info!("node: address {} index {}", address, index.index() as u8);
                Some(index)
            }
            Err(AddressError::Unknown(a)) => {
                log_warn!("node: unknown address {}", a);
                None
            }
        };
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn index(&self) -> Option<NodeIndex> {
        self.index
    }

    fn status(&self) -> StatusReply {
        StatusReply {
            address: self.address,
            bite: BITE_OK,
        }
    }

    //-------------------------------------------------------------------------

    /// Score update. No reply while calibrating.
    pub fn on_set_data(&mut self, payload: &[u8]) -> Option<StatusReply> {
        if self.calibrating {
            return None;
        }

        match ScoreFrame::parse(payload) {
            Ok(frame) => {
                if let Some(index) = self.index {
                    self.display.set_value(frame.value_for(index));
                    if let Some(arrow) = frame.arrow_for(index) {
                        self.display.set_arrow(arrow);
                    }
                }
            }
            Err(_) => log_warn!("node: bad score frame, {} bytes", payload.len() as u16),
        }

        Some(self.status())
    }

    /// Raw servo positioning for calibration. No reply while calibrating.
    pub fn on_set_servo(&mut self, payload: &[u8]) -> Option<StatusReply> {
        if self.calibrating {
            return None;
        }

        match ServoCommand::parse(payload) {
            Ok(cmd) => {
                log_debug!("node: servo mask {} width {}", cmd.mask.bits(), cmd.width.ticks());
                self.display.debug_servo(cmd.mask, cmd.width);
            }
            Err(_) => log_warn!("node: bad servo command, {} bytes", payload.len() as u16),
        }

        Some(self.status())
    }

    /// Status poll; a leading [`STATUS_RESOLVE_ADDRESS`] byte re-reads the straps
    /// through `resample` first.
    pub fn on_get_status<F>(&mut self, payload: &[u8], resample: F) -> StatusReply
    where
        F: FnOnce() -> Option<u8>,
    {
        if payload.first() == Some(&STATUS_RESOLVE_ADDRESS) {
            if let Some(address) = resample() {
                self.set_address(address);
            }
        }
        self.status()
    }

    pub fn on_get_version(&self) -> Result<heapless::Vec<u8, VERSION_REPLY_LEN>, FrameError> {
        encode_version()
    }

    //-------------------------------------------------------------------------

    pub fn on_tick(&mut self) {
        self.display.on_tick();
    }

    pub fn display(&self) -> &FlipDisplay<P, T, N> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut FlipDisplay<P, T, N> {
        &mut self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::display::mock::{MockPin, MockTick, PinLog};
    use crate::display::{ChannelId, State};

    type TestNode = Node<MockPin, MockTick, fn(u8)>;

    fn node(address: u8) -> (TestNode, MockTick) {
        let log = PinLog::default();
        let tick = MockTick::default();
        let outputs = core::array::from_fn(|i| Some(MockPin::new(i, &log)));
        let display = FlipDisplay::new(
            outputs,
            [Some(MockPin::new(8, &log)), None],
            tick.clone(),
            (|_: u8| {}) as fn(u8),
            sequencer_config(address).with_step_divider(1),
        );
        (Node::new(display, address), tick)
    }

    fn settle(node: &mut TestNode, tick: &MockTick) {
        for _ in 0..100_000 {
            if !tick.is_running() {
                return;
            }
            node.on_tick();
        }
        panic!("display never settled");
    }

    fn score(values: [u8; 10], flags: u8) -> [u8; SCORE_FRAME_LEN] {
        let mut f = [0u8; SCORE_FRAME_LEN];
        f[..10].copy_from_slice(&values);
        f[10] = flags;
        f
    }

    #[test]
    fn address_picks_node_delay() {
        assert_eq!(sequencer_config(config::PLAY2_SET3).node_delay, 2000);
        assert_eq!(sequencer_config(0x03).node_delay, 0);
    }

    #[test]
    fn startup_calibrates_every_channel() {
        let (mut n, tick) = node(config::PLAY1_TENS);
        n.start();
        assert!(n.is_calibrating());
        assert_eq!(n.display().state(), State::ServosWaiting);
        settle(&mut n, &tick);
        for id in ChannelId::ALL {
            assert_eq!(n.display().target(id), PulseWidth::CALIBRATE);
        }
    }

    #[test]
    fn commands_are_held_off_while_calibrating() {
        let (mut n, tick) = node(config::PLAY1_UNITS);
        n.start();
        settle(&mut n, &tick);

        assert_eq!(n.on_set_data(&score([8; 10], 0)), None);
        assert_eq!(n.on_set_servo(&[0x01, 20]), None);
        assert!(n.display().is_idle());

        n.end_calibration();
        let reply = n.on_set_data(&score([0, 7, 0, 0, 0, 0, 0, 0, 0, 0], 0));
        assert_eq!(
            reply,
            Some(StatusReply {
                address: config::PLAY1_UNITS,
                bite: BITE_OK
            })
        );
        assert!(!n.display().is_idle());
        settle(&mut n, &tick);
        assert_eq!(n.display().committed(), Some(7));
    }

    #[test]
    fn tens_node_follows_serve_flag() {
        let (mut n, tick) = node(config::PLAY2_TENS);
        n.on_set_data(&score([0, 0, 0, 0, 0, 3, 0, 0, 0, 0], 0x02));
        settle(&mut n, &tick);
        assert_eq!(n.display().committed(), Some(3));
        assert!(n.display().arrow());
        assert_eq!(n.display().target(ChannelId::H), PulseWidth::SHOWN);
    }

    #[test]
    fn other_nodes_ignore_serve_flag() {
        let (mut n, tick) = node(config::PLAY2_UNITS);
        n.on_set_data(&score([0; 10], 0x03));
        settle(&mut n, &tick);
        assert!(!n.display().arrow());
    }

    #[test]
    fn malformed_payloads_still_reply() {
        let (mut n, _tick) = node(config::PLAY1_SET1);
        assert!(n.on_set_data(&[1, 2, 3]).is_some());
        assert!(n.on_set_servo(&[1]).is_some());
        assert!(n.display().is_idle());
    }

    #[test]
    fn set_servo_drives_debug_movement() {
        let (mut n, tick) = node(config::PLAY1_SET2);
        n.on_set_servo(&[0b0000_0100, 9]);
        settle(&mut n, &tick);
        assert_eq!(n.display().target(ChannelId::C), PulseWidth::from_ticks(9));
        assert_eq!(n.display().target(ChannelId::A), PulseWidth::SHOWN);
    }

    #[test]
    fn unknown_address_replies_without_moving() {
        let (mut n, _tick) = node(0x02);
        assert_eq!(n.index(), None);
        let reply = n.on_set_data(&score([5; 10], 0)).unwrap();
        assert_eq!(reply.address, 0x02);
        assert!(n.display().is_idle());
    }

    #[test]
    fn status_can_re_resolve_address() {
        let (mut n, _tick) = node(0x02);
        let reply = n.on_get_status(&[STATUS_RESOLVE_ADDRESS], || Some(config::PLAY1_SET3));
        assert_eq!(reply.address, config::PLAY1_SET3);
        assert_eq!(n.index().map(|i| i.index()), Some(4));

        let reply = n.on_get_status(&[], || panic!("straps must not be read"));
        assert_eq!(reply.address, config::PLAY1_SET3);
    }

    #[test]
    fn version_reply() {
        let (n, _tick) = node(config::PLAY1_TENS);
        let v = n.on_get_version().unwrap();
        assert_eq!(&v[8..], &config::FIRMWARE_VERSION);
    }
}
