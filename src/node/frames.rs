//! Payloads exchanged with the bus master once the datalink has stripped
//! framing and CRC.

use byte::{BytesExt, LE};
use heapless::Vec;

use super::address::NodeIndex;
use crate::config;
use crate::display::{PulseWidth, Segments};

pub const SCORE_FRAME_LEN: usize = 14;
pub const SERVO_COMMAND_LEN: usize = 2;
pub const STATUS_REPLY_LEN: usize = 2;
pub const VERSION_REPLY_LEN: usize = 12;

/// Request byte asking the node to sample its address straps again.
pub const STATUS_RESOLVE_ADDRESS: u8 = 0x01;

/// No built-in test faults.
pub const BITE_OK: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameError {
    Length { expected: usize, actual: usize },
    Encode,
}

fn expect_len(payload: &[u8], expected: usize) -> Result<(), FrameError> {
    if payload.len() == expected {
        Ok(())
    } else {
        Err(FrameError::Length {
            expected,
            actual: payload.len(),
        })
    }
}

/// SetData payload: one numeral per node, serve flags and the match clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreFrame {
    values: [u8; config::BUS_NODES],
    flags: u8,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
}

impl ScoreFrame {
    pub fn parse(payload: &[u8]) -> Result<Self, FrameError> {
        expect_len(payload, SCORE_FRAME_LEN)?;

        let mut values = [0u8; config::BUS_NODES];
        values.copy_from_slice(&payload[..config::BUS_NODES]);

        Ok(Self {
            values,
            flags: payload[10],
            seconds: payload[11],
            minutes: payload[12],
            hours: payload[13],
        })
    }

    pub fn value_for(&self, node: NodeIndex) -> u8 {
        self.values[node.index()]
    }

    /// Arrow state for nodes that carry one.
    pub fn arrow_for(&self, node: NodeIndex) -> Option<bool> {
        node.serve_flag().map(|flag| self.flags & flag != 0)
    }
}

/// SetServo payload: channel mask and raw pulse width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServoCommand {
    pub mask: Segments,
    pub width: PulseWidth,
}

impl ServoCommand {
    pub fn parse(payload: &[u8]) -> Result<Self, FrameError> {
        match *payload {
            [mask, width] => Ok(Self {
                mask: Segments::from_bits_retain(mask),
                width: PulseWidth::from_ticks(width),
            }),
            _ => Err(FrameError::Length {
                expected: SERVO_COMMAND_LEN,
                actual: payload.len(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusReply {
    pub address: u8,
    pub bite: u8,
}

impl StatusReply {
    pub fn encode(&self) -> Result<Vec<u8, STATUS_REPLY_LEN>, FrameError> {
        Vec::from_slice(&[self.address, self.bite]).map_err(|_| FrameError::Encode)
    }
}

/// Product id (LE), publishing date and firmware version.
pub fn encode_version() -> Result<Vec<u8, VERSION_REPLY_LEN>, FrameError> {
    let mut raw = [0u8; VERSION_REPLY_LEN];
    let offset = &mut 0;

    raw.as_mut_slice()
        .write_with::<u32>(offset, config::PRODUCT_ID, LE)
        .map_err(|_| FrameError::Encode)?;
    raw[4..8].copy_from_slice(&config::PUBLISHING_DATE);
    raw[8..].copy_from_slice(&config::FIRMWARE_VERSION);

    Vec::from_slice(&raw).map_err(|_| FrameError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> [u8; SCORE_FRAME_LEN] {
        [3, 0, 6, 4, 0x10, 1, 5, 2, 6, 0x10, 0x02, 30, 45, 1]
    }

    #[test]
    fn score_frame_picks_node_value() {
        let f = ScoreFrame::parse(&frame()).unwrap();
        let units = NodeIndex::resolve(config::PLAY1_UNITS).unwrap();
        let p2_set3 = NodeIndex::resolve(config::PLAY2_SET3).unwrap();
        assert_eq!(f.value_for(units), 0);
        assert_eq!(f.value_for(p2_set3), 0x10);
        assert_eq!((f.hours, f.minutes, f.seconds), (1, 45, 30));
    }

    #[test]
    fn serve_flags_map_to_tens_arrows() {
        let f = ScoreFrame::parse(&frame()).unwrap();
        let p1 = NodeIndex::resolve(config::PLAY1_TENS).unwrap();
        let p2 = NodeIndex::resolve(config::PLAY2_TENS).unwrap();
        let other = NodeIndex::resolve(config::PLAY1_SET1).unwrap();
        assert_eq!(f.arrow_for(p1), Some(false));
        assert_eq!(f.arrow_for(p2), Some(true));
        assert_eq!(f.arrow_for(other), None);
    }

    #[test]
    fn short_score_frame_is_rejected() {
        assert_eq!(
            ScoreFrame::parse(&frame()[..13]),
            Err(FrameError::Length {
                expected: SCORE_FRAME_LEN,
                actual: 13
            })
        );
    }

    #[test]
    fn servo_command_clamps_width() {
        let cmd = ServoCommand::parse(&[0b1000_0001, 0xFF]).unwrap();
        assert_eq!(cmd.mask, Segments::A | Segments::ARROW);
        assert_eq!(cmd.width.ticks(), config::PPM_PERIOD);

        assert!(ServoCommand::parse(&[1]).is_err());
        assert!(ServoCommand::parse(&[1, 2, 3]).is_err());
    }

    #[test]
    fn status_reply_layout() {
        let reply = StatusReply {
            address: 0x1E,
            bite: BITE_OK,
        };
        let raw = reply.encode().unwrap();
        assert_eq!(raw.as_slice(), &[0x1E, 0x00]);
    }

    #[test]
    fn version_reply_layout() {
        let v = encode_version().unwrap();
        assert_eq!(
            v.as_slice(),
            &[1, 0, 0, 0, 11, 5, 20, 23, 1, 0, 0, 2]
        );
    }
}
