use embedded_hal::digital::v2::InputPin;

use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressError {
    /// Address pins read a value missing from the node table
    Unknown(u8),
}

/// Read the address straps, pin `n` is bit `n`.
pub fn sample_address<I: InputPin>(pins: &[I]) -> Result<u8, I::Error> {
    let mut address = 0u8;
    for (bit, pin) in pins.iter().take(u8::BITS as usize).enumerate() {
        if pin.is_high()? {
            address |= 1 << bit;
        }
    }
    Ok(address)
}

/// Position of this node on the scoreboard bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn resolve(address: u8) -> Result<Self, AddressError> {
        config::NODE_ADDRESSES
            .iter()
            .position(|&a| a == address)
            .map(NodeIndex)
            .ok_or(AddressError::Unknown(address))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn address(self) -> u8 {
        config::NODE_ADDRESSES[self.0]
    }

    /// Startup stagger for this node, ms.
    pub fn delay(self) -> u16 {
        config::NODE_DELAYS[self.0]
    }

    /// Only the tens digits carry the serving arrow.
    pub fn has_arrow(self) -> bool {
        self.serve_flag().is_some()
    }

    /// Bit in the score frame flags byte that drives this node's arrow.
    pub fn serve_flag(self) -> Option<u8> {
        match self.address() {
            config::PLAY1_TENS => Some(0x01),
            config::PLAY2_TENS => Some(0x02),
            _ => None,
        }
    }
}
