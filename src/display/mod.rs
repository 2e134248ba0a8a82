mod channel;
mod pulse;
mod sequencer;

pub mod segments;

pub use channel::{Channel, ChannelId, PulseWidth, Segments};
pub use pulse::PulseGenerator;
pub use sequencer::{FlipDisplay, SequencerConfig, State, Timing};

#[cfg(test)]
pub(crate) mod mock;
