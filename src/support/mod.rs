mod heartbeat;
mod timer_interface;

pub use heartbeat::Heartbeat;
pub use timer_interface::{TickSource, Timer};
