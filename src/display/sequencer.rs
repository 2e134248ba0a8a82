//! Movement sequencer for a servo-flipped seven-segment digit.
//!
//! A value change is carried out as a fixed series of phases so that no two
//! flip panels collide and the servo supply never sees the whole digit
//! starting at once:
//!
//! ```text
//! ServosWaiting -> ServosOn -> StartClear -> StartHorizontal -> StopHorizontal
//!   -> StartVertical -> StopVertical -> ServosOff -> Idle
//!                                   \-> ArrowOn -> ArrowMove -> ArrowOff -> Idle
//! ```
//!
//! Every state holds for a number of sequencer steps before its action runs;
//! the action sets the hold of the state it hands over to. Commands are only
//! accepted in `Idle`: the bus layer is expected not to overlap them, and
//! anything arriving mid-movement is dropped.

use embedded_hal::digital::v2::OutputPin;

use super::channel::{Channel, ChannelId, PulseWidth, Segments};
use super::pulse::PulseGenerator;
use super::segments;
use crate::config;
use crate::support::TickSource;
use crate::{log_debug, log_trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    ServosWaiting,
    ServosOn,
    StartClear,
    StartHorizontal,
    StopHorizontal,
    StartVertical,
    StopVertical,
    ServosOff,
    ArrowOn,
    ArrowMove,
    ArrowOff,
}

impl State {
    /// Phases during which a frame boundary starts new pulses.
    pub fn starts_pulses(self) -> bool {
        matches!(
            self,
            State::StartClear | State::StartHorizontal | State::StartVertical | State::ArrowMove
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::ServosWaiting => "servos-waiting",
            State::ServosOn => "servos-on",
            State::StartClear => "start-clear",
            State::StartHorizontal => "start-horizontal",
            State::StopHorizontal => "stop-horizontal",
            State::StartVertical => "start-vertical",
            State::StopVertical => "stop-vertical",
            State::ServosOff => "servos-off",
            State::ArrowOn => "arrow-on",
            State::ArrowMove => "arrow-move",
            State::ArrowOff => "arrow-off",
        }
    }
}

/// Phase holds, in sequencer steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub power_on: u16,
    pub power_off: u16,
    pub clearing: u16,
    pub horizontal: u16,
    pub vertical: u16,
    pub arrow: u16,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            power_on: config::FSM_SERVOS_ON,
            power_off: config::FSM_SERVOS_OFF,
            clearing: config::FSM_SERVOS_CLEARING,
            horizontal: config::FSM_SERVOS_MOVING_H,
            vertical: config::FSM_SERVOS_MOVING_V,
            arrow: config::FSM_ARROW_MOVING,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Hold before the first phase of a movement, resolved from the bus address
    pub node_delay: u16,
    /// PPM ticks per sequencer step
    pub step_divider: u16,
    pub timing: Timing,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            node_delay: 0,
            step_divider: config::FSM_STEP_DIVIDER,
            timing: Timing::default(),
        }
    }
}

impl SequencerConfig {
    pub fn with_node_delay(mut self, delay: u16) -> Self {
        self.node_delay = delay;
        self
    }

    pub fn with_step_divider(mut self, divider: u16) -> Self {
        self.step_divider = divider.max(1);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

/// Servo digit driver.
///
/// `P` is the output type shared by the eight servo lines and both power
/// lines, `T` the tick source and `N` the hook called with the committed
/// value once a value movement completes.
pub struct FlipDisplay<P, T, N> {
    pulses: PulseGenerator<P>,
    power: [Option<P>; 2],
    powered: bool,
    tick: T,
    on_commit: N,
    config: SequencerConfig,
    enabled: bool,

    state: State,
    phase: State,
    hold: u16,
    prescaler: u16,
    group: Segments,
    movement: Segments,

    value: u8,
    committed: Option<u8>,
    commit_pending: bool,
    arrow: bool,
    arrow_pending: bool,
    saved_b: PulseWidth,
    saved_f: PulseWidth,
}

impl<P, T, N> FlipDisplay<P, T, N>
where
    P: OutputPin,
    T: TickSource,
    N: FnMut(u8),
{
    pub fn new(
        outputs: [Option<P>; ChannelId::COUNT],
        power: [Option<P>; 2],
        tick: T,
        on_commit: N,
        config: SequencerConfig,
    ) -> Self {
        let mut display = Self {
            pulses: PulseGenerator::new(outputs),
            power,
            powered: true,
            tick,
            on_commit,
            config: config.with_step_divider(config.step_divider),
            enabled: true,

            state: State::Idle,
            phase: State::Idle,
            hold: 0,
            prescaler: 0,
            group: Segments::NONE,
            movement: Segments::NONE,

            value: segments::BLANK,
            committed: None,
            commit_pending: false,
            arrow: false,
            arrow_pending: false,
            saved_b: PulseWidth::SHOWN,
            saved_f: PulseWidth::SHOWN,
        };
        display.power_off();
        display
    }

    //-------------------------------------------------------------------------

    /// Request numeral `n`; anything above 15 blanks the digit.
    pub fn set_value(&mut self, n: u8) {
        if !self.enabled || self.state != State::Idle {
            log_trace!("display: value {} dropped, busy", n);
            return;
        }

        if self.committed == Some(n) {
            log_trace!("display: already at {}", n);
            (self.on_commit)(n);
            return;
        }

        log_debug!("display: moving to {}", n);
        self.value = n;
        self.pulses.apply_pattern(segments::encode(n, self.arrow));
        self.movement = Segments::DIGIT;
        self.commit_pending = true;
        self.begin(State::ServosWaiting, self.config.node_delay);
    }

    /// Show or hide the arrow flag.
    ///
    /// The new target is recorded even mid-movement; the running movement
    /// moves the arrow after its digit phases.
    pub fn set_arrow(&mut self, arrow: bool) {
        if !self.enabled || arrow == self.arrow {
            return;
        }

        self.arrow = arrow;
        self.arrow_pending = true;
        self.pulses.set_target(
            ChannelId::H,
            if arrow {
                PulseWidth::SHOWN
            } else {
                PulseWidth::HIDDEN
            },
        );

        if self.state == State::Idle {
            log_debug!("display: arrow {}", arrow);
            self.begin(State::ArrowOn, self.config.timing.power_on);
        }
    }

    /// Force the channels in `mask` to a raw width, for servo endpoint calibration.
    pub fn debug_servo(&mut self, mask: Segments, width: PulseWidth) {
        if !self.enabled || self.state != State::Idle {
            log_trace!("display: calibration dropped, busy");
            return;
        }

        log_debug!("display: calibrate mask {} width {}", mask.bits(), width.ticks());
        for id in ChannelId::ALL {
            if mask.contains(id.mask()) {
                self.pulses.set_target(id, width);
            }
        }

        self.movement = mask & Segments::DIGIT;
        if !self.movement.is_empty() {
            self.committed = None;
        }
        if mask.contains(Segments::ARROW) {
            self.arrow_pending = true;
        }
        self.commit_pending = false;
        self.begin(State::ServosWaiting, self.config.node_delay);
    }

    /// Periodic tick, one call per PPM tick while the tick source runs.
    pub fn on_tick(&mut self) {
        if !self.enabled || self.state == State::Idle {
            return;
        }

        self.pulses.run(self.group, self.phase.starts_pulses());

        self.prescaler += 1;
        if self.prescaler >= self.config.step_divider {
            self.prescaler = 0;
            self.step();
        }
    }

    //-------------------------------------------------------------------------

    fn begin(&mut self, state: State, hold: u16) {
        self.state = state;
        self.hold = hold;
        self.prescaler = 0;
        self.tick.start();
    }

    fn step(&mut self) {
        if self.hold > 0 {
            self.hold -= 1;
            return;
        }

        let timing = self.config.timing;
        self.phase = self.state;
        log_trace!("display: {}", self.state.name());

        match self.state {
            State::Idle => {}
            State::ServosWaiting => {
                self.hold = timing.power_on;
                self.state = State::ServosOn;
            }
            State::ServosOn => {
                self.power_on();
                self.hold = timing.power_on;
                self.state = State::StartClear;
            }
            State::StartClear => {
                self.saved_b = self.pulses.target(ChannelId::B);
                self.saved_f = self.pulses.target(ChannelId::F);
                for id in [ChannelId::B, ChannelId::F] {
                    if self.movement.contains(id.mask()) {
                        self.pulses.set_target(id, PulseWidth::CLEAR_TRANSIT);
                    }
                }
                self.set_group(Segments::CLEAR & self.movement);
                self.hold = timing.clearing;
                self.state = State::StartHorizontal;
            }
            State::StartHorizontal => {
                self.pulses.set_target(ChannelId::B, self.saved_b);
                self.pulses.set_target(ChannelId::F, self.saved_f);
                self.set_group(Segments::HORIZONTAL & self.movement);
                self.hold = timing.horizontal;
                self.state = State::StopHorizontal;
            }
            State::StopHorizontal => {
                self.hold = timing.power_off;
                self.state = State::StartVertical;
            }
            State::StartVertical => {
                self.set_group(Segments::DIGIT & self.movement);
                self.hold = timing.vertical;
                self.state = State::StopVertical;
            }
            State::StopVertical => {
                if self.commit_pending {
                    self.committed = Some(self.value);
                }
                self.hold = timing.power_off;
                // Without a node delay the arrow follows straight away; staggered
                // nodes power down first and stagger the arrow move again.
                self.state = if self.config.node_delay == 0 && self.arrow_pending {
                    State::ArrowOn
                } else {
                    State::ServosOff
                };
            }
            State::ServosOff => self.finish(self.config.node_delay),
            State::ArrowOn => {
                self.power_on();
                self.hold = timing.power_on;
                self.state = State::ArrowMove;
            }
            State::ArrowMove => {
                self.arrow_pending = false;
                self.set_group(Segments::ARROW);
                self.hold = timing.arrow;
                self.state = State::ArrowOff;
            }
            State::ArrowOff => self.finish(timing.power_on),
        }
    }

    /// Back to Idle; a still pending arrow move starts a new movement after `arrow_hold`.
    fn finish(&mut self, arrow_hold: u16) {
        self.tick.stop();
        self.pulses.release_all();
        self.power_off();
        self.group = Segments::NONE;
        self.state = State::Idle;
        self.phase = State::Idle;

        if self.commit_pending {
            self.commit_pending = false;
            log_debug!("display: committed {}", self.value);
            (self.on_commit)(self.value);
        }

        if self.arrow_pending {
            self.begin(State::ArrowOn, arrow_hold);
        }
    }

    /// Channels leaving the active group are cut so none stays high outside it.
    fn set_group(&mut self, group: Segments) {
        self.pulses.release(self.group.difference(group));
        self.group = group;
    }

    fn power_on(&mut self) {
        if !self.powered {
            for pin in self.power.iter_mut().flatten() {
                let _ = pin.set_high();
            }
            self.powered = true;
        }
    }

    fn power_off(&mut self) {
        if self.powered {
            for pin in self.power.iter_mut().flatten() {
                let _ = pin.set_low();
            }
            self.powered = false;
        }
    }

    //-------------------------------------------------------------------------

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// State currently holding.
    pub fn state(&self) -> State {
        self.state
    }

    /// State whose action ran last; decides whether pulses start.
    pub fn phase(&self) -> State {
        self.phase
    }

    pub fn group(&self) -> Segments {
        self.group
    }

    /// Last requested numeral that was accepted.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Numeral the digit is known to show, `None` before the first movement
    /// and after calibration.
    pub fn committed(&self) -> Option<u8> {
        self.committed
    }

    pub fn arrow(&self) -> bool {
        self.arrow
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn target(&self, id: ChannelId) -> PulseWidth {
        self.pulses.target(id)
    }

    pub fn channel(&self, id: ChannelId) -> &Channel<P> {
        self.pulses.channel(id)
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }
}
