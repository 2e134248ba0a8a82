pub const MCU_XTAL_HZ: u32 = 8_000_000;

//-----------------------------------------------------------------------------

pub const SYSTICK_RATE_HZ: u32 = 1_000;

/// PPM tick interval, µs
pub const PPM_TICK_US: u32 = 100;
/// Frame length in PPM ticks (20 ms)
pub const PPM_PERIOD: u8 = 200;

pub const PPM_SEG_SHOWN: u8 = 14;
pub const PPM_SEG_HIDDEN: u8 = 4;
pub const PPM_SEG_CALIBRATE: u8 = 4;
pub const PPM_SEG_CLEAR: u8 = 11;

//-----------------------------------------------------------------------------

/// PPM ticks per sequencer step, so holds below are in ms
pub const FSM_STEP_DIVIDER: u16 = 10;

pub const FSM_SERVOS_ON: u16 = 20;
pub const FSM_SERVOS_OFF: u16 = 10;
pub const FSM_SERVOS_CLEARING: u16 = 100;
pub const FSM_SERVOS_MOVING_H: u16 = 200;
pub const FSM_SERVOS_MOVING_V: u16 = 400;
pub const FSM_ARROW_MOVING: u16 = 500;

//-----------------------------------------------------------------------------

pub const BUS_NODES: usize = 10;

pub const PLAY1_TENS: u8 = 0x1E;
pub const PLAY1_UNITS: u8 = 0x1D;
pub const PLAY1_SET1: u8 = 0x1C;
pub const PLAY1_SET2: u8 = 0x1B;
pub const PLAY1_SET3: u8 = 0x1A;
pub const PLAY2_TENS: u8 = 0x19;
pub const PLAY2_UNITS: u8 = 0x18;
pub const PLAY2_SET1: u8 = 0x17;
pub const PLAY2_SET2: u8 = 0x16;
pub const PLAY2_SET3: u8 = 0x15;

pub const NODE_ADDRESSES: [u8; BUS_NODES] = [
    PLAY1_TENS,
    PLAY1_UNITS,
    PLAY1_SET1,
    PLAY1_SET2,
    PLAY1_SET3,
    PLAY2_TENS,
    PLAY2_UNITS,
    PLAY2_SET1,
    PLAY2_SET2,
    PLAY2_SET3,
];

/// Startup stagger per node, ms. Nodes sharing a supply must not start together.
pub const NODE_DELAYS: [u16; BUS_NODES] = [0, 500, 1000, 1500, 2000, 0, 500, 1000, 1500, 2000];

//-----------------------------------------------------------------------------

pub const PRODUCT_ID: u32 = 1;
pub const FIRMWARE_VERSION: [u8; 4] = [1, 0, 0, 2];
pub const PUBLISHING_DATE: [u8; 4] = [11, 5, 20, 23];

/// Time after boot during which bus commands are not forwarded to the display
pub const CALIBRATION_WINDOW_MS: u32 = 1_000;

/// Heartbeat LED toggle interval
pub const HEARTBEAT_MS: u32 = 250;
