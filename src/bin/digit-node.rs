#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_abort as _;
use rtic::app;

use stm32f1xx_hal::afio::AfioExt;
use stm32f1xx_hal::flash::FlashExt;
use stm32f1xx_hal::gpio::{ErasedPin, GpioExt, Output, PinState, PushPull, PA1};

use stm32f1xx_hal::pac::TIM2;
use stm32f1xx_hal::timer::CounterUs;

use systick_monotonic::Systick;

use flip_digit::node::{self, sample_address, Node};
use flip_digit::support::Heartbeat;
use flip_digit::{config, log_info, log_warn, FlipDisplay, Timer};

//-----------------------------------------------------------------------------

type Line = ErasedPin<Output<PushPull>>;
type DigitNode = Node<Line, Timer<CounterUs<TIM2>>, fn(u8)>;

fn on_commit(value: u8) {
    log_info!("digit: showing {}", value);
}

//-----------------------------------------------------------------------------

#[app(device = stm32f1xx_hal::pac, peripherals = true, dispatchers = [RTCALARM])]
mod app {
    use super::*;

    #[shared]
    struct Shared {
        node: DigitNode,
    }

    #[local]
    struct Local {
        led: Heartbeat<PA1<Output<PushPull>>>,
    }

    #[monotonic(binds = SysTick, default = true)]
    type MonoTimer = Systick<{ config::SYSTICK_RATE_HZ }>;

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        use stm32f1xx_hal::prelude::_fugit_RateExtU32;
        use stm32f1xx_hal::prelude::_stm32_hal_rcc_RccExt;
        use stm32f1xx_hal::prelude::_stm32f4xx_hal_timer_TimerExt;
        use systick_monotonic::ExtU64;

        let mut flash = ctx.device.FLASH.constrain();

        let mut gpioa = ctx.device.GPIOA.split();
        let mut gpiob = ctx.device.GPIOB.split();
        let mut gpioc = ctx.device.GPIOC.split();

        let mut afio = ctx.device.AFIO.constrain();

        let rcc = ctx.device.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(config::MCU_XTAL_HZ.Hz())
            .sysclk(32u32.MHz())
            .freeze(&mut flash.acr);

        let mono = Systick::new(ctx.core.SYST, clocks.sysclk().to_Hz());

        //---------------------------------------------------------------------

        // PB3/PB4 carry segments D and E
        let (_pa15, pb3, pb4) = afio.mapr.disable_jtag(gpioa.pa15, gpiob.pb3, gpiob.pb4);

        let led = Heartbeat::new(
            gpioa
                .pa1
                .into_push_pull_output_with_state(&mut gpioa.crl, PinState::Low),
        );

        let straps = [
            gpioa.pa3.into_pull_up_input(&mut gpioa.crl).erase(),
            gpioa.pa4.into_pull_up_input(&mut gpioa.crl).erase(),
            gpioa.pa5.into_pull_up_input(&mut gpioa.crl).erase(),
            gpioa.pa6.into_pull_up_input(&mut gpioa.crl).erase(),
            gpioa.pa7.into_pull_up_input(&mut gpioa.crl).erase(),
        ];
        let address = match sample_address(&straps) {
            Ok(a) => a,
            Err(e) => match e {},
        };
        let has_arrow = node::NodeIndex::resolve(address).map_or(false, |i| i.has_arrow());

        let low = PinState::Low;
        let arrow = if has_arrow {
            Some(
                gpiob
                    .pb7
                    .into_push_pull_output_with_state(&mut gpiob.crl, low)
                    .erase(),
            )
        } else {
            None
        };

        let outputs = [
            Some(gpiob.pb0.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(gpiob.pb1.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(gpiob.pb2.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(pb3.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(pb4.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(gpiob.pb5.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            Some(gpiob.pb6.into_push_pull_output_with_state(&mut gpiob.crl, low).erase()),
            arrow,
        ];

        let power = [
            Some(gpiob.pb12.into_push_pull_output_with_state(&mut gpiob.crh, low).erase()),
            Some(gpioc.pc14.into_push_pull_output_with_state(&mut gpioc.crh, low).erase()),
        ];

        let mut timer = ctx.device.TIM2.counter_us(&clocks);
        timer.listen(stm32f1xx_hal::timer::Event::Update);

        ctx.device
            .DBGMCU
            .cr
            .modify(|_, w| w.dbg_tim2_stop().set_bit());

        let display = FlipDisplay::new(
            outputs,
            power,
            Timer::new(timer),
            on_commit as fn(u8),
            node::sequencer_config(address),
        );

        let mut node = Node::new(display, address);
        node.start();

        if end_calibration::spawn_after((config::CALIBRATION_WINDOW_MS as u64).millis()).is_err() {
            log_warn!("node: calibration timer unavailable");
            node.end_calibration();
        }

        if heartbeat::spawn().is_err() {
            log_warn!("heartbeat: spawn failed");
        }

        //---------------------------------------------------------------------

        (Shared { node }, Local { led }, init::Monotonics(mono))
    }

    //-------------------------------------------------------------------------

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    //-------------------------------------------------------------------------

    #[task(binds = TIM2, shared = [node], priority = 3)]
    fn tim2(mut ctx: tim2::Context) {
        ctx.shared.node.lock(|node| {
            node.on_tick();
            unsafe { (*TIM2::ptr()).sr.modify(|_, w| w.uif().clear_bit()) };
        });
    }

    #[task(local = [led])]
    fn heartbeat(ctx: heartbeat::Context) {
        use systick_monotonic::ExtU64;

        let next = ctx.local.led.toggle();
        if heartbeat::spawn_after((next as u64).millis()).is_err() {
            log_warn!("heartbeat: reschedule failed");
        }
    }

    #[task(shared = [node])]
    fn end_calibration(mut ctx: end_calibration::Context) {
        ctx.shared.node.lock(|node| node.end_calibration());
    }
}
