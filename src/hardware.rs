//! Hardware Abstraction Module
//!
//! This module handles the low-level configuration of the RP2350 peripherals.
//! It encapsulates the setup of Clocks, GPIOs, UART and ADC, exposing a
//! `Hardware` struct with everything the scan loop drives.
//!
//! Pin map:
//! - GPIO0 / GPIO1: UART0 TX / RX to the host (9600 8N1)
//! - GPIO2..=GPIO5: mux address bits 0..=3
//! - GPIO6 / GPIO7: bank B / bank A enable
//! - GPIO15: busy indicator
//! - GPIO26: ADC input (AIN0), fed by both mux outputs

use embedded_hal::delay::DelayNs;
use hal::Clock;
use hal::fugit::RateExtU32;
use hal::gpio::{DynPinId, FunctionSio, FunctionUart, Pin, PullDown, SioOutput, bank0};
use hal::pac;
use hal::uart::{DataBits, Reader, StopBits, UartConfig, UartPeripheral, Writer};
use rp235x_hal as hal;

use mux_scan::channel::MuxLines;
use mux_scan::config::{BAUD_RATE, ns_to_cycles};
use mux_scan::conversion::ConversionTrigger;

/// External crystal frequency used by the Raspberry Pi Pico 2 W.
const XTAL_FREQ_HZ: u32 = 12_000_000u32;

pub type MuxPin = Pin<DynPinId, FunctionSio<SioOutput>, PullDown>;

pub type BusyPin = Pin<bank0::Gpio15, FunctionSio<SioOutput>, PullDown>;

type UartPins = (
    Pin<bank0::Gpio0, FunctionUart, PullDown>,
    Pin<bank0::Gpio1, FunctionUart, PullDown>,
);

pub type SerialTx = Writer<pac::UART0, UartPins>;
pub type SerialRx = Reader<pac::UART0, UartPins>;

/// Everything `main` hands to the scan loop and the interrupt handlers.
pub struct Hardware {
    pub mux: MuxLines<MuxPin>,
    pub busy: BusyPin,
    pub tx: SerialTx,
    pub rx: SerialRx,
    pub adc: AdcTrigger,
    pub delay: CycleDelay,
}

/// Starts single-shot conversions on the configured ADC input. Results
/// arrive through the FIFO interrupt.
pub struct AdcTrigger {
    _private: (),
}

impl ConversionTrigger for AdcTrigger {
    fn start_conversion(&mut self) {
        unsafe {
            let adc_regs = &(*pac::ADC::ptr());
            adc_regs.cs().modify(|_, w| w.start_once().set_bit());
        }
    }
}

/// Busy-wait counted in core clock cycles. Interrupts still run while it spins.
pub struct CycleDelay {
    sys_clk_hz: u32,
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        cortex_m::asm::delay(ns_to_cycles(ns, self.sys_clk_hz));
    }
}

/// Parks the core without output. Used when the board cannot be brought up.
pub fn halt() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

/// Initializes the entire hardware stack.
///
/// This function:
/// 1.  Takes ownership of the raw PAC peripherals.
/// 2.  Configures the Watchdog and Clocks. A clock that fails to come up
///     traps here for good.
/// 3.  Configures the mux and busy GPIOs.
/// 4.  Sets up UART0 for the host link with the receive interrupt armed.
/// 5.  Sets up the ADC for interrupt-driven single-shot mode.
///
/// Interrupts stay masked in the NVIC until [`enable_interrupts`].
pub fn init() -> Hardware {
    // 1. Take ownership of raw peripherals
    let Some(mut pac) = pac::Peripherals::take() else { halt() };
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // 2. Configure Clocks
    let Ok(clocks) = hal::clocks::init_clocks_and_plls(
        XTAL_FREQ_HZ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    ) else {
        halt()
    };

    // 3. Configure GPIOs
    let sio = hal::Sio::new(pac.SIO);
    let pins = hal::gpio::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mux = MuxLines {
        address: [
            pins.gpio2.into_push_pull_output().into_dyn_pin(),
            pins.gpio3.into_push_pull_output().into_dyn_pin(),
            pins.gpio4.into_push_pull_output().into_dyn_pin(),
            pins.gpio5.into_push_pull_output().into_dyn_pin(),
        ],
        bank_b: pins.gpio6.into_push_pull_output().into_dyn_pin(),
        bank_a: pins.gpio7.into_push_pull_output().into_dyn_pin(),
    };
    let busy = pins.gpio15.into_push_pull_output();

    // 4. Configure UART (Interrupt Driven receive)
    let uart_pins = (
        pins.gpio0.into_function::<FunctionUart>(),
        pins.gpio1.into_function::<FunctionUart>(),
    );
    let Ok(uart) = UartPeripheral::new(pac.UART0, uart_pins, &mut pac.RESETS).enable(
        UartConfig::new(BAUD_RATE.Hz(), DataBits::Eight, None, StopBits::One),
        clocks.peripheral_clock.freq(),
    ) else {
        halt()
    };
    let (mut rx, tx) = uart.split();
    rx.enable_rx_interrupt();

    // 5. Configure ADC (Interrupt Driven)
    let _adc = hal::Adc::new(pac.ADC, &mut pac.RESETS);
    let Ok(_adc_pin) = hal::adc::AdcPin::new(pins.gpio26) else { halt() };

    unsafe {
        let adc_regs = &(*pac::ADC::ptr());

        // FIFO Control: Enable, Threshold=1, No DMA
        adc_regs.fcs().modify(|_, w| {
            w.en().set_bit()
             .thresh().bits(1)
             .dreq_en().clear_bit()
        });

        // Enable FIFO Interrupt
        adc_regs.inte().modify(|_, w| w.fifo().set_bit());

        // Channel Control: Ch0 (GPIO26), Enable, Single-Shot
        adc_regs.cs().modify(|_, w| {
            w.ainsel().bits(0)
             .en().set_bit()
             .start_many().clear_bit()
        });
    }

    Hardware {
        mux,
        busy,
        tx,
        rx,
        adc: AdcTrigger { _private: () },
        delay: CycleDelay { sys_clk_hz: clocks.system_clock.freq().to_Hz() },
    }
}

/// Unmasks the ADC and UART interrupts. Call once the shared state they
/// touch has been published.
pub fn enable_interrupts() {
    unsafe {
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::ADC_IRQ_FIFO);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::UART0_IRQ);
    }
}
