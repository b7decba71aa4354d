#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::i2c::master::I2c;
use esp_hal::time::Rate;
use esp_hal::timer::systimer::SystemTimer;
use esp_println::println;
use log::{debug, info, warn};
use matrix_keypad_async::conf::Config;
use matrix_keypad_async::{EmbassyClock, KeyReading, Keypad, Layout, PollOutcome};
use mcp23008_async::{Mcp23008, DEFAULT_ADDRESS};
use static_cell::StaticCell;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

type KeypadI2c = I2c<'static, esp_hal::Async>;
type SharedKeypad = Mutex<CriticalSectionRawMutex, Keypad<Mcp23008<KeypadI2c>, EmbassyClock>>;

static KEYPAD: StaticCell<SharedKeypad> = StaticCell::new();

const ROW_PINS: [u8; 4] = [0, 1, 2, 3];
const COL_PINS: [u8; 4] = [4, 5, 6, 7];

/// Labels of a common 4x4 membrane keypad, indexed by `key index - 1`.
const KEY_LABELS: [char; 16] = [
    '1', '2', '3', 'A', '4', '5', '6', 'B', '7', '8', '9', 'C', '*', '0', '#', 'D',
];

/// The main entry point of the application.
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    // Init logging
    esp_println::logger::init_logger(log::LevelFilter::Debug);
    info!("Logger initialized");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("Peripherals initialized");

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let keypad_scl = peripherals.GPIO14;
    let keypad_sda = peripherals.GPIO13;

    let config = esp_hal::i2c::master::Config::default().with_frequency(Rate::from_khz(400));

    let mut keypad_i2c = I2c::new(peripherals.I2C0, config)
        .unwrap()
        .with_sda(keypad_sda)
        .with_scl(keypad_scl)
        .into_async();

    let address = match find_expander(&mut keypad_i2c).await {
        Some(address) => address,
        None => {
            warn!("No MCP23008 found, falling back to {DEFAULT_ADDRESS:#04x}");
            DEFAULT_ADDRESS
        }
    };

    let keypad_config = Config::default().with_debounce_count(2).with_debug(true);
    let mut keypad = match Keypad::from_pins(&ROW_PINS, &COL_PINS, address, keypad_i2c, keypad_config)
    {
        Ok(keypad) => keypad,
        Err(err) => panic!("Invalid keypad layout: {err:?}"),
    };
    match keypad.begin().await {
        Ok(_) => debug!("Keypad initialized."),
        Err(err) => warn!("Error initializing keypad: {err:?}"),
    };

    let keypad = KEYPAD.init(Mutex::new(keypad));
    spawner.spawn(poll_keypad(keypad)).unwrap();
    spawner.spawn(report_keys(keypad)).unwrap();

    info!("Keypad running. Entering idle loop.");
    loop {
        Timer::after(Duration::from_secs(10)).await;
        let mut keypad = keypad.lock().await;
        if !keypad.is_connected().await {
            warn!("Keypad expander stopped answering");
        }
    }
}

/// Probes the MCP23008 address range and returns the first address that answers.
async fn find_expander(i2c: &mut KeypadI2c) -> Option<u8> {
    for address in DEFAULT_ADDRESS..DEFAULT_ADDRESS + 8 {
        let mut expander = Mcp23008::new(&mut *i2c, address);
        if expander.probe().await {
            info!("MCP23008 found at {address:#04x}");
            return Some(address);
        }
    }
    None
}

/// A task that drives the keypad state machine.
#[embassy_executor::task]
async fn poll_keypad(keypad: &'static SharedKeypad) {
    loop {
        let outcome = keypad.lock().await.update().await;
        if let PollOutcome::Fault { raw } = outcome {
            warn!("Keypad fault, raw scan {raw:#06x}");
        }
        Timer::after(Duration::from_millis(5)).await;
    }
}

/// A task that logs every change of the debounced reading.
#[embassy_executor::task]
async fn report_keys(keypad: &'static SharedKeypad) {
    loop {
        {
            let mut keypad = keypad.lock().await;
            if keypad.is_updated() {
                match keypad.read_key() {
                    KeyReading::Key(index) => {
                        let label = KEY_LABELS
                            .get(usize::from(index) - 1)
                            .copied()
                            .unwrap_or('?');
                        let (row, col) = keypad.layout().position(index).unwrap_or_default();
                        info!("Key {index} '{label}' pressed at row {row}, column {col}");
                    }
                    KeyReading::None => info!("Key released"),
                    KeyReading::Fault => warn!("Keypad reports a wiring fault"),
                }
            }
        }
        Timer::after(Duration::from_millis(20)).await;
    }
}
