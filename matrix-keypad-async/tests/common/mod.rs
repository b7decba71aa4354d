#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use embassy_futures::block_on;
use matrix_keypad_async::conf::Config;
use matrix_keypad_async::{Clock, Keypad, Layout, PinMode, PollOutcome, PortExpander};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

pub const ROW_PINS: [u8; 4] = [0, 1, 2, 3];
pub const COL_PINS: [u8; 4] = [4, 5, 6, 7];
pub const POLL_PERIOD_MS: u32 = 10;

/// Clock the test advances by hand.
#[derive(Clone, Default)]
pub struct TestClock(Rc<Cell<u32>>);

impl TestClock {
    pub fn starting_at(millis: u32) -> Self {
        Self(Rc::new(Cell::new(millis)))
    }

    pub fn advance(&self, millis: u32) {
        self.0.set(self.0.get().wrapping_add(millis));
    }
}

impl Clock for TestClock {
    fn now_millis(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

/// Electrical state of the simulated keypad and expander.
#[derive(Default)]
pub struct MatrixState {
    /// Pressed keys as `(row, col)`.
    pub pressed: Vec<(usize, usize)>,
    /// Every read returns this value instead of the simulated levels.
    pub stuck_port: Option<u8>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_config: bool,
    pub connected: bool,
    /// Latch of the output pins, 1 = driven high.
    pub latch: u8,
    /// Bit set = input.
    pub direction: u8,
    pub pull_ups: u8,
    pub port_writes: usize,
    pub port_reads: usize,
    pub pin_mode_calls: usize,
    pub probes: usize,
}

/// Handle to the shared simulation, kept by the test while the keypad owns the expander.
#[derive(Clone)]
pub struct Matrix {
    pub state: Rc<RefCell<MatrixState>>,
    row_pins: Vec<u8>,
    col_pins: Vec<u8>,
}

impl Matrix {
    pub fn new(row_pins: &[u8], col_pins: &[u8]) -> Self {
        let state = MatrixState {
            connected: true,
            latch: 0xFF,
            direction: 0xFF,
            ..Default::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            row_pins: row_pins.to_vec(),
            col_pins: col_pins.to_vec(),
        }
    }

    pub fn press(&self, row: usize, col: usize) {
        self.state.borrow_mut().pressed.push((row, col));
    }

    pub fn release(&self, row: usize, col: usize) {
        self.state.borrow_mut().pressed.retain(|&key| key != (row, col));
    }

    pub fn release_all(&self) {
        self.state.borrow_mut().pressed.clear();
    }

    pub fn set_stuck(&self, port: Option<u8>) {
        self.state.borrow_mut().stuck_port = port;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn set_fail_config(&self, fail: bool) {
        self.state.borrow_mut().fail_config = fail;
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.borrow_mut().connected = connected;
    }

    /// Pin levels as the expander would read them.
    fn levels(&self) -> u8 {
        let state = self.state.borrow();
        let mut port = state.latch | state.direction;
        for &(row, col) in &state.pressed {
            let col_pin = self.col_pins[col];
            let col_driven_low = state.direction & (1 << col_pin) == 0 && state.latch & (1 << col_pin) == 0;
            let row_pin = self.row_pins[row];
            if col_driven_low && state.pull_ups & (1 << row_pin) != 0 {
                port &= !(1 << row_pin);
            }
        }
        port
    }
}

impl PortExpander for Matrix {
    type Error = SimError;

    async fn probe(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        state.probes += 1;
        state.connected
    }

    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        state.pin_mode_calls += 1;
        if state.fail_config {
            return Err(SimError);
        }
        match mode {
            PinMode::Output => state.direction &= !(1 << pin),
            PinMode::Input => {
                state.direction |= 1 << pin;
                state.pull_ups &= !(1 << pin);
            }
            PinMode::InputPullUp => {
                state.direction |= 1 << pin;
                state.pull_ups |= 1 << pin;
            }
        }
        Ok(())
    }

    async fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        if state.fail_config {
            return Err(SimError);
        }
        if high {
            state.latch |= 1 << pin;
        } else {
            state.latch &= !(1 << pin);
        }
        Ok(())
    }

    async fn read_port(&mut self) -> Result<u8, SimError> {
        {
            let mut state = self.state.borrow_mut();
            state.port_reads += 1;
            if state.fail_reads {
                return Err(SimError);
            }
            if let Some(port) = state.stuck_port {
                return Ok(port);
            }
        }
        Ok(self.levels())
    }

    async fn write_port(&mut self, value: u8) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        state.port_writes += 1;
        if state.fail_writes {
            return Err(SimError);
        }
        state.latch = value;
        Ok(())
    }
}

pub type TestKeypad = Keypad<Matrix, TestClock>;

/// A begun 4x4 keypad with the given debounce count and a 10 ms poll period.
pub fn four_by_four(debounce_count: u8) -> (TestKeypad, Matrix, TestClock) {
    keypad_on(&ROW_PINS, &COL_PINS, debounce_count, TestClock::starting_at(0))
}

pub fn keypad_on(
    row_pins: &[u8],
    col_pins: &[u8],
    debounce_count: u8,
    clock: TestClock,
) -> (TestKeypad, Matrix, TestClock) {
    let layout = Layout::new(row_pins, col_pins, 0x20).unwrap();
    let matrix = Matrix::new(row_pins, col_pins);
    let config = Config::default()
        .with_poll_period_ms(POLL_PERIOD_MS)
        .with_debounce_count(debounce_count)
        .with_debug(true);
    let mut keypad = Keypad::new(layout, matrix.clone(), clock.clone(), config);
    block_on(keypad.begin()).unwrap();
    (keypad, matrix, clock)
}

/// Lets one poll period pass and runs an update.
pub fn poll(keypad: &mut TestKeypad, clock: &TestClock) -> PollOutcome {
    clock.advance(POLL_PERIOD_MS);
    block_on(keypad.update())
}

/// Runs `count` polls.
pub fn poll_n(keypad: &mut TestKeypad, clock: &TestClock, count: usize) {
    for _ in 0..count {
        poll(keypad, clock);
    }
}
