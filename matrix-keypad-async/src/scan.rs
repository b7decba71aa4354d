//! Column-by-column matrix scan and the plausibility check on its result.

use log::warn;

use crate::expander::PortExpander;
use crate::layout::Layout;

/// Drives the columns and samples the rows.
///
/// Keeps a shadow of the port value last written so every column select is a single
/// port write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanner {
    port: u8,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub const fn new() -> Self {
        Self { port: 0xFF }
    }

    /// Seeds the shadow from a port read.
    pub fn prime(&mut self, port: u8) {
        self.port = port;
    }

    pub fn port(&self) -> u8 {
        self.port
    }

    /// Port value with only column `col` driven low.
    pub fn column_select(&self, layout: &Layout, col: usize) -> u8 {
        let selected = 1u8 << layout.col_pins()[col];
        (self.port | layout.col_port_mask()) & !selected
    }

    /// Scans every column once and returns the raw key mask.
    ///
    /// A failed port write skips the column and a failed port read counts its rows as
    /// released, so a flaky bus never looks like a held key. Bus errors are only logged
    /// when `debug` is set.
    pub async fn scan<X: PortExpander>(
        &mut self,
        expander: &mut X,
        layout: &Layout,
        debug: bool,
    ) -> u16 {
        let cols = layout.cols();
        let mut mask = 0u16;

        for col in 0..cols {
            self.port = self.column_select(layout, col);
            if let Err(err) = expander.write_port(self.port).await {
                if debug {
                    warn!("Error selecting keypad column {col}: {err:?}");
                }
                continue;
            }

            let port = match expander.read_port().await {
                Ok(port) => port,
                Err(err) => {
                    if debug {
                        warn!("Error reading keypad rows for column {col}: {err:?}");
                    }
                    continue;
                }
            };

            for (row, &pin) in layout.row_pins().iter().enumerate() {
                // Rows are pulled up, a pressed key shorts its row to the low column.
                if port & (1 << pin) == 0 {
                    mask |= 1 << (col + row * cols);
                }
            }
        }

        mask
    }
}

/// Whether `mask` could come from a correctly wired matrix.
///
/// A run of consecutive set bits longer than one row of columns means rows are
/// shorted together or the expander is stuck.
pub fn is_plausible(mask: u16, layout: &Layout) -> bool {
    let cols = layout.cols();
    let mut run = 0;
    for bit in 0..layout.key_count() {
        if mask & (1 << bit) != 0 {
            run += 1;
            if run > cols {
                return false;
            }
        } else {
            run = 0;
        }
    }
    true
}
