//! Raw XK-12 input reports
//!
//! The joystick sends fixed 33-byte reports. Only bytes 2..=8 carry data the
//! game reads:
//!
//! ```text
//! byte  0   1   2    3    4    5    6    7    8    9 .. 32
//!       -   -   c0   c1   c2   c3   x    y    z    (ignored)
//! ```
//!
//! `c0..c3` are button columns (3 bits each), `x`/`y`/`z` the raw axis bytes.

use chrono::{DateTime, Local};

/// X-keys vendor id
pub const XKEYS_VENDOR_ID: u16 = 0x05f3;

/// XK-12 joystick product id
pub const XK12_JOYSTICK_PRODUCT_ID: u16 = 0x0429;

/// Size of one report as delivered by the device
pub const REPORT_LEN: usize = 33;

/// Smallest report the decoder can work with (last axis byte is index 8)
pub const MIN_REPORT_LEN: usize = 9;

/// Offset of the first button column byte
pub const BUTTON_COLUMN_OFFSET: usize = 2;

/// Number of button column bytes
pub const BUTTON_COLUMNS: usize = 4;

/// Offsets of the x, y and twist axis bytes
pub const AXIS_OFFSETS: [usize; 3] = [6, 7, 8];

/// One report read from the device
///
/// Shorter reads are zero padded up to [`REPORT_LEN`]; `len` keeps the number
/// of bytes the device actually delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReport {
    bytes: [u8; REPORT_LEN],
    len: usize,
    received_at: DateTime<Local>,
}

impl RawReport {
    /// Builds a report from the bytes of one read.
    ///
    /// Returns `None` when fewer than [`MIN_REPORT_LEN`] bytes were read.
    /// Bytes past [`REPORT_LEN`] are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < MIN_REPORT_LEN {
            return None;
        }

        let len = data.len().min(REPORT_LEN);
        let mut bytes = [0u8; REPORT_LEN];
        bytes[..len].copy_from_slice(&data[..len]);

        Some(Self {
            bytes,
            len,
            received_at: Local::now(),
        })
    }

    /// Convenience constructor for a report carrying only buttons and axes.
    pub fn from_parts(columns: [u8; BUTTON_COLUMNS], axes: [u8; 3]) -> Self {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[BUTTON_COLUMN_OFFSET..BUTTON_COLUMN_OFFSET + BUTTON_COLUMNS]
            .copy_from_slice(&columns);
        for (offset, value) in AXIS_OFFSETS.iter().zip(axes) {
            bytes[*offset] = value;
        }

        Self {
            bytes,
            len: REPORT_LEN,
            received_at: Local::now(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }

    /// Button column byte `column` (0..4)
    pub fn button_column(&self, column: usize) -> u8 {
        self.bytes[BUTTON_COLUMN_OFFSET + column]
    }

    /// Raw x, y and twist bytes
    pub fn raw_axes(&self) -> [u8; 3] {
        AXIS_OFFSETS.map(|offset| self.bytes[offset])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reads_are_rejected() {
        assert!(RawReport::from_bytes(&[0u8; 8]).is_none());
        assert!(RawReport::from_bytes(&[]).is_none());
    }

    #[test]
    fn minimal_read_is_padded() {
        let data = [0, 0, 1, 2, 3, 4, 10, 20, 30];
        let report = RawReport::from_bytes(&data).unwrap();

        assert_eq!(report.len(), MIN_REPORT_LEN);
        assert_eq!(report.bytes(), &data);
        assert_eq!(report.button_column(0), 1);
        assert_eq!(report.button_column(3), 4);
        assert_eq!(report.raw_axes(), [10, 20, 30]);
    }

    #[test]
    fn oversized_read_is_truncated() {
        let data = vec![7u8; 64];
        let report = RawReport::from_bytes(&data).unwrap();
        assert_eq!(report.len(), REPORT_LEN);
    }

    #[test]
    fn from_parts_places_columns_and_axes() {
        let report = RawReport::from_parts([0b001, 0b010, 0, 0b100], [0, 128, 255]);

        assert_eq!(report.len(), REPORT_LEN);
        assert_eq!(report.bytes()[2..6], [0b001, 0b010, 0, 0b100]);
        assert_eq!(report.raw_axes(), [0, 128, 255]);
    }
}
