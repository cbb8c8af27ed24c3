//! Device subsystem for the XK-12 joystick
//!
//! Turns the raw HID stream into input the simulation can use:
//!
//! 1. [`hid`] - Device discovery and the hidapi backed [`ReportSource`]
//! 2. [`stream`] - Background polling thread and its lifecycle
//! 3. [`report`] - Fixed-size raw reports
//! 4. [`decoder`] - Button edges and normalized axes
//!
//! # Architecture
//!
//! ```text
//! XK-12 ──► ReportCollector ──► mpsc (unbounded) ──► ReportDecoder ──► DecodedReport
//!           (own thread)         (RawReport)          (sim task)
//! ```
//!
//! The collector thread is the only owner of the device handle. Decoding
//! happens on the consumer side so the button latch lives next to the game
//! state it feeds.

pub mod decoder;
pub mod error;
pub mod hid;
pub mod report;
pub mod stream;

pub use decoder::{
    decode, AxisPolicies, AxisPolicy, AxisTriple, ButtonEdges, ButtonId, ButtonLatch, ButtonState,
    DecodedReport, ReportDecoder, BUTTON_COUNT,
};
pub use error::DeviceError;
pub use hid::{open_device, OpenedDevice};
pub use report::{RawReport, REPORT_LEN, XK12_JOYSTICK_PRODUCT_ID, XKEYS_VENDOR_ID};
pub use stream::{DeviceStream, ReportSource, StopReason, StoppedCollector, StreamSettings};
