//! Error types for the device subsystem

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// hidapi could not be initialized
    #[error("Failed to initialize HID API: {0}")]
    Api(String),

    /// No attached device matches the vendor/product pair
    #[error("No device found with vendor id {vendor_id:#06x} and product id {product_id:#06x}")]
    NotFound { vendor_id: u16, product_id: u16 },

    /// A matching device exists but could not be opened
    #[error("Failed to open device {path}: {reason}")]
    Open { path: String, reason: String },

    /// A read on an open device failed
    #[error("Failed to read report: {0}")]
    Read(String),

    /// The polling thread could not be started
    #[error("Failed to spawn polling thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The polling thread panicked before handing the device back
    #[error("Polling thread panicked")]
    ThreadPanicked,
}
