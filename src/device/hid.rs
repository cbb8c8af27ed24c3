//! hidapi backed report source

use hidapi::{HidApi, HidDevice};
use tracing::{debug, error, info};

use super::error::DeviceError;
use super::stream::ReportSource;

/// An opened HID device plus a printable description
pub struct OpenedDevice {
    pub device: HidDevice,
    pub description: String,
}

/// Opens the first attached device matching `vendor_id`/`product_id`.
pub fn open_device(vendor_id: u16, product_id: u16) -> Result<OpenedDevice, DeviceError> {
    info!(
        "Looking for HID device {:04x}:{:04x}",
        vendor_id, product_id
    );

    let api = HidApi::new().map_err(|e| {
        error!("Failed to initialize HID API: {}", e);
        DeviceError::Api(e.to_string())
    })?;

    let info = api
        .device_list()
        .inspect(|info| {
            debug!(
                "Found HID device {:04x}:{:04x} ({})",
                info.vendor_id(),
                info.product_id(),
                info.product_string().unwrap_or("unknown")
            )
        })
        .find(|info| info.vendor_id() == vendor_id && info.product_id() == product_id)
        .ok_or(DeviceError::NotFound {
            vendor_id,
            product_id,
        })?;

    let path = info.path().to_string_lossy().into_owned();
    let description = format!(
        "{} ({:04x}:{:04x})",
        info.product_string().unwrap_or("Unknown"),
        vendor_id,
        product_id
    );

    let device = info.open_device(&api).map_err(|e| {
        error!("Failed to open {}: {}", path, e);
        DeviceError::Open {
            path: path.clone(),
            reason: e.to_string(),
        }
    })?;

    info!("Device opened successfully: {}", description);
    Ok(OpenedDevice {
        device,
        description,
    })
}

impl ReportSource for HidDevice {
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize, DeviceError> {
        self.read_timeout(buf, timeout_ms)
            .map_err(|e| DeviceError::Read(e.to_string()))
    }
}
