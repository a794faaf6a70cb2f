use iqstream_messages::DeviceArgs;

use crate::error::{Result, StreamError};
use crate::file::FileDevice;
use crate::virtual_device::VirtualDevice;
use crate::Device;

const FILE_DRIVER: &str = "file";
const VIRTUAL_DRIVER: &str = "virtual";

/// Builds a device from `args`.
///
/// The `driver` key picks the backend. Without it, a `path` implies the file
/// backend.
pub fn make_device(args: &DeviceArgs) -> Result<Box<dyn Device>> {
    let driver = match (args.get("driver"), args.get("path")) {
        (Some(driver), _) => driver,
        (None, Some(_)) => FILE_DRIVER,
        (None, None) => {
            return Err(StreamError::Configuration(
                "expected a 'driver' or 'path' argument".to_string(),
            ));
        }
    };

    match driver {
        FILE_DRIVER => Ok(Box::new(FileDevice::from_args(args)?)),
        VIRTUAL_DRIVER => Ok(Box::new(VirtualDevice::new())),
        other => Err(StreamError::Configuration(format!(
            "unknown driver '{other}'"
        ))),
    }
}

/// Lists the devices `args` could construct, optionally filtered by `driver`.
pub fn enumerate(args: &DeviceArgs) -> Vec<DeviceArgs> {
    let wanted = args.get("driver");
    let mut found = Vec::new();

    if wanted.is_none_or(|driver| driver == FILE_DRIVER) {
        let mut entry = DeviceArgs::new()
            .with("device", "File Device")
            .with("driver", FILE_DRIVER)
            .with("label", "File Device");
        if let Some(path) = args.get("path") {
            entry.insert("path", path);
        }
        found.push(entry);
    }

    if wanted.is_none_or(|driver| driver == VIRTUAL_DRIVER) {
        found.push(
            DeviceArgs::new()
                .with("device", "Virtual Device")
                .with("driver", VIRTUAL_DRIVER)
                .with("label", "Virtual Device"),
        );
    }

    found
}
