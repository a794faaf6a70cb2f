mod args;
mod event;
mod format;

pub use args::DeviceArgs;
pub use event::RelayEvent;
pub use format::{SampleFormat, StreamDirection, UnknownFormat};
