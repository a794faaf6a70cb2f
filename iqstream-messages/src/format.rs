use std::fmt;
use std::str::FromStr;

/// Sample encoding a stream is bound to at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Complex signed 8-bit integers, one byte per component.
    Cs8,
    /// Complex 32-bit floats, full scale at 1.0.
    Cf32,
}

impl SampleFormat {
    /// Canonical format name, as accepted by `setup_stream`.
    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::Cs8 => "CS8",
            SampleFormat::Cf32 => "CF32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Format name that matched neither `CS8` nor `CF32`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sample format '{}'", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for SampleFormat {
    type Err = UnknownFormat;

    // Names are matched exactly, the way driver format strings are compared.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CS8" => Ok(SampleFormat::Cs8),
            "CF32" => Ok(SampleFormat::Cf32),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Direction of a stream, fixed at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamDirection {
    Receive,
    Transmit,
}

impl fmt::Display for StreamDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamDirection::Receive => f.write_str("RX"),
            StreamDirection::Transmit => f.write_str("TX"),
        }
    }
}
