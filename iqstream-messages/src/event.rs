/// Progress reported by the transmitting side of a relay to its receiving loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A chunk of payload samples was written to the channel.
    Transmitted { samples: usize },
    /// The source underflowed and the last burst has been closed.
    Finished,
    /// The transmitter stopped on an error.
    Failed(String),
}
