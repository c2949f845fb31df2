use phy::MarshalError;
use security::KeyDecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    KeyDecode(#[from] KeyDecodeError),

    #[error("frame marshaling failed - {0}")]
    Marshal(#[from] MarshalError),

    #[error("band {band} has no data rate SF{spreading_factor}BW{bandwidth}")]
    UnknownDataRate {
        band: String,
        spreading_factor: u8,
        bandwidth: u32,
    },

    #[error("unsupported {what} {value}")]
    UnsupportedVersion { what: &'static str, value: u8 },

    #[error("can't dial {address} - {source}")]
    Dial {
        address: String,
        source: std::io::Error,
    },

    #[error("UDP send failed - {0}")]
    Send(#[source] std::io::Error),

    #[error("UDP receive failed - {0}")]
    Receive(#[source] std::io::Error),

    #[error("datagram exceeds the {limit} byte receive limit")]
    TruncatedDatagram { limit: usize },

    #[error("uplink frame counter exhausted")]
    CounterExhausted,

    #[error("bad payload configuration - {0}")]
    Payload(String),

    #[error(transparent)]
    Gwmp(#[from] gwmp::GwmpError),
}
