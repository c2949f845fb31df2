use thiserror::Error;

pub type AesKey = [u8; 16];
pub type Eui64 = [u8; 8];

/// Device address in the order it is written, most significant byte first.
pub type DevAddr = [u8; 4];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KeyDecodeError {
    #[error("{what} is not valid hex: {source}")]
    InvalidHex {
        what: &'static str,
        source: hex::FromHexError,
    },
    #[error("{what} must be {expected} bytes, got {actual}")]
    WrongLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub fn decode_key(what: &'static str, s: &str) -> Result<AesKey, KeyDecodeError> {
    decode_fixed(what, s)
}

pub fn decode_eui(what: &'static str, s: &str) -> Result<Eui64, KeyDecodeError> {
    decode_fixed(what, s)
}

pub fn decode_dev_addr(s: &str) -> Result<DevAddr, KeyDecodeError> {
    decode_fixed("device address", s)
}

fn decode_fixed<const N: usize>(what: &'static str, s: &str) -> Result<[u8; N], KeyDecodeError> {
    let bytes = hex::decode(s.trim()).map_err(|source| KeyDecodeError::InvalidHex { what, source })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| KeyDecodeError::WrongLength {
        what,
        expected: N,
        actual,
    })
}
