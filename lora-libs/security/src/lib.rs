//! security - LoRaWAN key handling, message integrity codes and payload encryption

mod crypt;
mod keys;
pub mod mic;

pub use crypt::encrypt_frm_payload;
pub use keys::{AesKey, DevAddr, Eui64, KeyDecodeError, decode_dev_addr, decode_eui, decode_key};

/// Direction bit used in the B0/B1/A_i blocks.  LoRaWAN 1.0.4, 4.3.3 and 4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink = 0,
    Downlink = 1,
}
