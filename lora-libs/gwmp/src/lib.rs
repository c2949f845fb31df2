//! gwmp - the Semtech gateway message protocol spoken between a packet forwarder and a network server
//!
//! Upstream datagrams (PUSH_DATA, PULL_DATA) start with
//! | version | token (2) | type | gateway EUI (8) |
//! and PUSH_DATA follows that with a JSON object.  Downstream datagrams (PUSH_ACK, PULL_ACK, PULL_RESP)
//! have only the 4 byte header, followed by JSON in the case of PULL_RESP.

mod codec;
mod records;

pub use codec::{
    DatagramView, decode, encode_downlink_ack, encode_keepalive, encode_push, encode_stat,
    parse_txpk,
};
pub use records::{Rxpk, Stat, Txpk};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

pub const PROTOCOL_VERSION: u8 = 2;
pub const HEADER_LEN: usize = 4;
pub const UPSTREAM_HEADER_LEN: usize = HEADER_LEN + 8;

pub type GatewayId = [u8; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum PacketType {
    PushData = 0,
    PushAck = 1,
    PullData = 2,
    PullResp = 3,
    PullAck = 4,
    TxAck = 5,
}

#[derive(Debug, Error)]
pub enum GwmpError {
    #[error("datagram too short ({0} bytes)")]
    TooShort(usize),
    #[error("unknown packet type {0:#04x}")]
    UnknownPacketType(u8),
    #[error("bad JSON body - {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad base64 data - {0}")]
    Base64(#[from] base64::DecodeError),
}
