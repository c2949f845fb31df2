//! phy - marshal LoRaWAN data frames into PHYPayloads and peek at their headers

pub mod band;
mod frame;
mod header;

pub use frame::{DataFrame, FCtrl, UplinkIntegrity};
pub use header::FrameHeader;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Largest FRMPayload that fits a 250 byte MACPayload with no FOpts.
pub const MAX_FRM_PAYLOAD_LEN: usize = 242;
pub const MAX_FOPTS_LEN: usize = 15;
pub const MIC_LEN: usize = 4;

/// MHDR(1) + DevAddr(4) + FCtrl(1) + FCnt(2)
pub const DATA_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MType {
    JoinRequest = 0,
    JoinAccept = 1,
    UnconfirmedDataUp = 2,
    UnconfirmedDataDown = 3,
    ConfirmedDataUp = 4,
    ConfirmedDataDown = 5,
    RejoinRequest = 6,
    Proprietary = 7,
}

impl MType {
    pub fn is_data_up(&self) -> bool {
        matches!(self, MType::UnconfirmedDataUp | MType::ConfirmedDataUp)
    }
    pub fn is_data_down(&self) -> bool {
        matches!(self, MType::UnconfirmedDataDown | MType::ConfirmedDataDown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Major {
    LoRaWANR1 = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MacVersion {
    LoRaWAN1_0 = 0,
    LoRaWAN1_1 = 1,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarshalError {
    #[error("{0:?} is not a data frame")]
    NotDataFrame(MType),
    #[error("{0:?} is not an uplink data frame")]
    NotUplink(MType),
    #[error("FRMPayload of {0} bytes exceeds {MAX_FRM_PAYLOAD_LEN}")]
    PayloadTooLong(usize),
    #[error("FOpts of {0} bytes exceeds {MAX_FOPTS_LEN}")]
    FOptsTooLong(usize),
    #[error("{f_opts} bytes of FOpts and {frm_payload} bytes of FRMPayload exceed {MAX_FRM_PAYLOAD_LEN}")]
    MacPayloadTooLong { f_opts: usize, frm_payload: usize },
    #[error("FRMPayload present without FPort")]
    MissingFPort,
    #[error("FOpts must be empty when FPort is 0")]
    FOptsWithPortZero,
    #[error("frame too short ({0} bytes)")]
    TooShort(usize),
}
