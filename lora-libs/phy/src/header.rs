use crate::{DATA_HEADER_LEN, FCtrl, MIC_LEN, MType, MarshalError};
use security::DevAddr;

/// The unencrypted header fields of a data frame.  Nothing behind the FHDR is
/// interpreted: FOpts and FRMPayload are left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub m_type: MType,
    pub dev_addr: DevAddr,
    pub f_ctrl: FCtrl,
    pub fcnt: u16,
    pub f_port: Option<u8>,
}

impl FrameHeader {
    pub fn parse(phy: &[u8]) -> Result<Self, MarshalError> {
        if phy.len() < DATA_HEADER_LEN + MIC_LEN {
            return Err(MarshalError::TooShort(phy.len()));
        }
        let m_type = MType::try_from(phy[0] >> 5).expect("3 bit value");
        if !m_type.is_data_up() && !m_type.is_data_down() {
            return Err(MarshalError::NotDataFrame(m_type));
        }
        let dev_addr = [phy[4], phy[3], phy[2], phy[1]];
        let f_ctrl = FCtrl::from_byte(phy[5]);
        let fcnt = u16::from_le_bytes([phy[6], phy[7]]);
        let f_opts_len = (phy[5] & 0x0f) as usize;
        let port_offset = DATA_HEADER_LEN + f_opts_len;
        let f_port = if phy.len() > port_offset + MIC_LEN {
            Some(phy[port_offset])
        } else {
            None
        };
        Ok(FrameHeader {
            m_type,
            dev_addr,
            f_ctrl,
            fcnt,
            f_port,
        })
    }
}
