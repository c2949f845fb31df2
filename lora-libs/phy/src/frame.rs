use crate::{
    DATA_HEADER_LEN, MAX_FOPTS_LEN, MAX_FRM_PAYLOAD_LEN, MIC_LEN, MType, Major, MarshalError,
};
use security::{AesKey, DevAddr, Direction, mic};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FCtrl {
    pub adr: bool,
    pub adr_ack_req: bool,
    pub ack: bool,
    pub class_b: bool,
}

impl FCtrl {
    // Uplink FCtrl, LoRaWAN 1.0.4, 4.3.1: ADR | ADRACKReq | ACK | ClassB | FOptsLen(4)
    fn to_byte(self, f_opts_len: usize) -> u8 {
        (self.adr as u8) << 7
            | (self.adr_ack_req as u8) << 6
            | (self.ack as u8) << 5
            | (self.class_b as u8) << 4
            | (f_opts_len as u8 & 0x0f)
    }

    pub(crate) fn from_byte(b: u8) -> Self {
        FCtrl {
            adr: b & 0x80 != 0,
            adr_ack_req: b & 0x40 != 0,
            ack: b & 0x20 != 0,
            class_b: b & 0x10 != 0,
        }
    }
}

/// Keys and metadata needed to stamp the MIC of an uplink.  Which variant applies
/// depends on the MAC version the device was provisioned with.
#[derive(Debug, Clone, Copy)]
pub enum UplinkIntegrity<'a> {
    LoRaWAN1_0 {
        nwk_s_key: &'a AesKey,
    },
    LoRaWAN1_1 {
        s_nwk_s_int_key: &'a AesKey,
        f_nwk_s_int_key: &'a AesKey,
        conf_fcnt: u16,
        tx_dr: u8,
        tx_ch: u8,
    },
}

#[derive(Debug, Clone)]
pub struct DataFrame {
    pub m_type: MType,
    pub major: Major,
    pub dev_addr: DevAddr,
    pub f_ctrl: FCtrl,
    /// Full 32-bit counter.  Only the low 16 bits go on the air.
    pub fcnt: u32,
    pub f_opts: Vec<u8>,
    pub f_port: Option<u8>,
    pub frm_payload: Vec<u8>,
}

impl DataFrame {
    /// Encrypt the FRMPayload with `payload_key`, append the MIC and return the PHYPayload.
    ///
    /// `payload_key` must be the AppSKey for FPort > 0 and the network session
    /// encryption key for FPort 0; the caller picks it.
    pub fn marshal_uplink(
        &self,
        payload_key: &AesKey,
        integrity: UplinkIntegrity,
    ) -> Result<Vec<u8>, MarshalError> {
        if !self.m_type.is_data_up() {
            return Err(MarshalError::NotUplink(self.m_type));
        }
        self.validate()?;

        let mut phy = Vec::with_capacity(
            DATA_HEADER_LEN + self.f_opts.len() + 1 + self.frm_payload.len() + MIC_LEN,
        );
        phy.push(u8::from(self.m_type) << 5 | u8::from(self.major));
        phy.extend(self.dev_addr.iter().rev());
        phy.push(self.f_ctrl.to_byte(self.f_opts.len()));
        phy.extend(((self.fcnt & 0xffff) as u16).to_le_bytes());
        phy.extend(&self.f_opts);

        if let Some(f_port) = self.f_port {
            phy.push(f_port);
            let mut encrypted = self.frm_payload.clone();
            security::encrypt_frm_payload(
                payload_key,
                Direction::Uplink,
                &self.dev_addr,
                self.fcnt,
                &mut encrypted,
            );
            phy.extend(encrypted);
        }

        let mic = match integrity {
            UplinkIntegrity::LoRaWAN1_0 { nwk_s_key } => {
                mic::data_mic_1_0(nwk_s_key, Direction::Uplink, &self.dev_addr, self.fcnt, &phy)
            }
            UplinkIntegrity::LoRaWAN1_1 {
                s_nwk_s_int_key,
                f_nwk_s_int_key,
                conf_fcnt,
                tx_dr,
                tx_ch,
            } => mic::uplink_mic_1_1(
                s_nwk_s_int_key,
                f_nwk_s_int_key,
                conf_fcnt,
                tx_dr,
                tx_ch,
                &self.dev_addr,
                self.fcnt,
                &phy,
            ),
        };
        phy.extend(mic);
        Ok(phy)
    }

    fn validate(&self) -> Result<(), MarshalError> {
        if self.f_opts.len() > MAX_FOPTS_LEN {
            return Err(MarshalError::FOptsTooLong(self.f_opts.len()));
        }
        if self.frm_payload.len() > MAX_FRM_PAYLOAD_LEN {
            return Err(MarshalError::PayloadTooLong(self.frm_payload.len()));
        }
        // MACPayload is capped at 250 bytes, so FOpts eat into the FRMPayload allowance.
        if self.f_opts.len() + self.frm_payload.len() > MAX_FRM_PAYLOAD_LEN {
            return Err(MarshalError::MacPayloadTooLong {
                f_opts: self.f_opts.len(),
                frm_payload: self.frm_payload.len(),
            });
        }
        match self.f_port {
            None if !self.frm_payload.is_empty() => Err(MarshalError::MissingFPort),
            Some(0) if !self.f_opts.is_empty() => Err(MarshalError::FOptsWithPortZero),
            _ => Ok(()),
        }
    }
}
