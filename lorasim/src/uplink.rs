//! uplink - build encrypted, MIC-protected uplink frames ready for the packet forwarder

use crate::{DataRateConfig, Error, RxInfoConfig, Session};
use chrono::{DateTime, SecondsFormat, Utc};
use gwmp::{GatewayId, Rxpk};
use phy::{DataFrame, FCtrl, MType, MacVersion, UplinkIntegrity, band};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRate {
    pub spreading_factor: u8,
    // kHz
    pub bandwidth: u32,
    pub bit_rate: u32,
    pub modulation: String,
}

impl DataRate {
    pub fn from_config(config: &DataRateConfig) -> Self {
        DataRate {
            spreading_factor: config.spread_factor,
            bandwidth: config.bandwidth,
            bit_rate: config.bit_rate,
            modulation: "LORA".to_string(),
        }
    }

    /// Semtech datr string, e.g. SF7BW125.
    pub fn datr(&self) -> String {
        format!("SF{}BW{}", self.spreading_factor, self.bandwidth)
    }

    pub fn index(&self, band_name: &str) -> Result<u8, Error> {
        band::data_rate_index(band_name, self.spreading_factor, self.bandwidth).ok_or_else(|| {
            Error::UnknownDataRate {
                band: band_name.to_string(),
                spreading_factor: self.spreading_factor,
                bandwidth: self.bandwidth,
            }
        })
    }
}

/// Radio metadata for one transmission, as the gateway would have measured it.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioDescriptor {
    pub channel: u8,
    pub code_rate: String,
    pub crc_status: i8,
    pub rf_chain: u8,
    pub snr: f32,
    pub rssi: i16,
    // Hz
    pub frequency: u32,
    pub received_at: DateTime<Utc>,
}

impl RadioDescriptor {
    pub fn new(rx_info: &RxInfoConfig, received_at: DateTime<Utc>) -> Self {
        RadioDescriptor {
            channel: rx_info.channel,
            code_rate: rx_info.code_rate.clone(),
            crc_status: rx_info.crc_status,
            rf_chain: rx_info.rf_chain,
            snr: rx_info.lora_snr,
            rssi: rx_info.rssi,
            frequency: rx_info.frequency,
            received_at,
        }
    }

    /// Concentrator timestamp: a free running microsecond counter that wraps at 32 bits.
    pub fn tmst(&self) -> u32 {
        self.received_at.timestamp_micros() as u32
    }
}

#[derive(Debug, Clone)]
pub struct UplinkFrame {
    pub gateway_id: GatewayId,
    pub phy_payload: Vec<u8>,
    pub rxpk: Rxpk,
}

impl UplinkFrame {
    pub fn encode_push(&self) -> Result<Vec<u8>, Error> {
        Ok(gwmp::encode_push(&self.gateway_id, &self.rxpk)?)
    }
}

/// Build the PHYPayload for the session's current uplink counter and the rxpk that carries it.
///
/// The session is not modified.  The caller advances the uplink counter once the frame
/// has actually been sent.
#[allow(clippy::too_many_arguments)]
pub fn build_uplink(
    session: &Session,
    m_type: MType,
    f_port: u8,
    radio: &RadioDescriptor,
    payload: &[u8],
    gateway_id: &GatewayId,
    band_name: &str,
    data_rate: &DataRate,
) -> Result<UplinkFrame, Error> {
    let tx_dr = data_rate.index(band_name)?;
    let keys = session.keys();

    let integrity = match session.mac_version() {
        MacVersion::LoRaWAN1_0 => UplinkIntegrity::LoRaWAN1_0 {
            nwk_s_key: &keys.nwk_s_enc_key,
        },
        MacVersion::LoRaWAN1_1 => UplinkIntegrity::LoRaWAN1_1 {
            s_nwk_s_int_key: &keys.s_nwk_s_int_key,
            f_nwk_s_int_key: &keys.f_nwk_s_int_key,
            // Acknowledgments are not tracked, so ConfFCnt is always 0.
            conf_fcnt: 0,
            tx_dr,
            tx_ch: radio.channel,
        },
    };

    // FPort 0 carries MAC commands and is encrypted with the network key.
    let payload_key = if f_port == 0 {
        &keys.nwk_s_enc_key
    } else {
        &keys.app_s_key
    };

    let frame = DataFrame {
        m_type,
        major: session.major(),
        dev_addr: *session.dev_addr(),
        f_ctrl: FCtrl::default(),
        fcnt: session.fcnt_up(),
        f_opts: vec![],
        f_port: Some(f_port),
        frm_payload: payload.to_vec(),
    };
    let phy_payload = frame.marshal_uplink(payload_key, integrity)?;

    let mut rxpk = Rxpk {
        time: Some(
            radio
                .received_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
        tmst: radio.tmst(),
        chan: radio.channel,
        rfch: radio.rf_chain,
        freq: radio.frequency as f64 / 1_000_000.0,
        stat: radio.crc_status,
        modu: data_rate.modulation.clone(),
        datr: data_rate.datr(),
        codr: radio.code_rate.clone(),
        rssi: radio.rssi,
        lsnr: radio.snr,
        size: 0,
        data: String::new(),
    };
    rxpk.set_phy_payload(&phy_payload);

    Ok(UplinkFrame {
        gateway_id: *gateway_id,
        phy_payload,
        rxpk,
    })
}
