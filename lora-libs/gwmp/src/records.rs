use crate::GwmpError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// An uplink radio packet, as reported by the forwarder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rxpk {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time: Option<String>,
    pub tmst: u32,
    pub chan: u8,
    pub rfch: u8,
    /// MHz
    pub freq: f64,
    /// CRC status: 1 = OK, -1 = fail, 0 = no CRC
    pub stat: i8,
    pub modu: String,
    pub datr: String,
    pub codr: String,
    pub rssi: i16,
    pub lsnr: f32,
    pub size: u16,
    /// base64 PHYPayload
    pub data: String,
}

impl Rxpk {
    pub fn set_phy_payload(&mut self, phy: &[u8]) {
        self.size = phy.len() as u16;
        self.data = STANDARD.encode(phy);
    }

    pub fn phy_payload(&self) -> Result<Vec<u8>, GwmpError> {
        Ok(STANDARD.decode(&self.data)?)
    }
}

/// Forwarder status report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    /// "YYYY-MM-DD hh:mm:ss GMT"
    pub time: String,
    pub lati: f64,
    pub long: f64,
    pub alti: i32,
    pub rxnb: u32,
    pub rxok: u32,
    pub rxfw: u32,
    pub ackr: f32,
    pub dwnb: u32,
    pub txnb: u32,
}

/// A downlink the network server asks the forwarder to transmit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Txpk {
    #[serde(default)]
    pub imme: bool,
    #[serde(default)]
    pub tmst: Option<u32>,
    pub freq: f64,
    #[serde(default)]
    pub rfch: u8,
    #[serde(default)]
    pub powe: i8,
    pub modu: String,
    pub datr: serde_json::Value,
    #[serde(default)]
    pub codr: Option<String>,
    #[serde(default)]
    pub ipol: Option<bool>,
    pub size: u16,
    pub data: String,
}

impl Txpk {
    pub fn phy_payload(&self) -> Result<Vec<u8>, GwmpError> {
        Ok(STANDARD.decode(&self.data)?)
    }
}
