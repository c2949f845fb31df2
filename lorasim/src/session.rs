//! session - device identity, session keys and frame counters

use crate::{DeviceConfig, Error};
use phy::{MacVersion, Major};
use security::{AesKey, DevAddr, Eui64, decode_dev_addr, decode_eui, decode_key};

// Largest forward jump of the 16 bit downlink counter that is treated as
// a rollover rather than a stale frame.
const MAX_FCNT_GAP: u32 = 16384;

#[derive(Clone, Debug)]
pub struct SessionKeys {
    pub nwk_s_enc_key: AesKey,
    pub s_nwk_s_int_key: AesKey,
    pub f_nwk_s_int_key: AesKey,
    pub app_s_key: AesKey,
    // Root keys.  Not used by an ABP session but kept for versions that derive session keys from them.
    pub app_key: Option<AesKey>,
    pub nwk_key: Option<AesKey>,
}

#[derive(Debug)]
pub struct Session {
    dev_eui: Eui64,
    dev_addr: DevAddr,
    app_eui: Eui64,
    keys: SessionKeys,
    major: Major,
    mac_version: MacVersion,
    fcnt_up: u32,
    fcnt_down: u32,
}

impl Session {
    pub fn new(
        dev_eui: Eui64,
        dev_addr: DevAddr,
        app_eui: Eui64,
        keys: SessionKeys,
        major: Major,
        mac_version: MacVersion,
    ) -> Self {
        Session {
            dev_eui,
            dev_addr,
            app_eui,
            keys,
            major,
            mac_version,
            fcnt_up: 0,
            fcnt_down: 0,
        }
    }

    pub fn from_config(device: &DeviceConfig) -> Result<Self, Error> {
        let major = Major::try_from(device.major).map_err(|_| Error::UnsupportedVersion {
            what: "LoRaWAN major version",
            value: device.major,
        })?;
        let mac_version =
            MacVersion::try_from(device.mac_version).map_err(|_| Error::UnsupportedVersion {
                what: "MAC version",
                value: device.mac_version,
            })?;

        let nwk_s_enc_key = decode_key("nwk_s_enc_key", &device.nwk_s_enc_key)?;
        let integrity_key = |what, hex: &str| match (mac_version, hex.is_empty()) {
            // 1.0 has a single NwkSKey that plays every network key role.
            (MacVersion::LoRaWAN1_0, true) => Ok(nwk_s_enc_key),
            _ => decode_key(what, hex),
        };
        let root_key = |what, hex: &str| {
            if hex.is_empty() {
                Ok(None)
            } else {
                decode_key(what, hex).map(Some)
            }
        };
        let keys = SessionKeys {
            nwk_s_enc_key,
            s_nwk_s_int_key: integrity_key("s_nwk_s_int_key", &device.s_nwk_s_int_key)?,
            f_nwk_s_int_key: integrity_key("f_nwk_s_int_key", &device.f_nwk_s_int_key)?,
            app_s_key: decode_key("app_s_key", &device.app_s_key)?,
            app_key: root_key("app_key", &device.app_key)?,
            nwk_key: root_key("nwk_key", &device.nwk_key)?,
        };

        let app_eui = if device.app_eui.is_empty() {
            [0; 8]
        } else {
            decode_eui("app_eui", &device.app_eui)?
        };

        Ok(Session::new(
            decode_eui("dev_eui", &device.eui)?,
            decode_dev_addr(&device.address)?,
            app_eui,
            keys,
            major,
            mac_version,
        ))
    }

    pub fn dev_eui(&self) -> &Eui64 {
        &self.dev_eui
    }

    pub fn dev_addr(&self) -> &DevAddr {
        &self.dev_addr
    }

    pub fn app_eui(&self) -> &Eui64 {
        &self.app_eui
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn major(&self) -> Major {
        self.major
    }

    pub fn mac_version(&self) -> MacVersion {
        self.mac_version
    }

    pub fn fcnt_up(&self) -> u32 {
        self.fcnt_up
    }

    pub fn fcnt_down(&self) -> u32 {
        self.fcnt_down
    }

    /// Record that the frame built with the current uplink counter reached the socket.
    pub fn advance_uplink(&mut self) -> Result<u32, Error> {
        self.fcnt_up = self.fcnt_up.checked_add(1).ok_or(Error::CounterExhausted)?;
        Ok(self.fcnt_up)
    }

    /// Record a downlink counter issued by the network.  Returns whether the
    /// frame was fresh.  Stale frames are reported but otherwise accepted.
    pub fn advance_downlink(&mut self, observed_fcnt: u32) -> bool {
        let fresh = observed_fcnt >= self.fcnt_down;
        if fresh {
            self.fcnt_down = observed_fcnt.saturating_add(1);
        }
        fresh
    }

    /// As `advance_downlink`, from the 16 bits carried on the air.
    pub fn observe_downlink(&mut self, fcnt16: u16) -> bool {
        let high = self.fcnt_down & 0xffff_0000;
        let mut full = high | fcnt16 as u32;
        if full < self.fcnt_down && self.fcnt_down - full > MAX_FCNT_GAP {
            full = full.saturating_add(0x1_0000);
        }
        self.advance_downlink(full)
    }

    pub fn reset_counters(&mut self) {
        self.fcnt_up = 0;
        self.fcnt_down = 0;
    }
}
