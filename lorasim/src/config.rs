use anyhow::{Result, ensure};
use serde::Deserialize;
use slog::{Logger, error, info};
use std::fs;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub udp: UdpConfig,
    pub gw: GatewayConfig,
    pub device: DeviceConfig,
    pub band: BandConfig,
    pub data_rate: DataRateConfig,
    pub rx_info: RxInfoConfig,
    #[serde(default)]
    pub default_data: DefaultDataConfig,
    #[serde(default)]
    pub raw_payload: RawPayloadConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UdpConfig {
    // host:port of the network server's packet forwarder listener
    pub server: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GatewayConfig {
    #[serde(with = "hex")]
    pub mac: [u8; 8],
    #[serde(default = "default_stat_interval_ms")]
    pub stat_interval_ms: u64,
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
    // Inbound datagrams longer than this are rejected rather than truncated.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

/// Device identity and ABP session keys, as hex strings.  Decoding happens when the
/// session is built, so that a bad key is reported as a key error.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DeviceConfig {
    pub eui: String,
    pub address: String,
    pub app_eui: String,
    pub nwk_s_enc_key: String,
    // Only needed for LoRaWAN 1.1.  For 1.0 they default to nwk_s_enc_key.
    pub s_nwk_s_int_key: String,
    pub f_nwk_s_int_key: String,
    pub app_s_key: String,
    pub app_key: String,
    pub nwk_key: String,
    pub major: u8,
    pub mac_version: u8,
    pub confirmed: bool,
    #[serde(default = "default_f_port")]
    pub f_port: u8,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BandConfig {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DataRateConfig {
    // kHz
    pub bandwidth: u32,
    pub spread_factor: u8,
    #[serde(default)]
    pub bit_rate: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RxInfoConfig {
    pub channel: u8,
    pub code_rate: String,
    pub crc_status: i8,
    // Hz
    pub frequency: u32,
    pub lora_snr: f32,
    pub rf_chain: u8,
    pub rssi: i16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DefaultDataConfig {
    // Milliseconds between uplinks
    #[serde(default = "default_interval_ms")]
    pub interval: u64,
    #[serde(default)]
    pub random: bool,
    // Each entry is [value, max value, byte width]
    #[serde(default)]
    pub data: Vec<[f64; 3]>,
}

impl Default for DefaultDataConfig {
    fn default() -> Self {
        DefaultDataConfig {
            interval: default_interval_ms(),
            random: false,
            data: vec![],
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawPayloadConfig {
    #[serde(default)]
    pub use_raw: bool,
    #[serde(default)]
    pub payload: String,
}

const MAX_UDP_DATAGRAM_SIZE: usize = 65535;

fn default_stat_interval_ms() -> u64 {
    30000
}
fn default_keepalive_interval_ms() -> u64 {
    3000
}
fn default_max_datagram_size() -> usize {
    1024
}
fn default_interval_ms() -> u64 {
    60000
}
fn default_f_port() -> u8 {
    1
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        ensure!(
            (1..=MAX_UDP_DATAGRAM_SIZE).contains(&config.gw.max_datagram_size),
            "max_datagram_size {} must be between 1 and {MAX_UDP_DATAGRAM_SIZE}",
            config.gw.max_datagram_size
        );
        Ok(config)
    }
}

/// Load the simulator configuration from a TOML file.
pub fn load_config_file(filename: &str, logger: &Logger) -> Result<Config> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load config file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    let config = Config::from_toml(&contents)?;
    info!(
        logger,
        "Loaded config from {filename}: gateway {}, device {}",
        hex::encode(config.gw.mac),
        config.device.eui
    );
    Ok(config)
}
