use super::MockNetworkServer;
use anyhow::Result;
use lorasim::{Config, LoraSim};
use slog::{Drain, Logger, o};

pub const GATEWAY_ID: &str = "b827ebfffe9448d0";
pub const DEV_ADDR: [u8; 4] = [0x26, 0x01, 0x1b, 0xda];
pub const NWK_S_KEY: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];
pub const APP_S_KEY: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];

/// Start a mock network server and a simulator pointed at it, with short intervals so
/// that every kind of traffic shows up within a test's lifetime.
pub async fn init() -> Result<(MockNetworkServer, LoraSim, Logger)> {
    init_with(|_| {}).await
}

pub async fn init_with(
    customize: impl FnOnce(&mut Config),
) -> Result<(MockNetworkServer, LoraSim, Logger)> {
    exit_on_panic();
    let logger = init_logging();
    let ns = MockNetworkServer::new(&logger).await?;
    let mut config = test_config(&ns.address()?)?;
    customize(&mut config);
    let sim = LoraSim::start(config, logger.new(o!("lorasim" => 1))).await?;
    Ok((ns, sim, logger))
}

fn test_config(server: &str) -> Result<Config> {
    Config::from_toml(&format!(
        r#"
        [udp]
        server = "{server}"

        [gw]
        mac = "{GATEWAY_ID}"
        stat_interval_ms = 300
        keepalive_interval_ms = 100

        [device]
        eui = "0102030405060708"
        address = "26011bda"
        nwk_s_enc_key = "2b7e151628aed2a6abf7158809cf4f3c"
        app_s_key = "000102030405060708090a0b0c0d0e0f"
        f_port = 2

        [band]
        name = "EU_863_870"

        [data_rate]
        bandwidth = 125
        spread_factor = 7
        bit_rate = 0

        [rx_info]
        channel = 2
        code_rate = "4/5"
        crc_status = 1
        frequency = 868500000
        lora_snr = 7.5
        rf_chain = 1
        rssi = -57

        [default_data]
        interval = 200

        [raw_payload]
        use_raw = true
        payload = "deadbeef"
        "#
    ))
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

fn init_logging() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = std::sync::Mutex::new(drain).fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}
