use crate::{Clock, DatagramSocket};
use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use slog::{Drain, Logger, o};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..3000 {
        if condition() {
            return;
        }
        async_std::task::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not met in time");
}

pub fn test_logger() -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(slog_term::TestStdoutWriter);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    Logger::root(drain, o!())
}

pub const TEST_CONFIG: &str = r#"
    [udp]
    server = "127.0.0.1:1700"

    [gw]
    mac = "b827ebfffe9448d0"
    stat_interval_ms = 30000
    keepalive_interval_ms = 3000

    [device]
    eui = "0102030405060708"
    address = "26011bda"
    nwk_s_enc_key = "2b7e151628aed2a6abf7158809cf4f3c"
    app_s_key = "000102030405060708090a0b0c0d0e0f"

    [band]
    name = "EU_863_870"

    [data_rate]
    bandwidth = 125
    spread_factor = 7

    [rx_info]
    channel = 0
    code_rate = "4/5"
    crc_status = 1
    frequency = 868100000
    lora_snr = 7.0
    rf_chain = 1
    rssi = -57

    [default_data]
    interval = 1000

    [raw_payload]
    use_raw = true
    payload = "deadbeef"
"#;

#[derive(Default)]
struct ClockState {
    now: Duration,
    sleepers: Vec<(Duration, Sender<()>)>,
}

/// A clock that only moves when the test advances it.
#[derive(Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap();
        state.now += by;
        let now = state.now;
        state.sleepers.retain(|(deadline, waker)| {
            if *deadline <= now {
                let _ = waker.try_send(());
                false
            } else {
                true
            }
        });
    }

    pub fn sleepers(&self) -> usize {
        self.state.lock().unwrap().sleepers.len()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        let (tx, rx) = async_channel::bounded(1);
        {
            let mut state = self.state.lock().unwrap();
            let deadline = state.now + duration;
            state.sleepers.push((deadline, tx));
        }
        let _ = rx.recv().await;
    }
}

/// An in-memory datagram socket.  Sends are written to `wire` a byte at a time, yielding
/// between bytes, so that unsynchronized concurrent writers would show up as interleaving.
pub struct MockSocket {
    wire: Arc<Mutex<Vec<u8>>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_sends: Arc<AtomicBool>,
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
}

impl MockSocket {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = async_channel::unbounded();
        MockSocket {
            wire: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_sends: Arc::new(AtomicBool::new(false)),
            inbound_tx,
            inbound_rx,
        }
    }

    pub fn wire(&self) -> Arc<Mutex<Vec<u8>>> {
        self.wire.clone()
    }

    pub fn sent(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        self.sent.clone()
    }

    pub fn inbound(&self) -> Sender<Vec<u8>> {
        self.inbound_tx.clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Flips send failures on and off after the socket has been handed over.
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        self.fail_sends.clone()
    }
}

#[async_trait]
impl DatagramSocket for MockSocket {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "mock send failure"));
        }
        for b in datagram {
            self.wire.lock().unwrap().push(*b);
            async_std::task::yield_now().await;
        }
        self.sent.lock().unwrap().push(datagram.to_vec());
        Ok(datagram.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbound_rx.recv().await {
            Ok(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(n)
            }
            Err(_) => std::future::pending().await,
        }
    }
}
