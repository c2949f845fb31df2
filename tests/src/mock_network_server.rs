use anyhow::{Result, anyhow, bail, ensure};
use async_net::UdpSocket;
use async_std::future;
use async_std::sync::Mutex;
use base64::{Engine, engine::general_purpose::STANDARD};
use gwmp::{PacketType, Rxpk, Stat};
use phy::FrameHeader;
use slog::{Logger, debug, info, o};
use std::net::SocketAddr;
use std::time::Duration;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// The network server end of the packet forwarder's UDP conversation.
pub struct MockNetworkServer {
    socket: UdpSocket,
    // Where the forwarder's datagrams come from, learned from the first one received.
    forwarder: Mutex<Option<SocketAddr>>,
    logger: Logger,
}

pub struct Uplink {
    pub token: u16,
    pub gateway_id: String,
    pub rxpk: Rxpk,
    pub phy_payload: Vec<u8>,
    pub header: FrameHeader,
}

impl MockNetworkServer {
    pub async fn new(logger: &Logger) -> Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        Ok(MockNetworkServer {
            socket,
            forwarder: Mutex::new(None),
            logger: logger.new(o!("ns" => 1)),
        })
    }

    pub fn address(&self) -> Result<String> {
        Ok(self.socket.local_addr()?.to_string())
    }

    /// Next datagram from the forwarder, failing after a few seconds of silence.
    pub async fn receive(&self) -> Result<Vec<u8>> {
        self.receive_within(RECEIVE_TIMEOUT).await
    }

    pub async fn receive_within(&self, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = [0; 2048];
        let (bytes_received, from) =
            future::timeout(timeout, self.socket.recv_from(&mut buf)).await??;
        *self.forwarder.lock().await = Some(from);
        let datagram = buf[..bytes_received].to_vec();
        debug!(self.logger, "<< {} bytes from {from}", datagram.len());
        Ok(datagram)
    }

    /// Skip datagrams until one of the given type arrives.
    pub async fn receive_type(&self, packet_type: PacketType) -> Result<Vec<u8>> {
        loop {
            let datagram = self.receive().await?;
            ensure!(datagram.len() >= 4, "Runt datagram of {} bytes", datagram.len());
            if datagram[3] == u8::from(packet_type) {
                return Ok(datagram);
            }
        }
    }

    fn push_body(datagram: &[u8]) -> Result<serde_json::Value> {
        ensure!(datagram.len() > 12, "PUSH_DATA without a body");
        Ok(serde_json::from_slice(&datagram[12..])?)
    }

    pub async fn receive_uplink(&self) -> Result<Uplink> {
        loop {
            let datagram = self.receive_type(PacketType::PushData).await?;
            let body = Self::push_body(&datagram)?;
            let Some(rxpk) = body.get("rxpk") else {
                continue;
            };
            let rxpk: Rxpk = serde_json::from_value(rxpk[0].clone())?;
            let phy_payload = rxpk.phy_payload()?;
            let header = FrameHeader::parse(&phy_payload)?;
            info!(self.logger, "<< Uplink FCnt {}", header.fcnt);
            return Ok(Uplink {
                token: u16::from_be_bytes([datagram[1], datagram[2]]),
                gateway_id: body["gateway_id"]
                    .as_str()
                    .ok_or_else(|| anyhow!("Missing gateway_id"))?
                    .to_string(),
                rxpk,
                phy_payload,
                header,
            });
        }
    }

    pub async fn receive_stat(&self) -> Result<Stat> {
        loop {
            let datagram = self.receive_type(PacketType::PushData).await?;
            let body = Self::push_body(&datagram)?;
            if let Some(stat) = body.get("stat") {
                return Ok(serde_json::from_value(stat.clone())?);
            }
        }
    }

    async fn send(&self, datagram: &[u8]) -> Result<()> {
        let Some(forwarder) = *self.forwarder.lock().await else {
            bail!("Nothing received from the forwarder yet");
        };
        self.socket.send_to(datagram, forwarder).await?;
        Ok(())
    }

    pub async fn send_push_ack(&self, token: u16) -> Result<()> {
        let [t1, t2] = token.to_be_bytes();
        self.send(&[gwmp::PROTOCOL_VERSION, t1, t2, PacketType::PushAck.into()])
            .await
    }

    /// Ask the forwarder to transmit `phy_payload`.
    pub async fn send_pull_resp(&self, token: u16, phy_payload: &[u8]) -> Result<()> {
        let [t1, t2] = token.to_be_bytes();
        let mut datagram = vec![gwmp::PROTOCOL_VERSION, t1, t2, PacketType::PullResp.into()];
        let txpk = serde_json::json!({
            "txpk": {
                "imme": true,
                "freq": 869.525,
                "rfch": 0,
                "powe": 14,
                "modu": "LORA",
                "datr": "SF9BW125",
                "codr": "4/5",
                "ipol": true,
                "size": phy_payload.len(),
                "data": STANDARD.encode(phy_payload),
            }
        });
        serde_json::to_writer(&mut datagram, &txpk)?;
        info!(self.logger, ">> PULL_RESP, token {token:04x}");
        self.send(&datagram).await
    }
}
