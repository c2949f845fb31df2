use crate::{
    GatewayId, GwmpError, HEADER_LEN, PROTOCOL_VERSION, PacketType, Rxpk, Stat, Txpk,
    UPSTREAM_HEADER_LEN,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct PushBody<'a> {
    gateway_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rxpk: Option<[&'a Rxpk; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stat: Option<&'a Stat>,
}

#[derive(Deserialize)]
struct PullRespBody {
    txpk: Txpk,
}

fn upstream_header(packet_type: PacketType, gateway_id: &GatewayId) -> Vec<u8> {
    let token = rand::random::<u16>().to_be_bytes();
    let mut datagram = Vec::with_capacity(UPSTREAM_HEADER_LEN);
    datagram.push(PROTOCOL_VERSION);
    datagram.extend(token);
    datagram.push(packet_type.into());
    datagram.extend(gateway_id);
    datagram
}

fn push(gateway_id: &GatewayId, body: &PushBody) -> Result<Vec<u8>, GwmpError> {
    let mut datagram = upstream_header(PacketType::PushData, gateway_id);
    serde_json::to_writer(&mut datagram, body)?;
    Ok(datagram)
}

/// PUSH_DATA carrying a single rxpk.
pub fn encode_push(gateway_id: &GatewayId, rxpk: &Rxpk) -> Result<Vec<u8>, GwmpError> {
    push(
        gateway_id,
        &PushBody {
            gateway_id: hex::encode(gateway_id),
            rxpk: Some([rxpk]),
            stat: None,
        },
    )
}

/// PUSH_DATA carrying a stat record.
pub fn encode_stat(gateway_id: &GatewayId, stat: &Stat) -> Result<Vec<u8>, GwmpError> {
    push(
        gateway_id,
        &PushBody {
            gateway_id: hex::encode(gateway_id),
            rxpk: None,
            stat: Some(stat),
        },
    )
}

/// PULL_DATA.  Keeps the NAT mapping open and tells the server where to send downlinks.
pub fn encode_keepalive(gateway_id: &GatewayId) -> Vec<u8> {
    upstream_header(PacketType::PullData, gateway_id)
}

/// Acknowledge a downlink.  The original header is echoed with the type rewritten to TX_ACK.
pub fn encode_downlink_ack(original_header: &[u8], gateway_id: &GatewayId) -> Vec<u8> {
    let mut reply = Vec::with_capacity(UPSTREAM_HEADER_LEN);
    reply.extend(&original_header[..HEADER_LEN.min(original_header.len())]);
    reply.resize(HEADER_LEN, 0);
    reply[3] = PacketType::TxAck.into();
    reply.extend(gateway_id);
    reply
}

pub fn parse_txpk(downlink_payload: &[u8]) -> Result<Txpk, GwmpError> {
    let body: PullRespBody = serde_json::from_slice(downlink_payload)?;
    Ok(body.txpk)
}

/// A borrowed view of an inbound datagram.
#[derive(Debug)]
pub struct DatagramView<'a> {
    bytes: &'a [u8],
    packet_type: PacketType,
}

pub fn decode(bytes: &[u8]) -> Result<DatagramView<'_>, GwmpError> {
    if bytes.len() < HEADER_LEN {
        return Err(GwmpError::TooShort(bytes.len()));
    }
    let packet_type =
        PacketType::try_from(bytes[3]).map_err(|_| GwmpError::UnknownPacketType(bytes[3]))?;
    Ok(DatagramView { bytes, packet_type })
}

impl<'a> DatagramView<'a> {
    pub fn header(&self) -> &'a [u8] {
        &self.bytes[..HEADER_LEN]
    }

    pub fn version(&self) -> u8 {
        self.bytes[0]
    }

    pub fn token(&self) -> u16 {
        u16::from_be_bytes([self.bytes[1], self.bytes[2]])
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A downlink push is a PULL_RESP that is longer than a bare upstream header.
    pub fn is_downlink(&self) -> bool {
        self.bytes.len() > UPSTREAM_HEADER_LEN && self.packet_type == PacketType::PullResp
    }

    /// Everything after the 4 byte header, if this is a downlink push.
    pub fn downlink_payload(&self) -> Option<&'a [u8]> {
        self.is_downlink().then(|| &self.bytes[HEADER_LEN..])
    }
}
