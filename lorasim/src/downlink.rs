//! downlink - handling of datagrams from the network server

use crate::{DatagramSocket, Endpoint, Error, GatewayCounters};
use async_channel::Sender;
use gwmp::{GatewayId, PacketType};
use phy::FrameHeader;
use security::DevAddr;
use slog::{Logger, debug, info, warn};
use std::sync::Arc;

pub struct DownlinkHandler {
    gateway_id: GatewayId,
    dev_addr: DevAddr,
    counters: Arc<GatewayCounters>,
    // 16 bit FCnts of downlinks addressed to our device, for the uplink task to fold into the session.
    observed: Sender<u16>,
    logger: Logger,
}

impl DownlinkHandler {
    pub fn new(
        gateway_id: GatewayId,
        dev_addr: DevAddr,
        counters: Arc<GatewayCounters>,
        observed: Sender<u16>,
        logger: Logger,
    ) -> Self {
        DownlinkHandler {
            gateway_id,
            dev_addr,
            counters,
            observed,
            logger,
        }
    }

    pub async fn handle<S: DatagramSocket>(
        &self,
        endpoint: &Endpoint<S>,
        datagram: &[u8],
    ) -> Result<(), Error> {
        if datagram.len() > endpoint.max_datagram_size() {
            return Err(Error::TruncatedDatagram {
                limit: endpoint.max_datagram_size(),
            });
        }
        let view = gwmp::decode(datagram)?;

        if let Some(payload) = view.downlink_payload() {
            self.counters.downlink_received();
            self.inspect(payload);
            let ack = gwmp::encode_downlink_ack(view.header(), &self.gateway_id);
            endpoint.send(&ack).await?;
            self.counters.downlink_acked();
            debug!(self.logger, "Acked downlink, token {:04x}", view.token());
            return Ok(());
        }

        match view.packet_type() {
            PacketType::PushAck => {
                self.counters.push_ack_received();
                debug!(self.logger, "<< PUSH_ACK, token {:04x}", view.token());
            }
            PacketType::PullAck => debug!(self.logger, "<< PULL_ACK, token {:04x}", view.token()),
            t => debug!(self.logger, "Ignoring {:?} of {} bytes", t, view.len()),
        }
        Ok(())
    }

    // A downlink that can't be understood is still acknowledged.
    fn inspect(&self, payload: &[u8]) {
        let txpk = match gwmp::parse_txpk(payload) {
            Ok(txpk) => txpk,
            Err(e) => {
                warn!(self.logger, "Unparseable txpk - {e}");
                return;
            }
        };
        let phy = match txpk.phy_payload() {
            Ok(phy) => phy,
            Err(e) => {
                warn!(self.logger, "Bad txpk data - {e}");
                return;
            }
        };
        match FrameHeader::parse(&phy) {
            Ok(header) if header.dev_addr == self.dev_addr => {
                info!(
                    self.logger,
                    "<< {:?} FCnt {} port {:?}, {} bytes",
                    header.m_type,
                    header.fcnt,
                    header.f_port,
                    phy.len()
                );
                if self.observed.try_send(header.fcnt).is_err() {
                    warn!(self.logger, "Downlink counter backlog full, dropped FCnt {}", header.fcnt);
                }
            }
            Ok(header) => debug!(
                self.logger,
                "Downlink for other device {}",
                hex::encode(header.dev_addr)
            ),
            Err(e) => debug!(self.logger, "Downlink is not a data frame - {e}"),
        }
    }
}
