//! scheduler - the forwarder's periodic tasks and its receive loop
//!
//! Four tasks share one [`Endpoint`]: uplink, stat, keepalive and receive.  Each is handed the
//! values it needs when it is spawned.  All of them watch the same stop token, and
//! [`Scheduler::graceful_shutdown`] fires it and waits for every task to finish.

use crate::{
    Clock, Config, DataRate, DatagramSocket, DownlinkHandler, Endpoint, Error, GatewayCounters,
    PayloadGenerator, RadioDescriptor, RxInfoConfig, Session, build_uplink,
};
use async_channel::Receiver;
use async_std::task::JoinHandle;
use chrono::Utc;
use gwmp::GatewayId;
use phy::{MType, band};
use slog::{Logger, debug, error, info, o, warn};
use std::sync::Arc;
use std::time::Duration;
use stop_token::prelude::*;
use stop_token::{StopSource, StopToken};

// Downlink counters waiting to be folded into the session.
const OBSERVED_DOWNLINK_BACKLOG: usize = 16;

#[derive(Debug, Clone)]
pub struct UplinkSettings {
    pub m_type: MType,
    pub f_port: u8,
    pub band: String,
    pub data_rate: DataRate,
    pub rx_info: RxInfoConfig,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub gateway_id: GatewayId,
    pub uplink: UplinkSettings,
    pub stat_interval: Duration,
    pub keepalive_interval: Duration,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        let m_type = if config.device.confirmed {
            MType::ConfirmedDataUp
        } else {
            MType::UnconfirmedDataUp
        };
        Settings {
            gateway_id: config.gw.mac,
            uplink: UplinkSettings {
                m_type,
                f_port: config.device.f_port,
                band: config.band.name.clone(),
                data_rate: DataRate::from_config(&config.data_rate),
                rx_info: config.rx_info.clone(),
                interval: Duration::from_millis(config.default_data.interval),
            },
            stat_interval: Duration::from_millis(config.gw.stat_interval_ms),
            keepalive_interval: Duration::from_millis(config.gw.keepalive_interval_ms),
        }
    }
}

pub struct Scheduler {
    stop_source: StopSource,
    uplink_task: JoinHandle<Session>,
    tasks: Vec<JoinHandle<()>>,
    logger: Logger,
}

impl Scheduler {
    pub fn start<S: DatagramSocket, C: Clock>(
        endpoint: Endpoint<S>,
        session: Session,
        payloads: PayloadGenerator,
        settings: Settings,
        clock: Arc<C>,
        counters: Arc<GatewayCounters>,
        logger: Logger,
    ) -> Self {
        let stop_source = StopSource::new();
        let (observed_tx, observed_rx) = async_channel::bounded(OBSERVED_DOWNLINK_BACKLOG);
        let gateway_id = settings.gateway_id;

        let handler = DownlinkHandler::new(
            gateway_id,
            *session.dev_addr(),
            counters.clone(),
            observed_tx,
            logger.new(o!("task" => "receive")),
        );
        let receive_task = {
            let endpoint = endpoint.clone();
            let stop = stop_source.token();
            async_std::task::spawn(async move { endpoint.receive_loop(handler, stop).await })
        };

        let stat_task = {
            let periodic = Periodic {
                endpoint: endpoint.clone(),
                clock: clock.clone(),
                interval: settings.stat_interval,
                stop: stop_source.token(),
                logger: logger.new(o!("task" => "stat")),
            };
            let counters = counters.clone();
            async_std::task::spawn(async move {
                periodic
                    .run(|| Ok(gwmp::encode_stat(&gateway_id, &counters.stat(Utc::now()))?))
                    .await
            })
        };

        let keepalive_task = {
            let periodic = Periodic {
                endpoint: endpoint.clone(),
                clock: clock.clone(),
                interval: settings.keepalive_interval,
                stop: stop_source.token(),
                logger: logger.new(o!("task" => "keepalive")),
            };
            async_std::task::spawn(async move {
                periodic
                    .run(|| Ok(gwmp::encode_keepalive(&gateway_id)))
                    .await
            })
        };

        let uplink_task = {
            let uplinker = Uplinker {
                endpoint,
                session,
                payloads,
                settings: settings.uplink,
                gateway_id,
                counters,
                observed: observed_rx,
                logger: logger.new(o!("task" => "uplink")),
            };
            let stop = stop_source.token();
            async_std::task::spawn(async move { uplinker.run(clock, stop).await })
        };

        Scheduler {
            stop_source,
            uplink_task,
            tasks: vec![receive_task, stat_task, keepalive_task],
            logger,
        }
    }

    /// Stop every task and hand back the session with its final counters.
    pub async fn graceful_shutdown(self) -> Session {
        let Scheduler {
            stop_source,
            uplink_task,
            tasks,
            logger,
        } = self;
        info!(logger, "Stopping tasks");
        drop(stop_source);
        for task in tasks {
            task.await;
        }
        uplink_task.await
    }
}

/// Sends a freshly built datagram every `interval`.
struct Periodic<S: DatagramSocket, C: Clock> {
    endpoint: Endpoint<S>,
    clock: Arc<C>,
    interval: Duration,
    stop: StopToken,
    logger: Logger,
}

impl<S: DatagramSocket, C: Clock> Periodic<S, C> {
    async fn run(self, build: impl Fn() -> Result<Vec<u8>, Error>) {
        loop {
            match build() {
                // Send failures are logged by the endpoint.
                Ok(datagram) => {
                    if self.endpoint.send(&datagram).await.is_ok() {
                        debug!(self.logger, ">> {} bytes", datagram.len());
                    }
                }
                Err(e) => warn!(self.logger, "Failed to build datagram - {e}"),
            }
            if self
                .clock
                .sleep(self.interval)
                .timeout_at(self.stop.clone())
                .await
                .is_err()
            {
                break;
            }
        }
    }
}

/// Owns the session.  Nothing else touches the frame counters.
struct Uplinker<S: DatagramSocket> {
    endpoint: Endpoint<S>,
    session: Session,
    payloads: PayloadGenerator,
    settings: UplinkSettings,
    gateway_id: GatewayId,
    counters: Arc<GatewayCounters>,
    observed: Receiver<u16>,
    logger: Logger,
}

impl<S: DatagramSocket> Uplinker<S> {
    async fn run<C: Clock>(mut self, clock: Arc<C>, stop: StopToken) -> Session {
        loop {
            self.absorb_downlinks();
            match self.send_uplink().await {
                Ok(()) => {}
                Err(Error::CounterExhausted) => {
                    error!(self.logger, "Uplink frame counter exhausted - no more uplinks");
                    break;
                }
                Err(e) => warn!(self.logger, "Uplink abandoned - {e}"),
            }
            if clock
                .sleep(self.settings.interval)
                .timeout_at(stop.clone())
                .await
                .is_err()
            {
                break;
            }
        }
        self.session
    }

    fn absorb_downlinks(&mut self) {
        while let Ok(fcnt) = self.observed.try_recv() {
            if !self.session.observe_downlink(fcnt) {
                warn!(
                    self.logger,
                    "Stale downlink FCnt {fcnt}, expected at least {}",
                    self.session.fcnt_down()
                );
            }
        }
    }

    async fn send_uplink(&mut self) -> Result<(), Error> {
        let payload = self.payloads.next_payload()?;
        self.check_payload_size(payload.len());
        let radio = RadioDescriptor::new(&self.settings.rx_info, Utc::now());
        let frame = build_uplink(
            &self.session,
            self.settings.m_type,
            self.settings.f_port,
            &radio,
            &payload,
            &self.gateway_id,
            &self.settings.band,
            &self.settings.data_rate,
        )?;
        let datagram = frame.encode_push()?;
        self.endpoint.send(&datagram).await?;

        self.counters.uplink_forwarded();
        info!(
            self.logger,
            ">> {:?} FCnt {}, {} byte payload",
            self.settings.m_type,
            self.session.fcnt_up(),
            payload.len()
        );
        self.session.advance_uplink()?;
        Ok(())
    }

    // Oversized payloads are still sent.  A network server may reject them.
    fn check_payload_size(&self, len: usize) {
        let Ok(dr) = self.settings.data_rate.index(&self.settings.band) else {
            return;
        };
        if let Some(max) = band::max_payload_size(&self.settings.band, dr) {
            if len > max {
                warn!(
                    self.logger,
                    "{len} byte payload exceeds the {max} byte limit of DR{dr} in {}",
                    self.settings.band
                );
            }
        }
    }
}
