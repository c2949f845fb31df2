use crate::{
    Config, Endpoint, GatewayCounters, PayloadGenerator, Scheduler, Session, Settings,
    SystemClock,
};
use anyhow::Result;
use slog::{Logger, info};
use std::sync::Arc;

/// A simulated end device behind a simulated packet forwarder.
pub struct LoraSim {
    scheduler: Scheduler,
    counters: Arc<GatewayCounters>,
    logger: Logger,
}

impl LoraSim {
    pub async fn start(config: Config, logger: Logger) -> Result<Self> {
        let session = Session::from_config(&config.device)?;
        let payloads = PayloadGenerator::from_config(&config.default_data, &config.raw_payload)?;
        let settings = Settings::from_config(&config);
        // Reject an unknown band or data rate now rather than on every uplink.
        settings.uplink.data_rate.index(&settings.uplink.band)?;

        let endpoint =
            Endpoint::connect(&config.udp.server, config.gw.max_datagram_size, &logger).await?;
        info!(
            &logger,
            "Device {} ({:?}, DevAddr {}) behind gateway {}, uplink every {:?}",
            hex::encode(session.dev_eui()),
            session.mac_version(),
            hex::encode(session.dev_addr()),
            hex::encode(settings.gateway_id),
            settings.uplink.interval
        );

        let counters = Arc::new(GatewayCounters::default());
        let scheduler = Scheduler::start(
            endpoint,
            session,
            payloads,
            settings,
            Arc::new(SystemClock),
            counters.clone(),
            logger.clone(),
        );
        Ok(LoraSim {
            scheduler,
            counters,
            logger,
        })
    }

    pub fn counters(&self) -> &GatewayCounters {
        &self.counters
    }

    pub async fn graceful_shutdown(self) -> Session {
        info!(&self.logger, "Shutting down");
        self.scheduler.graceful_shutdown().await
    }
}
