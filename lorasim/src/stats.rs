use atomic_counter::{AtomicCounter, RelaxedCounter};
use chrono::{DateTime, Utc};
use gwmp::Stat;

/// Traffic counters reported in the forwarder's stat record.
pub struct GatewayCounters {
    uplinks_forwarded: RelaxedCounter,
    push_acks: RelaxedCounter,
    downlinks_received: RelaxedCounter,
    downlinks_acked: RelaxedCounter,
}

impl Default for GatewayCounters {
    fn default() -> Self {
        GatewayCounters {
            uplinks_forwarded: RelaxedCounter::new(0),
            push_acks: RelaxedCounter::new(0),
            downlinks_received: RelaxedCounter::new(0),
            downlinks_acked: RelaxedCounter::new(0),
        }
    }
}

impl GatewayCounters {
    pub fn uplink_forwarded(&self) {
        self.uplinks_forwarded.inc();
    }
    pub fn push_ack_received(&self) {
        self.push_acks.inc();
    }
    pub fn downlink_received(&self) {
        self.downlinks_received.inc();
    }
    pub fn downlink_acked(&self) {
        self.downlinks_acked.inc();
    }

    pub fn uplinks(&self) -> usize {
        self.uplinks_forwarded.get()
    }
    pub fn downlinks(&self) -> usize {
        self.downlinks_received.get()
    }

    pub fn stat(&self, now: DateTime<Utc>) -> Stat {
        let forwarded = self.uplinks_forwarded.get() as u32;
        let acked = self.push_acks.get() as u32;
        let ackr = if forwarded == 0 {
            0.0
        } else {
            (100.0 * acked as f32 / forwarded as f32).min(100.0)
        };
        Stat {
            time: now.format("%Y-%m-%d %H:%M:%S GMT").to_string(),
            rxnb: forwarded,
            rxok: forwarded,
            rxfw: forwarded,
            ackr,
            dwnb: self.downlinks_received.get() as u32,
            txnb: self.downlinks_acked.get() as u32,
            ..Default::default()
        }
    }
}
