mod clock;
mod config;
mod downlink;
mod endpoint;
mod error;
mod lorasim;
mod payload;
mod scheduler;
mod session;
mod stats;
mod uplink;
#[cfg(test)]
mod test_support;

pub use clock::{Clock, SystemClock};
pub use config::*;
pub use downlink::DownlinkHandler;
pub use endpoint::{DatagramSocket, Endpoint};
pub use error::Error;
pub use lorasim::LoraSim;
pub use payload::{PayloadGenerator, encode_scaled};
pub use scheduler::{Scheduler, Settings, UplinkSettings};
pub use session::{Session, SessionKeys};
pub use stats::GatewayCounters;
pub use uplink::{DataRate, RadioDescriptor, UplinkFrame, build_uplink};
