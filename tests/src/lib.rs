mod mock_network_server;
pub mod framework;

pub use mock_network_server::{MockNetworkServer, Uplink};
