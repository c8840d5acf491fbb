//! Station interface view used by `get_ip`

use std::fmt;
use std::net::Ipv4Addr;

/// Address configuration of the station interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpInfo {
    pub ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl fmt::Display for IpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IP address: {}", self.ip)?;
        writeln!(f, "Gateway: {}", self.gateway)?;
        write!(f, "Netmask: {}", self.netmask)
    }
}

/// Snapshot of the station interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    pub ssid: String,
    /// `None` until an address has been obtained
    pub ip: Option<IpInfo>,
}

/// Anything that can report the station interface
pub trait NetworkStatus: Send + Sync {
    /// `None` when the interface does not exist
    fn station(&self) -> Option<StationInfo>;
}

/// Fixed answer, handy for tests and for running without a network
#[derive(Debug, Clone, Default)]
pub struct StaticNetwork(pub Option<StationInfo>);

impl NetworkStatus for StaticNetwork {
    fn station(&self) -> Option<StationInfo> {
        self.0.clone()
    }
}
