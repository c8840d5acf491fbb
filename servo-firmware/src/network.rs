//! WiFi station
//!
//! Tracks the station interface through its event sequence: start, connect,
//! address assignment and reconnects after a drop. On the host the link is
//! simulated from the address the HTTP server is bound to.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Mutex;
use servo_console::{IpInfo, NetworkStatus, StationInfo};
use tracing::{info, warn};

/// Credentials for the access point
#[derive(Clone, Default)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for WifiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Station events, in the order a driver reports them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiEvent {
    /// Interface is up and can associate
    StaStart,
    /// Association lost
    Disconnected,
    /// DHCP finished
    GotIp(IpInfo),
}

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Connecting,
    Connected,
}

#[derive(Debug)]
struct StationState {
    link: LinkState,
    ip: Option<IpInfo>,
    reconnects: u32,
}

/// Station interface
#[derive(Debug)]
pub struct Station {
    config: WifiConfig,
    state: Mutex<StationState>,
}

impl Station {
    pub fn new(config: WifiConfig) -> Self {
        Self {
            config,
            state: Mutex::new(StationState {
                link: LinkState::Down,
                ip: None,
                reconnects: 0,
            }),
        }
    }

    pub fn link(&self) -> LinkState {
        self.with_state(|s| s.link)
    }

    /// Reconnect attempts since start
    pub fn reconnects(&self) -> u32 {
        self.with_state(|s| s.reconnects)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StationState) -> T) -> T {
        // Plain data, still consistent after a panic elsewhere
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    /// Applies one station event
    pub fn handle_event(&self, event: WifiEvent) {
        match event {
            WifiEvent::StaStart => {
                info!(
                    ssid = %self.config.ssid,
                    secured = !self.config.password.is_empty(),
                    "station started, connecting"
                );
                self.with_state(|s| s.link = LinkState::Connecting);
            }
            WifiEvent::Disconnected => {
                let attempt = self.with_state(|s| {
                    s.link = LinkState::Connecting;
                    s.ip = None;
                    s.reconnects += 1;
                    s.reconnects
                });
                warn!(ssid = %self.config.ssid, attempt, "disconnected, reconnecting");
            }
            WifiEvent::GotIp(ip) => {
                info!("Got IP: {}", ip.ip);
                self.with_state(|s| {
                    s.link = LinkState::Connected;
                    s.ip = Some(ip);
                });
            }
        }
    }

    /// Brings the station up on the host.
    ///
    /// `bound` is the address the HTTP server listens on; an unspecified
    /// address is resolved to the interface that carries the default route.
    pub fn join(&self, bound: IpAddr) {
        if self.config.ssid.is_empty() {
            warn!("no WiFi SSID configured, station stays down");
            return;
        }
        self.handle_event(WifiEvent::StaStart);

        match host_ip_info(bound) {
            Some(ip) => self.handle_event(WifiEvent::GotIp(ip)),
            None => warn!(%bound, "no IPv4 address for the station"),
        }
    }
}

impl NetworkStatus for Station {
    fn station(&self) -> Option<StationInfo> {
        let ip = self.with_state(|s| s.ip);
        Some(StationInfo {
            ssid: self.config.ssid.clone(),
            ip,
        })
    }
}

/// Address, gateway and netmask for the interface carrying `bound`
fn host_ip_info(bound: IpAddr) -> Option<IpInfo> {
    let ip = match bound {
        IpAddr::V4(ip) if ip.is_unspecified() => default_route_ip().unwrap_or(Ipv4Addr::LOCALHOST),
        IpAddr::V4(ip) => ip,
        IpAddr::V6(_) => return None,
    };
    Some(ip_info_for(ip))
}

/// Local address picked by the kernel for outbound traffic. No packet is sent.
fn default_route_ip() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// Assumes a /24 with the gateway on .1, or 127.0.0.0/8 for loopback
fn ip_info_for(ip: Ipv4Addr) -> IpInfo {
    if ip.is_loopback() {
        return IpInfo {
            ip,
            gateway: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::new(255, 0, 0, 0),
        };
    }
    let [a, b, c, _] = ip.octets();
    IpInfo {
        ip,
        gateway: Ipv4Addr::new(a, b, c, 1),
        netmask: Ipv4Addr::new(255, 255, 255, 0),
    }
}
