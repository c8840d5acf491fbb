//! Command-line and environment configuration

use clap::Parser;
use servo_actuator::servo::{SERVO_GPIO, SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US};
use servo_actuator::ServoConfig;
use servo_api::ApiConfig;
use servo_console::{ClampPolicy, ConsoleConfig};

use crate::network::WifiConfig;

/// SSID baked in at build time
const BUILD_WIFI_SSID: &str = match option_env!("SERVO_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// Password baked in at build time
const BUILD_WIFI_PASS: &str = match option_env!("SERVO_WIFI_PASS") {
    Some(pass) => pass,
    None => "",
};

#[derive(Parser, Debug)]
#[command(name = "servo-firmware")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version)]
#[command(about = "Hobby servo controller with a serial console and an HTTP interface", long_about = None)]
pub struct Args {
    /// Host to bind the HTTP server to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "SERVO_HOST")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short, long, default_value_t = 8080, env = "SERVO_PORT")]
    pub port: u16,

    /// WiFi network to join
    #[arg(long, default_value = BUILD_WIFI_SSID, env = "SERVO_WIFI_SSID")]
    pub wifi_ssid: String,

    /// WiFi password
    #[arg(long, default_value = BUILD_WIFI_PASS, env = "SERVO_WIFI_PASS", hide_env_values = true, hide_default_value = true)]
    pub wifi_pass: String,

    /// GPIO carrying the servo signal
    #[arg(long, default_value_t = SERVO_GPIO, env = "SERVO_GPIO")]
    pub servo_gpio: u8,

    /// Pulse width at 0 degrees (µs)
    #[arg(long, default_value_t = SERVO_MIN_PULSE_US)]
    pub min_pulse_us: u32,

    /// Pulse width at 180 degrees (µs)
    #[arg(long, default_value_t = SERVO_MAX_PULSE_US)]
    pub max_pulse_us: u32,

    /// Refuse out-of-range console angles instead of clamping them
    #[arg(long, default_value_t = false)]
    pub reject_out_of_range: bool,

    /// Enable CORS for all origins
    #[arg(long, default_value_t = false)]
    pub cors: bool,

    /// Disable rate limiting
    #[arg(long, default_value_t = false)]
    pub no_rate_limit: bool,

    /// Run without the interactive console
    #[arg(long, default_value_t = false)]
    pub no_console: bool,
}

impl Args {
    pub fn servo_config(&self) -> ServoConfig {
        ServoConfig {
            gpio: self.servo_gpio,
            min_pulse_us: self.min_pulse_us,
            max_pulse_us: self.max_pulse_us,
            ..Default::default()
        }
    }

    pub fn console_config(&self) -> ConsoleConfig {
        let policy = if self.reject_out_of_range {
            ClampPolicy::Reject
        } else {
            ClampPolicy::Clamp
        };
        ConsoleConfig {
            policy,
            ..Default::default()
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::from_env();
        config.cors = self.cors;
        if self.no_rate_limit {
            config.rate_limit.enabled = false;
        }
        config
    }

    pub fn wifi_config(&self) -> WifiConfig {
        WifiConfig {
            ssid: self.wifi_ssid.clone(),
            password: self.wifi_pass.clone(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("servo-firmware").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        let servo = args.servo_config();
        assert_eq!(servo.gpio, 15);
        assert_eq!(servo.min_pulse_us, 500);
        assert_eq!(servo.max_pulse_us, 2500);
        assert_eq!(args.console_config().policy, ClampPolicy::Clamp);
        assert!(!args.no_console);
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--port", "9000",
            "--servo-gpio", "4",
            "--min-pulse-us", "1000",
            "--reject-out-of-range",
            "--no-rate-limit",
            "--cors",
            "--wifi-ssid", "workshop",
        ]);
        assert_eq!(args.bind_addr(), "0.0.0.0:9000");
        assert_eq!(args.servo_config().gpio, 4);
        assert_eq!(args.servo_config().min_pulse_us, 1000);
        assert_eq!(args.console_config().policy, ClampPolicy::Reject);
        assert!(!args.api_config().rate_limit.enabled);
        assert!(args.api_config().cors);
        assert_eq!(args.wifi_config().ssid, "workshop");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let result = Args::try_parse_from(["servo-firmware", "--servo-gpio", "300"]);
        assert!(result.is_err());
    }
}
