//! # servo-console — text command interface
//!
//! Line-oriented interpreter for the servo: `servo`, `servo_smooth`, `info`,
//! `get_ip`, `help`, `history` and `quit`. Commands are parsed with clap in
//! multicall mode and executed against a shared [`ServoHandle`].
//!
//! ```rust
//! use servo_actuator::{ServoDriver, ServoHandle, SimulatedLedc};
//! use servo_console::{Console, ConsoleResult};
//!
//! let servo = ServoHandle::new(ServoDriver::new(SimulatedLedc::new()).unwrap());
//! servo.configure().unwrap();
//!
//! let mut console = Console::new(servo.clone());
//! console.process_line("servo 300");
//! assert_eq!(servo.current_angle().unwrap().degrees(), 180);
//! assert_eq!(console.process_line("nope"), ConsoleResult::Unrecognized);
//! ```
//!
//! [`ServoHandle`]: servo_actuator::ServoHandle

pub mod command;
pub mod console;
pub mod error;
pub mod network;

pub use command::{split_argv, ConsoleCommand, MAX_CMDLINE_ARGS, MAX_CMDLINE_LENGTH};
pub use console::{ClampPolicy, Console, ConsoleConfig, ConsoleResult, HISTORY_LEN};
pub use error::ConsoleError;
pub use network::{IpInfo, NetworkStatus, StaticNetwork, StationInfo};
