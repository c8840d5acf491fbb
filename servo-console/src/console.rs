//! Interactive servo console
//!
//! # Usage
//!
//! ```text
//! Type 'help' to list commands.
//! > servo 90
//! Setting servo to 90 degrees
//! > servo_smooth 0 15
//! Moving servo smoothly from 90° to 0° with step delay 15 ms
//! > servo abc
//! error: invalid value 'abc' for '<angle>': invalid digit found in string
//! Command returned non-zero error code: 0x1
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, error, warn};
use servo_actuator::{Angle, MoveOutcome, ServoHandle};

use crate::command::{split_argv, ConsoleCommand, MAX_CMDLINE_ARGS, MAX_CMDLINE_LENGTH};
use crate::error::ConsoleError;
use crate::network::NetworkStatus;

/// Default number of remembered lines
pub const HISTORY_LEN: usize = 100;

/// What to do with angles outside 0-180
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClampPolicy {
    /// Saturate to the nearest bound and move
    #[default]
    Clamp,
    /// Refuse the command without touching the servo
    Reject,
}

/// Console settings
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub policy: ClampPolicy,
    pub prompt: String,
    pub max_line_len: usize,
    pub max_args: usize,
    pub history_len: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            policy: ClampPolicy::Clamp,
            prompt: "> ".into(),
            max_line_len: MAX_CMDLINE_LENGTH,
            max_args: MAX_CMDLINE_ARGS,
            history_len: HISTORY_LEN,
        }
    }
}

/// Result of one console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleResult {
    /// Nothing to print
    Continue,
    /// Command succeeded with output
    Output(String),
    /// Command ran and returned a non-zero code
    Failed { output: String, code: i32 },
    /// First word is not a registered command
    Unrecognized,
    /// Line could not be handed to a command at all
    Error(String),
    Exit,
}

/// Line-oriented command interpreter bound to one servo
pub struct Console {
    servo: ServoHandle,
    network: Option<Arc<dyn NetworkStatus>>,
    config: ConsoleConfig,
    history: VecDeque<String>,
    running: bool,
    exit_requested: bool,
}

impl Console {
    pub fn new(servo: ServoHandle) -> Self {
        Self::with_config(servo, ConsoleConfig::default())
    }

    pub fn with_config(servo: ServoHandle, config: ConsoleConfig) -> Self {
        Self {
            servo,
            network: None,
            config,
            history: VecDeque::new(),
            running: true,
            exit_requested: false,
        }
    }

    /// Attaches the interface reported by `get_ip`
    pub fn with_network(mut self, network: Arc<dyn NetworkStatus>) -> Self {
        self.network = Some(network);
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once `quit` was entered, as opposed to input running out
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Runs the read loop until `quit` or end of input.
    ///
    /// A line that is not valid UTF-8 is reported and skipped; only an I/O
    /// error from `input` or `output` ends the loop with an error.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: W) -> io::Result<()> {
        let result = self.read_loop(input, output);
        self.running = false;
        result
    }

    fn read_loop<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        writeln!(output)?;
        writeln!(output, "Type 'help' to list commands.")?;

        while self.running {
            write!(output, "{}", self.config.prompt)?;
            output.flush()?;

            let mut raw = Vec::new();
            if input.read_until(b'\n', &mut raw)? == 0 {
                debug!("console input closed");
                break;
            }

            let result = match std::str::from_utf8(&raw) {
                Ok(line) => self.process_line(line),
                Err(e) => {
                    warn!(len = raw.len(), "dropping console line with invalid UTF-8");
                    ConsoleResult::Error(ConsoleError::InvalidUtf8(e.valid_up_to()).to_string())
                }
            };

            match result {
                ConsoleResult::Continue => {}
                ConsoleResult::Output(text) => writeln!(output, "{}", text)?,
                ConsoleResult::Failed { output: text, code } => {
                    if !text.is_empty() {
                        writeln!(output, "{}", text)?;
                    }
                    writeln!(output, "Command returned non-zero error code: 0x{:x}", code)?;
                }
                ConsoleResult::Unrecognized => writeln!(output, "Unrecognized command")?,
                ConsoleResult::Error(e) => writeln!(output, "Internal error: {}", e)?,
                ConsoleResult::Exit => break,
            }
        }

        Ok(())
    }

    /// Parses and executes one input line
    pub fn process_line(&mut self, line: &str) -> ConsoleResult {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return ConsoleResult::Continue;
        }

        self.remember(line);

        let argv = match self.split(line) {
            Ok(argv) => argv,
            Err(e) => return ConsoleResult::Error(e.to_string()),
        };
        let Some(name) = argv.first() else {
            return ConsoleResult::Continue;
        };
        if !ConsoleCommand::is_registered(name) {
            return ConsoleResult::Unrecognized;
        }

        match ConsoleCommand::try_parse_from(&argv) {
            Ok(cmd) => self.execute(cmd),
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ConsoleResult::Output(e.render().to_string().trim_end().to_string())
                }
                _ => ConsoleResult::Failed {
                    output: e.render().to_string().trim_end().to_string(),
                    code: 1,
                },
            },
        }
    }

    fn split(&self, line: &str) -> Result<Vec<String>, ConsoleError> {
        if line.len() > self.config.max_line_len {
            return Err(ConsoleError::LineTooLong {
                len: line.len(),
                max: self.config.max_line_len,
            });
        }
        let argv = split_argv(line)?;
        if argv.len() > self.config.max_args {
            return Err(ConsoleError::TooManyArguments {
                count: argv.len(),
                max: self.config.max_args,
            });
        }
        Ok(argv)
    }

    fn remember(&mut self, line: &str) {
        if self.config.history_len == 0 {
            return;
        }
        while self.history.len() >= self.config.history_len {
            self.history.pop_front();
        }
        self.history.push_back(line.to_string());
    }

    /// Executes an already parsed command
    pub fn execute(&mut self, cmd: ConsoleCommand) -> ConsoleResult {
        match cmd {
            ConsoleCommand::Servo { angle } => self.cmd_servo(angle),
            ConsoleCommand::ServoSmooth { angle, step_delay } => self.cmd_servo_smooth(angle, step_delay),
            ConsoleCommand::Info => self.cmd_info(),
            ConsoleCommand::GetIp => self.cmd_get_ip(),
            ConsoleCommand::History => self.cmd_history(),
            ConsoleCommand::Help => ConsoleResult::Output(ConsoleCommand::help_text()),
            ConsoleCommand::Quit => {
                self.running = false;
                self.exit_requested = true;
                ConsoleResult::Exit
            }
        }
    }

    /// Applies the clamp policy; `Err` carries the rejection message
    fn check_angle(&self, angle: i32) -> Result<(), String> {
        match self.config.policy {
            ClampPolicy::Clamp => Ok(()),
            ClampPolicy::Reject => Angle::try_from_degrees(angle)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }

    fn cmd_servo(&mut self, angle: i32) -> ConsoleResult {
        if let Err(reason) = self.check_angle(angle) {
            warn!(angle, "console angle rejected");
            return ConsoleResult::Failed { output: reason, code: 1 };
        }

        let mut out = format!("Setting servo to {} degrees", angle);
        match self.servo.set_angle(angle) {
            Ok(applied) => {
                if applied.degrees() != angle {
                    out.push_str(&format!("\nClamped to {}", applied));
                }
                ConsoleResult::Output(out)
            }
            Err(e) => {
                error!(error = %e, "servo command failed");
                out.push_str(&format!("\nServo error: {}", e));
                ConsoleResult::Failed { output: out, code: 1 }
            }
        }
    }

    fn cmd_servo_smooth(&mut self, angle: i32, step_delay: u32) -> ConsoleResult {
        if let Err(reason) = self.check_angle(angle) {
            warn!(angle, "console angle rejected");
            return ConsoleResult::Failed { output: reason, code: 1 };
        }

        let current = match self.servo.current_angle() {
            Ok(current) => current,
            Err(e) => return ConsoleResult::Error(e.to_string()),
        };
        let mut out = format!(
            "Moving servo smoothly from {}° to {}° with step delay {} ms",
            current.degrees(),
            angle,
            step_delay
        );

        match self.servo.smooth_move_to(angle, step_delay) {
            Ok(MoveOutcome::Completed(_)) => ConsoleResult::Output(out),
            Ok(MoveOutcome::Preempted { at }) => {
                out.push_str(&format!("\nMove interrupted at {} by another command", at));
                ConsoleResult::Output(out)
            }
            Err(e) => {
                error!(error = %e, "smooth move failed");
                out.push_str(&format!("\nServo error: {}", e));
                ConsoleResult::Failed { output: out, code: 1 }
            }
        }
    }

    fn cmd_info(&self) -> ConsoleResult {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        ConsoleResult::Output(format!(
            "This is a {} host running {} with {} CPU cores",
            std::env::consts::ARCH,
            std::env::consts::OS,
            cores
        ))
    }

    fn cmd_get_ip(&self) -> ConsoleResult {
        let station = self.network.as_ref().and_then(|n| n.station());
        match station {
            None => ConsoleResult::Failed {
                output: "Interface not found".into(),
                code: 1,
            },
            Some(station) => match station.ip {
                Some(ip) => ConsoleResult::Output(ip.to_string()),
                None => ConsoleResult::Output("No IP address".into()),
            },
        }
    }

    fn cmd_history(&self) -> ConsoleResult {
        let lines: Vec<String> = self
            .history
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:4}  {}", i + 1, line))
            .collect();
        ConsoleResult::Output(lines.join("\n"))
    }
}
