//! Console command table and argument splitting
//!
//! Each console command is a clap subcommand of a multicall parser, so the
//! first word of the line selects the command and clap validates the rest.

use clap::{CommandFactory, Parser};
use crate::error::ConsoleError;

/// Longest accepted input line (bytes)
pub const MAX_CMDLINE_LENGTH: usize = 256;

/// Most words accepted on one line, command name included
pub const MAX_CMDLINE_ARGS: usize = 8;

/// Commands understood by the console
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(multicall = true, disable_help_subcommand = true)]
pub enum ConsoleCommand {
    /// Set servo angle (0-180)
    Servo {
        /// Angle 0-180 degrees
        #[arg(value_name = "angle", allow_negative_numbers = true)]
        angle: i32,
    },

    /// Move servo smoothly to target angle (0-180)
    #[command(name = "servo_smooth")]
    ServoSmooth {
        /// Target angle 0-180 degrees
        #[arg(value_name = "angle", allow_negative_numbers = true)]
        angle: i32,

        /// Step delay in ms
        #[arg(value_name = "step_delay")]
        step_delay: u32,
    },

    /// Print system information
    Info,

    /// Show the current IP address
    #[command(name = "get_ip")]
    GetIp,

    /// Show previously entered commands
    History,

    /// List all registered commands
    Help,

    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

impl ConsoleCommand {
    /// Whether `name` is a registered command or alias
    pub fn is_registered(name: &str) -> bool {
        Self::command().find_subcommand(name).is_some()
    }

    /// `help` listing: one entry per command with its arguments
    pub fn help_text() -> String {
        let cmd = Self::command();
        let mut out = String::new();

        for sub in cmd.get_subcommands() {
            let mut line = sub.get_name().to_string();
            for arg in sub.get_positionals() {
                let value = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| arg.get_id().to_string());
                line.push_str(&format!("  <{}>", value));
            }
            out.push_str(&line);
            out.push('\n');
            if let Some(about) = sub.get_about() {
                out.push_str(&format!("  {}\n", about));
            }
            for arg in sub.get_positionals() {
                if let Some(help) = arg.get_help() {
                    let value = arg
                        .get_value_names()
                        .and_then(|names| names.first())
                        .map(|name| name.to_string())
                        .unwrap_or_default();
                    out.push_str(&format!("    <{}>  {}\n", value, help));
                }
            }
            out.push('\n');
        }

        out.trim_end().to_string()
    }
}

/// Splits a command line into words.
///
/// Words are separated by whitespace. Double quotes group words and a
/// backslash escapes the next character. Length limits are left to the
/// caller.
pub fn split_argv(line: &str) -> Result<Vec<String>, ConsoleError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    in_word = true;
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                in_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_quotes {
        return Err(ConsoleError::UnbalancedQuote);
    }
    if in_word {
        args.push(current);
    }

    Ok(args)
}
