//! Servo firmware
//!
//! Brings the system up in the order the hardware needs it: servo PWM,
//! WiFi station, HTTP server, then the interactive console on the main
//! thread while the server answers requests on the tokio runtime.
//!
//! ## Environment Variables
//! - `SERVO_HOST` / `SERVO_PORT`: HTTP bind address (default: 0.0.0.0:8080)
//! - `SERVO_WIFI_SSID` / `SERVO_WIFI_PASS`: station credentials, also read at build time
//! - `SERVO_GPIO`: servo signal pin (default: 15)
//! - `SERVO_API_RATE_LIMIT`, `SERVO_API_RATE_BURST`, `SERVO_API_RATE_ENABLED`: HTTP rate limiting
//! - `RUST_LOG`: log filter

mod args;
mod network;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use servo_actuator::{ServoDriver, ServoHandle, SimulatedLedc};
use servo_api::AppState;
use servo_console::Console;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;
use network::Station;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "servo_firmware=info,servo_api=info,servo_actuator=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    // Servo first: without PWM there is nothing to serve
    let driver = ServoDriver::with_config(SimulatedLedc::new(), args.servo_config())
        .context("invalid servo configuration")?;
    let servo = ServoHandle::new(driver);
    servo.configure().context("servo PWM configuration failed")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("servo-http")
        .build()
        .context("failed to start async runtime")?;

    let addr = args.bind_addr();
    let listener = runtime
        .block_on(TcpListener::bind(&addr))
        .with_context(|| format!("failed to bind HTTP server to {}", addr))?;
    let local_addr = listener.local_addr()?;

    let station = Arc::new(Station::new(args.wifi_config()));
    station.join(local_addr.ip());
    info!(link = ?station.link(), "network ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (stopped_tx, stopped_rx) = watch::channel(false);

    let app = servo_api::build_app(AppState::new(servo.clone()), &args.api_config());
    let server = runtime.spawn(async move {
        let result = servo_api::serve(listener, app, wait_for(shutdown_rx)).await;
        let _ = stopped_tx.send(true);
        result
    });

    runtime.spawn(on_interrupt(servo.clone(), shutdown_tx.clone(), stopped_rx));

    if args.no_console {
        info!("console disabled, serving HTTP only");
    } else {
        let mut console = Console::with_config(servo.clone(), args.console_config())
            .with_network(station.clone());
        if let Err(e) = console.run(io::stdin().lock(), io::stdout()) {
            error!(error = %e, "console I/O failed, HTTP server keeps running");
        } else if console.exit_requested() {
            info!("console quit, shutting down");
            let _ = shutdown_tx.send(true);
        } else {
            info!("console input closed, HTTP server keeps running");
        }
    }

    runtime
        .block_on(server)
        .context("HTTP server task failed")?
        .context("HTTP server error")?;

    servo.emergency_stop().context("failed to release servo")?;
    Ok(())
}

/// Resolves once `true` is sent or every sender is gone
async fn wait_for(mut flag: watch::Receiver<bool>) {
    while !*flag.borrow_and_update() {
        if flag.changed().await.is_err() {
            return;
        }
    }
}

/// On Ctrl-C: cut the PWM output, stop the server and leave, even if the
/// console is still blocked reading input
async fn on_interrupt(servo: ServoHandle, shutdown: watch::Sender<bool>, stopped: watch::Receiver<bool>) {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("cannot listen for Ctrl-C");
        return;
    }

    warn!("interrupt received, stopping servo");
    if let Err(e) = servo.emergency_stop() {
        error!(error = %e, "emergency stop failed");
    }

    let _ = shutdown.send(true);
    wait_for(stopped).await;
    std::process::exit(130);
}
