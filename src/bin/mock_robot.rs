/**
 * Mock Robot
 *
 * Stands in for the robot: listens for motor-command datagrams and logs
 * every decoded "<a>,<b>" pair together with its sender.
 *
 * Usage: mock_robot [--port 12345]
 */

use std::net::UdpSocket;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tiltdrive::config::DEFAULT_PORT;
use tiltdrive::transport::decode;

#[derive(Parser)]
#[command(name = "mock_robot")]
#[command(about = "Prints motor commands received over UDP")]
struct Cli{
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn main() -> Result<()>{
    let cli = Cli::parse();

    let filter = if cli.verbose{
        EnvFilter::new("debug")
    }else{
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let socket = UdpSocket::bind(("0.0.0.0", cli.port))
        .with_context(|| format!("failed to bind UDP port {}", cli.port))?;
    info!(port = cli.port, "listening for motor commands");

    let mut buf = [0u8; 4096];
    loop{
        let (n, from) = match socket.recv_from(&mut buf){
            Ok(received) => received,
            Err(e) =>{
                warn!(error = %e, "receive failed");
                continue;
            }
        };

        match decode(&buf[..n]){
            Ok(cmd) => info!(%from, motor_a = cmd.motor_a, motor_b = cmd.motor_b, "command"),
            Err(e) => warn!(%from, error = %e, "rejected datagram"),
        }
    }
}
