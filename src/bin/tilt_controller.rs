/**
 * Tilt Controller Binary
 *
 * Runs the tilt-to-motor pipeline:
 * 1. Reads gravity/magnetic vectors from a serial IMU (or the console)
 * 2. Converts orientation into a differential-drive motor pair
 * 3. Streams "<a>,<b>" datagrams to the robot while the session is active
 *
 * Usage: tilt_controller [--serial /dev/ttyACM0] [--baud 9600] [--connect HOST]
 */

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tiltdrive::sensor::serial::{stop_source, SerialImuSource};
use tiltdrive::{Config, SensorHub, SensorKind, TickOutcome, TiltController, Vector3};

/// Tilt-to-motor-command controller
#[derive(Parser)]
#[command(name = "tilt_controller")]
#[command(about = "Streams differential-drive commands derived from device tilt over UDP")]
#[command(version)]
struct Cli{
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Serial device delivering IMU frames (overrides TILTDRIVE_SERIAL_PORT)
    #[arg(short, long)]
    serial: Option<String>,

    /// Serial baud rate (overrides TILTDRIVE_BAUD)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Robot UDP port used when the address carries none (overrides TILTDRIVE_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Initial sensitivity, 0.0 to 4.0 (overrides TILTDRIVE_SENSITIVITY)
    #[arg(long)]
    sensitivity: Option<f32>,

    /// Start sending to this robot address right away
    #[arg(short, long)]
    connect: Option<String>,
}

fn main() -> Result<()>{
    let cli = Cli::parse();

    let filter = if cli.verbose{
        EnvFilter::new("debug")
    }else{
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(port) = cli.port{
        config.port = port;
    }
    if let Some(baud) = cli.baud{
        config.baud_rate = baud;
    }
    if cli.serial.is_some(){
        config.serial_port = cli.serial.clone();
    }

    let hub = Arc::new(SensorHub::new());
    let controller = Arc::new(
        TiltController::new(Arc::clone(&hub), &config).context("failed to start transmit workers")?
    );
    if let Some(sensitivity) = cli.sensitivity{
        controller.set_sensitivity(sensitivity)?;
    }

    info!(port = config.port, sensitivity = controller.session().snapshot().sensitivity, "tilt controller ready");

    let serial = match &config.serial_port{
        Some(port_name) =>{
            let source = SerialImuSource::open(port_name, config.baud_rate)
                .with_context(|| format!("failed to open serial port {}", port_name))?;
            let ctrl = Arc::clone(&controller);
            Some(source.start(Arc::clone(&hub), move ||{
                ctrl.tick();
            }))
        }
        None =>{
            info!("no serial IMU configured, feed samples with 'g x y z' / 'm x y z'");
            None
        }
    };

    if let Some(target) = &cli.connect{
        controller.start(target)?;
    }

    println!("\n[Commands]");
    println!("  start <host[:port]> - begin sending");
    println!("  stop                - stop sending");
    println!("  sens <0.0-4.0>      - set sensitivity");
    println!("  g <x> <y> <z>       - gravity sample");
    println!("  m <x> <y> <z>       - magnetic sample");
    println!("  reset               - idle, default sensitivity, forget samples");
    println!("  status              - session and link counters");
    println!("  x                   - exit\n");

    run_console(&controller)?;

    controller.stop();
    if let Some((handle, running)) = serial{
        stop_source(&running);
        if handle.join().is_err(){
            warn!("serial reader panicked");
        }
    }

    match Arc::try_unwrap(controller){
        Ok(controller) =>{
            let stats = controller.shutdown();
            info!(sent = stats.sent, failed = stats.failed, dropped = stats.dropped, "shutdown complete");
        }
        Err(_) => warn!("controller still shared at exit"),
    }
    Ok(())
}

fn run_console(controller: &TiltController<Arc<SensorHub>>) -> Result<()>{
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop{
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else{
            return Ok(());
        };
        let line = line?;
        let mut parts = line.split_whitespace();

        match parts.next(){
            Some("start") =>{
                let target = parts.collect::<Vec<_>>().join(" ");
                match controller.start(&target){
                    Ok(endpoint) => println!("[SENDING] {}", endpoint),
                    Err(e) => println!("[REJECTED] {}", e),
                }
            }
            Some("stop") =>{
                controller.stop();
                println!("[STOPPED]");
            }
            Some("reset") =>{
                controller.reset();
                println!("[RESET]");
            }
            Some("sens") =>{
                match parts.next().map(str::parse::<f32>){
                    Some(Ok(value)) => match controller.set_sensitivity(value){
                        Ok(()) => println!("[SENSITIVITY {:.1}]", value),
                        Err(e) => println!("[REJECTED] {}", e),
                    },
                    _ => println!("usage: sens <value>"),
                }
            }
            Some(kind @ ("g" | "m")) =>{
                let values: Vec<f32> = parts.filter_map(|p| p.parse().ok()).collect();
                if values.len() != 3{
                    println!("usage: {} <x> <y> <z>", kind);
                    continue;
                }
                let kind = if kind == "g"{ SensorKind::Gravity }else{ SensorKind::Magnetic };
                match controller.on_sample(kind, Vector3::new(values[0], values[1], values[2])){
                    TickOutcome::Dispatched{ estimate, command, queued, .. } =>{
                        println!("[TICK] pitch={:.1}° roll={:.1}° -> {},{}{}",
                            estimate.pitch, estimate.roll, command.motor_a, command.motor_b,
                            if queued{ "" }else{ " (dropped)" });
                    }
                    other => println!("[TICK] {:?}", other),
                }
            }
            Some("status") | Some("r") =>{
                let state = controller.session().snapshot();
                let status = controller.status();
                let stats = controller.dispatch_stats();
                let color = status.indicator_color();
                println!("[STATUS] mode={:?} sensitivity={:.1} target={} intensity={} color=#{:02x}{:02x}{:02x}",
                    state.mode, state.sensitivity,
                    state.endpoint.map(|e| e.to_string()).unwrap_or_else(|| "-".into()),
                    status.intensity, color.r, color.g, color.b);
                println!("[LINK] sent={} failed={} dropped={}", stats.sent, stats.failed, stats.dropped);
            }
            Some("x") | Some("exit") | Some("quit") =>{
                println!("[SHUTDOWN]");
                return Ok(());
            }
            None => {}
            Some(other) => println!("Unknown command: {}", other),
        }
    }
}
