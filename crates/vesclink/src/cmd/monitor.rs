use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use tracing::{debug, warn};
use vesclink_packet::Packet;

use crate::cmd::{parse_duration, MonitorArgs};
use crate::exit::{interface_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let mut iface = args.connect.connect()?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    iface.set_packet_handler(move |packet| {
        if matches!(packet, Packet::Telemetry(_)) {
            let _ = tx.send(packet);
        }
    });
    iface.set_error_handler(|message| warn!(%message, "receive error"));

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        iface
            .request_state()
            .map_err(|err| interface_error("request failed", err))?;

        match rx.recv_timeout(interval) {
            Ok(packet) => {
                print_packet(&packet, format);
                printed = printed.saturating_add(1);
                if let Some(count) = args.count {
                    if printed >= count {
                        break;
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                debug!(?interval, "no telemetry reply");
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    iface
        .disconnect()
        .map_err(|err| interface_error("disconnect failed", err))?;
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
