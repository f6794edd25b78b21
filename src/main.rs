#[macro_use]
extern crate log;

use std::io::{self, BufRead};
use std::process;
use std::sync::Arc;
use std::thread;

use cast_client::RequestIds;
use cast_trigger::config::Settings;
use cast_trigger::discovery::MdnsBrowser;
use cast_trigger::host::{Envelope, Stdout};
use cast_trigger::operation::{Context, TlsConnect};
use cast_trigger::plugin::Plugin;
use futures::future;
use futures::prelude::*;
use futures::sync::mpsc::{unbounded, UnboundedSender};
use tokio::runtime::Runtime;

/// Forward stdin lines until stdin closes or the receiver is dropped.
fn read_stdin(lines: UnboundedSender<String>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if lines.unbounded_send(line).is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!("Error reading stdin: {}", err);
                break;
            }
        }
    }
    debug!("stdin closed");
}

fn main() {
    env_logger::init();
    let mut rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Could not start tokio runtime: {}", err);
            process::exit(1);
        }
    };
    let context = Context {
        browser: Arc::new(MdnsBrowser),
        connector: Arc::new(TlsConnect),
        emitter: Arc::new(Stdout),
        requests: RequestIds::default(),
        settings: Settings::default(),
    };
    let (lines_tx, lines_rx) = unbounded();
    let reader = thread::Builder::new()
        .name("stdin".to_owned())
        .spawn(move || read_stdin(lines_tx));
    if let Err(err) = reader {
        eprintln!("Could not read stdin: {}", err);
        process::exit(1);
    }

    let host = future::lazy(move || {
        let (plugin, pump) = Plugin::new(context);
        tokio::spawn(pump);
        lines_rx
            .filter_map(|line| Envelope::parse(&line))
            .for_each(move |envelope| plugin.handle(envelope))
    });
    debug!("spawn tokio runloop");
    rt.spawn(host);
    if rt.shutdown_on_idle().wait().is_err() {
        warn!("tokio runloop did not shut down cleanly");
    }
    debug!("tokio runloop completed");
}
