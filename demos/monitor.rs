//! Connects to a KISS TNC, prints all traffic, and optionally sends one
//! TEST frame.
//!
//! Usage: `cargo run --example monitor -- MYCALL [host:port] [TARGET]`

use tnc_net::{Address, NetConfig, NetWorker, Notification};

fn main() -> tnc_net::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let our_call: Address = args.next().unwrap_or_else(|| "N0CALL".into()).parse()?;
    let tnc_addr = args.next().unwrap_or_else(|| "127.0.0.1:8001".into());

    let config = NetConfig::new(our_call).with_tnc_addr(&tnc_addr);
    let (worker, notifications) = NetWorker::start(config)?;
    println!("connected to {tnc_addr}");

    if let Some(target) = args.next() {
        worker.handle().send_test(target.parse()?, "Testing from tnc-net");
    }

    for note in notifications {
        match note {
            Notification::Traffic(frame) => println!("{frame}"),
            Notification::Status(msg) => println!("* {msg}"),
            Notification::ModeChanged(name) => println!("* mode now {name}"),
            Notification::LinkError(msg) => {
                eprintln!("link lost: {msg}");
                break;
            }
        }
    }

    worker.shutdown();
    Ok(())
}
