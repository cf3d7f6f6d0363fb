use aprs::aprs_is::{self, CancelToken, Login};
use aprs::{passcode, Address};
use chrono::prelude::*;
use std::env;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 5 {
        println!(
            "Usage: {} <server> <callsign> [filter] [seconds]",
            args[0]
        );
        println!("where server is something like rotate.aprs.net:14580");
        println!("and filter is something like r/35.7/-78.7/50");
        std::process::exit(1);
    }

    let callsign = args[2].parse::<Address>()?;
    let mut login = Login::new(callsign, passcode::UNVERIFIED);
    if let Some(filter) = args.get(3) {
        login = login.filter(filter);
    }
    let seconds: u64 = match args.get(4) {
        Some(s) => s.parse()?,
        None => 60,
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            cancel.cancel();
        });
    }

    for frame in aprs_is::receive(&args[1], login, cancel) {
        let frame = frame?;
        println!("{}", Local::now());
        println!("{}", frame);
    }
    Ok(())
}
