use aprs::payload::Wx;
use aprs::tnc::{self, TncAddress};
use aprs::{aprs_is, passcode, Address, Frame, Path};
use chrono::prelude::*;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 6 {
        println!(
            "Usage: {} <destination> <source-callsign> <lat> <lon> <temperature-f>",
            args[0]
        );
        println!("where destination is something like");
        println!("  tcp://cwop.aprs.net:14580");
        println!("  http://rotate.aprs.net:8080/");
        println!("  tnc:tcpkiss:192.168.0.1:8001");
        std::process::exit(1);
    }

    let source = args[2].parse::<Address>()?;
    let mut wx = Wx::new(args[3].parse::<f64>()?, args[4].parse::<f64>()?, Utc::now());
    wx.temperature = Some(args[5].parse::<i16>()?);

    if args[1].starts_with("tnc:") {
        let addr = args[1].parse::<TncAddress>()?;
        let frame = Frame::new(
            source,
            "APRS".parse::<Address>()?,
            "WIDE2-1".parse::<Path>()?,
            wx.to_string(),
        );
        tnc::send_kiss((addr.host.as_str(), addr.port), &frame, 0)?;
        println!("{} transmitted {}", Local::now(), frame);
    } else {
        let pass = passcode::generate(&source.callsign);
        let frame = Frame::new(
            source,
            "APRS".parse::<Address>()?,
            Path::from(vec!["TCPIP*".parse::<Address>()?]),
            wx.to_string(),
        );
        aprs_is::send(&args[1], &frame, pass.into())?;
        println!("{} sent {}", Local::now(), frame);
    }
    Ok(())
}
