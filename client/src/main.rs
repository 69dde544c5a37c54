use clap::Parser;
use client::network::Client;
use log::info;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IPv4 or IPv6 address
    address: IpAddr,

    /// Server port
    port: u16,

    /// Draw the arena after every snapshot
    #[arg(short, long)]
    render: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Controls: type Up/Down/Left/Right (or w/a/s/d) and press Enter, QUIT to leave");

    let mut client = Client::new(SocketAddr::new(args.address, args.port), args.render).await?;

    client.run().await?;

    Ok(())
}
