use clap::Parser;
use log::info;
use server::game::{Arena, GameState};
use server::network::Server;
use server::utils::resolve_dimensions;
use shared::MAX_CLIENTS;
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IPv4 or IPv6 address to bind to
    address: IpAddr,

    /// UDP port to listen on
    port: u16,

    /// Arena width (defaults to the terminal width)
    #[arg(long)]
    width: Option<u16>,

    /// Arena height (defaults to the terminal height)
    #[arg(long)]
    height: Option<u16>,

    /// Number of session slots
    #[arg(long, default_value_t = MAX_CLIENTS, value_parser = parse_max_clients)]
    max_clients: usize,

    /// Seed for spawn positions
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_max_clients(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if (1..=MAX_CLIENTS).contains(&count) {
        Ok(count)
    } else {
        Err(format!("must be between 1 and {}", MAX_CLIENTS))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let (width, height) = resolve_dimensions(args.width, args.height);
    info!("width: {}, height: {}", width, height);
    let arena = Arena::new(i32::from(width), i32::from(height))?;

    let game_state = match args.seed {
        Some(seed) => GameState::with_seed(arena, seed),
        None => GameState::new(arena),
    };

    let address = SocketAddr::new(args.address, args.port);
    let mut server = Server::bind(address, game_state, args.max_clients).await?;

    server.run().await?;

    Ok(())
}
