use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use roombot::api::RoomApiClient;
use roombot::bot::Bot;
use roombot::config::Config;

/// Room bot - chat command dispatcher for virtual-room platforms
#[derive(Parser, Debug)]
#[command(name = "roombot", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Room to join (overrides the config file)
    #[arg(short, long)]
    room: Option<String>,

    /// Base URL of the room platform API
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding the persisted JSON collections
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")] // Events arrive one at a time
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default_for_room(args.room.clone().unwrap_or_default()),
    };
    if let Some(room) = args.room {
        config.room_id = room;
    }
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if config.room_id.is_empty() {
        return Err("a room id is required (--room or the config file)".into());
    }

    let token = std::env::var("ROOMBOT_TOKEN")
        .map_err(|_| "ROOMBOT_TOKEN environment variable is required")?;
    let web_api_key = std::env::var("ROOMBOT_API_KEY").ok();

    info!(
        room_id = %config.room_id,
        api_url = %config.api_url,
        data_dir = %config.data_dir.display(),
        "🤖 roombot starting"
    );

    let client = RoomApiClient::new(&config, token, web_api_key);
    let bot = Bot::new(config);
    bot.run(client).await
}
