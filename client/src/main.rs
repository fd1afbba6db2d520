use clap::Parser;
use log::info;
use macroquad::prelude::*;

use client::app::App;
use client::assets::{FrameLoader, TextureLoader};
use client::network::SyncChannel;
use client::scheduler::RenderScheduler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:9000")]
    server: String,

    /// Display name sent with the join request
    #[arg(short = 'u', long, default_value = "Sean")]
    username: String,

    /// Background image covering the world
    #[arg(long, default_value = "world.jpg")]
    world_image: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "World Viewer".to_owned(),
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("connecting to {}", args.server);
    info!("controls: arrow keys to move");

    let scheduler = RenderScheduler::new();
    let loader = TextureLoader::new(scheduler.dirty_flag());
    let background = loader.load(&args.world_image);
    let channel = SyncChannel::connect(&args.server);

    let mut app = App::new(channel, scheduler, background, args.username);

    loop {
        app.pump_network(&loader);
        app.poll_keys();
        app.frame();
        next_frame().await;
    }
}
