use anyhow::Result;
use tracing_subscriber::EnvFilter;

use trackbridge::{config::Config, models::Track, provider_factory};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        eprintln!("Usage: trackbridge <title> <artist> <duration-seconds>");
        return Ok(());
    }
    let duration: u32 = args[2].parse()?;

    let config = Config::from_env();
    let stack = provider_factory::create_spotify_stack(&config);
    stack.session.spawn_refresh();

    let track = Track::new("cli", args[0].as_str(), vec![args[1].clone()], duration);

    match stack.resolver.resolve_track(&track).await? {
        Some(matched) => {
            println!(
                "Matched: {} - {} ({})",
                matched.title,
                matched.all_artists(),
                Track::format_duration((matched.duration_ms / 1000) as u32),
            );
        }
        None => {
            println!("No match for {} - {}", track.title, track.all_artists());
            return Ok(());
        }
    }

    match stack.lyrics.get_lyrics(&track).await {
        Ok(lyrics) => {
            for line in &lyrics.lines {
                match line.time {
                    Some(time) => println!("[{time:7.2}] {}", line.text),
                    None => println!("{}", line.text),
                }
            }
        }
        Err(e) => eprintln!("{e}"),
    }

    Ok(())
}
