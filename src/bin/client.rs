use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lingolens::client::{
    render_lines, AudioSink, CommandPlayer, CommandSpeech, Preview, SaveToDir, Speaker,
    UploadClient,
};
use lingolens::language::Language;

/// Photograph something, hear it in another language.
#[derive(Debug, Parser)]
#[command(name = "lingolens-client", version)]
struct Args {
    /// Image to translate (JPEG, PNG, GIF, WebP or BMP)
    image: PathBuf,

    /// Target language: en, es, ko, zh or hi
    #[arg(short, long, default_value = "en")]
    language: Language,

    /// Relay base URL
    #[arg(long, env = "LINGOLENS_RELAY_URL", default_value = "http://localhost:3000")]
    relay: String,

    /// Command that plays an MP3 file (path is appended)
    #[arg(long, default_value = "mpg123 -q")]
    player: String,

    /// Save audio clips here instead of playing them
    #[arg(long)]
    save_audio: Option<PathBuf>,

    /// On-device speech command used when the speech relay fails
    #[arg(long, default_value = "espeak-ng -v {code} {text}")]
    fallback_speech: String,

    /// Skip speech entirely
    #[arg(long)]
    mute: bool,

    /// Offer to replay the translation after it is spoken
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingolens=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = UploadClient::new(&args.relay);

    let submission = match client.submit_file(&args.image, args.language).await {
        Ok(submission) => submission,
        Err(e) => {
            error!("Translation failed: {}", e);
            eprintln!("Translation failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Preview: {}",
        Preview {
            source: &args.image,
            image: &submission.image,
        }
    );
    for line in render_lines(&submission.result) {
        println!("{}", line);
    }

    if args.mute {
        return Ok(());
    }

    let sink: Arc<dyn AudioSink> = match &args.save_audio {
        Some(dir) => Arc::new(SaveToDir::new(dir)),
        None => Arc::new(CommandPlayer::new(&args.player)?),
    };
    let fallback = Arc::new(CommandSpeech::new(&args.fallback_speech)?);
    let speaker = Speaker::new(client, sink, fallback);

    let playback = speaker.speak(&submission.result);

    if args.interactive {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Press Enter to play again, q to quit.");
        while let Some(line) = lines.next_line().await? {
            if line.trim().eq_ignore_ascii_case("q") {
                break;
            }
            let outcome = speaker.speak(&submission.result).await?;
            info!("Replay finished: {:?}", outcome);
        }
    }

    let outcome = playback.await?;
    info!("Speech finished: {:?}", outcome);
    Ok(())
}
