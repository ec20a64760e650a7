use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use voice_assist::api::ApiServer;
use voice_assist::navigation::{ConsoleNavigator, SystemBrowser};
use voice_assist::voice::{
    AudioCapture, AudioPlayback, CaptureDevice, ConsoleCapture, ConsoleSpeaker, MicCapture,
    OPENAI_VOICES, Speaker, SpeechToText, SynthSpeaker, TextToSpeech, VoiceSelector, decode_mp3,
};
use voice_assist::{Assistant, BackendClient, Config, Interpreter, LocalCache, Navigator, db};

/// Voice assistant - speak commands to open sites and play songs
#[derive(Parser)]
#[command(name = "voice-assist", version, about)]
struct Cli {
    /// Type commands instead of speaking them
    #[arg(long, conflicts_with = "mic")]
    console: bool,

    /// Listen on the microphone (default when voice is available)
    #[arg(long)]
    mic: bool,

    /// Print URLs instead of opening them in a browser
    #[arg(long)]
    no_browser: bool,

    /// Disable microphone input and synthesized speech
    #[arg(long, env = "VOICE_ASSIST_DISABLE_VOICE")]
    disable_voice: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the command persistence API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Forget the cached user name
    Logout,
    /// Show the cached user name and device id
    Whoami,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test synthesized speech
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,voice_assist=info",
        1 => "info,voice_assist=debug",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so console mode keeps stdout for the conversation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_with_options(cli.disable_voice)?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Serve { port } => serve(&config, port).await,
            Command::Logout => logout(&config),
            Command::Whoami => whoami(&config).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
        };
    }

    let cache = LocalCache::new(db::init(config.cache_db_path())?);

    let capture = build_capture(&config, &cli)?;
    let speaker = build_speaker(&config);
    let navigator = build_navigator(cli.no_browser);

    let mut assistant = Assistant::new(
        Interpreter::new(config.assistant.command_options()),
        capture,
        speaker,
        navigator,
        cache.clone(),
    )?
    .with_rearm_delay(config.assistant.rearm_delay);

    if config.backend.enabled {
        let backend = BackendClient::new(&config.backend.url, cache.device_id()?)?;
        tracing::info!(url = %config.backend.url, "reporting commands to backend");
        assistant = assistant.with_backend(backend);
    }

    let session = assistant.run().await?;
    tracing::info!(user = ?session.user_name, "assistant stopped");

    Ok(())
}

/// Pick typed or spoken input
fn build_capture(config: &Config, cli: &Cli) -> anyhow::Result<Box<dyn CaptureDevice>> {
    if cli.console {
        return Ok(Box::new(ConsoleCapture::stdin()));
    }

    let api_key = config.api_keys.openai.clone();
    let use_mic = cli.mic || (config.voice.enabled && api_key.is_some());

    if !use_mic {
        tracing::info!("voice input unavailable, reading commands from stdin");
        return Ok(Box::new(ConsoleCapture::stdin()));
    }

    let api_key = api_key.context("OPENAI_API_KEY is required for microphone input")?;
    let stt = SpeechToText::new_whisper(api_key, config.voice.stt_model.clone())?
        .with_language(config.voice.language.clone());

    Ok(Box::new(MicCapture::new(stt)))
}

/// Pick synthesized or printed speech
fn build_speaker(config: &Config) -> Box<dyn Speaker> {
    match (config.voice.enabled, config.api_keys.openai.clone()) {
        (true, Some(api_key)) => match synth_speaker(config, api_key) {
            Ok(speaker) => Box::new(speaker),
            Err(e) => {
                tracing::warn!(error = %e, "speech output unavailable, printing responses");
                Box::new(ConsoleSpeaker)
            }
        },
        _ => Box::new(ConsoleSpeaker),
    }
}

fn synth_speaker(config: &Config, api_key: SecretString) -> anyhow::Result<SynthSpeaker> {
    let voice = VoiceSelector::new(config.voice.preferences.clone())
        .select(OPENAI_VOICES)
        .context("no synthesis voice available")?;

    let tts = TextToSpeech::new_openai(
        api_key,
        voice.name.to_string(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?;

    Ok(SynthSpeaker::new(tts, AudioPlayback::new()?))
}

fn build_navigator(no_browser: bool) -> Box<dyn Navigator> {
    if no_browser {
        return Box::new(ConsoleNavigator);
    }

    match SystemBrowser::new() {
        Ok(browser) => Box::new(browser),
        Err(e) => {
            tracing::warn!(error = %e, "no browser opener found, printing URLs");
            Box::new(ConsoleNavigator)
        }
    }
}

/// Run the persistence API until interrupted
async fn serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let pool = db::init(config.server_db_path())?;
    let port = port.unwrap_or(config.api_server.port);

    ApiServer::new(pool, port).run().await?;
    Ok(())
}

/// Forget the cached user name
fn logout(config: &Config) -> anyhow::Result<()> {
    let cache = LocalCache::new(db::init(config.cache_db_path())?);

    match cache.user_name()? {
        Some(name) => {
            cache.clear_user_name()?;
            println!("Logged out {name}");
        }
        None => println!("Nobody is logged in"),
    }

    Ok(())
}

/// Show the cached user name, device id and what the backend has recorded
async fn whoami(config: &Config) -> anyhow::Result<()> {
    let cache = LocalCache::new(db::init(config.cache_db_path())?);
    let device_id = cache.device_id()?;

    println!("User:      {}", cache.user_name()?.as_deref().unwrap_or("(none)"));
    println!("Device ID: {device_id}");

    if !config.backend.enabled {
        println!("Backend:   disabled");
        return Ok(());
    }
    println!("Backend:   {}", config.backend.url);

    match BackendClient::new(&config.backend.url, device_id)?.fetch_user().await {
        Ok(Some(user)) => {
            println!("Recorded:  {} ({} commands)", user.name, user.commands.len());
            if let Some(last) = user.last_command {
                println!("Last:      {last}");
            }
        }
        Ok(None) => println!("Recorded:  (not registered)"),
        Err(e) => println!("Recorded:  (unreachable: {e})"),
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If the meter moved while you spoke, your mic is working.");
    println!("Speech is detected above an RMS of 0.03.");

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test synthesized speech end to end
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let api_key = config
        .api_keys
        .openai
        .clone()
        .context("OPENAI_API_KEY is required for speech synthesis")?;

    let voice = VoiceSelector::new(config.voice.preferences.clone())
        .select(OPENAI_VOICES)
        .context("no synthesis voice available")?;
    println!("Speaking with voice \"{}\": \"{text}\"", voice.name);

    let tts = TextToSpeech::new_openai(
        api_key,
        voice.name.to_string(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?;

    let mp3 = tts.synthesize(text).await?;
    let samples = decode_mp3(&mp3)?;
    println!("Got {} bytes of audio ({} samples)", mp3.len(), samples.len());

    let playback = AudioPlayback::new()?;
    tokio::task::spawn_blocking(move || {
        playback.play_blocking(samples, &std::sync::atomic::AtomicBool::new(false))
    })
    .await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
