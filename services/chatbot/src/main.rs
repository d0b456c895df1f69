use anyhow::{Context, Result};
use chatbot_core::{Backends, TurnOrchestrator};
use chatbot_service::config::Config;
use chatbot_service::file_adapter::FileSpeechAdapter;
use chatbot_service::gemini_adapter::GeminiAdapter;
use chatbot_service::microphone_adapter::{CpalRecorder, MicrophoneAdapter};
use chatbot_service::repl::{self, Flow, Repl};
use chatbot_service::search_adapter::SearchAdapter;
use clap::Parser;
use cloud_speech::SpeechClient;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "A terminal chat client for Google's Gemini API")]
struct Cli {
    /// Name of the audio input device used for /mic (defaults to the system default)
    #[arg(long)]
    device: Option<String>,
    /// Print the available audio input devices and exit
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // Device listing needs no credentials.
    if args.list_devices {
        let devices = chatbot_native_utils::device::get_available_inputs()
            .context("Failed to list audio input devices")?;
        println!("{devices}");
        return Ok(());
    }

    // --- 2. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 3. Initialize Logging ---
    // Logs go to stderr so the chat on stdout stays readable.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting chatbot...");

    // --- 4. Initialize Adapters ---
    let Config {
        gemini,
        speech,
        listen,
        search,
        ..
    } = config;
    tracing::info!("Using model {} at {}", gemini.model, gemini.base_url);

    let speech_client = Arc::new(SpeechClient::with_base_url(
        speech.credential,
        &speech.base_url,
    ));
    let recorder = Arc::new(CpalRecorder::new(args.device, listen));

    let backends = Backends {
        text: Box::new(GeminiAdapter::new(gemini)),
        microphone: Box::new(MicrophoneAdapter::new(
            recorder,
            Arc::clone(&speech_client),
            &speech.language_code,
        )),
        file: Box::new(FileSpeechAdapter::new(
            speech_client,
            &speech.language_code,
            speech.upload_sample_rate,
        )),
        search: Box::new(SearchAdapter::new(search)),
    };
    let mut session = Repl::new(TurnOrchestrator::new(backends));

    // --- 5. Chat Loop ---
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}\n", repl::banner())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "{}", repl::PROMPT)?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            writeln!(stdout)?;
            break;
        };
        if session.handle_line(&line, &mut stdout).await? == Flow::Quit {
            break;
        }
    }

    tracing::info!(
        "Session ended after {} messages.",
        session.conversation().len()
    );
    Ok(())
}
