//! CLI entry point for the Kokoro TTS server.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kokoro_serve::constants::{DEFAULT_SPEED, DEFAULT_VOICE, SAMPLE_RATE};
use kokoro_serve::environment::{check_mecab, configure_thread_env, setup_mecab_environment};
use kokoro_serve::voice::{CATALOG, SAMPLE_TEXTS};
use kokoro_serve::{EngineConfig, LanguageCode, Runtime, ServerConfig, SynthesisRequest};

#[derive(Parser, Debug)]
#[command(name = "kokoro-serve")]
#[command(about = "Serve Kokoro TTS over HTTP, or synthesize from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (REST API, Swagger UI and web UI)
    Serve(ServerConfig),
    /// Synthesize text into a WAV file
    Synth(SynthArgs),
    /// Print the voice catalog
    Voices,
    /// Check that MeCab can analyze Japanese text
    CheckMecab,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Text to synthesize
    #[arg(short, long)]
    text: String,

    /// Voice name; its prefix selects the language
    #[arg(short, long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Speech speed multiplier (1.0 = normal speed)
    #[arg(short, long, default_value_t = DEFAULT_SPEED)]
    speed: f32,

    /// Single-letter language code overriding voice detection
    #[arg(short, long)]
    language: Option<String>,

    /// Output WAV file path (a temporary file when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kokoro_serve=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn synth(args: SynthArgs) -> Result<()> {
    let language = args
        .language
        .as_deref()
        .map(LanguageCode::from_code)
        .transpose()?;
    let request = SynthesisRequest::new(args.text)
        .voice(args.voice)
        .speed(args.speed)
        .language(language);

    let runtime = Runtime::new(args.engine.loader());
    let path = runtime
        .generate_audio_file(&request, args.output.as_deref())
        .context("Synthesis failed")?;

    let seconds = audio_seconds(&path)?;
    println!("Wrote {:.2}s of audio to {}", seconds, path.display());
    Ok(())
}

/// Duration of a written WAV file.
fn audio_seconds(path: &Path) -> Result<f32> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to reopen {}", path.display()))?;
    Ok(reader.duration() as f32 / SAMPLE_RATE as f32)
}

fn print_voices() {
    for group in CATALOG.iter() {
        println!("{} ({})", group.label, group.language.code());
        for chunk in group.voices.chunks(6) {
            println!("  {}", chunk.join(", "));
        }
    }
    println!();
    println!("Sample texts available for: {}", SAMPLE_TEXTS.map(|(label, _)| label).join(", "));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Native thread pools and MeCab read these once, so set them before any
    // worker thread starts.
    let cores = configure_thread_env();
    tracing::info!("CPU cores: {}", cores);
    let mecab = setup_mecab_environment();

    match cli.command {
        Command::Serve(config) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build async runtime")?;
            runtime.block_on(kokoro_serve::serve(config))
        }
        Command::Synth(args) => synth(args),
        Command::Voices => {
            print_voices();
            Ok(())
        }
        Command::CheckMecab => {
            match &mecab.binary {
                Some(binary) => println!("mecab: {}", binary.display()),
                None => anyhow::bail!("mecab was not found on PATH"),
            }
            if let Some(dicdir) = &mecab.dicdir {
                println!("MECAB_DICDIR: {}", dicdir.display());
            }
            if let Some(rc) = &mecab.mecabrc {
                println!("MECABRC: {}", rc.display());
            }
            let analysis = check_mecab("テスト").context("MeCab check failed")?;
            println!("{}", analysis);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synth_defaults() {
        let cli = Cli::try_parse_from(["kokoro-serve", "synth", "--text", "Hello"]).unwrap();
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.voice, "af_heart");
        assert_eq!(args.speed, 1.0);
        assert!(args.output.is_none());
    }

    #[test]
    fn serve_accepts_server_flags() {
        let cli = Cli::try_parse_from(["kokoro-serve", "serve", "--port", "9001"]).unwrap();
        let Command::Serve(config) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(config.port, 9001);
    }

    #[test]
    fn audio_seconds_reads_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.wav");
        kokoro_serve::save_wav(&[0.0; 12000], &path, SAMPLE_RATE).unwrap();
        assert_eq!(audio_seconds(&path).unwrap(), 0.5);

        let err = audio_seconds(&dir.path().join("missing.wav")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to reopen"));
    }
}
