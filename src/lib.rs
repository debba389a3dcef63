//! Kokoro TTS Serving Library
//!
//! Wraps a Kokoro speech pipeline behind a shared runtime with per-language
//! lazy initialization, and exposes it over HTTP and a CLI.

pub mod audio;
pub mod chunk;
pub mod config;
pub mod environment;
pub mod error;
pub mod language;
pub mod openapi;
pub mod pipeline;
pub mod remote;
pub mod runtime;
pub mod server;
pub mod voice;
pub mod web;

pub use audio::{decode_wav, encode_wav, save_wav};
pub use chunk::{normalize_chunks, AudioChunk};
pub use config::{BackendKind, EngineConfig, ServerConfig};
pub use error::{TtsError, TtsResult};
pub use language::{detect_language, LanguageCode};
pub use pipeline::{ChunkIter, Pipeline, PipelineLoader, StubLoader, StubPipeline};
pub use remote::{RemoteConfig, RemoteLoader};
pub use runtime::{PipelineCache, Runtime, SynthesisRequest, SystemInfo};
pub use server::{app, router, serve, AppState};
pub use voice::{all_voices, is_known_voice, VoiceInfo};

/// Output format and request limits shared by every front-end
pub mod constants {
    pub const SAMPLE_RATE: u32 = 24000;
    pub const MAX_TEXT_CHARS: usize = 1000;
    pub const DEFAULT_VOICE: &str = "af_heart";
    pub const DEFAULT_SPEED: f32 = 1.0;
    pub const MIN_SPEED: f32 = 0.5;
    pub const MAX_SPEED: f32 = 2.0;
}
