//! HTTP client for an external Kokoro inference service.
//!
//! Speaks the OpenAI-compatible speech endpoint exposed by Kokoro servers:
//! `POST {base}/v1/audio/speech` with a JSON body, answered with WAV bytes.

use crate::audio::decode_wav;
use crate::chunk::AudioChunk;
use crate::constants::SAMPLE_RATE;
use crate::language::LanguageCode;
use crate::pipeline::{ChunkIter, Pipeline, PipelineLoader};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the engine, e.g. `http://127.0.0.1:8880`.
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8880".to_string(),
            model: "kokoro".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl RemoteConfig {
    fn speech_url(&self) -> String {
        format!("{}/v1/audio/speech", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
    lang_code: String,
}

/// Pipeline handle bound to one language of a remote engine.
pub struct RemotePipeline {
    agent: ureq::Agent,
    config: RemoteConfig,
    language: LanguageCode,
}

impl RemotePipeline {
    pub fn new(agent: ureq::Agent, config: RemoteConfig, language: LanguageCode) -> Self {
        Self {
            agent,
            config,
            language,
        }
    }

    fn request_wav(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>> {
        let body = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice,
            speed,
            response_format: "wav",
            lang_code: self.language.to_string(),
        };

        let response = self
            .agent
            .post(&self.config.speech_url())
            .send_json(&body)
            .with_context(|| format!("Speech request to {} failed", self.config.base_url))?;

        let mut bytes = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut bytes)
            .context("Failed to read engine response body")?;
        Ok(bytes)
    }
}

impl Pipeline for RemotePipeline {
    fn language(&self) -> LanguageCode {
        self.language
    }

    fn generate(&self, text: &str, voice: &str, speed: f32) -> Result<ChunkIter> {
        let bytes = self.request_wav(text, voice, speed)?;
        let (samples, sample_rate) = decode_wav(&bytes).context("Engine returned invalid WAV")?;
        if sample_rate != SAMPLE_RATE {
            warn!(
                sample_rate,
                expected = SAMPLE_RATE,
                "Engine sample rate differs, audio will play at the wrong pitch"
            );
        }
        debug!(samples = samples.len(), "Received engine audio");

        let chunk = AudioChunk::result(text, String::new(), Some(AudioChunk::Samples(samples)));
        Ok(Box::new(std::iter::once(Ok(chunk))))
    }
}

/// Builds [`RemotePipeline`] handles that share one connection pool.
pub struct RemoteLoader {
    agent: ureq::Agent,
    config: RemoteConfig,
}

impl RemoteLoader {
    pub fn new(config: RemoteConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self { agent, config }
    }
}

impl PipelineLoader for RemoteLoader {
    fn load(&self, language: LanguageCode) -> Result<Arc<dyn Pipeline>> {
        info!(
            language = %language,
            engine = %self.config.base_url,
            "Binding remote Kokoro pipeline"
        );
        Ok(Arc::new(RemotePipeline::new(
            self.agent.clone(),
            self.config.clone(),
            language,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_url_ignores_trailing_slash() {
        let config = RemoteConfig {
            base_url: "http://engine:8880/".to_string(),
            ..RemoteConfig::default()
        };
        assert_eq!(config.speech_url(), "http://engine:8880/v1/audio/speech");
    }

    #[test]
    fn request_body_carries_language_code() {
        let body = SpeechRequest {
            model: "kokoro",
            input: "こんにちは",
            voice: "jf_alpha",
            speed: 1.5,
            response_format: "wav",
            lang_code: LanguageCode::Japanese.to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["lang_code"], "j");
        assert_eq!(json["input"], "こんにちは");
        assert_eq!(json["response_format"], "wav");
    }

    #[test]
    fn unreachable_engine_is_an_error() {
        let loader = RemoteLoader::new(RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
            ..RemoteConfig::default()
        });
        let pipeline = loader.load(LanguageCode::AmericanEnglish).unwrap();
        assert!(pipeline.generate("Hello", "af_heart", 1.0).is_err());
    }
}
