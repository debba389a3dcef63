//! Long-lived synthesis runtime shared by every front-end.

use crate::audio::{encode_wav, save_wav, write_temp_wav};
use crate::chunk::normalize_chunks;
use crate::constants::{
    DEFAULT_SPEED, DEFAULT_VOICE, MAX_SPEED, MAX_TEXT_CHARS, MIN_SPEED, SAMPLE_RATE,
};
use crate::environment::cpu_count;
use crate::error::{TtsError, TtsResult};
use crate::language::{detect_language, LanguageCode};
use crate::pipeline::{Pipeline, PipelineLoader};
use crate::voice::{is_known_voice, VoiceInfo};
use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-language pipeline handles, constructed on first use and kept for the
/// life of the process.
pub struct PipelineCache {
    loader: Arc<dyn PipelineLoader>,
    pipelines: RwLock<HashMap<LanguageCode, Arc<dyn Pipeline>>>,
    init_lock: Mutex<()>,
}

impl PipelineCache {
    pub fn new(loader: Arc<dyn PipelineLoader>) -> Self {
        Self {
            loader,
            pipelines: RwLock::new(HashMap::new()),
            init_lock: Mutex::new(()),
        }
    }

    fn cached(&self, language: LanguageCode) -> Option<Arc<dyn Pipeline>> {
        self.pipelines.read().get(&language).cloned()
    }

    /// Return the pipeline for `language`, constructing it at most once.
    ///
    /// A failed construction is not cached; the next call retries.
    pub fn get(&self, language: LanguageCode) -> Result<Arc<dyn Pipeline>> {
        if let Some(pipeline) = self.cached(language) {
            return Ok(pipeline);
        }

        let _guard = self.init_lock.lock();
        if let Some(pipeline) = self.cached(language) {
            return Ok(pipeline);
        }

        info!("Initializing Kokoro pipeline (language: {})", language);
        let pipeline = self
            .loader
            .load(language)
            .with_context(|| format!("Failed to initialize pipeline for language '{}'", language))?;
        self.pipelines.write().insert(language, Arc::clone(&pipeline));
        info!("Pipeline for language {} ready", language);
        Ok(pipeline)
    }

    pub fn loaded_languages(&self) -> Vec<LanguageCode> {
        let mut languages: Vec<_> = self.pipelines.read().keys().copied().collect();
        languages.sort();
        languages
    }
}

/// One synthesis job.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
    pub speed: f32,
    /// Explicit pipeline language; detected from the voice when absent.
    pub language: Option<LanguageCode>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: DEFAULT_VOICE.to_string(),
            speed: DEFAULT_SPEED,
            language: None,
        }
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn language(mut self, language: Option<LanguageCode>) -> Self {
        self.language = language;
        self
    }

    /// Check the request and resolve its pipeline language.
    pub fn validate(&self) -> TtsResult<LanguageCode> {
        if self.text.trim().is_empty() {
            return Err(TtsError::invalid_input("text is required"));
        }
        if self.text.chars().count() > MAX_TEXT_CHARS {
            return Err(TtsError::invalid_input(format!(
                "text is too long ({} characters max)",
                MAX_TEXT_CHARS
            )));
        }
        if !self.speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(TtsError::invalid_input(format!(
                "speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }
        Ok(self
            .language
            .unwrap_or_else(|| detect_language(&self.voice)))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub cpu_cores: usize,
    pub omp_threads: Option<String>,
    pub mkl_threads: Option<String>,
    pub loaded_languages: Vec<LanguageCode>,
}

pub struct Runtime {
    cache: PipelineCache,
}

impl Runtime {
    pub fn new(loader: Arc<dyn PipelineLoader>) -> Self {
        Self {
            cache: PipelineCache::new(loader),
        }
    }

    pub fn pipelines(&self) -> &PipelineCache {
        &self.cache
    }

    /// Construct the pipeline for `language` ahead of the first request.
    pub fn warmup(&self, language: LanguageCode) -> TtsResult<()> {
        self.cache
            .get(language)
            .map(|_| ())
            .map_err(|err| TtsError::pipeline(format!("{:#}", err)))
    }

    /// Run the pipeline and return a flat mono buffer at [`SAMPLE_RATE`].
    pub fn generate_audio_data(&self, request: &SynthesisRequest) -> TtsResult<Vec<f32>> {
        let language = request.validate()?;
        if !is_known_voice(&request.voice) {
            warn!(voice = %request.voice, "Voice is not in the catalog, passing it through");
        }

        let preview: String = request.text.chars().take(50).collect();
        info!(
            language = %language,
            voice = %request.voice,
            speed = request.speed,
            "Generating speech: {}...",
            preview
        );

        let pipeline = self
            .cache
            .get(language)
            .map_err(|err| TtsError::pipeline(format!("{:#}", err)))?;
        let chunks = pipeline
            .generate(&request.text, &request.voice, request.speed)
            .map_err(|err| TtsError::pipeline(format!("Audio generation failed: {:#}", err)))?;
        let samples = normalize_chunks(chunks)?;

        debug!(
            samples = samples.len(),
            seconds = samples.len() as f32 / SAMPLE_RATE as f32,
            "Audio generation complete"
        );
        Ok(samples)
    }

    /// Generate audio and write it to `output_path`, or to a fresh temporary
    /// file when no path is given.
    pub fn generate_audio_file(
        &self,
        request: &SynthesisRequest,
        output_path: Option<&Path>,
    ) -> TtsResult<PathBuf> {
        let samples = self.generate_audio_data(request)?;
        let written = match output_path {
            Some(path) => save_wav(&samples, path, SAMPLE_RATE).map(|()| path.to_path_buf()),
            None => write_temp_wav(&samples, SAMPLE_RATE),
        };
        written.map_err(|err| TtsError::io(format!("Failed to save audio file: {:#}", err)))
    }

    /// Generate audio and encode it as WAV bytes.
    pub fn generate_wav(&self, request: &SynthesisRequest) -> TtsResult<Vec<u8>> {
        let samples = self.generate_audio_data(request)?;
        encode_wav(&samples, SAMPLE_RATE)
            .map_err(|err| TtsError::io(format!("Failed to encode WAV: {:#}", err)))
    }

    pub fn voice_info(&self) -> VoiceInfo {
        VoiceInfo::collect()
    }

    pub fn system_info(&self) -> SystemInfo {
        SystemInfo {
            cpu_cores: cpu_count(),
            omp_threads: std::env::var("OMP_NUM_THREADS").ok(),
            mkl_threads: std::env::var("MKL_NUM_THREADS").ok(),
            loaded_languages: self.cache.loaded_languages(),
        }
    }
}
