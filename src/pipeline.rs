//! Pipeline abstraction over the external Kokoro engine.
//!
//! A [`Pipeline`] is an opaque handle for one language: it is called with
//! `(text, voice, speed)` and returns an iterator of [`AudioChunk`]s. How the
//! engine produces them is none of this crate's business. A
//! [`PipelineLoader`] constructs handles on demand; the runtime caches them.

use crate::chunk::AudioChunk;
use crate::constants::SAMPLE_RATE;
use crate::language::LanguageCode;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Boxed chunk stream returned by [`Pipeline::generate`].
pub type ChunkIter = Box<dyn Iterator<Item = Result<AudioChunk>> + Send>;

pub trait Pipeline: Send + Sync {
    fn language(&self) -> LanguageCode;

    fn generate(&self, text: &str, voice: &str, speed: f32) -> Result<ChunkIter>;
}

pub trait PipelineLoader: Send + Sync {
    fn load(&self, language: LanguageCode) -> Result<Arc<dyn Pipeline>>;
}

impl<F> PipelineLoader for F
where
    F: Fn(LanguageCode) -> Result<Arc<dyn Pipeline>> + Send + Sync,
{
    fn load(&self, language: LanguageCode) -> Result<Arc<dyn Pipeline>> {
        self(language)
    }
}

/// Milliseconds of audio the stub produces per input character at speed 1.0.
const STUB_MS_PER_CHAR: u64 = 60;

/// Offline stand-in for the engine.
///
/// Yields one silent result chunk per sentence so the HTTP and CLI surfaces
/// can be exercised without a model. Durations scale with text length and
/// inversely with speed.
pub struct StubPipeline {
    language: LanguageCode,
}

impl StubPipeline {
    pub fn new(language: LanguageCode) -> Self {
        Self { language }
    }

    fn samples_for(sentence: &str, speed: f32) -> usize {
        let chars = sentence.chars().filter(|ch| !ch.is_whitespace()).count() as u64;
        let base = chars * STUB_MS_PER_CHAR * u64::from(SAMPLE_RATE) / 1000;
        (base as f32 / speed.max(f32::EPSILON)).round() as usize
    }
}

impl Pipeline for StubPipeline {
    fn language(&self) -> LanguageCode {
        self.language
    }

    fn generate(&self, text: &str, _voice: &str, speed: f32) -> Result<ChunkIter> {
        let sentences = split_sentences(text);
        debug!(
            language = %self.language,
            sentences = sentences.len(),
            "Stub pipeline generating silence"
        );
        let chunks = sentences.into_iter().map(move |sentence| {
            let samples = vec![0.0f32; Self::samples_for(&sentence, speed)];
            Ok(AudioChunk::result(
                sentence,
                String::new(),
                Some(AudioChunk::Samples(samples)),
            ))
        });
        Ok(Box::new(chunks))
    }
}

/// Loader for [`StubPipeline`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubLoader;

impl PipelineLoader for StubLoader {
    fn load(&self, language: LanguageCode) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(StubPipeline::new(language)))
    }
}

fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '。' | '！' | '？' | '।' | '\n')
}

/// Split text after sentence terminators, dropping blank pieces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if is_sentence_end(ch) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::normalize_chunks;

    #[test]
    fn split_sentences_keeps_terminators() {
        assert_eq!(
            split_sentences("Hello there. How are you?  Fine"),
            vec!["Hello there.", "How are you?", "Fine"]
        );
        assert_eq!(
            split_sentences("こんにちは。これはテストです。"),
            vec!["こんにちは。", "これはテストです。"]
        );
        assert!(split_sentences("  \n ").is_empty());
    }

    #[test]
    fn stub_yields_one_chunk_per_sentence() {
        let pipeline = StubPipeline::new(LanguageCode::AmericanEnglish);
        let chunks: Vec<_> = pipeline
            .generate("One. Two.", "af_heart", 1.0)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[0], AudioChunk::Result { graphemes, .. } if graphemes == "One."));
    }

    #[test]
    fn stub_duration_scales_with_speed() {
        let pipeline = StubPipeline::new(LanguageCode::AmericanEnglish);
        let normal = normalize_chunks(pipeline.generate("abcd", "af_heart", 1.0).unwrap()).unwrap();
        let fast = normalize_chunks(pipeline.generate("abcd", "af_heart", 2.0).unwrap()).unwrap();
        // 4 chars * 60 ms at 24 kHz
        assert_eq!(normal.len(), 5760);
        assert_eq!(fast.len(), 2880);
    }

    #[test]
    fn closures_act_as_loaders() {
        let loader = |language: LanguageCode| -> Result<Arc<dyn Pipeline>> {
            Ok(Arc::new(StubPipeline::new(language)))
        };
        let pipeline = loader.load(LanguageCode::Japanese).unwrap();
        assert_eq!(pipeline.language(), LanguageCode::Japanese);
    }
}
