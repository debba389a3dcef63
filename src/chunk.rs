//! Pipeline output chunks and their normalization into a flat PCM buffer.
//!
//! Engines do not agree on what a generated chunk looks like: some yield flat
//! sample buffers, some yield tensors of arbitrary rank, some wrap the audio
//! in a result object next to the graphemes and phonemes it was generated
//! from, and some yield nested lists. [`normalize_chunks`] accepts all of them
//! and produces the mono `f32` buffer the WAV writer expects.

use crate::error::{TtsError, TtsResult};
use ndarray::{concatenate, stack, Array1, ArrayD, ArrayViewD, Axis};
use tracing::{debug, warn};

/// One unit of audio yielded by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioChunk {
    /// Yield without audio.
    Empty,
    Samples(Vec<f32>),
    Tensor(ArrayD<f32>),
    /// Result object of a Kokoro-style pipeline; `audio` is absent for
    /// segments the engine skipped.
    Result {
        graphemes: String,
        phonemes: String,
        audio: Option<Box<AudioChunk>>,
    },
    /// Generic wrapper exposing its payload.
    Data(Box<AudioChunk>),
    Nested(Vec<AudioChunk>),
}

impl AudioChunk {
    pub fn result(
        graphemes: impl Into<String>,
        phonemes: impl Into<String>,
        audio: Option<AudioChunk>,
    ) -> Self {
        AudioChunk::Result {
            graphemes: graphemes.into(),
            phonemes: phonemes.into(),
            audio: audio.map(Box::new),
        }
    }

    pub fn data(inner: AudioChunk) -> Self {
        AudioChunk::Data(Box::new(inner))
    }

    /// Convert to an n-dimensional array, or `None` if there is no audio.
    pub fn into_array(self) -> Option<ArrayD<f32>> {
        match self {
            AudioChunk::Empty => None,
            AudioChunk::Samples(samples) => Some(Array1::from_vec(samples).into_dyn()),
            AudioChunk::Tensor(array) => Some(array),
            AudioChunk::Result { audio, .. } => audio.and_then(|inner| inner.into_array()),
            AudioChunk::Data(inner) => inner.into_array(),
            AudioChunk::Nested(items) => nested_to_array(items),
        }
    }
}

impl From<Vec<f32>> for AudioChunk {
    fn from(samples: Vec<f32>) -> Self {
        AudioChunk::Samples(samples)
    }
}

impl From<ArrayD<f32>> for AudioChunk {
    fn from(array: ArrayD<f32>) -> Self {
        AudioChunk::Tensor(array)
    }
}

fn nested_to_array(items: Vec<AudioChunk>) -> Option<ArrayD<f32>> {
    let leaves: Vec<ArrayD<f32>> = items
        .into_iter()
        .filter_map(AudioChunk::into_array)
        .collect();
    if leaves.is_empty() {
        return None;
    }

    let views: Vec<ArrayViewD<'_, f32>> = leaves.iter().map(|leaf| leaf.view()).collect();
    match stack(Axis(0), &views) {
        Ok(stacked) => Some(stacked),
        // Ragged nesting
        Err(_) => Some(flatten_all(&leaves).into_dyn()),
    }
}

fn flatten_all(arrays: &[ArrayD<f32>]) -> Array1<f32> {
    let total = arrays.iter().map(|array| array.len()).sum();
    let mut flat = Vec::with_capacity(total);
    for array in arrays {
        flat.extend(array.iter().copied());
    }
    Array1::from_vec(flat)
}

/// Join per-chunk arrays along axis 0, flattening first when their shapes
/// disagree.
fn join_arrays(mut arrays: Vec<ArrayD<f32>>) -> ArrayD<f32> {
    if arrays.len() == 1 {
        if let Some(single) = arrays.pop() {
            return single;
        }
    }

    // ndarray panics instead of erroring when a 0-d array follows a ranked one
    let rank = arrays.first().map_or(0, |array| array.ndim());
    if rank == 0 || arrays.iter().any(|array| array.ndim() != rank) {
        debug!(rank, "Chunk ranks differ, flattening before concatenation");
        return flatten_all(&arrays).into_dyn();
    }

    let views: Vec<ArrayViewD<'_, f32>> = arrays.iter().map(|array| array.view()).collect();
    match concatenate(Axis(0), &views) {
        Ok(joined) => joined,
        Err(err) => {
            warn!("Chunk shapes do not line up ({}), flattening before concatenation", err);
            flatten_all(&arrays).into_dyn()
        }
    }
}

/// Collect a pipeline's chunk stream into one flat mono buffer.
///
/// Chunks without audio are skipped. The first error yielded by the stream
/// aborts collection.
pub fn normalize_chunks<I>(chunks: I) -> TtsResult<Vec<f32>>
where
    I: IntoIterator<Item = anyhow::Result<AudioChunk>>,
{
    let mut arrays = Vec::new();
    for chunk in chunks {
        let chunk = chunk
            .map_err(|err| TtsError::pipeline(format!("Audio generation failed: {:#}", err)))?;
        if let Some(array) = chunk.into_array() {
            arrays.push(array);
        }
    }

    if arrays.is_empty() {
        return Err(TtsError::no_audio("Audio generation produced no chunks"));
    }
    debug!(chunks = arrays.len(), "Collected audio chunks");

    let joined = join_arrays(arrays);
    let shape = joined.shape().to_vec();
    let samples: Vec<f32> = joined.iter().copied().collect();
    debug!(?shape, samples = samples.len(), "Normalized audio buffer");

    if samples.is_empty() {
        return Err(TtsError::no_audio("Audio generation produced no samples"));
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, arr2, Array2, Array3};

    fn ok(chunks: Vec<AudioChunk>) -> Vec<anyhow::Result<AudioChunk>> {
        chunks.into_iter().map(Ok).collect()
    }

    #[test]
    fn concatenates_flat_chunks_in_order() {
        let samples = normalize_chunks(ok(vec![
            AudioChunk::Samples(vec![0.1, 0.2]),
            AudioChunk::Samples(vec![0.3]),
        ]))
        .unwrap();
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn skips_empty_chunks_and_wrappers_without_audio() {
        let samples = normalize_chunks(ok(vec![
            AudioChunk::Empty,
            AudioChunk::result("Hi.", "hˈI.", None),
            AudioChunk::result("There.", "ðˈɛɹ.", Some(AudioChunk::Samples(vec![0.5, -0.5]))),
            AudioChunk::data(AudioChunk::Samples(vec![0.25])),
        ]))
        .unwrap();
        assert_eq!(samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn same_shape_tensors_concatenate_along_first_axis() {
        let a = arr2(&[[1.0f32, 2.0], [3.0, 4.0]]).into_dyn();
        let b = arr2(&[[5.0f32, 6.0]]).into_dyn();
        let samples = normalize_chunks(ok(vec![a.into(), b.into()])).unwrap();
        assert_eq!(samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn mismatched_ranks_fall_back_to_flattening() {
        let matrix = Array2::<f32>::from_elem((2, 3), 1.0).into_dyn();
        let cube = Array3::<f32>::from_elem((1, 1, 2), 2.0).into_dyn();
        let samples = normalize_chunks(ok(vec![
            matrix.into(),
            AudioChunk::Samples(vec![3.0]),
            cube.into(),
        ]))
        .unwrap();
        assert_eq!(samples, vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 2.0, 2.0]);
    }

    #[test]
    fn scalar_tensors_are_flattened_in_any_position() {
        let trailing = normalize_chunks(ok(vec![
            AudioChunk::Samples(vec![0.1, 0.2]),
            arr0(0.3f32).into_dyn().into(),
        ]))
        .unwrap();
        assert_eq!(trailing, vec![0.1, 0.2, 0.3]);

        let leading = normalize_chunks(ok(vec![
            arr0(0.5f32).into_dyn().into(),
            AudioChunk::Samples(vec![0.6]),
            arr0(0.7f32).into_dyn().into(),
        ]))
        .unwrap();
        assert_eq!(leading, vec![0.5, 0.6, 0.7]);
    }

    #[test]
    fn nested_lists_flatten_depth_first() {
        let nested = AudioChunk::Nested(vec![
            AudioChunk::Samples(vec![1.0, 2.0]),
            AudioChunk::Nested(vec![AudioChunk::Samples(vec![3.0]), AudioChunk::Empty]),
            AudioChunk::Samples(vec![4.0, 5.0, 6.0]),
        ]);
        let samples = normalize_chunks(ok(vec![nested])).unwrap();
        assert_eq!(samples, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn regular_nested_lists_become_a_matrix() {
        let nested = AudioChunk::Nested(vec![
            AudioChunk::Samples(vec![1.0, 2.0]),
            AudioChunk::Samples(vec![3.0, 4.0]),
        ]);
        let array = nested.into_array().unwrap();
        assert_eq!(array.shape(), &[2, 2]);
    }

    #[test]
    fn no_usable_chunks_is_an_error() {
        let err = normalize_chunks(ok(vec![AudioChunk::Empty, AudioChunk::result("", "", None)]))
            .unwrap_err();
        assert!(matches!(err, TtsError::NoAudio { .. }));

        let err = normalize_chunks(ok(vec![AudioChunk::Samples(Vec::new())])).unwrap_err();
        assert!(matches!(err, TtsError::NoAudio { .. }));
    }

    #[test]
    fn stream_errors_abort_collection() {
        let chunks = vec![
            Ok(AudioChunk::Samples(vec![0.1])),
            Err(anyhow::anyhow!("engine crashed")),
            Ok(AudioChunk::Samples(vec![0.2])),
        ];
        let err = normalize_chunks(chunks).unwrap_err();
        assert_eq!(err, TtsError::pipeline("Audio generation failed: engine crashed"));
    }
}
