//! Voice catalog and sample texts shipped with the Kokoro-82M voice packs.

use crate::language::LanguageCode;
use serde::Serialize;
use std::collections::BTreeMap;

/// Voices that belong to one pipeline language.
#[derive(Debug, Clone, Copy)]
pub struct VoiceGroup {
    pub language: LanguageCode,
    pub label: &'static str,
    pub voices: &'static [&'static str],
}

pub const CATALOG: [VoiceGroup; 9] = [
    VoiceGroup {
        language: LanguageCode::AmericanEnglish,
        label: "🇺🇸 American English",
        voices: &[
            "af_heart", "af_alloy", "af_aoede", "af_bella", "af_jessica", "af_kore",
            "af_nicole", "af_nova", "af_river", "af_sarah", "af_sky", "am_adam",
            "am_echo", "am_eric", "am_fenrir", "am_liam", "am_michael", "am_onyx",
            "am_puck", "am_santa",
        ],
    },
    VoiceGroup {
        language: LanguageCode::BritishEnglish,
        label: "🇬🇧 British English",
        voices: &[
            "bf_alice", "bf_emma", "bf_isabella", "bf_lily", "bm_daniel", "bm_fable",
            "bm_george", "bm_lewis",
        ],
    },
    VoiceGroup {
        language: LanguageCode::Japanese,
        label: "🇯🇵 Japanese",
        voices: &["jf_alpha", "jf_gongitsune", "jf_nezumi", "jf_tebukuro", "jm_kumo"],
    },
    VoiceGroup {
        language: LanguageCode::MandarinChinese,
        label: "🇨🇳 Mandarin Chinese",
        voices: &[
            "zf_xiaobei", "zf_xiaoni", "zf_xiaoxiao", "zf_xiaoyi", "zm_yunjian",
            "zm_yunxi", "zm_yunxia", "zm_yunyang",
        ],
    },
    VoiceGroup {
        language: LanguageCode::Spanish,
        label: "🇪🇸 Spanish",
        voices: &["ef_dora", "em_alex", "em_santa"],
    },
    VoiceGroup {
        language: LanguageCode::French,
        label: "🇫🇷 French",
        voices: &["ff_siwis"],
    },
    VoiceGroup {
        language: LanguageCode::Hindi,
        label: "🇮🇳 Hindi",
        voices: &["hf_alpha", "hf_beta", "hm_omega", "hm_psi"],
    },
    VoiceGroup {
        language: LanguageCode::Italian,
        label: "🇮🇹 Italian",
        voices: &["if_sara", "im_nicola"],
    },
    VoiceGroup {
        language: LanguageCode::BrazilianPortuguese,
        label: "🇧🇷 Brazilian Portuguese",
        voices: &["pf_dora", "pm_alex", "pm_santa"],
    },
];

/// Sample sentences offered by the web UI, keyed by display label.
pub const SAMPLE_TEXTS: [(&str, &[&str]); 8] = [
    (
        "🇺🇸 English",
        &[
            "Hello, this is Kokoro TTS!",
            "The quick brown fox jumps over the lazy dog.",
            "Kokoro is a lightweight TTS model with 82 million parameters.",
        ],
    ),
    (
        "🇯🇵 日本語",
        &[
            "こんにちは、これはテストです。",
            "日本語の音声合成のテストを行っています。",
            "吾輩は猫である。名前はまだ無い。",
            "美しい夕日が山の向こうに沈んでいく。",
        ],
    ),
    (
        "🇨🇳 中文",
        &["你好，这是Kokoro TTS测试。", "今天天气很好，阳光明媚。", "人工智能技术发展迅速。"],
    ),
    (
        "🇪🇸 Español",
        &[
            "Hola, esto es una prueba de Kokoro TTS.",
            "El clima está muy bueno hoy.",
            "La tecnología avanza rápidamente.",
        ],
    ),
    (
        "🇫🇷 Français",
        &[
            "Bonjour, ceci est un test de Kokoro TTS.",
            "La technologie évolue rapidement.",
            "Il fait beau aujourd'hui.",
        ],
    ),
    (
        "🇮🇳 हिंदी",
        &[
            "नमस्ते, यह Kokoro TTS का परीक्षण है।",
            "आज मौसम बहुत अच्छा है।",
            "तकनीक तेजी से विकसित हो रही है।",
        ],
    ),
    (
        "🇮🇹 Italiano",
        &[
            "Ciao, questo è un test di Kokoro TTS.",
            "Il tempo è molto bello oggi.",
            "La tecnologia si sviluppa rapidamente.",
        ],
    ),
    (
        "🇧🇷 Português",
        &[
            "Olá, este é um teste do Kokoro TTS.",
            "O tempo está muito bom hoje.",
            "A tecnologia se desenvolve rapidamente.",
        ],
    ),
];

/// Flat voice list in catalog order.
pub fn all_voices() -> Vec<&'static str> {
    CATALOG
        .iter()
        .flat_map(|group| group.voices.iter().copied())
        .collect()
}

pub fn is_known_voice(voice: &str) -> bool {
    CATALOG
        .iter()
        .any(|group| group.voices.iter().any(|known| *known == voice))
}

/// Serializable snapshot of the catalog served by `/info` and the web UI.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceInfo {
    pub languages: BTreeMap<String, &'static str>,
    pub voices: Vec<VoiceGroupInfo>,
    pub all_voices: Vec<&'static str>,
    pub sample_texts: Vec<SampleTexts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceGroupInfo {
    pub language: LanguageCode,
    pub label: &'static str,
    pub voices: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleTexts {
    pub label: &'static str,
    pub texts: &'static [&'static str],
}

impl VoiceInfo {
    pub fn collect() -> Self {
        let languages = LanguageCode::ALL
            .iter()
            .map(|lang| (lang.code().to_string(), lang.name()))
            .collect();
        let voices = CATALOG
            .iter()
            .map(|group| VoiceGroupInfo {
                language: group.language,
                label: group.label,
                voices: group.voices,
            })
            .collect();
        let sample_texts = SAMPLE_TEXTS
            .iter()
            .map(|&(label, texts)| SampleTexts { label, texts })
            .collect();

        Self {
            languages,
            voices,
            all_voices: all_voices(),
            sample_texts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::detect_language;

    #[test]
    fn catalog_has_54_voices() {
        assert_eq!(all_voices().len(), 54);
        assert_eq!(all_voices()[0], "af_heart");
    }

    #[test]
    fn every_voice_detects_its_group_language() {
        for group in CATALOG.iter() {
            for voice in group.voices {
                assert_eq!(detect_language(voice), group.language, "voice {}", voice);
            }
        }
    }

    #[test]
    fn voice_info_lists_all_languages() {
        let info = VoiceInfo::collect();
        assert_eq!(info.languages.len(), 9);
        assert_eq!(info.languages["j"], "Japanese");
        assert_eq!(info.voices.len(), 9);
        assert_eq!(info.sample_texts.len(), 8);
        assert!(is_known_voice("jm_kumo"));
        assert!(!is_known_voice("af_grace"));
    }
}
