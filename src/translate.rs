//! Text translation on top of the completion client.

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{ChatMessage, CompletionClient, CompletionError, CompletionRequest, Result};

pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a translation engine. Only return the translated text without any additional commentary or explanation.";

pub const TRANSLATION_TEMPERATURE: f32 = 0.1;

/// Source language code that lets the model detect the language itself.
pub const AUTO_DETECT: &str = "auto";

const LANGUAGES: &[(&str, &str)] = &[
    ("auto", "Auto-detect"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
];

/// Common function words per language, scored by match count.
const LANGUAGE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            r"\b(the|and|or|but|in|on|at|to|for|of|with|by)\b",
            r"\b(is|are|was|were|have|has|had|will|would|could|should)\b",
        ],
    ),
    (
        "es",
        &[
            r"\b(el|la|los|las|de|del|en|con|por|para|que|es|son)\b",
            r"\b(está|están|tiene|tienen|hace|hacer|ser|estar)\b",
        ],
    ),
    (
        "fr",
        &[
            r"\b(le|la|les|de|du|des|en|dans|avec|pour|que|est|sont)\b",
            r"\b(être|avoir|faire|aller|pouvoir|vouloir|savoir)\b",
        ],
    ),
    (
        "de",
        &[
            r"\b(der|die|das|den|dem|des|ein|eine|einen|einem|einer)\b",
            r"\b(ist|sind|war|waren|haben|hat|hatte|wird|werden)\b",
        ],
    ),
    (
        "it",
        &[
            r"\b(il|la|lo|gli|le|di|del|della|in|con|per|che|è|sono)\b",
            r"\b(essere|avere|fare|andare|potere|volere|sapere)\b",
        ],
    ),
    (
        "pt",
        &[
            r"\b(o|a|os|as|de|do|da|dos|das|em|com|por|para|que|é|são)\b",
            r"\b(ser|estar|ter|haver|fazer|ir|poder|querer|saber)\b",
        ],
    ),
];

static DETECTORS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    LANGUAGE_PATTERNS
        .iter()
        .map(|(code, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|pattern| Regex::new(&format!("(?i){pattern}")).ok())
                .collect();
            (*code, compiled)
        })
        .collect()
});

/// Texts shorter than this (after trimming) are not detected.
const MIN_DETECT_CHARS: usize = 10;

/// Below this score a detection is not trusted.
const MIN_DETECT_SCORE: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Translated text, trimmed.
    pub content: String,
    /// Source language sent to the model, after detection.
    pub source_language: String,
    /// Local detection result when the caller asked for [`AUTO_DETECT`].
    pub detected_language: Option<String>,
    /// Wall time including retries and backoff.
    pub latency: Duration,
    pub model: String,
    pub tokens_used: Option<u64>,
}

/// Human-readable name for a language code; unknown codes pass through.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(code, |(_, name)| *name)
}

/// Guesses the language of `text` from common function words.
///
/// Returns [`AUTO_DETECT`] for short texts, when nothing matches, or when
/// the best score is too low. Ties go to the earlier language in the table.
pub fn detect_language(text: &str) -> &'static str {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DETECT_CHARS {
        return AUTO_DETECT;
    }
    let lowered = trimmed.to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;
    for (code, patterns) in DETECTORS.iter() {
        let score: usize = patterns
            .iter()
            .map(|pattern| pattern.find_iter(&lowered).count())
            .sum();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((*code, score));
        }
    }

    match best {
        Some((code, score)) if score >= MIN_DETECT_SCORE => code,
        _ => AUTO_DETECT,
    }
}

/// Resolves the source language for a translation.
///
/// With [`AUTO_DETECT`] the text is run through [`detect_language`]; the
/// second value is that detection result. Fails when the target is
/// [`AUTO_DETECT`] or equals the resolved source.
pub fn resolve_source(
    text: &str,
    source: &str,
    target: &str,
) -> Result<(String, Option<String>)> {
    if target == AUTO_DETECT {
        return Err(CompletionError::InvalidRequest(
            "target language cannot be 'auto'".to_owned(),
        ));
    }

    let (resolved, detected) = if source == AUTO_DETECT {
        let detected = detect_language(text);
        (detected, Some(detected.to_owned()))
    } else {
        (source, None)
    };

    if resolved == target {
        return Err(CompletionError::InvalidRequest(
            "source and target languages cannot be the same".to_owned(),
        ));
    }
    Ok((resolved.to_owned(), detected))
}

pub fn translation_prompt(text: &str, source: &str, target: &str) -> String {
    if source == AUTO_DETECT {
        format!(
            "Translate the following text to {}:\n\n{text}",
            language_name(target)
        )
    } else {
        format!(
            "Translate the following {} text to {}:\n\n{text}",
            language_name(source),
            language_name(target)
        )
    }
}

/// Budget of three tokens per input character.
pub fn translation_request(text: &str, source: &str, target: &str, model: &str) -> CompletionRequest {
    let max_tokens = u32::try_from(text.chars().count().saturating_mul(3)).unwrap_or(u32::MAX);
    CompletionRequest::new(
        model,
        vec![
            ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
            ChatMessage::user(translation_prompt(text, source, target)),
        ],
    )
    .with_max_tokens(max_tokens)
    .with_temperature(TRANSLATION_TEMPERATURE)
}

impl CompletionClient {
    /// Translates `text` from `source` (or [`AUTO_DETECT`]) into `target`.
    ///
    /// An automatic source is detected locally first; when detection fails
    /// the model is asked to detect it. Same-language requests fail with
    /// [`CompletionError::InvalidRequest`] without calling upstream.
    /// `model` overrides the configured model for this call. A response
    /// without content is a [`CompletionError::Decode`] error.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
        model: Option<&str>,
    ) -> Result<Translation> {
        let started = Instant::now();
        let (source, detected_language) = resolve_source(text, source, target)?;
        let model = model.unwrap_or(&self.config().model);
        let request = translation_request(text, &source, target, model);
        let result = self.complete(&request).await?;

        let content = result
            .content
            .as_deref()
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| CompletionError::Decode("no translation content in response".to_owned()))?
            .to_owned();

        #[cfg(feature = "tracing")]
        tracing::info!(
            source = source.as_str(),
            target,
            model,
            latency_ms = started.elapsed().as_millis() as u64,
            tokens_used = result.total_tokens,
            "translation completed"
        );

        Ok(Translation {
            content,
            source_language: source,
            detected_language,
            latency: started.elapsed(),
            model: model.to_owned(),
            tokens_used: result.total_tokens,
        })
    }
}
