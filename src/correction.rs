//! Proofreading prompt and response envelope
//!
//! The model is asked to work in three numbered steps and to wrap its answer
//! in a fixed envelope:
//!
//! ```text
//! ==========START==========
//! ### 1 ###
//! {detected language}
//!
//! ### 2 ###
//! {list of errors}
//!
//! ### 3 ###
//! {corrected text}
//! ===========END===========
//! ```
//!
//! Only the third section is used. Models are not always exact about the
//! number of `=` signs, so extraction matches the inner `===START===` and
//! `===END===` markers.

use crate::config::Config;

const ROLE: &str = "You are a world-class proofreader of texts. You can work with multiple \
languages. We are now presenting you with constraints, example proofreading procedures, and \
input text. Please follow the given procedure to proofread the input text, following the \
examples and adhering to the constraints.";

const PROCEDURE: &str = "1. detect the language of the input sentence (e.g. Hello -> English);\n\
2. detect errors (typos, omissions, etc.) in the input text and list them as bullet points;\n\
3. correct input sentences by referring to constraints and examples";

const ENVELOPE: &str = "Finally, the format of the output must be as follows\n\
\n\
==========START==========\n\
### 1 ###\n\
{result of procedure 1}\n\
\n\
### 2 ###\n\
{result of procedure 2}\n\
\n\
### 3 ###\n\
{result of procedure 3}\n\
===========END===========";

const START_MARKER: &str = "===START===";
const END_MARKER: &str = "===END===";
const RESULT_MARKER: &str = "### 3 ###";

/// Ordered (header, body) context pairs for correcting `text`
pub fn build_context<'a>(config: &'a Config, text: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("", ROLE),
        (
            "Follow the following rules which you have to follow:",
            config.condition_text.as_str(),
        ),
        ("Examples:", config.example_text.as_str()),
        ("Procedures:", PROCEDURE),
        ("Here is the input text which you should correct:", text),
        ("", ENVELOPE),
    ]
}

/// Corrected text pulled out of a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    /// All three envelope markers were present
    pub well_formed: bool,
}

impl Extraction {
    /// Whether the result needs to be flagged to the user
    pub fn is_degraded(&self) -> bool {
        !self.well_formed || self.text.is_empty()
    }
}

/// Extract the corrected text from a raw model response
///
/// Takes what follows the last start marker, up to the first end marker
/// after it, then what follows the last `### 3 ###` heading, trimmed.
/// Missing markers are skipped rather than treated as errors, so a response
/// that ignored the envelope degrades to (part of) the whole response with
/// `well_formed` unset.
pub fn extract_corrected_text(raw: &str) -> Extraction {
    let mut well_formed = true;
    let mut body = raw;

    match body.rfind(START_MARKER) {
        Some(pos) => body = body[pos + START_MARKER.len()..].trim_start_matches('='),
        None => well_formed = false,
    }

    match body.find(END_MARKER) {
        Some(pos) => body = body[..pos].trim_end_matches('='),
        None => well_formed = false,
    }

    match body.rfind(RESULT_MARKER) {
        Some(pos) => body = &body[pos + RESULT_MARKER.len()..],
        None => well_formed = false,
    }

    Extraction {
        text: body.trim().to_string(),
        well_formed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "Sure!\n\
==========START==========\n\
### 1 ###\n\
English\n\
\n\
### 2 ###\n\
- Helo -> Hello\n\
\n\
### 3 ###\n\
Hello world!\n\
===========END===========\n\
Anything else?";

    #[test]
    fn test_extract_well_formed() {
        let extraction = extract_corrected_text(RESPONSE);
        assert_eq!(extraction.text, "Hello world!");
        assert!(extraction.well_formed);
        assert!(!extraction.is_degraded());
    }

    #[test]
    fn test_extract_tolerates_marker_width() {
        let raw = "===START===\n### 3 ###\n  fixed  \n=====END=====";
        let extraction = extract_corrected_text(raw);
        assert_eq!(extraction.text, "fixed");
        assert!(extraction.well_formed);
    }

    #[test]
    fn test_extract_uses_last_start_marker() {
        let raw = format!("{}\n{}", ENVELOPE, RESPONSE);
        assert_eq!(extract_corrected_text(&raw).text, "Hello world!");
    }

    #[test]
    fn test_extract_keeps_multiline_result() {
        let raw = "==START==\n===START===\n### 3 ###\nline one\nline two\n===END===";
        assert_eq!(extract_corrected_text(raw).text, "line one\nline two");
    }

    #[test]
    fn test_extract_without_envelope_is_degraded() {
        let extraction = extract_corrected_text("  Hello world!  ");
        assert_eq!(extraction.text, "Hello world!");
        assert!(!extraction.well_formed);
        assert!(extraction.is_degraded());
    }

    #[test]
    fn test_extract_missing_section_three() {
        let raw = "===START===\n### 1 ###\nEnglish\n===END===";
        let extraction = extract_corrected_text(raw);
        assert!(!extraction.well_formed);
        assert_eq!(extraction.text, "### 1 ###\nEnglish");
    }

    #[test]
    fn test_extract_empty_section_is_degraded() {
        let raw = "===START===\n### 3 ###\n\n===END===";
        let extraction = extract_corrected_text(raw);
        assert!(extraction.well_formed);
        assert!(extraction.text.is_empty());
        assert!(extraction.is_degraded());
    }

    #[test]
    fn test_build_context_order() {
        let config = Config::default();
        let context = build_context(&config, "Helo");
        assert_eq!(context.len(), 6);
        assert_eq!(context[0].0, "");
        assert_eq!(context[1].1, config.condition_text);
        assert_eq!(context[2], ("Examples:", config.example_text.as_str()));
        assert_eq!(context[4].1, "Helo");
        assert!(context[5].1.contains("### 3 ###"));
    }

    #[test]
    fn test_envelope_template_extracts_placeholder() {
        let extraction = extract_corrected_text(ENVELOPE);
        assert!(extraction.well_formed);
        assert_eq!(extraction.text, "{result of procedure 3}");
    }
}
