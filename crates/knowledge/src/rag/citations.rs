//! Citation extraction from generated answers.
//!
//! Citations are inline markers of the form `[[<marker>]]`. Which markers
//! are recognized is described by a table of rules, one per citation kind;
//! the rules are compiled into a single alternation so matches come back
//! in the order they appear in the text.

use crate::rag::types::{Citation, CitationKind};
use regex::Regex;
use yaseen_core::{AppError, AppResult};

/// Hadith collections the grammar recognizes.
///
/// The persona template lists the same names, so the model is only told
/// about collections this extractor understands.
pub const HADITH_COLLECTIONS: &[&str] = &["Bukhari", "Muslim"];

/// How the stored reference is derived from a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceRule {
    /// Use the rule's `<name>_ref` capture
    Capture,
    /// Use the whole marker body, trimmed
    WholeMarker,
}

#[derive(Debug, Clone)]
struct MarkerRule {
    kind: CitationKind,
    /// Capture group name; also the prefix of the `_ref` capture
    name: &'static str,
    /// Regex for the text between `[[` and `]]`
    body: String,
    reference: ReferenceRule,
}

fn default_rules(collections: &[&str]) -> Vec<MarkerRule> {
    let names = collections
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");

    vec![
        MarkerRule {
            kind: CitationKind::Quran,
            name: "quran",
            body: r"Q\s(?P<quran_ref>\d+:\d+)".to_string(),
            reference: ReferenceRule::Capture,
        },
        MarkerRule {
            kind: CitationKind::Hadith,
            name: "hadith",
            body: format!(r"(?:{})[^\]]+", names),
            reference: ReferenceRule::WholeMarker,
        },
    ]
}

/// Parses `[[...]]` markers into structured citations.
#[derive(Debug, Clone)]
pub struct CitationExtractor {
    pattern: Regex,
    rules: Vec<MarkerRule>,
}

impl CitationExtractor {
    /// Extractor for the built-in collections.
    pub fn new() -> AppResult<Self> {
        Self::with_collections(HADITH_COLLECTIONS)
    }

    /// Extractor recognizing the given hadith collections.
    pub fn with_collections(collections: &[&str]) -> AppResult<Self> {
        if collections.is_empty() {
            return Err(AppError::Config(
                "At least one hadith collection is required".to_string(),
            ));
        }

        let rules = default_rules(collections);
        let alternation = rules
            .iter()
            .map(|rule| format!("(?P<{}>{})", rule.name, rule.body))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(r"\[\[(?:{})\]\]", alternation))
            .map_err(|e| AppError::Config(format!("Invalid citation grammar: {}", e)))?;

        Ok(Self { pattern, rules })
    }

    /// All citations in `text`, in order of appearance, duplicates kept.
    pub fn extract(&self, text: &str) -> Vec<Citation> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                self.rules.iter().find_map(|rule| {
                    let marker = caps.name(rule.name)?;
                    let reference = match rule.reference {
                        ReferenceRule::Capture => caps
                            .name(&format!("{}_ref", rule.name))
                            .map(|m| m.as_str().to_string())?,
                        ReferenceRule::WholeMarker => marker.as_str().trim().to_string(),
                    };
                    Some(Citation {
                        kind: rule.kind,
                        reference,
                    })
                })
            })
            .collect()
    }
}
