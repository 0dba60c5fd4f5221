// src/perspectives.rs
//! Point / counterpoint / neutral summaries for an article.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::article::Perspective;

pub const POINT: &str = "point";
pub const COUNTERPOINT: &str = "counterpoint";
pub const NEUTRAL: &str = "neutral";

const SUMMARY_CHARS: usize = 100;

/// Voice the summaries are written in. Unknown names fall back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingStyle {
    #[default]
    Default,
    Standard,
    Thompson,
    Parker,
    Sagan,
    Baldwin,
    Pratchett,
    Eli5,
}

impl WritingStyle {
    pub const ALL: [WritingStyle; 8] = [
        WritingStyle::Default,
        WritingStyle::Standard,
        WritingStyle::Thompson,
        WritingStyle::Parker,
        WritingStyle::Sagan,
        WritingStyle::Baldwin,
        WritingStyle::Pratchett,
        WritingStyle::Eli5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WritingStyle::Default => "default",
            WritingStyle::Standard => "standard",
            WritingStyle::Thompson => "thompson",
            WritingStyle::Parker => "parker",
            WritingStyle::Sagan => "sagan",
            WritingStyle::Baldwin => "baldwin",
            WritingStyle::Pratchett => "pratchett",
            WritingStyle::Eli5 => "eli5",
        }
    }

    /// Lenient parse used for query strings.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for WritingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        WritingStyle::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| format!("unknown writing style {t:?}"))
    }
}

#[async_trait]
pub trait PerspectiveGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the `point`, `counterpoint` and `neutral` perspectives, in that order.
    async fn generate(
        &self,
        headline: &str,
        content: &str,
        style: WritingStyle,
    ) -> Result<Vec<Perspective>>;
}

/// Deterministic template summaries; used when no model backend is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackGenerator;

fn strip_quotes(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '"' | '\u{201C}' | '\u{201D}')).collect()
}

fn clip(content: &str) -> String {
    if content.chars().count() > SUMMARY_CHARS {
        let head: String = content.chars().take(SUMMARY_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

impl FallbackGenerator {
    pub fn perspectives(headline: &str, content: &str) -> Vec<Perspective> {
        let headline = strip_quotes(headline);
        let summary = strip_quotes(&clip(content));
        vec![
            Perspective {
                viewpoint: POINT.into(),
                summary: format!(
                    "{headline} reports: {summary}. A supportive read highlights concrete gains tied to the specifics here (people, place, timing) and explains how those gains continue over the next few steps. It should cite at least one clear upside that flows directly from the details above."
                ),
                title: None,
            },
            Perspective {
                viewpoint: COUNTERPOINT.into(),
                summary: format!(
                    "{headline} also leaves gaps: {summary}. A critical read calls out the missing costs, tradeoffs, or excluded parties and links that skepticism to the specifics above. It should name one plausible risk or downside and one practical safeguard rooted in those details."
                ),
                title: None,
            },
            Perspective {
                viewpoint: NEUTRAL.into(),
                summary: format!(
                    "Key facts: {summary} Readers should verify timing, scope, sources, and affected stakeholders."
                ),
                title: None,
            },
        ]
    }
}

#[async_trait]
impl PerspectiveGenerator for FallbackGenerator {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn generate(
        &self,
        headline: &str,
        content: &str,
        _style: WritingStyle,
    ) -> Result<Vec<Perspective>> {
        Ok(Self::perspectives(headline, content))
    }
}
