//! Prompt composition: theme, style, length, and name mention
//!
//! Composition is deterministic given the random source, today's date, and the
//! letter store, so callers inject the RNG.

use std::fmt;

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::theme::{self, FALLBACK_LENGTH, FALLBACK_STYLE, LetterStore, ThemeConfig};

/// Where the theme of a prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeSource {
    /// The general advent theme
    General,
    /// Today's letter
    Letter {
        /// Letter date (`YYYY-MM-DD`)
        date: String,
    },
}

impl fmt::Display for ThemeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Letter { date } => write!(f, "letter {date}"),
        }
    }
}

/// A fully selected prompt, consumed once by the phrase generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub personality: String,
    pub theme: String,
    pub theme_source: ThemeSource,
    pub style: String,
    pub length: String,
    pub name_clause: Option<String>,
}

impl ComposedPrompt {
    /// Render the instruction block sent as the user message
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{personality}\n\n\
             Dagens tema: {theme}\n\n\
             Generera EN kort replik ({length}) som nissen säger när ett barn går förbi.\n\
             Stil: {style}\n\n\
             Repliken ska vara:\n\
             - Anknyta till dagens tema/brev om möjligt\n\
             - Använd nisseuttryck som \"ho ho\", \"nämen\", \"jösses\"\n\
             - Barnvänlig och glad, aldrig läskig\n\
             - På svenska\n\
             - Högst {length}",
            personality = self.personality.trim(),
            theme = self.theme.trim(),
            length = self.length,
            style = self.style,
        );

        if let Some(clause) = &self.name_clause {
            out.push('\n');
            out.push_str(clause);
        }

        out
    }
}

/// Name-mention instruction listing every name
#[must_use]
pub fn name_clause(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    Some(format!("- Nämn barnen {} vid namn", names.join(" och ")))
}

/// Builds a fresh prompt per cycle from the theme configuration
#[derive(Debug, Clone)]
pub struct PromptComposer {
    config: ThemeConfig,
}

impl PromptComposer {
    /// Create a composer over an immutable theme configuration
    #[must_use]
    pub const fn new(config: ThemeConfig) -> Self {
        Self { config }
    }

    /// Theme configuration in use
    #[must_use]
    pub const fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Compose a prompt for `today`
    ///
    /// Draw order: theme, style, length, name mention.
    pub fn compose<R: Rng + ?Sized>(&self, rng: &mut R, today: NaiveDate) -> ComposedPrompt {
        let theme_draw: f64 = rng.gen_range(0.0..1.0);
        let (theme_source, theme) = self.select_theme(theme_draw, today);

        let style = self
            .config
            .styles
            .choose(rng)
            .map_or(FALLBACK_STYLE, String::as_str)
            .to_string();
        let length = self
            .config
            .lengths
            .choose(rng)
            .map_or(FALLBACK_LENGTH, String::as_str)
            .to_string();

        let name_draw: f64 = rng.gen_range(0.0..1.0);
        let name_clause = if name_draw < self.config.name_mention_rate {
            name_clause(&self.config.names)
        } else {
            None
        };

        ComposedPrompt {
            personality: self.config.personality.clone(),
            theme,
            theme_source,
            style,
            length,
            name_clause,
        }
    }

    /// Pick the theme for a draw in `[0, 1)`
    ///
    /// Reads the letter store only when the draw selects it; any failure to
    /// read or parse it falls back to the general theme.
    #[must_use]
    pub fn select_theme(&self, draw: f64, today: NaiveDate) -> (ThemeSource, String) {
        if draw < self.config.general_theme_rate {
            return self.general();
        }

        let Some(path) = &self.config.letters_path else {
            return self.general();
        };

        match LetterStore::load(path) {
            Ok(store) => self.select_from_store(&store, today),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "letter store unavailable, using general theme"
                );
                self.general()
            }
        }
    }

    /// Theme for a letter-draw given an already loaded store
    #[must_use]
    pub fn select_from_store(
        &self,
        store: &LetterStore,
        today: NaiveDate,
    ) -> (ThemeSource, String) {
        store.for_date(today).map_or_else(
            || self.general(),
            |letter| {
                (
                    ThemeSource::Letter {
                        date: letter.date.clone(),
                    },
                    theme::letter_theme(letter),
                )
            },
        )
    }

    fn general(&self) -> (ThemeSource, String) {
        (ThemeSource::General, self.config.general_theme.clone())
    }
}
