//! Elf personality, themes, and the dated-letter store
//!
//! Defaults describe a Swedish "tomtenisse" who lives in the wall and talks
//! to the children of the house during advent.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::Result;

/// Fixed personality description placed at the top of every prompt
pub const DEFAULT_PERSONALITY: &str = "\
Du är en tomtenisse som älskar julen.
Du pratar gammaldags och mysigt, som en riktig tomtenisse från svenska folksagorna.
Du använder uttryck som \"ho ho\", \"nämen\", \"jösses\", \"kära nån\".
Du är godhjärtad och älskar barn.
Du säger aldrig något läskigt.";

/// General advent theme, used when no letter applies
pub const DEFAULT_GENERAL_THEME: &str = "\
Det är adventstid och julen närmar sig!
Prata om jul, julklappar, tomten, snön, granen, pepparkakor, julpynt eller något annat juligt.";

/// Style used when no styles are configured
pub const FALLBACK_STYLE: &str = "Var uppspelt och glad";

/// Length hint used when no lengths are configured
pub const FALLBACK_LENGTH: &str = "1 mening";

/// Children the elf greets by name unless configured otherwise
pub const DEFAULT_NAMES: &[&str] = &["Livia", "Juni"];

/// Default dated-letter store file name
pub const DEFAULT_LETTERS_FILE: &str = "nissebrev.json";

/// Default delivery styles
pub const DEFAULT_STYLES: &[&str] = &[
    "Ställ en nyfiken fråga till barnet",
    "Berätta något spännande du gjort i natt",
    "Viska en hemlighet",
    "Var lite busig och skojig",
    "Var extra varm och kärleksfull",
    "Låtsas att du precis vaknade",
    "Var uppspelt och glad",
    "Ge barnet en liten komplimang",
    "Berätta något om musen du bor med i väggen",
    "Säg att musen gjort något tokigt bakom väggen",
    "Nämn att musen nästan väckte dig i natt med sitt prassel",
    "Säg att musen hälsar så gott till barnen",
    "Låtsas att du och musen håller på med ett hemligt julprojekt i väggen",
    "Berätta att du hörde barnens mamma och att hon verkar så trevlig",
    "Säg att du tycker om när barnens mamma pysslar, det låter så mysigt från väggen",
    "Nämn att du smög fram till väggen för att lyssna när barnens mamma skrattade",
    "Säg något om att du försöker vara tyst så du inte stör barnens mamma",
    "Berätta att du blev rädd när barnens mamma nös så högt",
    "Prata om hur varmt och tryggt det känns i väggen när mamman är hemma",
    "Låtsas att du och musen försöker hålla ordning i väggen när mamman städar utanför",
    "Berätta att du smugit runt och pysslat i natt",
    "Låtsas att du tappat något pyttelitet bakom dörren",
    "Låtsas att du försöker vara tyst men råkar prassla ändå",
    "Berätta att du sett något roligt barnet gjort",
    "Kläck ur dig något tokigt som bara nissar säger",
    "Låtsas att du övar på en julsång",
    "Prata om att du hjälpt tomten med ett viktigt litet uppdrag",
    "Säg att du nästan fastnade i en snödriva på väg hit",
    "Låtsas att du hörde något och blev nyfiken",
    "Prata om hur svårt det är att bära stora paket med så små nissearmar",
    "Var hemlighetsfull och påstå att du har 'nisse-grejer' på gång",
    "Prata om hur det luktar jul i huset",
    "Berätta om en liten olycka, som att du spillde glitter över hela golvet bakom dörren",
    "Låtsas att du just tränar på att slå in paket snabbt",
    "Var andfådd som om du sprungit genom hela nisselandet",
    "Prata om hur mycket du älskar värmen från huset när det är kallt ute",
    "Säg något om att du försökt vara tyst men råkade nysa",
    "Berätta om ett nytt nissebus du funderar på",
    "Låtsas att du råkade smaka på pepparkaksdegen",
    "Säg att du just nu gömmer dig för tomtens renar som busar runt",
];

/// Default length hints
pub const DEFAULT_LENGTHS: &[&str] = &["1 mening", "2 meningar", "2-3 meningar"];

/// Immutable theme configuration loaded at startup
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// Personality description
    pub personality: String,

    /// General theme text
    pub general_theme: String,

    /// Names the elf may mention
    pub names: Vec<String>,

    /// Delivery style descriptors
    pub styles: Vec<String>,

    /// Length descriptors
    pub lengths: Vec<String>,

    /// Dated-letter store (JSON), read during theme selection
    pub letters_path: Option<PathBuf>,

    /// Probability of using the general theme instead of today's letter
    pub general_theme_rate: f64,

    /// Probability of asking the elf to mention the names
    pub name_mention_rate: f64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            personality: DEFAULT_PERSONALITY.to_string(),
            general_theme: DEFAULT_GENERAL_THEME.to_string(),
            names: DEFAULT_NAMES.iter().map(ToString::to_string).collect(),
            styles: DEFAULT_STYLES.iter().map(ToString::to_string).collect(),
            lengths: DEFAULT_LENGTHS.iter().map(ToString::to_string).collect(),
            letters_path: Some(PathBuf::from(DEFAULT_LETTERS_FILE)),
            general_theme_rate: 0.5,
            name_mention_rate: 0.3,
        }
    }
}

/// A scripted message left for the children on a given day
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Letter {
    /// Day in `YYYY-MM-DD` form
    pub date: String,

    /// Letter text
    pub message: String,
}

/// The dated-letter store: a JSON list of `{date, message}` entries
#[derive(Debug, Clone, Default)]
pub struct LetterStore {
    letters: Vec<Letter>,
}

impl LetterStore {
    /// Load the store from a JSON file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse the store from JSON text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a list of letters
    pub fn from_json(content: &str) -> Result<Self> {
        let letters: Vec<Letter> = serde_json::from_str(content)?;
        Ok(Self { letters })
    }

    /// Number of letters in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    /// Whether the store holds no letters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// First letter dated `date`
    #[must_use]
    pub fn for_date(&self, date: NaiveDate) -> Option<&Letter> {
        let key = date.format("%Y-%m-%d").to_string();
        self.letters.iter().find(|l| l.date == key)
    }
}

/// Theme text built around today's letter
#[must_use]
pub fn letter_theme(letter: &Letter) -> String {
    format!(
        "Idag lämnade du detta brev till barnen:\n\"{}\"\n\n\
         Prata om något som anknyter till dagens brev, kanske det bus du gjorde i natt,\n\
         eller fråga om de hittade det du gömde. Var lekfull och nyfiken!",
        letter.message.trim()
    )
}
