use crate::Error;
use midi_analysis::SongForm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the song form is chosen: from the analysis, or forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormMode {
    #[default]
    Auto,
    Loop,
    #[serde(alias = "verse-chorus", alias = "verse_chorus")]
    VerseChorus,
    Build,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Loop => "loop",
            Self::VerseChorus => "verseChorus",
            Self::Build => "build",
        }
    }

    /// The form actually applied: the suggestion under `Auto`, else the forced form.
    pub fn resolve(&self, suggested: SongForm) -> SongForm {
        match self {
            Self::Auto => suggested,
            Self::Loop => SongForm::Loop,
            Self::VerseChorus => SongForm::VerseChorus,
            Self::Build => SongForm::Build,
        }
    }
}

impl std::fmt::Display for FormMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "loop" => Ok(Self::Loop),
            "verseChorus" | "verse-chorus" | "verse_chorus" => Ok(Self::VerseChorus),
            "build" => Ok(Self::Build),
            other => Err(Error::UnknownFormMode(other.to_string())),
        }
    }
}
