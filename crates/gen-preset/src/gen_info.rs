//! The song-settings patch in the generator's own key names.

use serde::{Deserialize, Serialize};

/// Song part slot in the generator's part structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SongPartType {
    Verse1,
    Verse2,
    Chorus1,
    Chorus2,
    Bridge1,
    Bridge2,
    Misc1,
    Misc2,
}

impl SongPartType {
    /// Integer code used in serialized settings.
    pub fn code(&self) -> u8 {
        match self {
            Self::Verse1 => 0,
            Self::Verse2 => 1,
            Self::Chorus1 => 2,
            Self::Chorus2 => 3,
            Self::Bridge1 => 4,
            Self::Bridge2 => 5,
            Self::Misc1 => 6,
            Self::Misc2 => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Verse1,
            1 => Self::Verse2,
            2 => Self::Chorus1,
            3 => Self::Chorus2,
            4 => Self::Bridge1,
            5 => Self::Bridge2,
            6 => Self::Misc1,
            7 => Self::Misc2,
            _ => return None,
        })
    }
}

impl Serialize for SongPartType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for SongPartType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown song part type {code}")))
    }
}

/// Medium part strength.
pub const STRENGTH_MEDIUM: u8 = 1;

/// One part in a forced part sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPartStructureInfo {
    pub part_type: SongPartType,
    pub strength: u8,
    #[serde(rename = "_constructorName")]
    pub constructor_name: String,
}

impl SongPartStructureInfo {
    pub fn medium(part_type: SongPartType) -> Self {
        Self {
            part_type,
            strength: STRENGTH_MEDIUM,
            constructor_name: "SongPartStructureInfo".to_string(),
        }
    }
}

/// A weighted candidate part sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongPartStructureInfoDataSample {
    pub data: Vec<SongPartStructureInfo>,
    pub likelihood: u32,
    pub active: bool,
    #[serde(rename = "_constructorName")]
    pub constructor_name: String,
}

impl SongPartStructureInfoDataSample {
    /// An always-active sample of medium-strength parts.
    pub fn from_parts(parts: &[SongPartType]) -> Self {
        Self {
            data: parts.iter().copied().map(SongPartStructureInfo::medium).collect(),
            likelihood: 100,
            active: true,
            constructor_name: "SongPartStructureInfoDataSample".to_string(),
        }
    }

    pub fn part_types(&self) -> Vec<SongPartType> {
        self.data.iter().map(|p| p.part_type).collect()
    }
}

/// Settings to overlay on the generator's defaults. Unset keys are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo_range: Option<[u32; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature2_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature3_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_signature4_likelihood: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_scale_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor_scale_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harmonic_minor_scale_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_scale_base_note: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_base_note: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub electronic_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electric_likelihood: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acoustic_likelihood: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_melody_instruments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub melody_instruments: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_bass_instruments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bass_instruments: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_inner1_instruments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner1_instruments: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_inner2_instruments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner2_instruments: Option<Vec<u8>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_song_structure_likelihood_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verse_chorus_song_structure_likelihood_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verse_chorus_bridge_song_structure_likelihood_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_intro_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_end_probability: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_song_part_structure_rnd_infos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_part_structure_rnd_infos: Option<Vec<SongPartStructureInfoDataSample>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_melody_part_song_structure_likelihood_multiplier: Option<f64>,
}

impl GenInfo {
    /// Force a single part sequence, replacing any random structure.
    pub fn force_part_sequence(&mut self, parts: &[SongPartType]) {
        self.overwrite_song_part_structure_rnd_infos = Some(true);
        self.song_part_structure_rnd_infos =
            Some(vec![SongPartStructureInfoDataSample::from_parts(parts)]);
    }

    /// The forced part sequence, if any.
    pub fn forced_parts(&self) -> Option<Vec<SongPartType>> {
        if self.overwrite_song_part_structure_rnd_infos != Some(true) {
            return None;
        }
        self.song_part_structure_rnd_infos
            .as_ref()
            .and_then(|samples| samples.first())
            .map(SongPartStructureInfoDataSample::part_types)
    }
}
