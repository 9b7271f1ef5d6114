use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

const SYNTH_PROGRAMS: RangeInclusive<u8> = 80..=119;
/// Guitars, basses and strings.
const ELECTRIC_PROGRAMS: RangeInclusive<u8> = 24..=47;

/// Share of program changes a bucket needs to dominate.
const DOMINANT_SHARE: f64 = 0.45;

/// Broad instrument family of a General MIDI program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneBucket {
    Synth,
    Electric,
    Acoustic,
}

impl ToneBucket {
    pub fn of_program(program: u8) -> Self {
        if SYNTH_PROGRAMS.contains(&program) {
            Self::Synth
        } else if ELECTRIC_PROGRAMS.contains(&program) {
            Self::Electric
        } else {
            Self::Acoustic
        }
    }
}

/// Likelihood weights for the generator's instrument character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneWeights {
    pub electronic: f64,
    pub electric: f64,
    pub acoustic: f64,
}

impl ToneWeights {
    pub const SYNTH_LEANING: Self = Self {
        electronic: 6.0,
        electric: 1.0,
        acoustic: 0.5,
    };
    pub const ELECTRIC_LEANING: Self = Self {
        electronic: 0.75,
        electric: 6.0,
        acoustic: 1.0,
    };
    pub const ACOUSTIC_LEANING: Self = Self {
        electronic: 0.75,
        electric: 1.0,
        acoustic: 6.0,
    };
}

/// Pick weights from a program histogram. `None` when the histogram is empty.
///
/// Synth is checked before electric; acoustic is the fallback when no
/// bucket holds more than 45% of the total.
pub fn tone_weights(program_counts: &BTreeMap<u8, usize>) -> Option<ToneWeights> {
    let mut total = 0usize;
    let mut synth = 0usize;
    let mut electric = 0usize;

    for (&program, &count) in program_counts {
        total += count;
        match ToneBucket::of_program(program) {
            ToneBucket::Synth => synth += count,
            ToneBucket::Electric => electric += count,
            ToneBucket::Acoustic => {}
        }
    }

    if total == 0 {
        return None;
    }

    let share = |n: usize| n as f64 / total as f64;
    Some(if share(synth) > DOMINANT_SHARE {
        ToneWeights::SYNTH_LEANING
    } else if share(electric) > DOMINANT_SHARE {
        ToneWeights::ELECTRIC_LEANING
    } else {
        ToneWeights::ACOUSTIC_LEANING
    })
}
