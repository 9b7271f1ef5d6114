use crate::message::KeyMode;
use serde::{Deserialize, Serialize};

/// Tonic per sharps/flats count for major keys, indexed by `sharps_flats + 7`.
const MAJOR_TONICS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];

/// Tonic per sharps/flats count for minor keys, indexed by `sharps_flats + 7`.
const MINOR_TONICS: [&str; 15] = [
    "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#", "G#", "D#", "A#",
];

/// Key signature as written in the file: sharps (positive) or flats (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignature {
    pub sharps_flats: i8,
    pub mode: KeyMode,
}

impl KeySignature {
    pub fn new(sharps_flats: i8, mode: KeyMode) -> Self {
        Self { sharps_flats, mode }
    }

    /// Tonic spelling, e.g. `"F#"` or `"Bb"`. `None` outside -7..=7.
    pub fn tonic(&self) -> Option<&'static str> {
        if !(-7..=7).contains(&self.sharps_flats) {
            return None;
        }
        let index = (self.sharps_flats + 7) as usize;
        Some(match self.mode {
            KeyMode::Major => MAJOR_TONICS[index],
            KeyMode::Minor => MINOR_TONICS[index],
        })
    }

    /// Pitch class of the tonic, 0 = C.
    pub fn tonic_pitch_class(&self) -> Option<u8> {
        self.tonic().and_then(pitch_class)
    }

    /// Display name such as `"Eb minor"`.
    pub fn name(&self) -> Option<String> {
        self.tonic().map(|tonic| format!("{tonic} {}", self.mode))
    }
}

/// Pitch class of a note name: a letter plus any number of `#`/`b`.
pub fn pitch_class(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let base: i32 = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut offset = 0i32;
    for c in chars {
        match c {
            '#' => offset += 1,
            'b' => offset -= 1,
            _ => return None,
        }
    }
    Some((base + offset).rem_euclid(12) as u8)
}
