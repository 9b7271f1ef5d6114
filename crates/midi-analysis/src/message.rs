//! Decoded MIDI messages and timed event wrappers.

use serde::{Deserialize, Serialize};

/// Major or minor mode of a key signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl KeyMode {
    /// Mode byte of a key-signature meta event. Only `1` means minor.
    pub fn from_byte(byte: u8) -> Self {
        if byte == 1 {
            KeyMode::Minor
        } else {
            KeyMode::Major
        }
    }
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// The subset of SMF messages the analyzer cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiMessage {
    SetTempo {
        micros_per_quarter: u32,
    },
    TimeSignature {
        numerator: u8,
        /// Denominator exponent: the written denominator is `2^denominator_pow2`.
        denominator_pow2: u8,
    },
    KeySignature {
        sharps_flats: i8,
        mode: KeyMode,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    EndOfTrack,
}

impl MidiMessage {
    /// Ordering rank for events sharing a tick.
    ///
    /// Tempo, meter and key come first so the analyzer sees them before any
    /// note at the same instant; end-of-track markers sort last.
    pub fn priority(&self) -> u8 {
        match self {
            MidiMessage::SetTempo { .. } => 1,
            MidiMessage::TimeSignature { .. } => 2,
            MidiMessage::KeySignature { .. } => 3,
            MidiMessage::ProgramChange { .. } => 4,
            MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. } => 5,
            MidiMessage::ControlChange { .. } => 6,
            MidiMessage::EndOfTrack => 99,
        }
    }

    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => Some(channel),
            _ => None,
        }
    }
}

/// A message at an absolute tick within its source track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub absolute_tick: u64,
    pub message: MidiMessage,
}

/// A message positioned relative to the previous event of a merged stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEvent {
    pub delta_ticks: u64,
    pub message: MidiMessage,
}
