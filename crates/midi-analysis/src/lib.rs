pub mod analyze;
pub mod bars;
pub mod cursor;
pub mod decode;
pub mod gm;
pub mod key;
pub mod merge;
pub mod message;
pub mod note;
pub mod roles;
pub mod structure;
pub mod summary;

pub use analyze::{analyze, analyze_events, AnalysisParams, MidiAnalysis, DEFAULT_MAX_BARS};
pub use bars::BarSummary;
pub use cursor::ByteCursor;
pub use decode::{decode, DecodedSmf};
pub use key::KeySignature;
pub use merge::merge_tracks;
pub use message::{DeltaEvent, KeyMode, MidiMessage, RawEvent};
pub use note::{ChannelStats, Note};
pub use roles::RoleChannels;
pub use structure::{RepeatMatch, Section, SongForm};
pub use summary::summarize;

/// Errors from SMF decoding.
///
/// Offsets are absolute byte positions in the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid MIDI header: {0}")]
    InvalidHeader(String),

    #[error("invalid track header for track {track}: expected `MTrk`, found {found:?}")]
    InvalidTrackHeader { track: usize, found: String },

    #[error("SMPTE time division is not supported (division {0:#06x})")]
    UnsupportedTimeDivision(u16),

    #[error("data byte at offset {offset} with no running status in effect")]
    InvalidRunningStatus { offset: usize },

    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEndOfData { offset: usize, needed: usize },
}

impl Error {
    /// Rebase a position reported by a sub-cursor onto the enclosing buffer.
    pub(crate) fn shifted(self, base: usize) -> Self {
        match self {
            Error::InvalidRunningStatus { offset } => Error::InvalidRunningStatus {
                offset: offset + base,
            },
            Error::UnexpectedEndOfData { offset, needed } => Error::UnexpectedEndOfData {
                offset: offset + base,
                needed,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
