use crate::note::ChannelStats;
use serde::{Deserialize, Serialize};

/// General MIDI percussion channel (channel 10, zero-based 9).
pub const DRUM_CHANNEL: u8 = 9;

/// Minimum Note-On count for a channel to be preferred as melody.
const MELODY_MIN_NOTES: usize = 8;

/// Arrangement role a channel can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Melody,
    Inner1,
    Inner2,
    Bass,
    Drums,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melody => "melody",
            Self::Inner1 => "inner1",
            Self::Inner2 => "inner2",
            Self::Bass => "bass",
            Self::Drums => "drums",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel chosen for each role. Pitched roles are unset when no channel fits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChannels {
    pub melody: Option<u8>,
    pub bass: Option<u8>,
    pub inner1: Option<u8>,
    pub inner2: Option<u8>,
    pub drums: u8,
}

impl Default for RoleChannels {
    fn default() -> Self {
        Self {
            melody: None,
            bass: None,
            inner1: None,
            inner2: None,
            drums: DRUM_CHANNEL,
        }
    }
}

impl RoleChannels {
    /// Pitched roles in arrangement order: melody, inner1, inner2, bass.
    pub fn pitched(&self) -> [(Role, Option<u8>); 4] {
        [
            (Role::Melody, self.melody),
            (Role::Inner1, self.inner1),
            (Role::Inner2, self.inner2),
            (Role::Bass, self.bass),
        ]
    }
}

/// Assign roles from per-channel Note-On statistics.
///
/// Ties keep the busier channel first, then the lower channel number.
pub fn assign_roles(stats: &[ChannelStats]) -> RoleChannels {
    let mut pitched: Vec<&ChannelStats> = stats
        .iter()
        .filter(|s| s.channel != DRUM_CHANNEL && s.note_count > 0)
        .collect();
    pitched.sort_by_key(|s| s.channel);
    pitched.sort_by(|a, b| b.note_count.cmp(&a.note_count));

    let Some(first) = pitched.first() else {
        return RoleChannels::default();
    };

    let mut low_to_high = pitched.clone();
    low_to_high.sort_by(|a, b| a.avg_pitch.total_cmp(&b.avg_pitch));
    let bass = low_to_high.first().map_or(first.channel, |s| s.channel);

    let mut high_to_low = pitched.clone();
    high_to_low.sort_by(|a, b| b.avg_pitch.total_cmp(&a.avg_pitch));
    let melody = high_to_low
        .iter()
        .find(|s| s.note_count >= MELODY_MIN_NOTES)
        .or(high_to_low.first())
        .map_or(first.channel, |s| s.channel);

    // `pitched` is already ordered by note count.
    let mut inner = pitched
        .iter()
        .filter(|s| s.channel != melody && s.channel != bass)
        .map(|s| s.channel);

    RoleChannels {
        melody: Some(melody),
        bass: Some(bass),
        inner1: inner.next(),
        inner2: inner.next(),
        drums: DRUM_CHANNEL,
    }
}
