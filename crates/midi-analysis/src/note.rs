use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A note reconstructed from a matched Note-On / Note-Off pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub channel: u8,
    pub pitch: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    /// Always `end_tick - start_tick`, and always positive.
    pub duration_ticks: u64,
    pub velocity: u8,
}

/// Note-On statistics for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: u8,
    pub note_count: usize,
    pub avg_pitch: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct OnTally {
    count: usize,
    pitch_sum: u64,
}

/// Pairs Note-Ons with Note-Offs while replaying a stream.
///
/// Open notes are kept on a stack per (channel, pitch), so a repeated
/// Note-On before the first one closes nests inside it and the next
/// Note-Off closes the most recent one.
#[derive(Debug, Default)]
pub struct NoteTracker {
    // (channel, pitch) → stack of (onset_tick, velocity)
    open: HashMap<(u8, u8), Vec<(u64, u8)>>,
    notes: Vec<Note>,
    tallies: [OnTally; 16],
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_on(&mut self, tick: u64, channel: u8, pitch: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(tick, channel, pitch);
            return;
        }

        self.open
            .entry((channel, pitch))
            .or_default()
            .push((tick, velocity));

        let tally = &mut self.tallies[(channel & 0x0F) as usize];
        tally.count += 1;
        tally.pitch_sum += pitch as u64;
    }

    /// Close the most recent open note on this channel and pitch, if any.
    pub fn note_off(&mut self, tick: u64, channel: u8, pitch: u8) {
        let Some((start_tick, velocity)) = self
            .open
            .get_mut(&(channel, pitch))
            .and_then(|stack| stack.pop())
        else {
            return;
        };

        if tick > start_tick {
            self.notes.push(Note {
                channel,
                pitch,
                start_tick,
                end_tick: tick,
                duration_ticks: tick - start_tick,
                velocity,
            });
        }
    }

    /// Notes in the order they closed, and per-channel stats for every
    /// channel that saw at least one Note-On. Notes still open are dropped.
    pub fn finish(self) -> (Vec<Note>, Vec<ChannelStats>) {
        let stats = self
            .tallies
            .iter()
            .enumerate()
            .filter(|(_, t)| t.count > 0)
            .map(|(channel, t)| ChannelStats {
                channel: channel as u8,
                note_count: t.count,
                avg_pitch: t.pitch_sum as f64 / t.count as f64,
            })
            .collect();

        (self.notes, stats)
    }
}
