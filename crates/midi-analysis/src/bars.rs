//! Fixed-size bar grid and per-bar fingerprints.

use crate::note::Note;
use crate::roles::DRUM_CHANNEL;
use serde::{Deserialize, Serialize};

/// Note activity inside one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSummary {
    pub index: usize,
    pub note_on_count: u32,
    pub drum_hit_count: u32,
    pub velocity_sum: u32,
    pub velocity_count: u32,
    /// Pitch-class histogram.
    pub chroma: [u32; 12],
}

impl BarSummary {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            note_on_count: 0,
            drum_hit_count: 0,
            velocity_sum: 0,
            velocity_count: 0,
            chroma: [0; 12],
        }
    }

    pub fn add_note(&mut self, note: &Note) {
        self.note_on_count += 1;
        self.velocity_sum += note.velocity as u32;
        self.velocity_count += 1;
        self.chroma[(note.pitch % 12) as usize] += 1;
        if note.channel == DRUM_CHANNEL {
            self.drum_hit_count += 1;
        }
    }

    pub fn avg_velocity(&self) -> f64 {
        if self.velocity_count == 0 {
            0.0
        } else {
            self.velocity_sum as f64 / self.velocity_count as f64
        }
    }

    /// Weighted activity: notes, plus drum hits and loudness.
    pub fn energy(&self) -> f64 {
        self.note_on_count as f64 + 0.75 * self.drum_hit_count as f64 + 0.15 * self.avg_velocity()
    }

    /// Transposition-invariant fingerprint used for repeat matching.
    ///
    /// Twelve rotated chroma buckets followed by `N`, `D` and `V` buckets for
    /// note count, drum hits and mean velocity, joined with `.`.
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = rotate_to_peak(&self.chroma)
            .iter()
            .map(|&v| bucket(v as f64, 2.0, 5).to_string())
            .collect();
        parts.push(format!("N{}", bucket(self.note_on_count as f64, 8.0, 8)));
        parts.push(format!("D{}", bucket(self.drum_hit_count as f64, 6.0, 8)));
        parts.push(format!("V{}", bucket(self.avg_velocity(), 16.0, 8)));
        parts.join(".")
    }
}

/// Number of ticks in one bar of `numerator / denominator` time, at least 1.
pub fn ticks_per_bar(ticks_per_quarter: u16, numerator: u8, denominator: u32) -> u64 {
    let ticks_per_beat = ticks_per_quarter as f64 * (4.0 / denominator.max(1) as f64);
    (ticks_per_beat * numerator as f64).round().max(1.0) as u64
}

/// Bin notes by start bar. Notes starting at or beyond `bar_count` bars are ignored.
pub fn bin_notes(notes: &[Note], ticks_per_bar: u64, bar_count: usize) -> Vec<BarSummary> {
    let mut bars: Vec<BarSummary> = (0..bar_count).map(BarSummary::new).collect();
    let ticks_per_bar = ticks_per_bar.max(1);

    for note in notes {
        let index = note.start_tick / ticks_per_bar;
        if let Some(bar) = usize::try_from(index).ok().and_then(|i| bars.get_mut(i)) {
            bar.add_note(note);
        }
    }

    bars
}

/// Rotate so the first maximal bin lands at index 0.
fn rotate_to_peak(chroma: &[u32; 12]) -> [u32; 12] {
    let mut peak = 0;
    for (i, &v) in chroma.iter().enumerate() {
        if v > chroma[peak] {
            peak = i;
        }
    }

    let mut rotated = [0; 12];
    for (i, slot) in rotated.iter_mut().enumerate() {
        *slot = chroma[(i + peak) % 12];
    }
    rotated
}

fn bucket(value: f64, step: f64, max_bucket: u32) -> u32 {
    ((value / step).floor().max(0.0) as u32).min(max_bucket)
}
