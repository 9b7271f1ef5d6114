//! Repeat detection, section labelling, energy statistics and form choice.

use crate::bars::BarSummary;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const MIN_REPEAT_BARS: usize = 4;
pub const MAX_REPEAT_BARS: usize = 16;

/// Label energy ratio at or above which sections count as contrasting.
pub const STRONG_CONTRAST: f64 = 1.35;
/// Bar energy coefficient of variation at or below which a piece is monotone.
pub const MONOTONE_CV: f64 = 0.18;
/// Contrast reported when the quietest label has no energy at all.
pub const UNBOUNDED_CONTRAST: f64 = 999.0;

/// Two equal runs of bar signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatMatch {
    pub length: usize,
    pub start_a: usize,
    pub start_b: usize,
}

/// An inclusive bar range with a structural label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub start_bar: usize,
    pub end_bar: usize,
}

impl Section {
    pub fn new(label: &str, start_bar: usize, end_bar: usize) -> Self {
        Self {
            label: label.to_string(),
            start_bar,
            end_bar,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.end_bar + 1 - self.start_bar
    }
}

/// Coarse arrangement shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SongForm {
    Loop,
    VerseChorus,
    Build,
}

impl SongForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::VerseChorus => "verseChorus",
            Self::Build => "build",
        }
    }
}

impl std::fmt::Display for SongForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean, sample standard deviation and coefficient of variation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyStats {
    pub mean: f64,
    pub std_dev: f64,
    pub cv: f64,
}

impl EnergyStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = if values.len() < 2 {
            0.0
        } else {
            let sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
            (sq / (n - 1.0)).sqrt()
        };
        let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

        Self { mean, std_dev, cv }
    }
}

/// Find repeated runs of bar signatures, longest first.
///
/// Lengths are tried from `min(max_len, bars / 2)` down to `min_len`; the
/// search stops at the first length with any match. Each match pairs the
/// first occurrence of a run with a later occurrence that does not overlap it.
pub fn find_repeats(signatures: &[String], min_len: usize, max_len: usize) -> Vec<RepeatMatch> {
    let bars = signatures.len();
    let longest = max_len.min(bars / 2);
    let mut repeats = Vec::new();

    for length in (min_len.max(1)..=longest).rev() {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        for start in 0..=bars - length {
            let key = signatures[start..start + length].join("|");
            match first_seen.get(&key) {
                Some(&earlier) if start >= earlier + length => repeats.push(RepeatMatch {
                    length,
                    start_a: earlier,
                    start_b: start,
                }),
                Some(_) => {}
                None => {
                    first_seen.insert(key, start);
                }
            }
        }
        if !repeats.is_empty() {
            break;
        }
    }

    repeats
}

/// Label both halves of a repeat `A`, the gap between them and the tail `B`,
/// then merge touching sections that share a label.
pub fn infer_sections(best: Option<&RepeatMatch>, analyzed_bars: usize) -> Vec<Section> {
    let Some(best) = best else {
        return Vec::new();
    };
    let len = best.length;

    let mut sections = vec![
        Section::new("A", best.start_a, best.start_a + len - 1),
        Section::new("A", best.start_b, best.start_b + len - 1),
    ];

    let gap_start = best.start_a + len;
    if best.start_b > gap_start {
        sections.push(Section::new("B", gap_start, best.start_b - 1));
    }

    let tail_start = best.start_b + len;
    if tail_start < analyzed_bars {
        sections.push(Section::new("B", tail_start, analyzed_bars - 1));
    }

    sections.sort_by_key(|s| s.start_bar);

    let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
    for section in sections {
        match merged.last_mut() {
            Some(last) if last.label == section.label && section.start_bar <= last.end_bar + 1 => {
                last.end_bar = last.end_bar.max(section.end_bar);
            }
            _ => merged.push(section),
        }
    }
    merged
}

/// Mean bar energy over a section, counting only bars inside the grid.
pub fn section_energy(section: &Section, bars: &[BarSummary]) -> f64 {
    let in_grid: Vec<f64> = (section.start_bar..=section.end_bar)
        .filter_map(|i| bars.get(i))
        .map(BarSummary::energy)
        .collect();
    if in_grid.is_empty() {
        0.0
    } else {
        in_grid.iter().sum::<f64>() / in_grid.len() as f64
    }
}

/// Average section energy per label.
pub fn label_energies(sections: &[Section], bars: &[BarSummary]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for section in sections {
        let entry = totals.entry(section.label.clone()).or_insert((0.0, 0));
        entry.0 += section_energy(section, bars);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(label, (sum, count))| (label, sum / count.max(1) as f64))
        .collect()
}

/// Ratio of the loudest to the quietest label energy.
pub fn energy_contrast(label_energies: &BTreeMap<String, f64>) -> f64 {
    if label_energies.len() < 2 {
        return 1.0;
    }
    let min = label_energies.values().copied().fold(f64::INFINITY, f64::min);
    let max = label_energies.values().copied().fold(f64::NEG_INFINITY, f64::max);

    if min > 0.0 {
        max / min
    } else if max > 0.0 {
        UNBOUNDED_CONTRAST
    } else {
        1.0
    }
}

pub fn suggest_form(has_repeats: bool, label_count: usize, contrast: f64, bar_energy_cv: f64) -> SongForm {
    let strong_contrast = label_count >= 2 && contrast >= STRONG_CONTRAST;
    if has_repeats {
        if strong_contrast {
            SongForm::VerseChorus
        } else {
            SongForm::Loop
        }
    } else if bar_energy_cv <= MONOTONE_CV {
        SongForm::Loop
    } else {
        SongForm::Build
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sigs(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn bar(index: usize, notes: u32, velocity: u32) -> BarSummary {
        let mut bar = BarSummary::new(index);
        bar.note_on_count = notes;
        bar.velocity_count = notes;
        bar.velocity_sum = notes * velocity;
        bar
    }

    #[test]
    fn finds_repeat_at_expected_offsets() {
        // Bars 0-3 equal bars 8-11; everything else distinct.
        let s = sigs(&[
            "a", "b", "c", "d", "e", "f", "g", "h", "a", "b", "c", "d", "i", "j", "k", "l",
        ]);
        let repeats = find_repeats(&s, MIN_REPEAT_BARS, MAX_REPEAT_BARS);
        assert_eq!(
            repeats,
            vec![RepeatMatch {
                length: 4,
                start_a: 0,
                start_b: 8
            }]
        );
    }

    #[test]
    fn longest_length_wins() {
        let s = sigs(&["a", "b", "c", "d", "e", "a", "b", "c", "d", "e"]);
        let repeats = find_repeats(&s, 4, 16);
        assert_eq!(repeats[0].length, 5);
        assert_eq!((repeats[0].start_a, repeats[0].start_b), (0, 5));
    }

    #[test]
    fn overlapping_runs_are_not_repeats() {
        // Constant bars overlap themselves at every length; only disjoint pairs count.
        let s = sigs(&["x"; 10]);
        let repeats = find_repeats(&s, 4, 16);
        assert!(repeats.iter().all(|r| r.start_b >= r.start_a + r.length));
        assert_eq!(repeats[0], RepeatMatch { length: 5, start_a: 0, start_b: 5 });
        assert_eq!(repeats.len(), 1);
    }

    #[test]
    fn too_few_bars_for_a_repeat() {
        let s = sigs(&["a", "b", "c", "a", "b", "c", "x"]);
        assert!(find_repeats(&s, 4, 16).is_empty());
        assert!(find_repeats(&[], 4, 16).is_empty());
    }

    #[test]
    fn sections_with_gap_and_tail() {
        let best = RepeatMatch {
            length: 4,
            start_a: 0,
            start_b: 8,
        };
        assert_eq!(
            infer_sections(Some(&best), 16),
            vec![
                Section::new("A", 0, 3),
                Section::new("B", 4, 7),
                Section::new("A", 8, 11),
                Section::new("B", 12, 15),
            ]
        );
    }

    #[test]
    fn adjacent_repeats_merge() {
        let best = RepeatMatch {
            length: 8,
            start_a: 0,
            start_b: 8,
        };
        assert_eq!(infer_sections(Some(&best), 16), vec![Section::new("A", 0, 15)]);
        assert!(infer_sections(None, 16).is_empty());
    }

    #[test]
    fn energy_stats_use_sample_deviation() {
        let stats = EnergyStats::from_values(&[2.0, 4.0, 6.0]);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.cv, 0.5);

        assert_eq!(EnergyStats::from_values(&[3.0]).std_dev, 0.0);
        assert_eq!(EnergyStats::from_values(&[0.0, 0.0]).cv, 0.0);
        assert_eq!(EnergyStats::from_values(&[]), EnergyStats::default());
    }

    #[test]
    fn label_energy_and_contrast() {
        let bars: Vec<BarSummary> = (0..8)
            .map(|i| if i < 4 { bar(i, 4, 0) } else { bar(i, 8, 0) })
            .collect();
        let sections = vec![Section::new("A", 0, 3), Section::new("B", 4, 7)];
        let energies = label_energies(&sections, &bars);

        assert_eq!(energies["A"], 4.0);
        assert_eq!(energies["B"], 8.0);
        assert_eq!(energy_contrast(&energies), 2.0);
    }

    #[test]
    fn contrast_edge_cases() {
        let mut energies = BTreeMap::new();
        energies.insert("A".to_string(), 5.0);
        assert_eq!(energy_contrast(&energies), 1.0);

        energies.insert("B".to_string(), 0.0);
        assert_eq!(energy_contrast(&energies), UNBOUNDED_CONTRAST);

        energies.insert("A".to_string(), 0.0);
        assert_eq!(energy_contrast(&energies), 1.0);
    }

    #[test]
    fn section_energy_ignores_bars_off_the_grid() {
        let bars = vec![bar(0, 2, 0), bar(1, 4, 0)];
        assert_eq!(section_energy(&Section::new("B", 1, 5), &bars), 4.0);
        assert_eq!(section_energy(&Section::new("B", 3, 5), &bars), 0.0);
    }

    #[test]
    fn form_decisions() {
        assert_eq!(suggest_form(true, 2, 1.5, 0.5), SongForm::VerseChorus);
        assert_eq!(suggest_form(true, 2, 1.2, 0.5), SongForm::Loop);
        assert_eq!(suggest_form(true, 1, 1.0, 0.5), SongForm::Loop);
        assert_eq!(suggest_form(false, 0, 1.0, 0.0), SongForm::Loop);
        assert_eq!(suggest_form(false, 0, 1.0, 0.18), SongForm::Loop);
        assert_eq!(suggest_form(false, 0, 1.0, 0.4), SongForm::Build);
    }
}
