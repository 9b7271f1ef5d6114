//! Translate a [`MidiAnalysis`] into generator settings.

use crate::form::FormMode;
use crate::gen_info::{GenInfo, SongPartType};
use crate::tone::tone_weights;
use midi_analysis::roles::Role;
use midi_analysis::{KeyMode, MidiAnalysis, SongForm};
use std::collections::HashMap;
use tracing::debug;

const MIN_BPM: f64 = 10.0;
const MAX_BPM: f64 = 500.0;
const TEMPO_SPREAD: f64 = 0.05;

const DETECTED_LIKELIHOOD: f64 = 10.0;
const OTHER_LIKELIHOOD: f64 = 0.2;
const HARMONIC_MINOR_NUDGE: f64 = 1.5;

/// Middle C; the scale base note is the tonic in this octave.
const BASE_OCTAVE_C: u8 = 60;

/// Melody note starts per bar below which a section counts as sparse.
const SPARSE_MELODY_PER_BAR: f64 = 1.5;
const NO_MELODY_MULTIPLIER: f64 = 3.0;

const LOOP_PART_COUNT: usize = 6;

/// Likelihood multipliers for the build, verse-chorus and verse-chorus-bridge
/// song structures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureMultipliers {
    pub build: f64,
    pub verse_chorus: f64,
    pub verse_chorus_bridge: f64,
}

impl StructureMultipliers {
    pub const NEUTRAL: Self = Self {
        build: 1.0,
        verse_chorus: 1.0,
        verse_chorus_bridge: 1.0,
    };

    pub fn for_form(form: SongForm, section_count: usize) -> Self {
        match form {
            SongForm::VerseChorus => Self {
                build: 0.5,
                verse_chorus: 8.0,
                verse_chorus_bridge: if section_count >= 3 { 2.5 } else { 1.0 },
            },
            SongForm::Build => Self {
                build: 6.0,
                verse_chorus: 0.4,
                verse_chorus_bridge: 0.25,
            },
            SongForm::Loop => Self {
                build: 6.0,
                verse_chorus: 0.15,
                verse_chorus_bridge: 0.05,
            },
        }
    }
}

/// Build the settings patch for an analysis under the given form mode.
pub fn map_analysis(analysis: &MidiAnalysis, mode: FormMode) -> GenInfo {
    let mut info = GenInfo::default();

    apply_tempo(&mut info, analysis);
    apply_time_signature(&mut info, analysis);
    apply_key(&mut info, analysis);
    apply_tone(&mut info, analysis);
    apply_role_instruments(&mut info, analysis);

    let form = mode.resolve(analysis.suggested_form);
    debug!(%mode, suggested = %analysis.suggested_form, %form, "resolved song form");
    apply_form(&mut info, analysis, form);

    if has_sparse_melody(analysis) {
        info.no_melody_part_song_structure_likelihood_multiplier = Some(NO_MELODY_MULTIPLIER);
    }

    if form == SongForm::VerseChorus {
        if let Some(parts) = verse_chorus_parts(analysis) {
            debug!(parts = parts.len(), "forcing verse/chorus part order");
            info.force_part_sequence(&parts);
        }
    }

    info
}

/// Allowed tempo range around the detected tempo.
pub fn tempo_range(bpm: f64) -> Option<[u32; 2]> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return None;
    }
    let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    let spread = (bpm * TEMPO_SPREAD).round().max(2.0);
    let bound = |v: f64| v.round().clamp(MIN_BPM, MAX_BPM) as u32;
    Some([bound(bpm - spread), bound(bpm + spread)])
}

fn apply_tempo(info: &mut GenInfo, analysis: &MidiAnalysis) {
    info.tempo_range = analysis.bpm.and_then(tempo_range);
}

fn apply_time_signature(info: &mut GenInfo, analysis: &MidiAnalysis) {
    let Some(ts) = analysis.time_signature else {
        return;
    };
    if ts.denominator != 4 || !(2..=4).contains(&ts.numerator) {
        return;
    }

    let weight = |beats: u8| {
        Some(if ts.numerator == beats {
            DETECTED_LIKELIHOOD
        } else {
            OTHER_LIKELIHOOD
        })
    };
    info.time_signature2_likelihood = weight(2);
    info.time_signature3_likelihood = weight(3);
    info.time_signature4_likelihood = weight(4);
}

fn apply_key(info: &mut GenInfo, analysis: &MidiAnalysis) {
    let Some(key) = analysis.key_signature else {
        return;
    };
    let minor = key.mode == KeyMode::Minor;

    info.minor_scale_likelihood = Some(if minor { DETECTED_LIKELIHOOD } else { OTHER_LIKELIHOOD });
    info.major_scale_likelihood = Some(if minor { OTHER_LIKELIHOOD } else { DETECTED_LIKELIHOOD });
    info.harmonic_minor_scale_likelihood = Some(if minor { HARMONIC_MINOR_NUDGE } else { 0.0 });

    if let Some(pc) = key.tonic_pitch_class() {
        info.set_scale_base_note = Some(true);
        info.scale_base_note = Some(BASE_OCTAVE_C + pc);
    }
}

fn apply_tone(info: &mut GenInfo, analysis: &MidiAnalysis) {
    if let Some(weights) = tone_weights(&analysis.program_counts) {
        info.electronic_likelihood = Some(weights.electronic);
        info.electric_likelihood = Some(weights.electric);
        info.acoustic_likelihood = Some(weights.acoustic);
    }
}

fn apply_role_instruments(info: &mut GenInfo, analysis: &MidiAnalysis) {
    for (role, channel) in analysis.role_channels.pitched() {
        let Some(channel) = channel else {
            continue;
        };
        let program = Some(vec![analysis.program_for_channel(channel)]);
        match role {
            Role::Melody => {
                info.overwrite_melody_instruments = Some(true);
                info.melody_instruments = program;
            }
            Role::Bass => {
                info.overwrite_bass_instruments = Some(true);
                info.bass_instruments = program;
            }
            Role::Inner1 => {
                info.overwrite_inner1_instruments = Some(true);
                info.inner1_instruments = program;
            }
            Role::Inner2 => {
                info.overwrite_inner2_instruments = Some(true);
                info.inner2_instruments = program;
            }
            Role::Drums => {}
        }
    }
}

fn apply_form(info: &mut GenInfo, analysis: &MidiAnalysis, form: SongForm) {
    let multipliers = StructureMultipliers::for_form(form, analysis.sections.len());
    info.build_song_structure_likelihood_multiplier = Some(multipliers.build);
    info.verse_chorus_song_structure_likelihood_multiplier = Some(multipliers.verse_chorus);
    info.verse_chorus_bridge_song_structure_likelihood_multiplier =
        Some(multipliers.verse_chorus_bridge);

    if form == SongForm::Loop {
        info.song_intro_probability = Some(0.0);
        info.song_end_probability = Some(0.0);
        info.force_part_sequence(&[SongPartType::Verse1; LOOP_PART_COUNT]);
    }
}

/// True when some section averages fewer than 1.5 melody note starts per bar.
fn has_sparse_melody(analysis: &MidiAnalysis) -> bool {
    let Some(melody) = analysis.role_channels.melody else {
        return false;
    };
    if analysis.sections.is_empty() || analysis.ticks_per_bar == 0 {
        return false;
    }

    let mut starts_by_bar: HashMap<u64, usize> = HashMap::new();
    for note in analysis.notes.iter().filter(|n| n.channel == melody) {
        *starts_by_bar
            .entry(note.start_tick / analysis.ticks_per_bar)
            .or_insert(0) += 1;
    }

    analysis.sections.iter().any(|section| {
        let starts: usize = (section.start_bar..=section.end_bar)
            .map(|bar| starts_by_bar.get(&(bar as u64)).copied().unwrap_or(0))
            .sum();
        (starts as f64 / section.bar_count() as f64) < SPARSE_MELODY_PER_BAR
    })
}

/// Chronological verse/chorus parts: the most energetic label is the chorus.
///
/// `None` with fewer than two sections, or when collapsing repeats leaves
/// fewer than two parts.
fn verse_chorus_parts(analysis: &MidiAnalysis) -> Option<Vec<SongPartType>> {
    if analysis.sections.len() < 2 {
        return None;
    }

    let mut chorus_label: Option<&str> = None;
    let mut best = f64::NEG_INFINITY;
    for (label, &energy) in &analysis.label_energies {
        if energy > best {
            best = energy;
            chorus_label = Some(label.as_str());
        }
    }

    let mut ordered: Vec<_> = analysis.sections.iter().collect();
    ordered.sort_by_key(|s| s.start_bar);

    let mut parts: Vec<SongPartType> = Vec::new();
    for section in ordered {
        let part = if Some(section.label.as_str()) == chorus_label {
            SongPartType::Chorus1
        } else {
            SongPartType::Verse1
        };
        if parts.last() != Some(&part) {
            parts.push(part);
        }
    }

    (parts.len() >= 2).then_some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_analysis::{analyze_events, AnalysisParams, DeltaEvent, MidiMessage};
    use pretty_assertions::assert_eq;

    fn ev(delta_ticks: u64, message: MidiMessage) -> DeltaEvent {
        DeltaEvent {
            delta_ticks,
            message,
        }
    }

    fn analysis_of(events: &[DeltaEvent]) -> MidiAnalysis {
        analyze_events(events, Some(96), &AnalysisParams::default())
    }

    #[test]
    fn tempo_range_spreads_five_percent() {
        assert_eq!(tempo_range(120.0), Some([114, 126]));
        assert_eq!(tempo_range(20.0), Some([18, 22]));
        assert_eq!(tempo_range(5.0), Some([10, 12]));
        assert_eq!(tempo_range(900.0), Some([475, 500]));
        assert_eq!(tempo_range(f64::NAN), None);
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(
            StructureMultipliers::for_form(SongForm::VerseChorus, 2).verse_chorus_bridge,
            1.0
        );
        assert_eq!(
            StructureMultipliers::for_form(SongForm::VerseChorus, 3).verse_chorus_bridge,
            2.5
        );
        assert_eq!(
            StructureMultipliers::for_form(SongForm::Build, 0),
            StructureMultipliers {
                build: 6.0,
                verse_chorus: 0.4,
                verse_chorus_bridge: 0.25
            }
        );
    }

    #[test]
    fn empty_analysis_still_sets_structure() {
        let info = map_analysis(&analysis_of(&[]), FormMode::Build);
        assert_eq!(info.tempo_range, None);
        assert_eq!(info.major_scale_likelihood, None);
        assert_eq!(info.electronic_likelihood, None);
        assert_eq!(info.overwrite_melody_instruments, None);
        assert_eq!(info.build_song_structure_likelihood_multiplier, Some(6.0));
        assert_eq!(info.forced_parts(), None);
    }

    #[test]
    fn meter_outside_two_three_four_quarter_is_ignored() {
        for (num, pow) in [(6, 3), (5, 2), (4, 3)] {
            let events = [ev(0, MidiMessage::TimeSignature { numerator: num, denominator_pow2: pow })];
            let info = map_analysis(&analysis_of(&events), FormMode::Auto);
            assert_eq!(info.time_signature4_likelihood, None, "{num}/{pow}");
        }

        let events = [ev(0, MidiMessage::TimeSignature { numerator: 3, denominator_pow2: 2 })];
        let info = map_analysis(&analysis_of(&events), FormMode::Auto);
        assert_eq!(info.time_signature2_likelihood, Some(0.2));
        assert_eq!(info.time_signature3_likelihood, Some(10.0));
        assert_eq!(info.time_signature4_likelihood, Some(0.2));
    }

    #[test]
    fn key_sets_scale_and_base_note() {
        let events = [ev(0, MidiMessage::KeySignature { sharps_flats: -3, mode: KeyMode::Minor })];
        let info = map_analysis(&analysis_of(&events), FormMode::Auto);
        assert_eq!(info.minor_scale_likelihood, Some(10.0));
        assert_eq!(info.major_scale_likelihood, Some(0.2));
        assert_eq!(info.harmonic_minor_scale_likelihood, Some(1.5));
        assert_eq!(info.set_scale_base_note, Some(true));
        assert_eq!(info.scale_base_note, Some(60));

        let events = [ev(0, MidiMessage::KeySignature { sharps_flats: 9, mode: KeyMode::Major })];
        let info = map_analysis(&analysis_of(&events), FormMode::Auto);
        assert_eq!(info.major_scale_likelihood, Some(10.0));
        assert_eq!(info.harmonic_minor_scale_likelihood, Some(0.0));
        assert_eq!(info.scale_base_note, None);
    }

    #[test]
    fn roles_lock_instruments_with_piano_fallback() {
        let mut events = vec![ev(0, MidiMessage::ProgramChange { channel: 1, program: 33 })];
        for _ in 0..8 {
            events.push(ev(0, MidiMessage::NoteOn { channel: 0, pitch: 76, velocity: 90 }));
            events.push(ev(0, MidiMessage::NoteOn { channel: 1, pitch: 40, velocity: 90 }));
            events.push(ev(0, MidiMessage::NoteOn { channel: 2, pitch: 60, velocity: 90 }));
            events.push(ev(48, MidiMessage::NoteOff { channel: 0, pitch: 76, velocity: 0 }));
            events.push(ev(0, MidiMessage::NoteOff { channel: 1, pitch: 40, velocity: 0 }));
            events.push(ev(0, MidiMessage::NoteOff { channel: 2, pitch: 60, velocity: 0 }));
        }
        let info = map_analysis(&analysis_of(&events), FormMode::Auto);

        assert_eq!(info.melody_instruments, Some(vec![0]));
        assert_eq!(info.bass_instruments, Some(vec![33]));
        assert_eq!(info.overwrite_inner1_instruments, Some(true));
        assert_eq!(info.inner1_instruments, Some(vec![0]));
        assert_eq!(info.overwrite_inner2_instruments, None);
        // A single electric-bass program change dominates the histogram.
        assert_eq!(info.electric_likelihood, Some(6.0));
    }

    #[test]
    fn loop_forces_six_verses() {
        let info = map_analysis(&analysis_of(&[]), FormMode::Loop);
        assert_eq!(info.song_intro_probability, Some(0.0));
        assert_eq!(info.song_end_probability, Some(0.0));
        assert_eq!(info.verse_chorus_song_structure_likelihood_multiplier, Some(0.15));
        assert_eq!(info.forced_parts(), Some(vec![SongPartType::Verse1; 6]));
    }

    #[test]
    fn forced_verse_chorus_without_sections_has_no_part_order() {
        let info = map_analysis(&analysis_of(&[]), FormMode::VerseChorus);
        assert_eq!(info.verse_chorus_song_structure_likelihood_multiplier, Some(8.0));
        assert_eq!(info.build_song_structure_likelihood_multiplier, Some(0.5));
        assert_eq!(info.forced_parts(), None);
        assert_eq!(info.no_melody_part_song_structure_likelihood_multiplier, None);
    }
}
