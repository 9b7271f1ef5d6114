use crate::bars::{self, BarSummary};
use crate::key::KeySignature;
use crate::merge;
use crate::message::{DeltaEvent, MidiMessage};
use crate::note::{ChannelStats, Note, NoteTracker};
use crate::roles::{self, RoleChannels};
use crate::structure::{self, EnergyStats, RepeatMatch, Section, SongForm};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Default ceiling on analyzed bars.
pub const DEFAULT_MAX_BARS: usize = 512;

/// Resolution assumed when the caller has no header value.
pub const DEFAULT_TICKS_PER_QUARTER: u16 = 192;

/// Parameters controlling feature analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Maximum number of bars fed to bar, repeat and energy analysis. Default: 512.
    pub max_bars: Option<usize>,
}

impl AnalysisParams {
    pub fn with_max_bars(max_bars: usize) -> Self {
        Self {
            max_bars: Some(max_bars),
        }
    }

    fn max_bars(&self) -> usize {
        self.max_bars.unwrap_or(DEFAULT_MAX_BARS)
    }
}

/// Detected meter with the written denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn from_pow2(numerator: u8, denominator_pow2: u8) -> Self {
        Self {
            numerator,
            denominator: 2u32.saturating_pow(denominator_pow2 as u32),
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Everything derived from one merged event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiAnalysis {
    /// Initial tempo; `None` without any Set-Tempo event.
    pub bpm: Option<f64>,
    /// Initial meter as found in the file; 4/4 is assumed for the bar grid only.
    pub time_signature: Option<TimeSignature>,
    pub key_signature: Option<KeySignature>,
    pub ticks_per_quarter: u16,
    pub ticks_per_bar: u64,
    pub max_tick: u64,
    /// Bars spanned by the stream, at least 1.
    pub bar_count: usize,
    /// Bars actually analyzed, `min(bar_count, max_bars)`.
    pub analyzed_bars: usize,
    /// Last program seen on each channel.
    pub program_by_channel: BTreeMap<u8, u8>,
    /// Number of Program-Change events per program.
    pub program_counts: BTreeMap<u8, usize>,
    pub notes: Vec<Note>,
    pub channel_stats: Vec<ChannelStats>,
    pub bars: Vec<BarSummary>,
    /// Every repeat at the longest matching length; the first is the best.
    pub repeats: Vec<RepeatMatch>,
    pub sections: Vec<Section>,
    pub role_channels: RoleChannels,
    pub bar_energy: EnergyStats,
    pub label_energies: BTreeMap<String, f64>,
    pub label_energy_contrast: f64,
    pub suggested_form: SongForm,
}

impl MidiAnalysis {
    pub fn best_repeat(&self) -> Option<&RepeatMatch> {
        self.repeats.first()
    }

    /// Program for a channel, 0 when it never received a Program-Change.
    pub fn program_for_channel(&self, channel: u8) -> u8 {
        self.program_by_channel.get(&channel).copied().unwrap_or(0)
    }
}

/// Decode, merge and analyze an SMF byte buffer.
pub fn analyze(midi_bytes: &[u8], params: &AnalysisParams) -> crate::Result<MidiAnalysis> {
    let smf = crate::decode::decode(midi_bytes)?;
    debug!(
        format = smf.format,
        tracks = smf.track_count,
        ticks_per_quarter = smf.ticks_per_quarter,
        "decoded SMF"
    );

    let merged = smf.merged();
    Ok(analyze_events(&merged, Some(smf.ticks_per_quarter), params))
}

/// Analyze a merged, delta-timed event stream.
///
/// Never fails: sparse input yields unset or neutral fields.
pub fn analyze_events(
    events: &[DeltaEvent],
    ticks_per_quarter: Option<u16>,
    params: &AnalysisParams,
) -> MidiAnalysis {
    let ticks_per_quarter = ticks_per_quarter.unwrap_or(DEFAULT_TICKS_PER_QUARTER);
    let pass = replay(events);

    let bpm = initial(&pass.tempos)
        .filter(|&micros| micros > 0)
        .map(|micros| 60_000_000.0 / micros as f64);
    let time_signature = initial(&pass.time_signatures);
    let key_signature = initial(&pass.key_signatures);

    let meter = time_signature.unwrap_or_default();
    let ticks_per_bar = bars::ticks_per_bar(ticks_per_quarter, meter.numerator, meter.denominator);
    let max_tick = pass.max_tick;
    let bar_count = usize::try_from(max_tick.div_ceil(ticks_per_bar))
        .unwrap_or(usize::MAX)
        .max(1);

    let max_bars = params.max_bars();
    let analyzed_bars = bar_count.min(max_bars);
    if bar_count > max_bars {
        warn!(bar_count, max_bars, "bar count exceeds analysis ceiling, truncating");
    }
    debug!(ticks_per_bar, bar_count, analyzed_bars, "bar grid");

    let (notes, channel_stats) = pass.tracker.finish();
    let bars = bars::bin_notes(&notes, ticks_per_bar, analyzed_bars);

    let signatures: Vec<String> = bars.iter().map(BarSummary::signature).collect();
    let repeats = structure::find_repeats(
        &signatures,
        structure::MIN_REPEAT_BARS,
        structure::MAX_REPEAT_BARS,
    );
    if let Some(best) = repeats.first() {
        debug!(
            length = best.length,
            start_a = best.start_a,
            start_b = best.start_b,
            matches = repeats.len(),
            "repeat found"
        );
    }
    let sections = structure::infer_sections(repeats.first(), analyzed_bars);

    let role_channels = roles::assign_roles(&channel_stats);

    let energies: Vec<f64> = bars.iter().map(BarSummary::energy).collect();
    let bar_energy = EnergyStats::from_values(&energies);
    let label_energies = structure::label_energies(&sections, &bars);
    let label_energy_contrast = structure::energy_contrast(&label_energies);

    let suggested_form = structure::suggest_form(
        !repeats.is_empty(),
        label_energies.len(),
        label_energy_contrast,
        bar_energy.cv,
    );

    info!(
        notes = notes.len(),
        analyzed_bars,
        sections = sections.len(),
        form = %suggested_form,
        "analysis complete"
    );

    MidiAnalysis {
        bpm,
        time_signature,
        key_signature,
        ticks_per_quarter,
        ticks_per_bar,
        max_tick,
        bar_count,
        analyzed_bars,
        program_by_channel: pass.program_by_channel,
        program_counts: pass.program_counts,
        notes,
        channel_stats,
        bars,
        repeats,
        sections,
        role_channels,
        bar_energy,
        label_energies,
        label_energy_contrast,
        suggested_form,
    }
}

/// State collected from one pass over the stream.
#[derive(Default)]
struct Replay {
    tempos: Vec<(u64, u32)>,
    time_signatures: Vec<(u64, TimeSignature)>,
    key_signatures: Vec<(u64, KeySignature)>,
    program_by_channel: BTreeMap<u8, u8>,
    program_counts: BTreeMap<u8, usize>,
    tracker: NoteTracker,
    max_tick: u64,
}

fn replay(events: &[DeltaEvent]) -> Replay {
    let mut state = Replay::default();

    for (tick, event) in merge::absolute_ticks(events) {
        state.max_tick = tick;
        match event.message {
            MidiMessage::SetTempo { micros_per_quarter } => {
                state.tempos.push((tick, micros_per_quarter));
            }
            MidiMessage::TimeSignature {
                numerator,
                denominator_pow2,
            } => {
                state
                    .time_signatures
                    .push((tick, TimeSignature::from_pow2(numerator, denominator_pow2)));
            }
            MidiMessage::KeySignature { sharps_flats, mode } => {
                state
                    .key_signatures
                    .push((tick, KeySignature::new(sharps_flats, mode)));
            }
            MidiMessage::ProgramChange { channel, program } => {
                state.program_by_channel.insert(channel, program);
                *state.program_counts.entry(program).or_insert(0) += 1;
            }
            MidiMessage::NoteOn {
                channel,
                pitch,
                velocity,
            } => state.tracker.note_on(tick, channel, pitch, velocity),
            MidiMessage::NoteOff { channel, pitch, .. } => {
                state.tracker.note_off(tick, channel, pitch)
            }
            MidiMessage::ControlChange { .. } | MidiMessage::EndOfTrack => {}
        }
    }

    state
}

/// The value at tick 0 if there is one, else the earliest.
fn initial<T: Copy>(timed: &[(u64, T)]) -> Option<T> {
    timed
        .iter()
        .find(|(tick, _)| *tick == 0)
        .or(timed.first())
        .map(|&(_, value)| value)
}
