use crate::analyze::MidiAnalysis;
use crate::gm;

const TOP_PROGRAMS: usize = 8;

/// Human-readable report, one line per detected feature.
///
/// Channels and bars are shown 1-based.
pub fn summarize(analysis: &MidiAnalysis) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(bpm) = analysis.bpm {
        lines.push(format!("Tempo: {} BPM", round2(bpm)));
    }
    if let Some(ts) = analysis.time_signature {
        lines.push(format!("Time signature: {ts}"));
    }
    if let Some(name) = analysis.key_signature.and_then(|k| k.name()) {
        lines.push(format!("Key: {name}"));
    }

    lines.push(format!(
        "Bars: ~{} (analyzed {})",
        analysis.bar_count, analysis.analyzed_bars
    ));

    let roles: Vec<String> = analysis
        .role_channels
        .pitched()
        .iter()
        .filter_map(|(role, channel)| channel.map(|ch| format!("{role} ch {}", ch + 1)))
        .collect();
    if !roles.is_empty() {
        lines.push(format!("Role guess: {}", roles.join(", ")));
    }

    if !analysis.sections.is_empty() {
        let mut sections = analysis.sections.clone();
        sections.sort_by_key(|s| s.start_bar);
        let parts: Vec<String> = sections
            .iter()
            .map(|s| format!("{}: bars {}-{}", s.label, s.start_bar + 1, s.end_bar + 1))
            .collect();
        lines.push(format!("Sections: {}", parts.join(" | ")));
    }

    lines.push(format!("Suggested form: {}", analysis.suggested_form));
    if analysis.label_energy_contrast.is_finite() {
        lines.push(format!(
            "Section energy contrast: {}",
            round2(analysis.label_energy_contrast)
        ));
    }
    if analysis.bar_energy.cv.is_finite() {
        lines.push(format!(
            "Overall energy variation (CV): {}",
            round2(analysis.bar_energy.cv)
        ));
    }

    let mut programs: Vec<(u8, usize)> = analysis
        .program_counts
        .iter()
        .map(|(&program, &count)| (program, count))
        .collect();
    programs.sort_by(|a, b| b.1.cmp(&a.1));
    if !programs.is_empty() {
        let top: Vec<String> = programs
            .iter()
            .take(TOP_PROGRAMS)
            .map(|&(program, count)| format!("{} ×{count}", gm::program_name(program)))
            .collect();
        lines.push(format!("Programs (top): {}", top.join(", ")));
    }

    lines
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze_events, AnalysisParams};
    use crate::message::{DeltaEvent, KeyMode, MidiMessage};
    use pretty_assertions::assert_eq;

    fn ev(delta_ticks: u64, message: MidiMessage) -> DeltaEvent {
        DeltaEvent {
            delta_ticks,
            message,
        }
    }

    #[test]
    fn empty_analysis_reports_grid_and_form() {
        let analysis = analyze_events(&[], Some(96), &AnalysisParams::default());
        assert_eq!(
            summarize(&analysis),
            vec![
                "Bars: ~1 (analyzed 1)".to_string(),
                "Suggested form: loop".to_string(),
                "Section energy contrast: 1".to_string(),
                "Overall energy variation (CV): 0".to_string(),
            ]
        );
    }

    #[test]
    fn full_report() {
        let mut events = vec![
            ev(0, MidiMessage::SetTempo { micros_per_quarter: 461_538 }),
            ev(0, MidiMessage::TimeSignature { numerator: 3, denominator_pow2: 2 }),
            ev(0, MidiMessage::KeySignature { sharps_flats: -1, mode: KeyMode::Minor }),
            ev(0, MidiMessage::ProgramChange { channel: 0, program: 73 }),
            ev(0, MidiMessage::ProgramChange { channel: 1, program: 33 }),
            ev(0, MidiMessage::ProgramChange { channel: 2, program: 33 }),
        ];
        for _ in 0..8 {
            events.push(ev(0, MidiMessage::NoteOn { channel: 0, pitch: 74, velocity: 90 }));
            events.push(ev(0, MidiMessage::NoteOn { channel: 1, pitch: 38, velocity: 90 }));
            events.push(ev(96, MidiMessage::NoteOff { channel: 0, pitch: 74, velocity: 0 }));
            events.push(ev(0, MidiMessage::NoteOff { channel: 1, pitch: 38, velocity: 0 }));
        }
        let analysis = analyze_events(&events, Some(96), &AnalysisParams::default());
        let lines = summarize(&analysis);

        assert_eq!(lines[0], "Tempo: 130 BPM");
        assert_eq!(lines[1], "Time signature: 3/4");
        assert_eq!(lines[2], "Key: D minor");
        assert_eq!(lines[3], "Bars: ~3 (analyzed 3)");
        assert_eq!(lines[4], "Role guess: melody ch 1, bass ch 2");
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Programs (top): Electric Bass (finger) ×2, Flute ×1")
        );
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(119.9999), 120.0);
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(format!("{}", round2(0.5)), "0.5");
    }
}
