//! Merge per-track event lists into a single delta-timed stream.

use crate::message::{DeltaEvent, RawEvent};

/// Combine tracks into one stream ordered by tick, then by message priority.
///
/// The sort is stable: events with equal tick and priority keep track order,
/// then within-track order. Deltas are recomputed against the merged stream.
pub fn merge_tracks(tracks: &[Vec<RawEvent>]) -> Vec<DeltaEvent> {
    let mut all: Vec<RawEvent> = tracks.iter().flatten().copied().collect();
    all.sort_by_key(|e| (e.absolute_tick, e.message.priority()));

    let mut last_tick = 0u64;
    all.into_iter()
        .map(|event| {
            let delta_ticks = event.absolute_tick - last_tick;
            last_tick = event.absolute_tick;
            DeltaEvent {
                delta_ticks,
                message: event.message,
            }
        })
        .collect()
}

/// Absolute tick of each event in a delta-timed stream.
pub fn absolute_ticks(events: &[DeltaEvent]) -> impl Iterator<Item = (u64, &DeltaEvent)> + '_ {
    events.iter().scan(0u64, |tick, event| {
        *tick = tick.saturating_add(event.delta_ticks);
        Some((*tick, event))
    })
}
