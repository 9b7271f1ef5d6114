//! Synthetic Standard MIDI File builder for integration tests.

#![allow(dead_code)]

/// Events for one track, kept as (absolute tick, encoded message).
#[derive(Debug, Default, Clone)]
pub struct TrackBuilder {
    events: Vec<(u64, Vec<u8>)>,
    running_status: bool,
    end_of_track: bool,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self {
            end_of_track: true,
            ..Self::default()
        }
    }

    /// Omit repeated channel status bytes when encoding.
    pub fn running_status(mut self) -> Self {
        self.running_status = true;
        self
    }

    /// Leave out the trailing End-of-Track meta event.
    pub fn without_end_of_track(mut self) -> Self {
        self.end_of_track = false;
        self
    }

    pub fn tempo(mut self, tick: u64, micros_per_quarter: u32) -> Self {
        let us = micros_per_quarter;
        self.events.push((
            tick,
            vec![0xFF, 0x51, 0x03, (us >> 16) as u8, (us >> 8) as u8, us as u8],
        ));
        self
    }

    pub fn bpm(self, tick: u64, bpm: u32) -> Self {
        self.tempo(tick, 60_000_000 / bpm)
    }

    pub fn time_signature(mut self, tick: u64, numerator: u8, denominator: u8) -> Self {
        let pow = denominator.trailing_zeros() as u8;
        self.events
            .push((tick, vec![0xFF, 0x58, 0x04, numerator, pow, 0x18, 0x08]));
        self
    }

    pub fn key_signature(mut self, tick: u64, sharps_flats: i8, minor: bool) -> Self {
        self.events.push((
            tick,
            vec![0xFF, 0x59, 0x02, sharps_flats as u8, minor as u8],
        ));
        self
    }

    pub fn track_name(mut self, tick: u64, name: &str) -> Self {
        let mut event = vec![0xFF, 0x03];
        write_vlq(&mut event, name.len() as u32);
        event.extend_from_slice(name.as_bytes());
        self.events.push((tick, event));
        self
    }

    pub fn program(mut self, tick: u64, channel: u8, program: u8) -> Self {
        self.events.push((tick, vec![0xC0 | channel, program]));
        self
    }

    pub fn control(mut self, tick: u64, channel: u8, controller: u8, value: u8) -> Self {
        self.events
            .push((tick, vec![0xB0 | channel, controller, value]));
        self
    }

    /// Note-On at `tick` and Note-Off (as Note-On velocity 0) `duration` ticks later.
    pub fn note(mut self, tick: u64, duration: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        self.events
            .push((tick, vec![0x90 | channel, pitch, velocity]));
        self.events
            .push((tick + duration, vec![0x90 | channel, pitch, 0]));
        self
    }

    pub fn note_on(mut self, tick: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        self.events
            .push((tick, vec![0x90 | channel, pitch, velocity]));
        self
    }

    pub fn note_off(mut self, tick: u64, channel: u8, pitch: u8) -> Self {
        self.events.push((tick, vec![0x80 | channel, pitch, 64]));
        self
    }

    /// A message written verbatim.
    pub fn raw(mut self, tick: u64, bytes: &[u8]) -> Self {
        self.events.push((tick, bytes.to_vec()));
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut events = self.events.clone();
        // Stable: same-tick events keep insertion order.
        events.sort_by_key(|(tick, _)| *tick);

        let mut data = Vec::new();
        let mut last_tick = 0u64;
        let mut last_status: Option<u8> = None;

        for (tick, bytes) in events {
            write_vlq(&mut data, (tick - last_tick) as u32);
            last_tick = tick;

            let status = bytes[0];
            if status < 0xF0 {
                if self.running_status && last_status == Some(status) {
                    data.extend_from_slice(&bytes[1..]);
                } else {
                    data.extend_from_slice(&bytes);
                }
                last_status = Some(status);
            } else {
                data.extend_from_slice(&bytes);
                last_status = None;
            }
        }

        if self.end_of_track {
            write_vlq(&mut data, 0);
            data.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        }
        data
    }
}

/// Assemble a format-1 file (format 0 when there is a single track).
pub fn build_smf(ticks_per_quarter: u16, tracks: &[TrackBuilder]) -> Vec<u8> {
    let format: u16 = if tracks.len() == 1 { 0 } else { 1 };
    let mut buf = Vec::new();

    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&format.to_be_bytes());
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&ticks_per_quarter.to_be_bytes());

    for track in tracks {
        let data = track.encode();
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&data);
    }

    buf
}

/// A melody of `bars` 4/4 bars at `ticks_per_quarter`, one note per beat,
/// repeating the same 8-bar phrase.
pub fn phrase_track(ticks_per_quarter: u16, bars: u64, channel: u8) -> TrackBuilder {
    const PHRASE: [u8; 8] = [60, 62, 64, 65, 67, 65, 64, 62];
    let tpq = ticks_per_quarter as u64;
    let mut track = TrackBuilder::new().program(0, channel, 0);
    for bar in 0..bars {
        let root = PHRASE[(bar % 8) as usize];
        for beat in 0..4 {
            let tick = (bar * 4 + beat) * tpq;
            let pitch = if beat == 0 { root } else { root + 12 * (beat % 2) as u8 };
            track = track.note(tick, tpq / 2, channel, pitch, 96);
        }
    }
    track
}

pub fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    buf.extend_from_slice(&bytes);
}
