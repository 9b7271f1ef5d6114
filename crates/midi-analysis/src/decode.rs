//! Standard MIDI File decoding: `MThd` header plus one event list per `MTrk` chunk.

use crate::cursor::ByteCursor;
use crate::message::{KeyMode, MidiMessage, RawEvent};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const HEADER_TAG: &str = "MThd";
const TRACK_TAG: &str = "MTrk";

const META_END_OF_TRACK: u8 = 0x2F;
const META_SET_TEMPO: u8 = 0x51;
const META_TIME_SIGNATURE: u8 = 0x58;
const META_KEY_SIGNATURE: u8 = 0x59;

/// A decoded file: header fields and each track's events in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSmf {
    pub format: u16,
    pub track_count: u16,
    pub ticks_per_quarter: u16,
    pub tracks: Vec<Vec<RawEvent>>,
}

impl DecodedSmf {
    /// All tracks merged into one delta-timed stream.
    pub fn merged(&self) -> Vec<crate::DeltaEvent> {
        crate::merge::merge_tracks(&self.tracks)
    }
}

/// Per-track decoding state threaded through the event loop.
#[derive(Debug, Default)]
struct DecoderState {
    running_status: Option<u8>,
    absolute_tick: u64,
}

/// Decode a complete SMF byte buffer.
///
/// Any structural problem aborts the whole decode; no partial result is returned.
pub fn decode(bytes: &[u8]) -> Result<DecodedSmf> {
    let mut cursor = ByteCursor::new(bytes);

    let tag = cursor.read_ascii(4)?;
    if tag != HEADER_TAG {
        return Err(Error::InvalidHeader(format!("expected tag `MThd`, found {tag:?}")));
    }

    let header_len = cursor.read_u32_be()? as usize;
    if header_len < 6 {
        return Err(Error::InvalidHeader(format!(
            "header chunk length {header_len} is shorter than 6"
        )));
    }

    let format = cursor.read_u16_be()?;
    let track_count = cursor.read_u16_be()?;
    let division = cursor.read_u16_be()?;

    // Newer header fields are skipped rather than rejected.
    if header_len > 6 {
        cursor.skip(header_len - 6)?;
    }

    if division & 0x8000 != 0 {
        return Err(Error::UnsupportedTimeDivision(division));
    }

    let mut tracks = Vec::with_capacity(track_count as usize);
    for track in 0..track_count as usize {
        let tag = cursor.read_ascii(4)?;
        if tag != TRACK_TAG {
            return Err(Error::InvalidTrackHeader { track, found: tag });
        }

        let track_len = cursor.read_u32_be()? as usize;
        let track_start = cursor.position();

        let mut window = cursor.window(track_len);
        let events = decode_track(&mut window).map_err(|e| e.shifted(track_start))?;
        debug!(track, events = events.len(), bytes = track_len, "decoded track");
        tracks.push(events);

        // Resume at the declared chunk end whether or not End-of-Track was seen.
        cursor.seek(track_start.saturating_add(track_len));
    }

    Ok(DecodedSmf {
        format,
        track_count,
        ticks_per_quarter: division,
        tracks,
    })
}

fn decode_track(cursor: &mut ByteCursor<'_>) -> Result<Vec<RawEvent>> {
    let mut state = DecoderState::default();
    let mut events = Vec::new();

    while cursor.remaining() > 0 {
        state.absolute_tick += cursor.read_vlq()? as u64;

        let lead = cursor.read_u8()?;
        let (status, first_data) = if lead < 0x80 {
            let status = state.running_status.ok_or(Error::InvalidRunningStatus {
                offset: cursor.position() - 1,
            })?;
            (status, Some(lead))
        } else {
            state.running_status = Some(lead);
            (lead, None)
        };

        let message = match status {
            0xFF => match decode_meta(cursor, first_data)? {
                Some(MidiMessage::EndOfTrack) => {
                    events.push(RawEvent {
                        absolute_tick: state.absolute_tick,
                        message: MidiMessage::EndOfTrack,
                    });
                    break;
                }
                other => other,
            },
            0xF0 | 0xF7 => {
                // A data byte below 0x80 is a complete one-byte length.
                let len = match first_data {
                    Some(byte) => byte as usize,
                    None => cursor.read_vlq()? as usize,
                };
                cursor.skip(len)?;
                None
            }
            _ => decode_channel(cursor, status, first_data)?,
        };

        if let Some(message) = message {
            events.push(RawEvent {
                absolute_tick: state.absolute_tick,
                message,
            });
        }
    }

    Ok(events)
}

/// Meta event body, after the `0xFF` status byte. Under running status the
/// already-consumed data byte is the meta type.
fn decode_meta(cursor: &mut ByteCursor<'_>, first_data: Option<u8>) -> Result<Option<MidiMessage>> {
    let meta_type = match first_data {
        Some(byte) => byte,
        None => cursor.read_u8()?,
    };
    let len = cursor.read_vlq()? as usize;
    let data = cursor.read_bytes(len)?;

    let message = match meta_type {
        META_END_OF_TRACK => Some(MidiMessage::EndOfTrack),
        META_SET_TEMPO if data.len() == 3 => Some(MidiMessage::SetTempo {
            micros_per_quarter: ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32,
        }),
        META_TIME_SIGNATURE if data.len() >= 2 => Some(MidiMessage::TimeSignature {
            numerator: data[0],
            denominator_pow2: data[1],
        }),
        META_KEY_SIGNATURE if data.len() >= 2 => Some(MidiMessage::KeySignature {
            sharps_flats: data[0] as i8,
            mode: KeyMode::from_byte(data[1]),
        }),
        _ => None,
    };

    Ok(message)
}

/// Channel message body. `first_data` is the data byte already consumed
/// when the status came from running status.
fn decode_channel(
    cursor: &mut ByteCursor<'_>,
    status: u8,
    first_data: Option<u8>,
) -> Result<Option<MidiMessage>> {
    let family = status & 0xF0;
    let channel = status & 0x0F;

    let data1 = match first_data {
        Some(byte) => byte,
        None => cursor.read_u8()?,
    };
    let data2 = if family == 0xC0 || family == 0xD0 {
        0
    } else {
        cursor.read_u8()?
    };

    let message = match family {
        0x90 if data2 == 0 => Some(MidiMessage::NoteOff {
            channel,
            pitch: data1,
            velocity: 0,
        }),
        0x90 => Some(MidiMessage::NoteOn {
            channel,
            pitch: data1,
            velocity: data2,
        }),
        0x80 => Some(MidiMessage::NoteOff {
            channel,
            pitch: data1,
            velocity: data2,
        }),
        0xB0 => Some(MidiMessage::ControlChange {
            channel,
            controller: data1,
            value: data2,
        }),
        0xC0 => Some(MidiMessage::ProgramChange {
            channel,
            program: data1,
        }),
        // Aftertouch, channel pressure, pitch bend: consumed, not reported.
        _ => None,
    };

    Ok(message)
}
