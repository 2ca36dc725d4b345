// MIDI output for voiced progressions.
//
// Writes a Standard MIDI File (SMF Format 1): a tempo track, then one track
// per voice in SATB order on channels 0-3, each set to choir aahs. Every
// chord contributes one note per voice spanning the chord's start beat and
// duration. Beats are quarter notes.
//
// Uses the `midly` crate for MIDI writing.

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use crate::chord::Chord;
use crate::error::HarmonyError;
use crate::voicing::{Voice, Voicing};

/// Ticks per quarter note in MIDI output.
const TICKS_PER_BEAT: u16 = 480;

/// General MIDI "Choir Aahs".
const CHOIR_PROGRAM: u8 = 52;

const VELOCITY: u8 = 80;

const MAX_TEMPO: u32 = 0xFF_FFFF;

/// Write `voicings` (one per chord) to a MIDI file.
pub fn write_midi(
    chords: &[Chord],
    voicings: &[Voicing],
    tempo_bpm: u16,
    path: &Path,
) -> Result<(), HarmonyError> {
    let smf = to_smf(chords, voicings, tempo_bpm);
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| HarmonyError::Midi(e.to_string()))?;
    std::fs::write(path, &buf)?;
    log::info!("wrote {} chords to {}", voicings.len(), path.display());
    Ok(())
}

fn beat_to_tick(beat: f64) -> u32 {
    (beat.max(0.0) * TICKS_PER_BEAT as f64).round() as u32
}

/// Build the in-memory SMF.
fn to_smf(chords: &[Chord], voicings: &[Voicing], tempo_bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));

    // Tempo is 24 bits of microseconds per beat; below 4 BPM it saturates.
    let tempo_microseconds = (60_000_000 / tempo_bpm.max(1) as u32).min(MAX_TEMPO);
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    for voice in Voice::ALL {
        smf.tracks.push(voice_track(voice, chords, voicings));
    }
    smf
}

fn voice_track(voice: Voice, chords: &[Chord], voicings: &[Voicing]) -> Track<'static> {
    const NAMES: [&str; 4] = ["Soprano", "Alto", "Tenor", "Bass"];
    let channel = u4::new(voice.index() as u8);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(NAMES[voice.index()].as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(CHOIR_PROGRAM),
                },
            },
        },
    ];

    // Notes never overlap within a voice: a chord starting before the
    // previous one ended cuts the previous note short.
    let mut last_tick: u32 = 0;
    for (chord, voicing) in chords.iter().zip(voicings) {
        let key = u7::new(voicing.get(voice).min(127));
        let start = beat_to_tick(chord.start_beat).max(last_tick);
        let end = beat_to_tick(chord.end_beat()).max(start);
        track.push(TrackEvent {
            delta: u28::new(start - last_tick),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(VELOCITY),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(end - start),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
        last_tick = end;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordQuality;
    use crate::pitch::{Mode, PitchClass};

    fn two_chords() -> (Vec<Chord>, Vec<Voicing>) {
        let c = PitchClass::C;
        let chords = vec![
            Chord::new(c, Mode::Major, 1, ChordQuality::Major).at(0.0, 1.0),
            Chord::new(c, Mode::Major, 5, ChordQuality::Major).at(1.0, 2.0),
        ];
        let voicings = vec![Voicing::new(67, 67, 52, 48), Voicing::new(62, 71, 50, 55)];
        (chords, voicings)
    }

    #[test]
    fn test_track_layout() {
        let (chords, voicings) = two_chords();
        let smf = to_smf(&chords, &voicings, 96);
        // 1 tempo track + 4 voice tracks
        assert_eq!(smf.tracks.len(), 5);
        // name, program, two notes on/off, end of track
        assert_eq!(smf.tracks[1].len(), 2 + 4 + 1);
    }

    #[test]
    fn test_note_timing() {
        let (chords, voicings) = two_chords();
        let smf = to_smf(&chords, &voicings, 96);
        let bass = &smf.tracks[4];
        let deltas: Vec<u32> = bass.iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![0, 0, 0, 480, 0, 960, 0]);
        match bass[2].kind {
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, .. },
            } => {
                assert_eq!(channel.as_int(), 3);
                assert_eq!(key.as_int(), 48);
            }
            ref other => panic!("expected note on, got {other:?}"),
        }
    }

    #[test]
    fn test_tempo_meta() {
        let (chords, voicings) = two_chords();
        let tempo = |bpm: u16| match to_smf(&chords, &voicings, bpm).tracks[0][0].kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => t.as_int(),
            ref other => panic!("expected tempo, got {other:?}"),
        };
        assert_eq!(tempo(120), 500_000);
        assert_eq!(tempo(4), 15_000_000);
        // Slower than the 24-bit field can express.
        assert_eq!(tempo(2), MAX_TEMPO);
        assert_eq!(tempo(0), MAX_TEMPO);
    }

    #[test]
    fn test_write_midi_file() {
        let (chords, voicings) = two_chords();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.mid");
        write_midi(&chords, &voicings, 120, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 5);
        assert_eq!(smf.header.format, Format::Parallel);
    }
}
