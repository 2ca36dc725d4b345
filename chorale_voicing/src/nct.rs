// Non-chord-tone classification for a single voice's melodic line.
//
// A note is a chord tone when its pitch class belongs to the resolved set of
// the chord sounding under it. Anything else is tested against the named
// figures in a fixed precedence order; the first match wins:
//
//   suspension > retardation > anticipation > pedal > passing > neighbor
//   > appoggiatura > escape
//
// Rules that need a neighbouring note or chord simply fail when it is
// missing, and a note that matches nothing stays an unlabelled non-chord
// tone. Classification is a pure function of the note and its context, so
// lines can be re-analyzed whenever the harmony underneath them changes.
//
// "Previous context" below means the chord under the previous note when
// known, else the current chord; "next context" likewise.
//
// `analyze_line` walks a line and builds each note's context from the chord
// timeline. `analyze_voices` runs the four lines in parallel with rayon;
// lines are independent of each other.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::pitch::{PitchClass, interval, leading_tone, major_scale_degree, named_interval};
use crate::resolver::resolve;

/// Named non-chord-tone figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonChordTone {
    Suspension,
    Retardation,
    Anticipation,
    Pedal,
    Passing,
    Neighbor,
    Appoggiatura,
    Escape,
}

impl NonChordTone {
    pub fn name(self) -> &'static str {
        match self {
            NonChordTone::Suspension => "suspension",
            NonChordTone::Retardation => "retardation",
            NonChordTone::Anticipation => "anticipation",
            NonChordTone::Pedal => "pedal",
            NonChordTone::Passing => "passing",
            NonChordTone::Neighbor => "neighbor",
            NonChordTone::Appoggiatura => "appoggiatura",
            NonChordTone::Escape => "escape",
        }
    }
}

/// Direction a note wants to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tendency {
    Up,
    Down,
    Static,
}

impl Tendency {
    fn of_motion(from: u8, to: u8) -> Tendency {
        match interval::direction(from, to) {
            1 => Tendency::Up,
            -1 => Tendency::Down,
            _ => Tendency::Static,
        }
    }
}

/// Result of classifying one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteAnalysis {
    pub is_chord_tone: bool,
    #[serde(rename = "type")]
    pub kind: Option<NonChordTone>,
    /// Degree in the major scale of the chord's key; None when chromatic.
    pub scale_degree: Option<u8>,
    /// Melodic interval from the previous note ("2M", "-3m").
    pub interval: Option<String>,
    pub tendency: Option<Tendency>,
}

/// One sung note in a voice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelodicNote {
    pub pitch: u8,
    pub start_beat: f64,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NoteAnalysis>,
}

impl MelodicNote {
    pub fn new(pitch: u8, start_beat: f64, duration: f64) -> Self {
        MelodicNote {
            pitch,
            start_beat,
            duration,
            analysis: None,
        }
    }
}

/// Neighbouring notes and chords for one classification.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub current_chord: &'a Chord,
    pub prev_note: Option<&'a MelodicNote>,
    pub next_note: Option<&'a MelodicNote>,
    pub prev_chord: Option<&'a Chord>,
    pub next_chord: Option<&'a Chord>,
}

impl<'a> ClassifyContext<'a> {
    /// Context with no neighbours.
    pub fn new(current_chord: &'a Chord) -> Self {
        ClassifyContext {
            current_chord,
            prev_note: None,
            next_note: None,
            prev_chord: None,
            next_chord: None,
        }
    }

    fn prev_context(&self) -> &'a Chord {
        self.prev_chord.unwrap_or(self.current_chord)
    }

    fn next_context(&self) -> &'a Chord {
        self.next_chord.unwrap_or(self.current_chord)
    }
}

fn is_chord_tone(chord: &Chord, pitch: u8) -> bool {
    resolve(chord).contains(PitchClass::of(pitch))
}

/// Classify `note` in `ctx`.
pub fn classify(note: &MelodicNote, ctx: &ClassifyContext) -> NoteAnalysis {
    let chord = ctx.current_chord;
    let pitch = note.pitch;
    let scale_degree = major_scale_degree(chord.key, PitchClass::of(pitch));
    let interval = ctx.prev_note.map(|prev| named_interval(prev.pitch, pitch));

    if is_chord_tone(chord, pitch) {
        return NoteAnalysis {
            is_chord_tone: true,
            kind: None,
            scale_degree,
            interval,
            tendency: chord_tone_tendency(chord, pitch),
        };
    }

    let kind = figure(pitch, ctx);
    let tendency = kind.map(|k| match k {
        NonChordTone::Suspension => Tendency::Down,
        NonChordTone::Retardation => Tendency::Up,
        NonChordTone::Anticipation | NonChordTone::Pedal => Tendency::Static,
        NonChordTone::Passing
        | NonChordTone::Neighbor
        | NonChordTone::Appoggiatura
        | NonChordTone::Escape => ctx
            .next_note
            .map_or(Tendency::Static, |next| Tendency::of_motion(pitch, next.pitch)),
    });

    NoteAnalysis {
        is_chord_tone: false,
        kind,
        scale_degree,
        interval,
        tendency,
    }
}

/// The leading tone pulls up and a chord seventh pulls down.
fn chord_tone_tendency(chord: &Chord, pitch: u8) -> Option<Tendency> {
    let pc = PitchClass::of(pitch);
    if pc == leading_tone(chord.key) {
        return Some(Tendency::Up);
    }
    let seventh = chord.quality.intervals().get(3).copied();
    if chord.quality.has_seventh() && seventh == Some(chord.root().interval_to(pc)) {
        return Some(Tendency::Down);
    }
    None
}

/// First matching figure for a non-chord tone, in precedence order.
fn figure(pitch: u8, ctx: &ClassifyContext) -> Option<NonChordTone> {
    let surrounding = ctx.prev_note.zip(ctx.next_note).map(|(p, n)| (p.pitch, n.pitch));

    if let Some((prev, next)) = surrounding {
        let held_over = prev == pitch
            && interval::is_step(pitch, next)
            && is_chord_tone(ctx.current_chord, next)
            && ctx.prev_chord.is_some_and(|c| is_chord_tone(c, pitch));
        if held_over && next < pitch {
            return Some(NonChordTone::Suspension);
        }
        if held_over {
            return Some(NonChordTone::Retardation);
        }
    }

    if ctx.next_chord.is_some_and(|c| is_chord_tone(c, pitch)) {
        return Some(NonChordTone::Anticipation);
    }

    let (prev, next) = surrounding?;
    let prev_is_tone = is_chord_tone(ctx.prev_context(), prev);
    let next_is_tone = is_chord_tone(ctx.next_context(), next);
    let step_in = interval::is_step(prev, pitch);
    let step_out = interval::is_step(pitch, next);

    if prev == pitch && pitch == next {
        Some(NonChordTone::Pedal)
    } else if step_in
        && step_out
        && prev_is_tone
        && next_is_tone
        && interval::direction(prev, pitch) == interval::direction(pitch, next)
    {
        Some(NonChordTone::Passing)
    } else if step_in && prev == next && prev_is_tone {
        Some(NonChordTone::Neighbor)
    } else if interval::is_leap(prev, pitch) && step_out && next_is_tone {
        Some(NonChordTone::Appoggiatura)
    } else if step_in && prev_is_tone && interval::is_leap(pitch, next) {
        Some(NonChordTone::Escape)
    } else {
        None
    }
}

/// The chord sounding at `beat`: the last chord, in timeline order, that
/// starts at or before it.
pub fn chord_at(chords: &[Chord], beat: f64) -> Option<&Chord> {
    const EPSILON: f64 = 1e-9;
    chords.iter().rev().find(|c| c.start_beat <= beat + EPSILON)
}

/// Analyze every note of a line against the chord timeline. Notes that
/// start before the first chord get no analysis.
pub fn analyze_line(notes: &[MelodicNote], chords: &[Chord]) -> Vec<MelodicNote> {
    notes
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let prev_note = i.checked_sub(1).and_then(|p| notes.get(p));
            let next_note = notes.get(i + 1);
            let analysis = chord_at(chords, note.start_beat).map(|current_chord| {
                let ctx = ClassifyContext {
                    current_chord,
                    prev_note,
                    next_note,
                    prev_chord: prev_note.and_then(|n| chord_at(chords, n.start_beat)),
                    next_chord: next_note.and_then(|n| chord_at(chords, n.start_beat)),
                };
                classify(note, &ctx)
            });
            MelodicNote {
                analysis,
                ..note.clone()
            }
        })
        .collect()
}

/// Analyze several independent voice lines in parallel, keeping their order.
pub fn analyze_voices(lines: &[Vec<MelodicNote>], chords: &[Chord]) -> Vec<Vec<MelodicNote>> {
    lines
        .par_iter()
        .map(|line| analyze_line(line, chords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordQuality;
    use crate::pitch::Mode;

    fn c_chord(degree: u8, quality: ChordQuality) -> Chord {
        Chord::new(PitchClass::C, Mode::Major, degree, quality)
    }

    fn note(pitch: u8, start: f64) -> MelodicNote {
        MelodicNote::new(pitch, start, 1.0)
    }

    fn kind_of(analysis: &NoteAnalysis) -> Option<NonChordTone> {
        assert!(!analysis.is_chord_tone);
        analysis.kind
    }

    #[test]
    fn test_passing_tone_over_sustained_chord() {
        let chords = [c_chord(1, ChordQuality::Major).at(0.0, 3.0)];
        let line = [note(60, 0.0), note(62, 1.0), note(64, 2.0)];
        let analyzed = analyze_line(&line, &chords);

        let c4 = analyzed[0].analysis.as_ref().unwrap();
        assert!(c4.is_chord_tone);
        assert_eq!(c4.interval, None);
        let d4 = analyzed[1].analysis.as_ref().unwrap();
        assert_eq!(kind_of(d4), Some(NonChordTone::Passing));
        assert_eq!(d4.scale_degree, Some(2));
        assert_eq!(d4.interval.as_deref(), Some("2M"));
        assert_eq!(d4.tendency, Some(Tendency::Up));
        assert!(analyzed[2].analysis.as_ref().unwrap().is_chord_tone);
    }

    #[test]
    fn test_suspension_resolving_down() {
        let g7 = c_chord(5, ChordQuality::Dominant7);
        let c = c_chord(1, ChordQuality::Major);
        let held = note(62, 1.0);
        let ctx = ClassifyContext {
            current_chord: &c,
            prev_note: Some(&note(62, 0.0)),
            next_note: Some(&note(60, 2.0)),
            prev_chord: Some(&g7),
            next_chord: Some(&c),
        };
        let analysis = classify(&held, &ctx);
        assert_eq!(kind_of(&analysis), Some(NonChordTone::Suspension));
        assert_eq!(analysis.tendency, Some(Tendency::Down));
        assert_eq!(analysis.interval.as_deref(), Some("1P"));
    }

    #[test]
    fn test_retardation_resolving_up() {
        // B held over from G major, rising to C over C major.
        let g = c_chord(5, ChordQuality::Major);
        let c = c_chord(1, ChordQuality::Major);
        let ctx = ClassifyContext {
            current_chord: &c,
            prev_note: Some(&note(71, 0.0)),
            next_note: Some(&note(72, 2.0)),
            prev_chord: Some(&g),
            next_chord: Some(&c),
        };
        let analysis = classify(&note(71, 1.0), &ctx);
        assert_eq!(kind_of(&analysis), Some(NonChordTone::Retardation));
        assert_eq!(analysis.tendency, Some(Tendency::Up));
    }

    #[test]
    fn test_anticipation_needs_only_next_chord() {
        let c = c_chord(1, ChordQuality::Major);
        let g = c_chord(5, ChordQuality::Major);
        let ctx = ClassifyContext {
            next_chord: Some(&g),
            ..ClassifyContext::new(&c)
        };
        let analysis = classify(&note(71, 0.0), &ctx);
        assert_eq!(kind_of(&analysis), Some(NonChordTone::Anticipation));
        assert_eq!(analysis.tendency, Some(Tendency::Static));
    }

    #[test]
    fn test_pedal_tone() {
        // Bass C held from F major into G major and on through it.
        let g = c_chord(5, ChordQuality::Major);
        let f = c_chord(4, ChordQuality::Major);
        let ctx = ClassifyContext {
            current_chord: &g,
            prev_note: Some(&note(48, 0.0)),
            next_note: Some(&note(48, 2.0)),
            prev_chord: Some(&f),
            next_chord: Some(&g),
        };
        assert_eq!(kind_of(&classify(&note(48, 1.0), &ctx)), Some(NonChordTone::Pedal));
    }

    #[test]
    fn test_neighbor_tone() {
        let chords = [c_chord(1, ChordQuality::Major).at(0.0, 3.0)];
        let line = [note(64, 0.0), note(65, 1.0), note(64, 2.0)];
        let analyzed = analyze_line(&line, &chords);
        let f4 = analyzed[1].analysis.as_ref().unwrap();
        assert_eq!(kind_of(f4), Some(NonChordTone::Neighbor));
        assert_eq!(f4.tendency, Some(Tendency::Down));
    }

    #[test]
    fn test_appoggiatura_and_escape() {
        let chords = [c_chord(1, ChordQuality::Major).at(0.0, 3.0)];

        // Leap up from C to F, step down to E.
        let line = [note(60, 0.0), note(65, 1.0), note(64, 2.0)];
        let analyzed = analyze_line(&line, &chords);
        let appoggiatura = analyzed[1].analysis.as_ref().unwrap();
        assert_eq!(kind_of(appoggiatura), Some(NonChordTone::Appoggiatura));
        assert_eq!(appoggiatura.interval.as_deref(), Some("4P"));

        // Step up from E to F, leap down to C.
        let line = [note(64, 0.0), note(65, 1.0), note(60, 2.0)];
        let analyzed = analyze_line(&line, &chords);
        let escape = analyzed[1].analysis.as_ref().unwrap();
        assert_eq!(kind_of(escape), Some(NonChordTone::Escape));
        assert_eq!(escape.tendency, Some(Tendency::Down));
    }

    #[test]
    fn test_unclassified_and_missing_context() {
        let c = c_chord(1, ChordQuality::Major);
        let analysis = classify(&note(61, 0.0), &ClassifyContext::new(&c));
        assert!(!analysis.is_chord_tone);
        assert_eq!(analysis.kind, None);
        assert_eq!(analysis.tendency, None);
        assert_eq!(analysis.scale_degree, None);

        // Leap in, leap out: nothing matches.
        let chords = [c.at(0.0, 3.0)];
        let line = [note(60, 0.0), note(65, 1.0), note(72, 2.0)];
        let analyzed = analyze_line(&line, &chords);
        assert_eq!(analyzed[1].analysis.as_ref().unwrap().kind, None);
    }

    #[test]
    fn test_every_resolved_class_is_a_chord_tone() {
        for quality in ChordQuality::ALL {
            for degree in 1..=7 {
                let chord = c_chord(degree, quality);
                for pc in resolve(&chord).classes() {
                    let pitch = 60 + pc.value();
                    let analysis = classify(&note(pitch, 0.0), &ClassifyContext::new(&chord));
                    assert!(analysis.is_chord_tone, "{quality:?} {degree} {pc}");
                    assert_eq!(analysis.kind, None);
                }
            }
        }
    }

    #[test]
    fn test_chord_tone_tendencies() {
        let g7 = c_chord(5, ChordQuality::Dominant7);
        let ctx = ClassifyContext::new(&g7);
        assert_eq!(classify(&note(71, 0.0), &ctx).tendency, Some(Tendency::Up));
        assert_eq!(classify(&note(65, 0.0), &ctx).tendency, Some(Tendency::Down));
        assert_eq!(classify(&note(67, 0.0), &ctx).tendency, None);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let chords = [
            c_chord(5, ChordQuality::Dominant7).at(0.0, 1.0),
            c_chord(1, ChordQuality::Major).at(1.0, 2.0),
        ];
        let line = [note(62, 0.0), note(62, 1.0), note(60, 2.0)];
        let once = analyze_line(&line, &chords);
        let twice = analyze_line(&once, &chords);
        assert_eq!(once, twice);
        assert_eq!(
            once[1].analysis.as_ref().unwrap().kind,
            Some(NonChordTone::Suspension)
        );
    }

    #[test]
    fn test_notes_before_first_chord_are_skipped() {
        let chords = [c_chord(1, ChordQuality::Major).at(2.0, 2.0)];
        let analyzed = analyze_line(&[note(60, 0.0), note(60, 2.0)], &chords);
        assert!(analyzed[0].analysis.is_none());
        assert!(analyzed[1].analysis.is_some());
    }

    #[test]
    fn test_analyze_voices_keeps_line_order() {
        let chords = [c_chord(1, ChordQuality::Major).at(0.0, 3.0)];
        let lines = vec![
            vec![note(72, 0.0), note(74, 1.0), note(76, 2.0)],
            vec![note(67, 0.0)],
            vec![],
            vec![note(48, 0.0)],
        ];
        let analyzed = analyze_voices(&lines, &chords);
        assert_eq!(analyzed.len(), 4);
        assert_eq!(analyzed[0][1].analysis.as_ref().unwrap().kind, Some(NonChordTone::Passing));
        assert!(analyzed[2].is_empty());
        assert!(analyzed[3][0].analysis.as_ref().unwrap().is_chord_tone);
    }

    #[test]
    fn test_analysis_wire_format() {
        let c = c_chord(1, ChordQuality::Major);
        let analysis = classify(&note(62, 0.0), &ClassifyContext::new(&c));
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["isChordTone"], false);
        assert!(json["type"].is_null());
        assert_eq!(json["scaleDegree"], 2);
    }
}
