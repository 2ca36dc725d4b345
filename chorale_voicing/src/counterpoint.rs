// Counterpoint validation: advisory checks over one or two voicings.
//
// Pure predicates and finding lists. Nothing here rejects or mutates a
// voicing; the leading engine folds the predicates into its score, and a
// critique view renders the findings.
//
// Rules:
// - Parallel fifths: the interval between two voices reduces to 7 or 5
//   (mod 12) in both voicings and both voices move the same way. The 5
//   also catches parallel fourths; that strictness is kept deliberately.
// - Parallel octaves: same, with the interval reducing to 0.
// - Voice crossing: a nominally lower voice sounds above its upper neighbour.
// - Voice overlap: adjacent voices more than an octave apart (spacing).
// - Doubled leading tone: the key's leading tone in two or more voices.
// - Retained common tones: voices whose pitch class did not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pitch::{PitchClass, interval, leading_tone};
use crate::voicing::{Voice, Voicing};

/// Every unordered pair of voices, upper voice first.
pub const VOICE_PAIRS: [(Voice, Voice); 6] = [
    (Voice::Soprano, Voice::Alto),
    (Voice::Soprano, Voice::Tenor),
    (Voice::Soprano, Voice::Bass),
    (Voice::Alto, Voice::Tenor),
    (Voice::Alto, Voice::Bass),
    (Voice::Tenor, Voice::Bass),
];

/// True if both voices moved, in the same direction.
fn similar_motion(prev: &Voicing, curr: &Voicing, v1: Voice, v2: Voice) -> bool {
    let d1 = interval::direction(prev.get(v1), curr.get(v1));
    let d2 = interval::direction(prev.get(v2), curr.get(v2));
    d1 != 0 && d1 == d2
}

/// Both voicings hold an interval between `v1` and `v2` whose reduction is
/// in `classes`, reached by similar motion.
fn parallel_interval(prev: &Voicing, curr: &Voicing, v1: Voice, v2: Voice, classes: &[u8]) -> bool {
    let before = interval::reduced(prev.get(v1), prev.get(v2));
    let after = interval::reduced(curr.get(v1), curr.get(v2));
    classes.contains(&before) && classes.contains(&after) && similar_motion(prev, curr, v1, v2)
}

pub fn parallel_fifths(prev: &Voicing, curr: &Voicing, v1: Voice, v2: Voice) -> bool {
    parallel_interval(prev, curr, v1, v2, &[7, 5])
}

pub fn parallel_octaves(prev: &Voicing, curr: &Voicing, v1: Voice, v2: Voice) -> bool {
    parallel_interval(prev, curr, v1, v2, &[0])
}

/// Adjacent pairs (lower, upper) where the lower voice sounds higher.
pub fn crossed_pairs(voicing: &Voicing) -> Vec<(Voice, Voice)> {
    Voice::ADJACENT
        .into_iter()
        .filter(|&(lower, upper)| voicing.get(lower) > voicing.get(upper))
        .collect()
}

pub fn voice_crossing(voicing: &Voicing) -> bool {
    !crossed_pairs(voicing).is_empty()
}

/// Adjacent pairs more than an octave apart.
pub fn overlapped_pairs(voicing: &Voicing) -> Vec<(Voice, Voice)> {
    Voice::ADJACENT
        .into_iter()
        .filter(|&(lower, upper)| {
            interval::semitones(voicing.get(lower), voicing.get(upper)).unsigned_abs() > 12
        })
        .collect()
}

pub fn voice_overlap(voicing: &Voicing) -> bool {
    !overlapped_pairs(voicing).is_empty()
}

/// Voices singing the key's leading tone.
pub fn leading_tone_voices(voicing: &Voicing, key: PitchClass) -> Vec<Voice> {
    let lt = leading_tone(key);
    Voice::ALL
        .into_iter()
        .filter(|&v| voicing.pitch_class(v) == lt)
        .collect()
}

pub fn doubled_leading_tone(voicing: &Voicing, key: PitchClass) -> bool {
    leading_tone_voices(voicing, key).len() >= 2
}

/// Voices whose pitch class is unchanged, octave ignored.
pub fn retained_common_tones(prev: &Voicing, curr: &Voicing) -> usize {
    Voice::ALL
        .iter()
        .filter(|&&v| prev.pitch_class(v) == curr.pitch_class(v))
        .count()
}

// ── Findings ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    ParallelFifth,
    ParallelOctave,
    VoiceCrossing,
    VoiceOverlap,
    DoubledLeadingTone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl FindingKind {
    pub fn severity(self) -> Severity {
        match self {
            FindingKind::ParallelFifth | FindingKind::ParallelOctave => Severity::Error,
            FindingKind::VoiceCrossing | FindingKind::DoubledLeadingTone => Severity::Warning,
            FindingKind::VoiceOverlap => Severity::Info,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FindingKind::ParallelFifth => "parallel fifths",
            FindingKind::ParallelOctave => "parallel octaves",
            FindingKind::VoiceCrossing => "voice crossing",
            FindingKind::VoiceOverlap => "voice overlap",
            FindingKind::DoubledLeadingTone => "doubled leading tone",
        }
    }
}

/// One detected issue. Ephemeral: computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub voices: Vec<Voice>,
    pub severity: Severity,
}

impl Finding {
    pub fn new(kind: FindingKind, voices: Vec<Voice>) -> Self {
        Finding {
            kind,
            voices,
            severity: kind.severity(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let voices: Vec<&str> = self.voices.iter().map(|v| v.name()).collect();
        write!(
            f,
            "[{:?}] {} ({})",
            self.severity,
            self.kind.label(),
            voices.join("/")
        )
    }
}

/// Issues inside a single voicing: crossing, overlap, doubled leading tone.
pub fn findings_within(voicing: &Voicing, key: PitchClass) -> Vec<Finding> {
    let mut out = Vec::new();
    for (lower, upper) in crossed_pairs(voicing) {
        out.push(Finding::new(FindingKind::VoiceCrossing, vec![lower, upper]));
    }
    for (lower, upper) in overlapped_pairs(voicing) {
        out.push(Finding::new(FindingKind::VoiceOverlap, vec![lower, upper]));
    }
    let lt_voices = leading_tone_voices(voicing, key);
    if lt_voices.len() >= 2 {
        out.push(Finding::new(FindingKind::DoubledLeadingTone, lt_voices));
    }
    out
}

/// Parallel perfects between two successive voicings, over all six pairs.
pub fn findings_between(prev: &Voicing, curr: &Voicing) -> Vec<Finding> {
    let mut out = Vec::new();
    for (v1, v2) in VOICE_PAIRS {
        if parallel_fifths(prev, curr, v1, v2) {
            out.push(Finding::new(FindingKind::ParallelFifth, vec![v1, v2]));
        }
        if parallel_octaves(prev, curr, v1, v2) {
            out.push(Finding::new(FindingKind::ParallelOctave, vec![v1, v2]));
        }
    }
    out
}

/// Full critique of `curr`, including motion from `prev` when there is one.
pub fn critique(prev: Option<&Voicing>, curr: &Voicing, key: PitchClass) -> Vec<Finding> {
    let mut out = prev.map(|p| findings_between(p, curr)).unwrap_or_default();
    out.extend(findings_within(curr, key));
    out
}
