// Voice leading: choose the next voicing given the previous one.
//
// The bass always takes the chord root, fitted into the bass range; only the
// tenor, alto, and soprano are searched. The search space:
//
// 1. Pitch-class assignments. Every (tenor, alto, soprano) triple drawn from
//    the chord's non-root classes, doublings and omissions included. Leaving
//    out a fifth is sometimes the only way around a parallel; the common-tone
//    and motion terms decide between complete and incomplete chords.
// 2. Best-fit placement. Each assigned class goes to the octave, within the
//    voice's range, nearest that voice's previous pitch.
// 3. Octave variants. Each upper voice on its own moved up or down an octave,
//    when that stays in range.
//
// Every candidate is scored with `score_voicing` and the best wins. Ties go
// to the smaller total motion, then to enumeration order, so the result is
// a pure function of the inputs.
//
// Scoring terms (weights in `LeadingWeights`, defaults shown):
// - motion:               -2 per semitone per voice
// - parallel fifths:      -1000 per voice pair (validator's 7-or-5 test)
// - parallel octaves:     -1000 per voice pair
// - doubled leading tone: -500
// - common tone retained: +50 per voice keeping its pitch class
// - contrary outer voices: +100 when soprano and bass move opposite ways
// - voice crossing:       0 (off by default, available to configs)
//
// With no previous voicing there is nothing to score; generator.rs voices
// the chord by convention instead.

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::config::EngineConfig;
use crate::counterpoint::{
    VOICE_PAIRS, crossed_pairs, doubled_leading_tone, parallel_fifths, parallel_octaves,
};
use crate::generator::generate_default;
use crate::pitch::{PitchClass, candidate_pitches, fit_pitch_class, interval, nearest_to};
use crate::resolver::{PitchSet, resolve};
use crate::voicing::{Voice, VoiceRanges, Voicing};

/// Weights for the voice-leading score. Tunable through `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadingWeights {
    pub motion_per_semitone: i32,
    pub parallel_fifths: i32,
    pub parallel_octaves: i32,
    pub doubled_leading_tone: i32,
    pub common_tone: i32,
    pub contrary_outer_motion: i32,
    pub voice_crossing: i32,
}

impl Default for LeadingWeights {
    fn default() -> Self {
        LeadingWeights {
            motion_per_semitone: -2,
            parallel_fifths: -1000,
            parallel_octaves: -1000,
            doubled_leading_tone: -500,
            common_tone: 50,
            contrary_outer_motion: 100,
            voice_crossing: 0,
        }
    }
}

/// A candidate with its score and total motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredVoicing {
    pub voicing: Voicing,
    pub score: i32,
    pub motion: u32,
}

/// Score `candidate` as the successor of `previous` in `key`.
pub fn score_voicing(
    candidate: &Voicing,
    previous: &Voicing,
    key: PitchClass,
    weights: &LeadingWeights,
) -> i32 {
    let mut score = weights.motion_per_semitone * candidate.total_motion(previous) as i32;

    for (v1, v2) in VOICE_PAIRS {
        if parallel_fifths(previous, candidate, v1, v2) {
            score += weights.parallel_fifths;
        }
        if parallel_octaves(previous, candidate, v1, v2) {
            score += weights.parallel_octaves;
        }
    }

    if doubled_leading_tone(candidate, key) {
        score += weights.doubled_leading_tone;
    }

    for voice in Voice::ALL {
        if candidate.pitch_class(voice) == previous.pitch_class(voice) {
            score += weights.common_tone;
        }
    }

    let soprano = interval::direction(previous.soprano, candidate.soprano);
    let bass = interval::direction(previous.bass, candidate.bass);
    if soprano != 0 && bass != 0 && soprano != bass {
        score += weights.contrary_outer_motion;
    }

    score += weights.voice_crossing * crossed_pairs(candidate).len() as i32;

    score
}

/// Voice `chord`, leading from `previous` when there is one.
pub fn next_voicing(chord: &Chord, previous: Option<&Voicing>, config: &EngineConfig) -> Voicing {
    let set = resolve(chord);
    match previous {
        None => generate_default(&set, &config.ranges),
        Some(prev) => lead(&set, prev, chord.key, config).voicing,
    }
}

/// Run the search for a resolved chord and return the winner.
pub fn lead(set: &PitchSet, previous: &Voicing, key: PitchClass, config: &EngineConfig) -> ScoredVoicing {
    let candidates = candidates(set, previous, &config.ranges);
    log::trace!("scoring {} candidate voicings", candidates.len());

    let mut best: Option<ScoredVoicing> = None;
    for voicing in candidates {
        let scored = ScoredVoicing {
            voicing,
            score: score_voicing(&voicing, previous, key, &config.weights),
            motion: voicing.total_motion(previous),
        };
        let better = match &best {
            None => true,
            Some(b) => scored.score > b.score || (scored.score == b.score && scored.motion < b.motion),
        };
        if better {
            best = Some(scored);
        }
    }

    // The candidate list always holds at least the base placement of one
    // assignment; the fallback only covers that invariant breaking.
    let best = best.unwrap_or_else(|| {
        let voicing = generate_default(set, &config.ranges);
        ScoredVoicing {
            voicing,
            score: score_voicing(&voicing, previous, key, &config.weights),
            motion: voicing.total_motion(previous),
        }
    });
    log::debug!("chose {} (score {}, motion {})", best.voicing.summary(), best.score, best.motion);
    best
}

/// Every voicing the search considers, in enumeration order.
pub fn candidates(set: &PitchSet, previous: &Voicing, ranges: &VoiceRanges) -> Vec<Voicing> {
    let bass = fit_pitch_class(set.root(), ranges.bass);
    let mut out = Vec::new();

    for [tenor, alto, soprano] in assignments(set) {
        let place = |voice: Voice, pc: PitchClass| best_fit(pc, voice, previous, ranges);
        let base = Voicing {
            soprano: place(Voice::Soprano, soprano),
            alto: place(Voice::Alto, alto),
            tenor: place(Voice::Tenor, tenor),
            bass,
        };
        out.push(base);

        for voice in Voice::UPPER {
            let range = ranges.get(voice);
            let pitch = base.get(voice) as i16;
            for shifted in [pitch - 12, pitch + 12] {
                if (0..=127).contains(&shifted) && range.contains(shifted as u8) {
                    out.push(base.with(voice, shifted as u8));
                }
            }
        }
    }
    out
}

/// Every (tenor, alto, soprano) triple over the non-root classes.
fn assignments(set: &PitchSet) -> Vec<[PitchClass; 3]> {
    let upper: &[PitchClass] = if set.upper().is_empty() {
        &set.classes()[..1]
    } else {
        set.upper()
    };

    let mut out = Vec::with_capacity(upper.len().pow(3));
    for &tenor in upper {
        for &alto in upper {
            for &soprano in upper {
                out.push([tenor, alto, soprano]);
            }
        }
    }
    out
}

/// The in-range octave of `pc` nearest the voice's previous pitch.
fn best_fit(pc: PitchClass, voice: Voice, previous: &Voicing, ranges: &VoiceRanges) -> u8 {
    let range = ranges.get(voice);
    nearest_to(&candidate_pitches(pc, range), previous.get(voice))
        .unwrap_or_else(|| fit_pitch_class(pc, range))
}
