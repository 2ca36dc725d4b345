// Pitch primitives: pitch classes, major/minor modes, and octave fitting.
//
// Everything above the chord level speaks in two units: a pitch class
// (0-11, C = 0) and a concrete MIDI pitch (0-127, C4 = 60). This module
// provides:
// - `PitchClass`, parsed from and displayed as a note name ("C", "F#", "Bb")
// - `Mode` (major / natural minor) with its diatonic interval table
// - Octave fitting: placing a pitch class inside an inclusive voice range
// - Note and interval naming for reports ("C4", "2M", "-3m")
// - The `interval` helpers shared by the validator and the classifier
//
// Used by resolver.rs for root lookup, generator.rs and leading.rs for
// octave placement, and nct.rs for scale degrees and interval names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarmonyError;
use crate::voicing::VoiceRange;

/// A pitch class, 0 = C through 11 = B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Build a pitch class from any integer, reducing mod 12.
    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(12) as u8)
    }

    /// Pitch class of a MIDI pitch.
    pub fn of(pitch: u8) -> Self {
        PitchClass(pitch % 12)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Transpose by a signed number of semitones.
    pub fn transpose(self, semitones: i32) -> Self {
        PitchClass::new(self.0 as i32 + semitones)
    }

    /// Ascending semitone distance from `self` up to `other` (0-11).
    pub fn interval_to(self, other: PitchClass) -> u8 {
        (other.0 + 12 - self.0) % 12
    }

    /// Note name, sharps for C#/F#, flats for Eb/Ab/Bb.
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
        ];
        NAMES[self.0 as usize]
    }
}

impl FromStr for PitchClass {
    type Err = HarmonyError;

    /// Parse "C", "c#", "Db", "B#", "Cb". At most one accidental.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .ok_or_else(|| HarmonyError::InvalidPitchClass(s.to_string()))?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(HarmonyError::InvalidPitchClass(s.to_string())),
        };
        let accidental = match chars.as_str() {
            "" => 0,
            "#" | "♯" => 1,
            "b" | "♭" => -1,
            _ => return Err(HarmonyError::InvalidPitchClass(s.to_string())),
        };
        Ok(PitchClass::new(base + accidental))
    }
}

impl TryFrom<String> for PitchClass {
    type Error = HarmonyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(pc: PitchClass) -> Self {
        pc.name().to_string()
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tonal mode of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ionian: W W H W W W H
    Major,
    /// Natural minor (Aeolian): W H W W H W W
    Minor,
}

impl Mode {
    /// Semitone offsets from the tonic to scale degrees 1-7.
    pub fn intervals(self) -> [u8; 7] {
        match self {
            Mode::Major => MAJOR_SCALE,
            Mode::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }
}

impl FromStr for Mode {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" | "maj" | "ionian" => Ok(Mode::Major),
            "minor" | "min" | "aeolian" => Ok(Mode::Minor),
            _ => Err(HarmonyError::InvalidMode(s.to_string())),
        }
    }
}

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Pitch class of a 1-indexed scale degree. Degrees outside 1-7 wrap
/// (0 reads as 7, 8 as 1).
pub fn scale_degree_pitch(key: PitchClass, mode: Mode, degree: u8) -> PitchClass {
    let index = (degree as i32 - 1).rem_euclid(7) as usize;
    key.transpose(mode.intervals()[index] as i32)
}

/// 1-indexed degree of `pc` in the MAJOR scale of `key`, or None when `pc`
/// is chromatic. Mode is ignored on purpose: melodic analysis reports
/// degrees against the major scale only.
pub fn major_scale_degree(key: PitchClass, pc: PitchClass) -> Option<u8> {
    let offset = key.interval_to(pc);
    MAJOR_SCALE
        .iter()
        .position(|&iv| iv == offset)
        .map(|d| d as u8 + 1)
}

/// The leading tone: a fixed major seventh above the tonic in either mode.
pub fn leading_tone(key: PitchClass) -> PitchClass {
    key.transpose(11)
}

// ── Octave fitting ──

/// Every MIDI pitch of class `pc` inside `range`, ascending.
pub fn candidate_pitches(pc: PitchClass, range: VoiceRange) -> Vec<u8> {
    let offset = (pc.value() + 12 - range.low % 12) % 12;
    let mut out = Vec::with_capacity(3);
    let mut pitch = range.low as u16 + offset as u16;
    while pitch <= range.high as u16 {
        out.push(pitch as u8);
        pitch += 12;
    }
    out
}

/// Place `pc` in `range`: the in-range octave nearest the range centre,
/// ties to the lower one. A range too narrow to hold the class at all
/// yields the range edge closest to an occurrence of it.
pub fn fit_pitch_class(pc: PitchClass, range: VoiceRange) -> u8 {
    let doubled_center = range.low as i32 + range.high as i32;
    let best = candidate_pitches(pc, range)
        .into_iter()
        .min_by_key(|&p| (2 * p as i32 - doubled_center).abs());
    match best {
        Some(pitch) => pitch,
        None => clamp_to_edge(pc, range),
    }
}

/// Pitch-class occurrence just below `range.low` versus the one just above
/// `range.high`; return whichever edge is closer.
fn clamp_to_edge(pc: PitchClass, range: VoiceRange) -> u8 {
    let below_gap = (range.low % 12 + 12 - pc.value()) % 12;
    let above_gap = (pc.value() + 12 - range.high % 12) % 12;
    log::warn!(
        "pitch class {} has no octave in {}..={}, clamping to range edge",
        pc,
        range.low,
        range.high
    );
    if below_gap <= above_gap {
        range.low
    } else {
        range.high
    }
}

/// Of all pitches in `candidates`, the one closest to `target` (ties to the
/// lower pitch). Candidates must be non-empty to return Some.
pub fn nearest_to(candidates: &[u8], target: u8) -> Option<u8> {
    candidates
        .iter()
        .copied()
        .min_by_key(|&p| ((p as i16 - target as i16).abs(), p))
}

// ── Naming ──

/// Convert a MIDI pitch to a compact note name (e.g., "C4", "F#3").
pub fn pitch_name(pitch: u8) -> String {
    let octave = pitch as i32 / 12 - 1;
    format!("{}{}", PitchClass::of(pitch).name(), octave)
}

/// Name the interval from `from` to `to` as number + quality, prefixed with
/// "-" when descending: 2 semitones up is "2M", 3 down is "-3m", 12 is "8P",
/// 14 is "9M". The tritone is spelled as an augmented fourth.
pub fn named_interval(from: u8, to: u8) -> String {
    const SIMPLE: [(u8, &str); 12] = [
        (1, "P"),
        (2, "m"),
        (2, "M"),
        (3, "m"),
        (3, "M"),
        (4, "P"),
        (4, "A"),
        (5, "P"),
        (6, "m"),
        (6, "M"),
        (7, "m"),
        (7, "M"),
    ];
    let diff = to as i16 - from as i16;
    let size = diff.unsigned_abs();
    let octaves = size / 12;
    let (mut number, quality) = SIMPLE[(size % 12) as usize];
    number += 7 * octaves as u8;
    let sign = if diff < 0 { "-" } else { "" };
    format!("{sign}{number}{quality}")
}

/// Musical interval helpers.
pub mod interval {
    /// Signed semitones from `a` to `b`. Positive means `b` is higher.
    pub fn semitones(a: u8, b: u8) -> i16 {
        b as i16 - a as i16
    }

    /// A step is a move of one or two semitones.
    pub fn is_step(a: u8, b: u8) -> bool {
        matches!(semitones(a, b).unsigned_abs(), 1 | 2)
    }

    /// A leap is any move larger than a step.
    pub fn is_leap(a: u8, b: u8) -> bool {
        semitones(a, b).unsigned_abs() > 2
    }

    /// Direction of motion: 1 up, -1 down, 0 none.
    pub fn direction(a: u8, b: u8) -> i8 {
        semitones(a, b).signum() as i8
    }

    /// Absolute interval reduced to within an octave (0-11).
    pub fn reduced(a: u8, b: u8) -> u8 {
        (semitones(a, b).unsigned_abs() % 12) as u8
    }
}
