// SATB voicings: the concrete output of the engine.
//
// A voicing is exactly four MIDI pitches, one per voice. Each voice owns an
// inclusive register (`VoiceRange`); the default table is the classical SATB
// compass, but ranges are plain data so callers can pass their own (the
// generator and the leading engine take a `VoiceRanges` parameter rather
// than reading constants).
//
// Pitch ordering (bass <= tenor <= alto <= soprano) is a goal, not a
// construction invariant. A voicing that crosses is still a valid value; the
// counterpoint validator reports the crossing.

use serde::{Deserialize, Serialize};

use crate::pitch::{PitchClass, pitch_name};

/// Voice index in SATB order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Soprano = 0,
    Alto = 1,
    Tenor = 2,
    Bass = 3,
}

impl Voice {
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    /// The three voices the leading engine optimizes, bass excluded.
    pub const UPPER: [Voice; 3] = [Voice::Tenor, Voice::Alto, Voice::Soprano];

    /// Adjacent pairs, each listed (lower, upper).
    pub const ADJACENT: [(Voice, Voice); 3] = [
        (Voice::Bass, Voice::Tenor),
        (Voice::Tenor, Voice::Alto),
        (Voice::Alto, Voice::Soprano),
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Soprano => "soprano",
            Voice::Alto => "alto",
            Voice::Tenor => "tenor",
            Voice::Bass => "bass",
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive MIDI pitch range for one voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceRange {
    pub low: u8,
    pub high: u8,
}

impl VoiceRange {
    pub fn new(low: u8, high: u8) -> Self {
        VoiceRange { low, high }
    }

    pub fn contains(self, pitch: u8) -> bool {
        pitch >= self.low && pitch <= self.high
    }
}

/// One range per voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceRanges {
    pub soprano: VoiceRange,
    pub alto: VoiceRange,
    pub tenor: VoiceRange,
    pub bass: VoiceRange,
}

impl VoiceRanges {
    pub fn get(&self, voice: Voice) -> VoiceRange {
        match voice {
            Voice::Soprano => self.soprano,
            Voice::Alto => self.alto,
            Voice::Tenor => self.tenor,
            Voice::Bass => self.bass,
        }
    }
}

impl Default for VoiceRanges {
    fn default() -> Self {
        VoiceRanges {
            soprano: VoiceRange::new(60, 79), // C4–G5
            alto: VoiceRange::new(55, 74),    // G3–D5
            tenor: VoiceRange::new(48, 67),   // C3–G4
            bass: VoiceRange::new(40, 60),    // E2–C4
        }
    }
}

/// A four-voice pitch assignment for one chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voicing {
    pub soprano: u8,
    pub alto: u8,
    pub tenor: u8,
    pub bass: u8,
}

impl Voicing {
    pub fn new(soprano: u8, alto: u8, tenor: u8, bass: u8) -> Self {
        Voicing {
            soprano,
            alto,
            tenor,
            bass,
        }
    }

    pub fn get(&self, voice: Voice) -> u8 {
        match voice {
            Voice::Soprano => self.soprano,
            Voice::Alto => self.alto,
            Voice::Tenor => self.tenor,
            Voice::Bass => self.bass,
        }
    }

    pub fn set(&mut self, voice: Voice, pitch: u8) {
        match voice {
            Voice::Soprano => self.soprano = pitch,
            Voice::Alto => self.alto = pitch,
            Voice::Tenor => self.tenor = pitch,
            Voice::Bass => self.bass = pitch,
        }
    }

    /// Copy with one voice replaced.
    pub fn with(mut self, voice: Voice, pitch: u8) -> Self {
        self.set(voice, pitch);
        self
    }

    /// Pitches in SATB order (vertical slice).
    pub fn pitches(&self) -> [u8; 4] {
        Voice::ALL.map(|v| self.get(v))
    }

    pub fn pitch_class(&self, voice: Voice) -> PitchClass {
        PitchClass::of(self.get(voice))
    }

    /// True when every voice sits inside its range.
    pub fn in_range(&self, ranges: &VoiceRanges) -> bool {
        Voice::ALL
            .iter()
            .all(|&v| ranges.get(v).contains(self.get(v)))
    }

    /// Sum of absolute semitone motion per voice from `previous`.
    pub fn total_motion(&self, previous: &Voicing) -> u32 {
        Voice::ALL
            .iter()
            .map(|&v| (self.get(v) as i16 - previous.get(v) as i16).unsigned_abs() as u32)
            .sum()
    }

    /// Compact text, e.g. "S:G4 A:E4 T:C4 B:C3".
    pub fn summary(&self) -> String {
        format!(
            "S:{} A:{} T:{} B:{}",
            pitch_name(self.soprano),
            pitch_name(self.alto),
            pitch_name(self.tenor),
            pitch_name(self.bass)
        )
    }
}
