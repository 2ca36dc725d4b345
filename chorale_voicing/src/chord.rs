// Abstract chords: key, scale degree, quality, and extension flags.
//
// A `Chord` is an immutable value. Changing its key, mode, or quality means
// building a new chord (`in_key`, `skeleton`), never mutating one in place.
// The quality is a closed enum; `intervals()` is a total match, so adding a
// quality without an interval stack fails to compile.
//
// Quality names arriving from outside (JSON, UI) go through
// `ChordQuality::from_name`, which never fails: an unknown name degrades to
// a plain major or minor triad.
//
// Also here: chord-symbol and roman-numeral rendering, the reverse import
// from symbol labels ("F#m", "G7b9", "N" for no chord) that chord detectors
// emit, and the diatonic quality table a caller uses to re-derive qualities
// after a key change.
// Pitch content is computed by resolver.rs, not stored.

use serde::{Deserialize, Serialize};

use crate::pitch::{Mode, PitchClass, scale_degree_pitch};

/// Chord quality: triad type plus optional seventh and upper extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    Dominant9,
    Major9,
    Minor9,
    Dominant11,
    Major11,
    Minor11,
    Dominant13,
    Major13,
    Minor13,
}

/// Semitones: thirds, fifths, sevenths, and the compound extensions.
const MINOR_THIRD: u8 = 3;
const MAJOR_THIRD: u8 = 4;
const DIMINISHED_FIFTH: u8 = 6;
const PERFECT_FIFTH: u8 = 7;
const AUGMENTED_FIFTH: u8 = 8;
const DIMINISHED_SEVENTH: u8 = 9;
const MINOR_SEVENTH: u8 = 10;
const MAJOR_SEVENTH: u8 = 11;
pub(crate) const NINTH: u8 = 14;
pub(crate) const ELEVENTH: u8 = 17;
pub(crate) const THIRTEENTH: u8 = 21;

impl ChordQuality {
    pub const ALL: [ChordQuality; 18] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Diminished7,
        ChordQuality::Dominant9,
        ChordQuality::Major9,
        ChordQuality::Minor9,
        ChordQuality::Dominant11,
        ChordQuality::Major11,
        ChordQuality::Minor11,
        ChordQuality::Dominant13,
        ChordQuality::Major13,
        ChordQuality::Minor13,
    ];

    /// Semitone stack above the root: unison, third, fifth, then the seventh
    /// and any upper extensions implied by the quality itself.
    pub fn intervals(self) -> Vec<u8> {
        use ChordQuality::*;
        let (third, fifth) = self.triad_intervals();
        let mut stack = vec![0, third, fifth];
        let seventh = match self {
            Major | Minor | Diminished | Augmented => None,
            Dominant7 | Minor7 | HalfDiminished7 | Dominant9 | Minor9 | Dominant11 | Minor11
            | Dominant13 | Minor13 => Some(MINOR_SEVENTH),
            Major7 | Major9 | Major11 | Major13 => Some(MAJOR_SEVENTH),
            Diminished7 => Some(DIMINISHED_SEVENTH),
        };
        stack.extend(seventh);
        let upper: &[u8] = match self.extension_level() {
            9 => &[NINTH],
            11 => &[NINTH, ELEVENTH],
            13 => &[NINTH, ELEVENTH, THIRTEENTH],
            _ => &[],
        };
        stack.extend_from_slice(upper);
        stack
    }

    /// (third, fifth) in semitones.
    fn triad_intervals(self) -> (u8, u8) {
        match self.triad() {
            ChordQuality::Minor => (MINOR_THIRD, PERFECT_FIFTH),
            ChordQuality::Diminished => (MINOR_THIRD, DIMINISHED_FIFTH),
            ChordQuality::Augmented => (MAJOR_THIRD, AUGMENTED_FIFTH),
            _ => (MAJOR_THIRD, PERFECT_FIFTH),
        }
    }

    /// The basic triad underneath this quality.
    pub fn triad(self) -> ChordQuality {
        use ChordQuality::*;
        match self {
            Major | Dominant7 | Major7 | Dominant9 | Major9 | Dominant11 | Major11
            | Dominant13 | Major13 => Major,
            Minor | Minor7 | Minor9 | Minor11 | Minor13 => Minor,
            Diminished | HalfDiminished7 | Diminished7 => Diminished,
            Augmented => Augmented,
        }
    }

    /// 5 for triads, 7 for seventh chords, 9/11/13 for extended chords.
    pub fn extension_level(self) -> u8 {
        use ChordQuality::*;
        match self {
            Major | Minor | Diminished | Augmented => 5,
            Dominant7 | Major7 | Minor7 | HalfDiminished7 | Diminished7 => 7,
            Dominant9 | Major9 | Minor9 => 9,
            Dominant11 | Major11 | Minor11 => 11,
            Dominant13 | Major13 | Minor13 => 13,
        }
    }

    pub fn has_seventh(self) -> bool {
        self.extension_level() >= 7
    }

    /// Raise a seventh-chord quality to the given extension level (9, 11,
    /// 13). Qualities with no extended family (triads, half-diminished,
    /// diminished seventh) come back unchanged.
    pub fn extended_to(self, level: u8) -> ChordQuality {
        use ChordQuality::*;
        let family = match self {
            Dominant7 | Dominant9 | Dominant11 | Dominant13 => [Dominant7, Dominant9, Dominant11, Dominant13],
            Major7 | Major9 | Major11 | Major13 => [Major7, Major9, Major11, Major13],
            Minor7 | Minor9 | Minor11 | Minor13 => [Minor7, Minor9, Minor11, Minor13],
            _ => return self,
        };
        match level {
            9 => family[1],
            11 => family[2],
            13 => family[3],
            _ => family[0],
        }
    }

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        use ChordQuality::*;
        match self {
            Major => "major",
            Minor => "minor",
            Diminished => "diminished",
            Augmented => "augmented",
            Dominant7 => "dominant7",
            Major7 => "major7",
            Minor7 => "minor7",
            HalfDiminished7 => "halfDiminished7",
            Diminished7 => "diminished7",
            Dominant9 => "dominant9",
            Major9 => "major9",
            Minor9 => "minor9",
            Dominant11 => "dominant11",
            Major11 => "major11",
            Minor11 => "minor11",
            Dominant13 => "dominant13",
            Major13 => "major13",
            Minor13 => "minor13",
        }
    }

    /// Recognize a quality by canonical name or common chord-symbol alias.
    pub fn parse_known(name: &str) -> Option<ChordQuality> {
        use ChordQuality::*;
        let quality = match name.trim() {
            "" | "major" | "maj" | "M" => Major,
            "minor" | "min" | "m" | "-" => Minor,
            "diminished" | "dim" | "°" => Diminished,
            "augmented" | "aug" | "+" => Augmented,
            "dominant7" | "dom7" | "7" => Dominant7,
            "major7" | "maj7" | "M7" => Major7,
            "minor7" | "min7" | "m7" | "-7" => Minor7,
            "halfDiminished7" | "half-diminished7" | "m7b5" | "ø7" | "ø" => HalfDiminished7,
            "diminished7" | "dim7" | "°7" => Diminished7,
            "dominant9" | "dom9" | "9" => Dominant9,
            "major9" | "maj9" | "M9" => Major9,
            "minor9" | "min9" | "m9" => Minor9,
            "dominant11" | "dom11" | "11" => Dominant11,
            "major11" | "maj11" | "M11" => Major11,
            "minor11" | "min11" | "m11" => Minor11,
            "dominant13" | "dom13" | "13" => Dominant13,
            "major13" | "maj13" | "M13" => Major13,
            "minor13" | "min13" | "m13" => Minor13,
            _ => return None,
        };
        Some(quality)
    }

    /// Lenient parse: unknown names fall back to a minor triad when the name
    /// carries a "min"/"dim" marker, otherwise a major triad.
    pub fn from_name(name: &str) -> ChordQuality {
        if let Some(quality) = Self::parse_known(name) {
            return quality;
        }
        let lower = name.to_lowercase();
        let fallback = if lower.contains("min") || lower.contains("dim") {
            ChordQuality::Minor
        } else {
            ChordQuality::Major
        };
        log::warn!(
            "unrecognized chord quality {name:?}, falling back to {}",
            fallback.as_str()
        );
        fallback
    }

    /// Chord-symbol suffix ("", "m", "7", "maj7", "m7b5", ...).
    pub fn suffix(self) -> &'static str {
        use ChordQuality::*;
        match self {
            Major => "",
            Minor => "m",
            Diminished => "dim",
            Augmented => "+",
            Dominant7 => "7",
            Major7 => "maj7",
            Minor7 => "m7",
            HalfDiminished7 => "m7b5",
            Diminished7 => "dim7",
            Dominant9 => "9",
            Major9 => "maj9",
            Minor9 => "m9",
            Dominant11 => "11",
            Major11 => "maj11",
            Minor11 => "m11",
            Dominant13 => "13",
            Major13 => "maj13",
            Minor13 => "m13",
        }
    }

    /// Roman-numeral figure appended after the numeral ("°", "7", "ø7").
    fn roman_figure(self) -> &'static str {
        use ChordQuality::*;
        match self {
            Major | Minor => "",
            Diminished => "°",
            Augmented => "+",
            Dominant7 | Minor7 => "7",
            Major7 => "maj7",
            HalfDiminished7 => "ø7",
            Diminished7 => "°7",
            Dominant9 | Minor9 => "9",
            Major9 => "maj9",
            Dominant11 | Minor11 => "11",
            Major11 => "maj11",
            Dominant13 | Minor13 => "13",
            Major13 => "maj13",
        }
    }
}

/// Best guess at a quality from a suffix no alias matches, read from the
/// markers a lead sheet uses. The flag is true when a 9 appears.
fn guess_quality(suffix: &str) -> (ChordQuality, bool) {
    use ChordQuality::*;
    let lower = suffix.to_lowercase();
    let minor = lower.contains('m') && !lower.contains("maj");
    let seventh = lower.contains('7');
    let quality = if lower.contains("dim") {
        if seventh {
            Diminished7
        } else {
            Diminished
        }
    } else if lower.contains("aug") || lower.contains('+') {
        Augmented
    } else if seventh {
        if lower.contains("maj") {
            Major7
        } else if minor {
            Minor7
        } else {
            Dominant7
        }
    } else if minor {
        Minor
    } else {
        Major
    };
    (quality, lower.contains('9'))
}

impl From<String> for ChordQuality {
    fn from(name: String) -> Self {
        ChordQuality::from_name(&name)
    }
}

impl From<ChordQuality> for String {
    fn from(quality: ChordQuality) -> Self {
        quality.as_str().to_string()
    }
}

/// Diatonic quality of a scale degree. Triads for `seventh == false`,
/// diatonic seventh chords otherwise.
pub fn diatonic_quality(mode: Mode, degree: u8, seventh: bool) -> ChordQuality {
    use ChordQuality::*;
    const MAJOR_TRIADS: [ChordQuality; 7] = [Major, Minor, Minor, Major, Major, Minor, Diminished];
    const MINOR_TRIADS: [ChordQuality; 7] = [Minor, Diminished, Major, Minor, Minor, Major, Major];
    const MAJOR_SEVENTHS: [ChordQuality; 7] =
        [Major7, Minor7, Minor7, Major7, Dominant7, Minor7, HalfDiminished7];
    const MINOR_SEVENTHS: [ChordQuality; 7] =
        [Minor7, HalfDiminished7, Major7, Minor7, Minor7, Major7, Dominant7];
    let index = (degree as i32 - 1).rem_euclid(7) as usize;
    let table = match (mode, seventh) {
        (Mode::Major, false) => &MAJOR_TRIADS,
        (Mode::Minor, false) => &MINOR_TRIADS,
        (Mode::Major, true) => &MAJOR_SEVENTHS,
        (Mode::Minor, true) => &MINOR_SEVENTHS,
    };
    table[index]
}

/// Extension flags layered on top of the quality.
///
/// sus2/sus4 replace the third rather than adding to it; when both are set,
/// sus4 wins. The altered flags replace the natural extension of the same
/// number (flat9 replaces a 9th, sharp11 an 11th).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Extensions {
    pub add9: bool,
    pub add11: bool,
    pub add13: bool,
    pub sus2: bool,
    pub sus4: bool,
    pub flat9: bool,
    pub sharp9: bool,
    pub sharp11: bool,
    pub flat13: bool,
}

impl Extensions {
    pub fn is_empty(&self) -> bool {
        *self == Extensions::default()
    }

    /// Semitone that replaces the third, if any.
    pub fn suspension(&self) -> Option<u8> {
        if self.sus4 {
            Some(5)
        } else if self.sus2 {
            Some(2)
        } else {
            None
        }
    }

    /// Symbol text for the flags, in sus / add / alteration order.
    fn suffix(&self) -> String {
        let mut out = String::new();
        if self.sus4 {
            out.push_str("sus4");
        } else if self.sus2 {
            out.push_str("sus2");
        }
        for (flag, text) in [
            (self.add9, "add9"),
            (self.add11, "add11"),
            (self.add13, "add13"),
            (self.flat9, "b9"),
            (self.sharp9, "#9"),
            (self.sharp11, "#11"),
            (self.flat13, "b13"),
        ] {
            if flag {
                out.push_str(text);
            }
        }
        out
    }
}

/// Extension tags as they appear in chord symbols. Longer tags that contain
/// a shorter one come first ("b13" before any "13" quality suffix).
const SYMBOL_TAGS: [&str; 9] = ["b13", "#11", "#9", "b9", "add9", "add11", "add13", "sus4", "sus2"];

/// Split "F#m7" into ("F#", "m7"): a letter plus at most one accidental.
fn split_root(label: &str) -> (&str, &str) {
    let mut chars = label.char_indices().skip(1);
    let end = match chars.next() {
        Some((_, '#' | 'b' | '♯' | '♭')) => chars.next().map_or(label.len(), |(i, _)| i),
        Some((i, _)) => i,
        None => label.len(),
    };
    label.split_at(end)
}

/// Quality and extension flags from a symbol suffix. Extension tags are
/// lifted out first so "7b9" reads as a dominant seventh with a flat nine.
fn parse_suffix(suffix: &str) -> (ChordQuality, Extensions) {
    let mut rest = suffix.to_string();
    let mut extensions = Extensions::default();
    for tag in SYMBOL_TAGS {
        let Some(at) = rest.find(tag) else {
            continue;
        };
        rest.replace_range(at..at + tag.len(), "");
        let flag = match tag {
            "b13" => &mut extensions.flat13,
            "#11" => &mut extensions.sharp11,
            "#9" => &mut extensions.sharp9,
            "b9" => &mut extensions.flat9,
            "add9" => &mut extensions.add9,
            "add11" => &mut extensions.add11,
            "add13" => &mut extensions.add13,
            "sus4" => &mut extensions.sus4,
            _ => &mut extensions.sus2,
        };
        *flag = true;
    }

    let quality = match ChordQuality::parse_known(&rest) {
        Some(quality) => quality,
        None => {
            let (quality, ninth) = guess_quality(&rest);
            log::warn!(
                "unrecognized chord suffix {suffix:?}, reading it as {}",
                quality.as_str()
            );
            extensions.add9 |= ninth;
            quality
        }
    };
    (quality, extensions)
}

/// An abstract chord placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub key: PitchClass,
    pub mode: Mode,
    /// 1-indexed scale degree of the root.
    pub scale_degree: u8,
    pub quality: ChordQuality,
    #[serde(default)]
    pub extensions: Extensions,
    /// Timeline placement in beats. Carried through, never read by the
    /// voicing engine.
    #[serde(default)]
    pub start_beat: f64,
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_duration() -> f64 {
    1.0
}

impl Chord {
    pub fn new(key: PitchClass, mode: Mode, scale_degree: u8, quality: ChordQuality) -> Self {
        Chord {
            key,
            mode,
            scale_degree,
            quality,
            extensions: Extensions::default(),
            start_beat: 0.0,
            duration: default_duration(),
        }
    }

    /// Import a chord-symbol label ("C", "F#m", "Gmaj7", "Dm7b5", "G7b9",
    /// "Csus4add9") into `key`/`mode`. Never fails: "N" (no chord) and empty
    /// labels become C major, an unreadable root becomes C major with a
    /// warning, and an unknown suffix is guessed from its markers.
    ///
    /// A diatonic root gets its scale degree in `key`. A chromatic root
    /// becomes degree 1 of its own key, so `root()` is still right.
    pub fn from_symbol(label: &str, key: PitchClass, mode: Mode) -> Chord {
        let label = label.trim();
        let (root, quality, extensions) = if label.is_empty() || label == "N" {
            (PitchClass::C, ChordQuality::Major, Extensions::default())
        } else {
            let (root_text, suffix) = split_root(label);
            match root_text.parse::<PitchClass>() {
                Ok(root) => {
                    let (quality, extensions) = parse_suffix(suffix);
                    (root, quality, extensions)
                }
                Err(_) => {
                    log::warn!("unreadable chord label {label:?}, using C major");
                    (PitchClass::C, ChordQuality::Major, Extensions::default())
                }
            }
        };

        let chord = match (1..=7).find(|&d| scale_degree_pitch(key, mode, d) == root) {
            Some(degree) => Chord::new(key, mode, degree, quality),
            None => {
                log::debug!("{label:?} is chromatic in {key} {mode:?}");
                Chord::new(root, mode, 1, quality)
            }
        };
        chord.with_extensions(extensions)
    }

    /// Copy placed at a different spot on the timeline.
    pub fn at(self, start_beat: f64, duration: f64) -> Self {
        Chord {
            start_beat,
            duration,
            ..self
        }
    }

    pub fn with_extensions(self, extensions: Extensions) -> Self {
        Chord { extensions, ..self }
    }

    /// Root pitch class from key, mode, and scale degree.
    pub fn root(&self) -> PitchClass {
        scale_degree_pitch(self.key, self.mode, self.scale_degree)
    }

    /// End of the chord on the timeline.
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration
    }

    /// Chord symbol such as "G7", "F#m", "Bdim", "Csus4", "Dm7b5".
    pub fn symbol(&self) -> String {
        format!(
            "{}{}{}",
            self.root().name(),
            self.quality.suffix(),
            self.extensions.suffix()
        )
    }

    /// Roman numeral relative to the chord's key: "I", "ii", "vii°", "V7".
    pub fn roman(&self) -> String {
        const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];
        let index = (self.scale_degree as i32 - 1).rem_euclid(7) as usize;
        let numeral = match self.quality.triad() {
            ChordQuality::Minor | ChordQuality::Diminished => NUMERALS[index].to_lowercase(),
            _ => NUMERALS[index].to_string(),
        };
        format!("{numeral}{}", self.quality.roman_figure())
    }

    /// The same scale degree re-targeted to another key and mode, with its
    /// quality re-derived from the diatonic table. Seventh chords stay
    /// seventh chords (at their extension level where the new quality has
    /// one); extension flags are kept.
    pub fn in_key(&self, key: PitchClass, mode: Mode) -> Chord {
        let seventh = self.quality.has_seventh();
        let quality = diatonic_quality(mode, self.scale_degree, seventh)
            .extended_to(self.quality.extension_level());
        Chord {
            key,
            mode,
            quality,
            ..*self
        }
    }

    /// The bare triad: sevenths, extensions, and all flags removed.
    pub fn skeleton(&self) -> Chord {
        Chord {
            quality: self.quality.triad(),
            extensions: Extensions::default(),
            ..*self
        }
    }
}
