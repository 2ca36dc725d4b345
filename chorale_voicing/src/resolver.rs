// Pitch resolution: chord → ordered pitch-class set.
//
// The root comes from the key's diatonic scale (major or natural minor) at
// the chord's scale degree. The quality contributes its interval stack;
// extension flags then add upper tones or swap the third for a suspension.
// The result is ordered by interval above the root (root, third, fifth,
// seventh, extensions) and deduplicated by pitch class.
//
// Resolution never fails. Unknown qualities were already degraded to a
// triad when the chord was built (chord.rs), and an empty set, which the
// stacks cannot produce, is still guarded with a C-major placeholder.
//
// Consumed by generator.rs and leading.rs (what to voice) and by nct.rs
// (chord-tone membership).

use crate::chord::{Chord, ELEVENTH, NINTH, THIRTEENTH};
use crate::pitch::PitchClass;

/// Ordered pitch classes of a chord, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchSet {
    classes: Vec<PitchClass>,
}

impl PitchSet {
    /// Build from pitch classes, dropping repeats while keeping first-seen
    /// order. An empty input becomes the C-major placeholder triad.
    pub fn new(classes: impl IntoIterator<Item = PitchClass>) -> Self {
        let mut unique: Vec<PitchClass> = Vec::new();
        for pc in classes {
            if !unique.contains(&pc) {
                unique.push(pc);
            }
        }
        if unique.is_empty() {
            log::warn!("empty pitch-class set, substituting a C major triad");
            unique = [0, 4, 7].into_iter().map(PitchClass::new).collect();
        }
        PitchSet { classes: unique }
    }

    pub fn root(&self) -> PitchClass {
        self.classes[0]
    }

    pub fn classes(&self) -> &[PitchClass] {
        &self.classes
    }

    /// Everything but the root, in order.
    pub fn upper(&self) -> &[PitchClass] {
        &self.classes[1..]
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        self.classes.contains(&pc)
    }

    /// First member lying `semitones` (mod 12) above the root.
    pub fn at_interval(&self, semitones: &[u8]) -> Option<PitchClass> {
        let root = self.root();
        self.classes
            .iter()
            .copied()
            .find(|&pc| semitones.contains(&root.interval_to(pc)))
    }
}

/// Resolve a chord into its ordered pitch-class set.
pub fn resolve(chord: &Chord) -> PitchSet {
    let root = chord.root();
    let mut intervals = chord.quality.intervals();
    let ext = &chord.extensions;

    if let Some(sus) = ext.suspension() {
        // The third is always the second entry of a quality's stack.
        intervals[1] = sus;
    }

    let add = |intervals: &mut Vec<u8>, natural: u8, flag: bool, altered: Option<u8>| {
        if let Some(alt) = altered {
            intervals.retain(|&iv| iv != natural);
            intervals.push(alt);
        } else if flag && !intervals.contains(&natural) {
            intervals.push(natural);
        }
    };
    let flat_or_sharp = |flat: bool, sharp: bool, natural: u8| {
        if flat {
            Some(natural - 1)
        } else if sharp {
            Some(natural + 1)
        } else {
            None
        }
    };
    add(&mut intervals, NINTH, ext.add9, flat_or_sharp(ext.flat9, ext.sharp9, NINTH));
    add(&mut intervals, ELEVENTH, ext.add11, flat_or_sharp(false, ext.sharp11, ELEVENTH));
    add(&mut intervals, THIRTEENTH, ext.add13, flat_or_sharp(ext.flat13, false, THIRTEENTH));
    if ext.flat9 && ext.sharp9 {
        // Both altered ninths may sound together.
        intervals.push(NINTH + 1);
    }

    intervals.sort_unstable();
    PitchSet::new(
        intervals
            .into_iter()
            .map(|iv| root.transpose(iv as i32)),
    )
}
