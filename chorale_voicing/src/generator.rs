// Default voicing: the first chord of a progression, with nothing to lead from.
//
// The bass always takes the root. The upper voices are filled by convention:
// - Triads (three classes or fewer): tenor gets the second class, alto the
//   third, and the soprano doubles the last class of the set. Sets shorter
//   than three repeat their last class.
// - Seventh and extended chords: voices are assigned by harmonic function.
//   The third goes to the tenor, the perfect fifth to the alto, the seventh
//   to the soprano. A slot whose function is missing (a sus chord has no
//   third, a diminished seventh no perfect fifth) takes the next unassigned
//   class in root-to-extension order.
//
// Every pitch is octave-fitted into its voice's range independently, so the
// result is always in range. It may still cross; the validator reports that.

use crate::pitch::{PitchClass, fit_pitch_class};
use crate::resolver::PitchSet;
use crate::voicing::{Voice, VoiceRanges, Voicing};

/// Semitone offsets that identify each upper voice's function.
const THIRDS: &[u8] = &[3, 4];
const PERFECT_FIFTH: &[u8] = &[7];
const SEVENTHS: &[u8] = &[10, 11];

/// Voice a pitch set with no predecessor.
pub fn generate_default(set: &PitchSet, ranges: &VoiceRanges) -> Voicing {
    let [tenor, alto, soprano] = if set.len() >= 4 {
        assign_by_function(set)
    } else {
        assign_by_position(set)
    };
    let place = |voice: Voice, pc: PitchClass| fit_pitch_class(pc, ranges.get(voice));
    Voicing {
        soprano: place(Voice::Soprano, soprano),
        alto: place(Voice::Alto, alto),
        tenor: place(Voice::Tenor, tenor),
        bass: place(Voice::Bass, set.root()),
    }
}

/// Triad layout, returned as [tenor, alto, soprano].
fn assign_by_position(set: &PitchSet) -> [PitchClass; 3] {
    let classes = set.classes();
    let last = classes[classes.len() - 1];
    let tenor = classes.get(1).copied().unwrap_or(last);
    let alto = classes.get(2).copied().unwrap_or(last);
    [tenor, alto, last]
}

/// Functional layout for four or more classes, returned as [tenor, alto, soprano].
fn assign_by_function(set: &PitchSet) -> [PitchClass; 3] {
    let mut slots = [THIRDS, PERFECT_FIFTH, SEVENTHS].map(|wanted| set.at_interval(wanted));

    // Fill the gaps in slot order from what nobody took yet.
    for i in 0..slots.len() {
        if slots[i].is_some() {
            continue;
        }
        let taken: Vec<PitchClass> = slots.iter().flatten().copied().collect();
        slots[i] = set
            .upper()
            .iter()
            .copied()
            .find(|pc| !taken.contains(pc));
    }

    slots.map(|slot| slot.unwrap_or(set.root()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{Chord, ChordQuality, Extensions};
    use crate::pitch::Mode;
    use crate::resolver::resolve;

    fn voice(degree: u8, quality: ChordQuality) -> Voicing {
        let chord = Chord::new(PitchClass::C, Mode::Major, degree, quality);
        generate_default(&resolve(&chord), &VoiceRanges::default())
    }

    #[test]
    fn test_c_major_triad() {
        let v = voice(1, ChordQuality::Major);
        assert_eq!(v.bass, 48); // C3
        assert_eq!(v.tenor, 52); // E3
        assert_eq!(v.alto, 67); // G4
        assert_eq!(v.soprano, 67); // G4, doubling the fifth
        for pitch in [v.soprano, v.alto, v.tenor] {
            assert!([0, 4, 7].contains(&(pitch % 12)));
        }
        assert!(v.in_range(&VoiceRanges::default()));
    }

    #[test]
    fn test_dominant_seventh_by_function() {
        let v = voice(5, ChordQuality::Dominant7);
        assert_eq!(v.bass % 12, 7); // G
        assert_eq!(v.tenor % 12, 11); // B, the third
        assert_eq!(v.alto % 12, 2); // D, the fifth
        assert_eq!(v.soprano % 12, 5); // F, the seventh
    }

    #[test]
    fn test_missing_function_falls_back() {
        // C E G Bb D with sus4: no third, so tenor takes the next free class.
        let chord = Chord::new(PitchClass::C, Mode::Major, 1, ChordQuality::Dominant9)
            .with_extensions(Extensions {
                sus4: true,
                ..Default::default()
            });
        let v = generate_default(&resolve(&chord), &VoiceRanges::default());
        assert_eq!(v.alto % 12, 7); // G
        assert_eq!(v.soprano % 12, 10); // Bb
        assert_eq!(v.tenor % 12, 5); // F, first unassigned upper class

        // Diminished seventh: no perfect fifth, alto takes the diminished F.
        let dim7 = voice(7, ChordQuality::Diminished7);
        assert_eq!(dim7.tenor % 12, 2); // D
        assert_eq!(dim7.alto % 12, 5); // F
        assert_eq!(dim7.soprano % 12, 8); // Ab
    }

    #[test]
    fn test_every_quality_in_range_with_root_in_bass() {
        let ranges = VoiceRanges::default();
        for degree in 1..=7 {
            for quality in ChordQuality::ALL {
                let chord = Chord::new(PitchClass::new(3), Mode::Minor, degree, quality);
                let set = resolve(&chord);
                let v = generate_default(&set, &ranges);
                assert!(v.in_range(&ranges), "{quality:?} on {degree}: {v:?}");
                assert_eq!(PitchClass::of(v.bass), set.root());
            }
        }
    }
}
