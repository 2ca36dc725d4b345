// Progression driver: voice a whole chord sequence and analyze the result.
//
// Voicing is strictly left-to-right. The first chord is voiced by
// generator.rs; every later chord by the leading engine, from the voicing
// just chosen. There is no lookahead and nothing to parallelize here.
//
// Also hosts the bulk collaborators that sit around the engine:
// - `critique_progression`: the standalone counterpoint pass
// - `retarget` / `skeleton`: key changes and the bare-triad reduction, both
//   returning new chords for the caller to re-voice
// - `deconstruct`: the progression rebuilt from its skeleton one layer at a
//   time (sevenths, suspensions, ninths, then everything else), each step a
//   complete chord list
// - `voice_lines`: per-voice melodic lines built from the voicings, ready
//   for non-chord-tone analysis (nct.rs)
//
// `Progression` is the JSON file format read by the `voice` binary.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::config::EngineConfig;
use crate::counterpoint::{Finding, critique};
use crate::leading::next_voicing;
use crate::nct::MelodicNote;
use crate::pitch::{Mode, PitchClass};
use crate::voicing::{Voice, Voicing};

/// A tempo plus a chord sequence in timeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progression {
    #[serde(default = "default_tempo")]
    pub tempo_bpm: u16,
    pub chords: Vec<Chord>,
}

fn default_tempo() -> u16 {
    96
}

impl Progression {
    pub fn load(path: &Path) -> Result<Self, crate::error::HarmonyError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A chord with the voicing chosen for it, as emitted by the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicedChord {
    #[serde(flatten)]
    pub chord: Chord,
    pub symbol: String,
    pub roman: String,
    pub voicing: Voicing,
}

impl VoicedChord {
    pub fn new(chord: Chord, voicing: Voicing) -> Self {
        VoicedChord {
            symbol: chord.symbol(),
            roman: chord.roman(),
            chord,
            voicing,
        }
    }
}

/// Voice every chord, each one led from its predecessor's voicing.
pub fn voice_progression(chords: &[Chord], config: &EngineConfig) -> Vec<Voicing> {
    let mut voicings: Vec<Voicing> = Vec::with_capacity(chords.len());
    for chord in chords {
        let voicing = next_voicing(chord, voicings.last(), config);
        log::debug!("{} -> {}", chord.symbol(), voicing.summary());
        voicings.push(voicing);
    }
    voicings
}

/// Counterpoint findings for every voicing and every successive pair,
/// tagged with the index of the chord they concern.
pub fn critique_progression(chords: &[Chord], voicings: &[Voicing]) -> Vec<(usize, Finding)> {
    let mut out = Vec::new();
    for (i, (chord, voicing)) in chords.iter().zip(voicings).enumerate() {
        let prev = i.checked_sub(1).and_then(|p| voicings.get(p));
        out.extend(
            critique(prev, voicing, chord.key)
                .into_iter()
                .map(|finding| (i, finding)),
        );
    }
    out
}

/// Every chord moved into `key`/`mode`, qualities re-derived diatonically.
pub fn retarget(chords: &[Chord], key: PitchClass, mode: Mode) -> Vec<Chord> {
    chords.iter().map(|c| c.in_key(key, mode)).collect()
}

/// Every chord reduced to its bare triad.
pub fn skeleton(chords: &[Chord]) -> Vec<Chord> {
    chords.iter().map(Chord::skeleton).collect()
}

/// Chord indices carrying each layer that `skeleton` strips away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layers {
    pub sevenths: Vec<usize>,
    pub suspensions: Vec<usize>,
    /// Added ninths and 9th-or-higher qualities.
    pub ninths: Vec<usize>,
    /// Altered tones, added 11ths and 13ths, 11th and 13th qualities.
    pub alterations: Vec<usize>,
}

pub fn identify_layers(chords: &[Chord]) -> Layers {
    let mut layers = Layers::default();
    for (i, chord) in chords.iter().enumerate() {
        let ext = &chord.extensions;
        let level = chord.quality.extension_level();
        if chord.quality.has_seventh() {
            layers.sevenths.push(i);
        }
        if ext.sus2 || ext.sus4 {
            layers.suspensions.push(i);
        }
        if ext.add9 || level >= 9 {
            layers.ninths.push(i);
        }
        if level >= 11
            || ext.add11
            || ext.add13
            || ext.flat9
            || ext.sharp9
            || ext.sharp11
            || ext.flat13
        {
            layers.alterations.push(i);
        }
    }
    layers
}

/// One stage of a deconstruction: a name and the full chord list at that
/// stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeconstructionStep {
    pub name: String,
    pub chords: Vec<Chord>,
}

pub const MAX_STEPS: usize = 6;

/// The progression rebuilt from its skeleton. Step one is always the bare
/// triads; each later step restores one layer where any chord has it, and
/// the last step equals the input. Empty layers add no step.
pub fn deconstruct(chords: &[Chord]) -> Vec<DeconstructionStep> {
    let layers = identify_layers(chords);
    let mut current = skeleton(chords);
    let mut steps = vec![DeconstructionStep {
        name: "Skeleton".to_string(),
        chords: current.clone(),
    }];

    let stages: [(&str, &[usize], fn(&Chord, &mut Chord)); 4] = [
        ("Add 7ths", layers.sevenths.as_slice(), restore_seventh),
        ("Suspensions", layers.suspensions.as_slice(), restore_suspension),
        ("Added 9ths", layers.ninths.as_slice(), restore_ninth),
        ("Complex Alterations", layers.alterations.as_slice(), restore_alterations),
    ];
    for (name, indices, restore) in stages {
        if indices.is_empty() {
            continue;
        }
        for &i in indices {
            restore(&chords[i], &mut current[i]);
        }
        steps.push(DeconstructionStep {
            name: name.to_string(),
            chords: current.clone(),
        });
    }
    steps.truncate(MAX_STEPS);
    steps
}

fn restore_seventh(original: &Chord, chord: &mut Chord) {
    chord.quality = original.quality.extended_to(7);
}

fn restore_suspension(original: &Chord, chord: &mut Chord) {
    chord.extensions.sus2 = original.extensions.sus2;
    chord.extensions.sus4 = original.extensions.sus4;
}

fn restore_ninth(original: &Chord, chord: &mut Chord) {
    chord.extensions.add9 = original.extensions.add9;
    if original.quality.extension_level() >= 9 {
        chord.quality = original.quality.extended_to(9);
    }
}

fn restore_alterations(original: &Chord, chord: &mut Chord) {
    chord.quality = original.quality;
    chord.extensions = original.extensions;
}

/// One melodic line per voice, in SATB order: a note per chord with the
/// chord's timing and that voice's pitch.
pub fn voice_lines(chords: &[Chord], voicings: &[Voicing]) -> [Vec<MelodicNote>; 4] {
    Voice::ALL.map(|voice| {
        chords
            .iter()
            .zip(voicings)
            .map(|(chord, voicing)| {
                MelodicNote::new(voicing.get(voice), chord.start_beat, chord.duration)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{ChordQuality, Extensions};
    use crate::counterpoint::FindingKind;

    fn cadence() -> Vec<Chord> {
        let c = PitchClass::C;
        [
            (1, ChordQuality::Major),
            (4, ChordQuality::Major),
            (5, ChordQuality::Dominant7),
            (1, ChordQuality::Major),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (degree, quality))| Chord::new(c, Mode::Major, degree, quality).at(i as f64, 1.0))
        .collect()
    }

    #[test]
    fn test_voice_progression_roots_and_ranges() {
        let config = EngineConfig::default();
        let chords = cadence();
        let voicings = voice_progression(&chords, &config);
        assert_eq!(voicings.len(), chords.len());
        for (chord, voicing) in chords.iter().zip(&voicings) {
            assert_eq!(PitchClass::of(voicing.bass), chord.root());
            assert!(voicing.in_range(&config.ranges));
        }
    }

    #[test]
    fn test_voice_progression_empty() {
        assert!(voice_progression(&[], &EngineConfig::default()).is_empty());
    }

    #[test]
    fn test_voiced_cadence_has_no_parallels() {
        let chords = cadence();
        let voicings = voice_progression(&chords, &EngineConfig::default());
        let findings = critique_progression(&chords, &voicings);
        assert!(
            !findings.iter().any(|(_, f)| matches!(
                f.kind,
                FindingKind::ParallelFifth | FindingKind::ParallelOctave
            )),
            "{findings:?}"
        );
    }

    #[test]
    fn test_critique_tags_chord_index() {
        let chords = cadence()[..2].to_vec();
        // Both voicings are clean on their own; only the motion between them
        // is faulty, with the alto moving in octaves against the bass.
        let voicings = [Voicing::new(72, 67, 64, 55), Voicing::new(77, 72, 69, 60)];
        let findings = critique_progression(&chords, &voicings);
        assert!(findings.iter().all(|(i, _)| *i == 1));
        assert!(findings.iter().any(|(_, f)| f.kind == FindingKind::ParallelOctave));
    }

    #[test]
    fn test_retarget_and_skeleton() {
        let chords = cadence();
        let a: PitchClass = "A".parse().unwrap();
        let minor = retarget(&chords, a, Mode::Minor);
        assert_eq!(minor[0].quality, ChordQuality::Minor);
        assert_eq!(minor[1].quality, ChordQuality::Minor);
        assert_eq!(minor[2].quality, ChordQuality::Minor7);
        assert_eq!(minor[2].start_beat, 2.0);

        let bare = skeleton(&chords);
        assert_eq!(bare[2].quality, ChordQuality::Major);
        // Inputs are untouched.
        assert_eq!(chords[2].quality, ChordQuality::Dominant7);
    }

    #[test]
    fn test_deconstruct_layers_in_order() {
        let c = PitchClass::C;
        let chord = |degree, quality| Chord::new(c, Mode::Major, degree, quality);
        let chords = vec![
            chord(1, ChordQuality::Major),
            chord(2, ChordQuality::Minor7),
            chord(4, ChordQuality::Major).with_extensions(Extensions {
                sus4: true,
                ..Default::default()
            }),
            chord(5, ChordQuality::Dominant13).with_extensions(Extensions {
                sharp11: true,
                ..Default::default()
            }),
            chord(1, ChordQuality::Major).with_extensions(Extensions {
                add9: true,
                ..Default::default()
            }),
        ];

        let layers = identify_layers(&chords);
        assert_eq!(layers.sevenths, vec![1, 3]);
        assert_eq!(layers.suspensions, vec![2]);
        assert_eq!(layers.ninths, vec![3, 4]);
        assert_eq!(layers.alterations, vec![3]);

        let steps = deconstruct(&chords);
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Skeleton", "Add 7ths", "Suspensions", "Added 9ths", "Complex Alterations"]
        );
        assert_eq!(steps[0].chords, skeleton(&chords));
        assert_eq!(steps[1].chords[3].quality, ChordQuality::Dominant7);
        assert!(!steps[1].chords[2].extensions.sus4);
        assert!(steps[2].chords[2].extensions.sus4);
        assert_eq!(steps[3].chords[3].quality, ChordQuality::Dominant9);
        assert!(steps[3].chords[4].extensions.add9);
        assert!(!steps[3].chords[3].extensions.sharp11);
        assert_eq!(steps.last().unwrap().chords, chords);
        // Inputs are untouched.
        assert_eq!(chords[3].quality, ChordQuality::Dominant13);
    }

    #[test]
    fn test_deconstruct_plain_triads() {
        let chords: Vec<Chord> = cadence().into_iter().map(|c| c.skeleton()).collect();
        let steps = deconstruct(&chords);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "Skeleton");
        assert_eq!(steps[0].chords, chords);

        // The cadence's V7 adds one step.
        let steps = deconstruct(&cadence());
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].chords, cadence());
        assert!(steps.len() <= MAX_STEPS);

        let json = serde_json::to_value(&steps[1]).unwrap();
        assert_eq!(json["name"], "Add 7ths");
        assert_eq!(json["chords"][2]["quality"], "dominant7");
    }

    #[test]
    fn test_voice_lines_follow_voicings() {
        let chords = cadence();
        let voicings = voice_progression(&chords, &EngineConfig::default());
        let lines = voice_lines(&chords, &voicings);
        for (voice, line) in Voice::ALL.into_iter().zip(&lines) {
            assert_eq!(line.len(), chords.len());
            for ((note, voicing), chord) in line.iter().zip(&voicings).zip(&chords) {
                assert_eq!(note.pitch, voicing.get(voice));
                assert_eq!(note.start_beat, chord.start_beat);
                assert!(note.analysis.is_none());
            }
        }
    }

    #[test]
    fn test_progression_json() {
        let json = r#"{
            "chords": [
                {"key": "G", "mode": "major", "scaleDegree": 1, "quality": "major"},
                {"key": "G", "mode": "major", "scaleDegree": 5, "quality": "dominant7",
                 "extensions": {"flat9": true}, "startBeat": 1.0, "duration": 2.0}
            ]
        }"#;
        let progression: Progression = serde_json::from_str(json).unwrap();
        assert_eq!(progression.tempo_bpm, 96);
        assert_eq!(progression.chords.len(), 2);
        assert_eq!(progression.chords[0].duration, 1.0);
        assert!(progression.chords[1].extensions.flat9);
        assert_eq!(progression.chords[1].symbol(), "D7b9");
    }
}
