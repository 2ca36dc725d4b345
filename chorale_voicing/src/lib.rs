// Chorale Voicing
//
// Four-part (SATB) harmonization of abstract chord progressions. A chord is
// given as key, mode, scale degree, quality, and extension flags; the engine
// turns it into concrete soprano/alto/tenor/bass pitches, leading each chord
// from the one before by classical voice-leading rules, and classifies each
// voice's melodic notes as chord tones or named non-chord tones.
//
// Architecture:
// - pitch.rs: Pitch classes, major/minor modes, octave fitting, naming
// - voicing.rs: SATB voices, voice ranges, and the `Voicing` value type
// - chord.rs: Chord qualities, extension flags, symbols (both ways), roman numerals
// - resolver.rs: Chord → ordered pitch-class set
// - generator.rs: Default voicing for a chord with no predecessor
// - counterpoint.rs: Parallels, crossing, spacing, doubled leading tone
// - leading.rs: Scored search for the best successor voicing
// - nct.rs: Non-chord-tone classification of melodic lines
// - progression.rs: Left-to-right voicing of whole progressions, layered deconstruction
// - config.rs: JSON-loadable ranges and scoring weights
// - midi.rs: MIDI file output from voiced progressions
// - error.rs: Errors at the file and parsing boundaries
//
// Everything except the file boundaries is a pure function of its inputs,
// so the same progression and config always voice the same way.

pub mod chord;
pub mod config;
pub mod counterpoint;
pub mod error;
pub mod generator;
pub mod leading;
pub mod midi;
pub mod nct;
pub mod pitch;
pub mod progression;
pub mod resolver;
pub mod voicing;
