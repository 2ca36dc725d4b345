// Chorale Voicing — CLI entry point.
//
// Voices a chord progression read from a JSON file and reports the result:
// each chord's symbol, roman numeral, and SATB pitches, the counterpoint
// findings, and the non-chord-tone analysis of every voice line.
//
// Usage:
//   cargo run -p chorale_voicing -- <progression.json> [--config cfg.json]
//     [--midi out.mid] [--key K --mode major|minor] [--skeleton] [--json]
//     [--deconstruct]
//
// `--deconstruct` prints the layer-by-layer rebuild of the progression from
// its skeleton instead of voicing it.
//
// Logging goes through env_logger; set RUST_LOG=debug to see the winning
// score of every voiced chord.

use std::path::Path;
use std::process::ExitCode;

use chorale_voicing::config::EngineConfig;
use chorale_voicing::error::HarmonyError;
use chorale_voicing::midi::write_midi;
use chorale_voicing::nct::analyze_voices;
use chorale_voicing::pitch::{Mode, PitchClass, pitch_name};
use chorale_voicing::progression::{
    Progression, VoicedChord, critique_progression, deconstruct, retarget, skeleton,
    voice_lines, voice_progression,
};
use chorale_voicing::voicing::Voice;

fn main() -> ExitCode {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1).filter(|s| !s.starts_with("--")) else {
        eprintln!(
            "Usage: voice <progression.json> [--config cfg.json] [--midi out.mid] \
             [--key K --mode major|minor] [--skeleton] [--json] [--deconstruct]"
        );
        return ExitCode::FAILURE;
    };

    match run(input, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &str, args: &[String]) -> Result<(), HarmonyError> {
    let config = match flag_value(args, "--config") {
        Some(path) => EngineConfig::load(Path::new(path))?,
        None => EngineConfig::default(),
    };

    let mut progression = Progression::load(Path::new(input))?;
    let key = flag_value(args, "--key").map(str::parse::<PitchClass>).transpose()?;
    let mode = flag_value(args, "--mode").map(str::parse::<Mode>).transpose()?;
    if key.is_some() || mode.is_some() {
        let first = progression.chords.first();
        let key = key.or(first.map(|c| c.key)).unwrap_or(PitchClass::C);
        let mode = mode.or(first.map(|c| c.mode)).unwrap_or(Mode::Major);
        log::info!("retargeting to {key} {mode:?}");
        progression.chords = retarget(&progression.chords, key, mode);
    }
    if has_flag(args, "--skeleton") {
        progression.chords = skeleton(&progression.chords);
    }

    if has_flag(args, "--deconstruct") {
        let steps = deconstruct(&progression.chords);
        if has_flag(args, "--json") {
            println!("{}", serde_json::to_string_pretty(&steps)?);
        } else {
            for (i, step) in steps.iter().enumerate() {
                let symbols: Vec<String> = step.chords.iter().map(|c| c.symbol()).collect();
                println!("{}. {:<20} {}", i + 1, step.name, symbols.join(" -> "));
            }
        }
        return Ok(());
    }

    let chords = &progression.chords;
    let voicings = voice_progression(chords, &config);

    if has_flag(args, "--json") {
        let voiced: Vec<VoicedChord> = chords
            .iter()
            .zip(&voicings)
            .map(|(chord, voicing)| VoicedChord::new(*chord, *voicing))
            .collect();
        println!("{}", serde_json::to_string_pretty(&voiced)?);
    } else {
        println!("=== Chorale Voicing ===");
        println!("Input: {input}");
        println!("Chords: {}  Tempo: {} BPM", chords.len(), progression.tempo_bpm);
        println!();

        for (i, (chord, voicing)) in chords.iter().zip(&voicings).enumerate() {
            println!(
                "{:>3}  {:<10} {:<8} {}",
                i + 1,
                chord.symbol(),
                chord.roman(),
                voicing.summary()
            );
        }

        println!();
        let findings = critique_progression(chords, &voicings);
        if findings.is_empty() {
            println!("Counterpoint: clean");
        } else {
            println!("Counterpoint:");
            for (i, finding) in &findings {
                println!("  chord {}: {finding}", i + 1);
            }
        }

        println!();
        println!("Melodic analysis:");
        let lines = analyze_voices(&voice_lines(chords, &voicings), chords);
        for (voice, line) in Voice::ALL.into_iter().zip(&lines) {
            let labels: Vec<String> = line
                .iter()
                .map(|note| {
                    let label = match &note.analysis {
                        Some(a) if a.is_chord_tone => "ct",
                        Some(a) => a.kind.map_or("nct", |k| k.name()),
                        None => "-",
                    };
                    format!("{}({label})", pitch_name(note.pitch))
                })
                .collect();
            println!("  {:<8} {}", voice.name(), labels.join(" "));
        }
    }

    if let Some(path) = flag_value(args, "--midi") {
        write_midi(chords, &voicings, progression.tempo_bpm, Path::new(path))?;
    }

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|v| v.as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
