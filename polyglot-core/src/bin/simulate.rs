//! Adaptive-learning simulation: replays a labeled corpus through the engine,
//! submitting a correction after every prediction, and reports how accuracy
//! moves round over round as the weights, patterns, and contexts learn.

fn main() {
    if let Err(e) = run() {
        eprintln!("simulation failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    use polyglot_core::{
        AmbientNoise, ContextSignature, DetectorHandle, EngineConfig, JsonFileStore,
        LanguageDetector, MemoryStore, PolyglotEngine, ScoreMap,
    };
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Debug)]
    struct Args {
        fixtures: Option<PathBuf>,
        rounds: usize,
        state_dir: Option<PathBuf>,
        output: Option<PathBuf>,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Fixture {
        text: String,
        language: String,
    }

    #[derive(Debug, Clone, Serialize)]
    struct RoundResult {
        round: usize,
        cases: usize,
        correct: usize,
        accuracy: f64,
    }

    #[derive(Debug, Clone, Serialize)]
    struct Summary {
        rounds: usize,
        total_cases: usize,
        first_round_accuracy: f64,
        final_round_accuracy: f64,
        improvement: f64,
        engine_stats: polyglot_core::EngineStats,
        per_round: Vec<RoundResult>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut fixtures: Option<PathBuf> = None;
        let mut rounds: usize = 3;
        let mut state_dir: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;

        let mut it = std::env::args().skip(1);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--fixtures" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --fixtures".into());
                    };
                    fixtures = Some(PathBuf::from(v));
                }
                "--rounds" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --rounds".into());
                    };
                    rounds = v
                        .parse::<usize>()
                        .map_err(|_| "invalid value for --rounds".to_string())?
                        .clamp(1, 20);
                }
                "--state-dir" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --state-dir".into());
                    };
                    state_dir = Some(PathBuf::from(v));
                }
                "--output" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --output".into());
                    };
                    output = Some(PathBuf::from(v));
                }
                "--help" | "-h" => {
                    println!(
                        "Usage: cargo run -p polyglot-core --bin simulate -- \\
  [--fixtures <cases.jsonl>] [--rounds <n>] [--state-dir <dir>] [--output <file.json>]"
                    );
                    std::process::exit(0);
                }
                other => {
                    return Err(format!("unknown argument: {other}"));
                }
            }
        }

        Ok(Args {
            fixtures,
            rounds,
            state_dir,
            output,
        })
    }

    fn load_fixtures(path: &PathBuf) -> Result<Vec<Fixture>, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut cases = Vec::new();
        for (number, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fixture: Fixture = serde_json::from_str(line)
                .map_err(|e| format!("{}:{}: {e}", path.display(), number + 1))?;
            cases.push(fixture);
        }
        if cases.is_empty() {
            return Err(format!("no cases in {}", path.display()));
        }
        Ok(cases)
    }

    fn builtin_fixtures() -> Vec<Fixture> {
        [
            ("namaste aap kaise hain", "hi"),
            ("mero naam ram ho ra malai khana man parcha", "ne"),
            ("hola amigo como estas hoy", "es"),
            ("bonjour tout le monde comment allez vous", "fr"),
            ("the quick brown fox jumps over the lazy dog", "en"),
            ("kripya dhyan dijiye yah suchana mahatvapurn hai", "hi"),
            ("timilai kasto cha aja mausam ramro cha", "ne"),
            ("buenos dias quiero un cafe con leche", "es"),
            ("je voudrais un croissant et un cafe", "fr"),
            ("please remember to close the window tonight", "en"),
        ]
        .into_iter()
        .map(|(text, language)| Fixture {
            text: text.to_string(),
            language: language.to_string(),
        })
        .collect()
    }

    // Crude script-and-stopword detectors standing in for the host's real
    // signal sources. Deliberately weak so the learning loop has room to move.
    struct StopwordDetector;

    impl LanguageDetector for StopwordDetector {
        fn name(&self) -> &str {
            "stopwords"
        }

        fn detect(&mut self, text: &str) -> polyglot_core::error::Result<ScoreMap> {
            const STOPWORDS: &[(&str, &[&str])] = &[
                ("en", &["the", "and", "to", "over", "please"]),
                ("es", &["como", "hoy", "con", "un", "quiero"]),
                ("fr", &["tout", "le", "vous", "et", "je"]),
                ("hi", &["aap", "hain", "yah", "hai", "kaise"]),
                ("ne", &["cha", "ho", "malai", "aja", "timilai"]),
            ];

            let tokens: Vec<String> = text
                .split_whitespace()
                .map(|t| t.to_lowercase())
                .collect();
            if tokens.is_empty() {
                return Ok(ScoreMap::new());
            }

            let mut scores = ScoreMap::new();
            for (language, words) in STOPWORDS {
                let hits = tokens.iter().filter(|t| words.contains(&t.as_str())).count();
                if hits > 0 {
                    scores.insert(
                        language.to_string(),
                        (hits as f32 / tokens.len() as f32).min(1.0),
                    );
                }
            }
            Ok(scores)
        }
    }

    struct CharsetDetector;

    impl LanguageDetector for CharsetDetector {
        fn name(&self) -> &str {
            "charset"
        }

        fn detect(&mut self, text: &str) -> polyglot_core::error::Result<ScoreMap> {
            let total = text.chars().filter(|c| c.is_alphabetic()).count();
            if total == 0 {
                return Ok(ScoreMap::new());
            }
            let devanagari = text
                .chars()
                .filter(|c| ('\u{0900}'..='\u{097F}').contains(c))
                .count();
            let latin = text.chars().filter(|c| c.is_ascii_alphabetic()).count();

            let mut scores = ScoreMap::new();
            if devanagari > 0 {
                let share = devanagari as f32 / total as f32;
                scores.insert("hi".to_string(), 0.6 * share);
                scores.insert("ne".to_string(), 0.4 * share);
            }
            if latin > 0 {
                let share = latin as f32 / total as f32;
                // Latin script alone cannot separate these; spread thin.
                scores.insert("en".to_string(), 0.3 * share);
                scores.insert("es".to_string(), 0.25 * share);
                scores.insert("fr".to_string(), 0.25 * share);
            }
            Ok(scores)
        }
    }

    fn context_for(case_index: usize, previous: Option<&str>) -> ContextSignature {
        ContextSignature {
            hour_of_day: (8 + case_index * 3) as u32 % 24,
            day_of_week: (case_index % 7) as u32 + 1,
            previous_language: previous.map(str::to_string),
            session_elapsed: Duration::from_secs(30 * (case_index as u64 + 1)),
            ambient_noise: AmbientNoise::Quiet,
        }
    }

    let args = parse_args()?;
    let cases = match &args.fixtures {
        Some(path) => load_fixtures(path)?,
        None => builtin_fixtures(),
    };

    let detectors = vec![
        DetectorHandle::new(CharsetDetector),
        DetectorHandle::new(StopwordDetector),
    ];
    let engine = match &args.state_dir {
        Some(dir) => PolyglotEngine::new(
            EngineConfig::default(),
            detectors,
            JsonFileStore::new(dir.clone()),
        ),
        None => PolyglotEngine::new(EngineConfig::default(), detectors, MemoryStore::new()),
    }
    .map_err(|e| e.to_string())?;

    println!(
        "Running learning simulation: {} cases × {} rounds",
        cases.len(),
        args.rounds
    );

    let mut per_round = Vec::with_capacity(args.rounds);
    for round in 1..=args.rounds {
        let mut correct = 0;
        let mut previous: Option<String> = None;
        for (index, case) in cases.iter().enumerate() {
            let context = context_for(index, previous.as_deref());
            let prediction = engine.predict(&case.text, &context);
            if prediction.language == case.language {
                correct += 1;
            }
            engine.submit_correction(
                &case.text,
                &prediction.language,
                &case.language,
                prediction.confidence,
                &context,
            );
            previous = Some(case.language.clone());
        }
        let accuracy = correct as f64 / cases.len() as f64;
        println!(
            "round {round}/{rounds}: {correct}/{total} correct ({pct:.0}%)",
            rounds = args.rounds,
            total = cases.len(),
            pct = accuracy * 100.0
        );
        per_round.push(RoundResult {
            round,
            cases: cases.len(),
            correct,
            accuracy,
        });
    }

    let first = per_round.first().map(|r| r.accuracy).unwrap_or(0.0);
    let last = per_round.last().map(|r| r.accuracy).unwrap_or(0.0);
    let summary = Summary {
        rounds: args.rounds,
        total_cases: cases.len(),
        first_round_accuracy: first,
        final_round_accuracy: last,
        improvement: last - first,
        engine_stats: engine.stats(),
        per_round,
    };

    println!(
        "Done. accuracy {first:.0}% → {last:.0}% ({delta:+.0} pts), {patterns} learned pattern(s), {contexts} contextual pattern(s)",
        first = summary.first_round_accuracy * 100.0,
        last = summary.final_round_accuracy * 100.0,
        delta = summary.improvement * 100.0,
        patterns = summary.engine_stats.learned_language_patterns,
        contexts = summary.engine_stats.contextual_patterns,
    );

    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&out, json).map_err(|e| e.to_string())?;
        println!("Wrote simulation report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
