/// Migrate: ports a legacy voice pack onto a freshly built baseline.
///
/// Usage: migrate --legacy <dir> --baseline <pack.json> --output <dir>
///                --character <name> --language <code>
use std::path::Path;
use std::process;
use voiceline_engine::core::migration::{load_legacy_dir, migrate, write_outcome};
use voiceline_engine::core::pack::load_packs;

const USAGE: &str = "Usage: migrate --legacy <dir> --baseline <pack.json> --output <dir> --character <name> --language <code>";

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let mut legacy = None;
    let mut baseline = None;
    let mut output = None;
    let mut character = None;
    let mut language = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--legacy" if i + 1 < args.len() => {
                i += 1;
                legacy = Some(args[i].clone());
            }
            "--baseline" if i + 1 < args.len() => {
                i += 1;
                baseline = Some(args[i].clone());
            }
            "--output" if i + 1 < args.len() => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--character" if i + 1 < args.len() => {
                i += 1;
                character = Some(args[i].clone());
            }
            "--language" if i + 1 < args.len() => {
                i += 1;
                language = Some(args[i].clone());
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{USAGE}");
                process::exit(1);
            }
        }
        i += 1;
    }

    let legacy = required(legacy, "--legacy");
    let baseline = required(baseline, "--baseline");
    let output = required(output, "--output");
    let character = required(character, "--character");
    let language = required(language, "--language");

    let packs = load_packs(Path::new(&baseline)).unwrap_or_else(|e| {
        eprintln!("Error loading baseline '{}': {}", baseline, e);
        process::exit(1);
    });
    let Some(baseline_pack) = packs
        .into_iter()
        .find(|p| p.character == character && p.language == language)
    else {
        eprintln!("Error: baseline '{}' has no {character}/{language} section", baseline);
        process::exit(1);
    };

    let sources = load_legacy_dir(Path::new(&legacy), &character, &language).unwrap_or_else(|e| {
        eprintln!("Error reading legacy directory '{}': {}", legacy, e);
        process::exit(1);
    });

    let output_dir = Path::new(&output);
    let outcome = migrate(&sources, &baseline_pack, output_dir);
    let (pack_path, report_path) = write_outcome(&outcome, output_dir).unwrap_or_else(|e| {
        eprintln!("Error writing migration output to '{}': {}", output, e);
        process::exit(1);
    });

    let summary = &outcome.report.summary;
    println!(
        "Legacy entries: {}, baseline entries: {}, matched: {}, needs review: {}",
        summary.legacy_entries, summary.baseline_entries, summary.matched, summary.needs_review
    );
    for row in &outcome.report.rows {
        println!(
            "  REVIEW: {:?} ({}): {}",
            row.legacy_text,
            row.legacy_audio,
            row.error.as_deref().unwrap_or("")
        );
    }
    println!("Pack saved to '{}'", pack_path.display());
    println!("Report saved to '{}'", report_path.display());
}

fn required(value: Option<String>, flag: &str) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Error: {flag} is required");
        eprintln!("{USAGE}");
        process::exit(1);
    })
}
