/// Pack Builder: builds a current-format voice pack from harvested lines.
///
/// Usage: pack_builder --input <lines.json> --character <name> --language <code>
///                     --output <pack.json> [--ext <ogg>] [--config <engine.ron>]
///
/// The input is a JSON array of raw lines as adapters produce them. Lines in
/// other languages are ignored.
use std::path::Path;
use std::process;
use voiceline_engine::core::builder::PackBuilder;
use voiceline_engine::core::config::EngineConfig;
use voiceline_engine::core::pack::save_packs;
use voiceline_engine::schema::line::RawLine;

const USAGE: &str = "Usage: pack_builder --input <lines.json> --character <name> --language <code> --output <pack.json> [--ext <ogg>] [--config <engine.ron>]";

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    let mut input = None;
    let mut character = None;
    let mut language = None;
    let mut output = None;
    let mut extension = None;
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--character" if i + 1 < args.len() => {
                i += 1;
                character = Some(args[i].clone());
            }
            "--language" if i + 1 < args.len() => {
                i += 1;
                language = Some(args[i].clone());
            }
            "--output" if i + 1 < args.len() => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--ext" if i + 1 < args.len() => {
                i += 1;
                extension = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
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

    let input = required(input, "--input");
    let character = required(character, "--character");
    let language = required(language, "--language");
    let output = required(output, "--output");

    let config = match config_path {
        Some(path) => EngineConfig::load_from_ron(Path::new(&path)).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            process::exit(1);
        }),
        None => EngineConfig::default(),
    };
    let extension = extension.unwrap_or(config.audio_extension);

    let text = std::fs::read_to_string(&input).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input, e);
        process::exit(1);
    });
    let lines: Vec<RawLine> = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing '{}': {}", input, e);
        process::exit(1);
    });

    let output_path = Path::new(&output);
    let root = output_path.parent().unwrap_or_else(|| Path::new("."));
    let name = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pack");

    let mut builder = PackBuilder::new(name, &character, &language, root).extension(&extension);
    let mut considered = 0;
    for line in lines.iter().filter(|l| l.language == language) {
        considered += 1;
        builder.push_line(line);
    }
    let report = builder.finish();

    println!(
        "Indexed {} segments from {} lines ({} skipped)",
        report.pack.len(),
        considered,
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("  SKIPPED: {}", skipped);
    }

    save_packs(&[&report.pack], output_path).unwrap_or_else(|e| {
        eprintln!("Error saving pack to '{}': {}", output, e);
        process::exit(1);
    });
    println!("Pack saved to '{}'", output);
}

fn required(value: Option<String>, flag: &str) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Error: {flag} is required");
        eprintln!("{USAGE}");
        process::exit(1);
    })
}
