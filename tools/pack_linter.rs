/// Pack Linter: validates voice pack documents.
///
/// Usage: pack_linter <pack.json|pack_dir> [--check-audio]
///
/// Errors: empty display patterns, unsupported or unreadable documents,
/// one audio file voicing different patterns, audio missing on disk (with
/// `--check-audio`). Warnings: the display and translation-key indices
/// resolving the same entry to different audio.
use std::path::Path;
use std::process;
use voiceline_engine::core::pack::{load_packs, VoicePack};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: pack_linter <pack.json|pack_dir> [--check-audio]");
        process::exit(0);
    }

    let target = &args[1];
    let mut check_audio = false;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--check-audio" {
            check_audio = true;
        }
        i += 1;
    }

    let mut errors = Vec::new();
    let mut packs = Vec::new();
    let path = Path::new(target);

    if path.is_file() {
        load_file(path, &mut packs, &mut errors);
    } else if path.is_dir() {
        load_recursive(path, &mut packs, &mut errors);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target);
        process::exit(1);
    }

    println!("Loaded {} pack sections", packs.len());

    let mut warnings = Vec::new();
    for pack in &packs {
        lint_pack(pack, check_audio, &mut errors, &mut warnings);
    }

    println!("\n=== Pack Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_file(path: &Path, packs: &mut Vec<VoicePack>, errors: &mut Vec<String>) {
    match load_packs(path) {
        Ok(loaded) => {
            println!("  Loaded: {}", path.display());
            packs.extend(loaded);
        }
        Err(e) => errors.push(format!("{}: {}", path.display(), e)),
    }
}

fn load_recursive(dir: &Path, packs: &mut Vec<VoicePack>, errors: &mut Vec<String>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_recursive(&path, packs, errors);
            } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                load_file(&path, packs, errors);
            }
        }
    }
}

fn lint_pack(
    pack: &VoicePack,
    check_audio: bool,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let label = format!("{}/{}/{}", pack.name, pack.character, pack.language);

    for entry in pack.entries() {
        if entry.display_text.trim().is_empty() {
            errors.push(format!("{label}: empty display pattern ({})", entry.source));
        }

        if let Some(key) = &entry.translation_key {
            let by_display = pack.lookup_display(&entry.display_text).map(|e| &e.audio);
            let by_key = pack.lookup_key_page(key, entry.page).map(|e| &e.audio);
            if by_key == Some(&entry.audio) && by_display != by_key {
                warnings.push(format!(
                    "{label}: {:?} resolves to {:?} by display but {:?} by {key}#{}",
                    entry.display_text,
                    by_display.map(String::as_str).unwrap_or("-"),
                    entry.audio,
                    entry.page
                ));
            }
        }

        if check_audio && !pack.audio_path(entry).is_file() {
            errors.push(format!(
                "{label}: audio missing on disk: {}",
                pack.audio_path(entry).display()
            ));
        }
    }

    let mut audio: Vec<&str> = pack.entries().iter().map(|e| e.audio.as_str()).collect();
    audio.sort_unstable();
    audio.dedup();
    for file in audio {
        let users = pack.entries_for_audio(file);
        if let Some(first) = users.first() {
            if users.iter().any(|e| e.display_text != first.display_text) {
                errors.push(format!("{label}: {file} voices different display patterns"));
            }
        }
    }
}
