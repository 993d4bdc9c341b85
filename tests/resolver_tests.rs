/// Resolver integration tests: build packs from raw lines, persist them,
/// load them back through the service and resolve on-screen text.

use std::fs;
use std::path::Path;
use voiceline_engine::core::builder::PackBuilder;
use voiceline_engine::core::config::EngineConfig;
use voiceline_engine::core::pack::{load_packs, save_packs, PackCatalog, VoicePack};
use voiceline_engine::core::resolver::{DialogueFrame, ResolveFailure, Resolution, Route};
use voiceline_engine::core::service::VoiceService;
use voiceline_engine::schema::capture::WorldSnapshot;
use voiceline_engine::schema::line::RawLine;
use voiceline_engine::schema::source::SourceKey;

fn monday() -> SourceKey {
    SourceKey::Dialogue {
        character: "Abigail".to_string(),
        key: "Mon".to_string(),
    }
}

/// Build a pack for one language, write its audio and document under
/// `dir`, and return the reloaded pack.
fn build_pack(dir: &Path, name: &str, language: &str, raw: &str) -> VoicePack {
    fs::create_dir_all(dir).unwrap();
    let mut builder = PackBuilder::new(name, "Abigail", language, dir);
    builder.push_line(&RawLine::new(monday(), language, raw));
    let report = builder.finish();
    assert!(report.skipped.is_empty());

    for entry in report.pack.entries() {
        fs::write(dir.join(&entry.audio), entry.display_text.as_bytes()).unwrap();
    }
    let path = dir.join(format!("{name}.json"));
    save_packs(&[&report.pack], &path).unwrap();
    load_packs(&path).unwrap().remove(0)
}

const ENGLISH: &str = "Hey, @!#$e#${Sir^Ma'am}, the mines are dangerous.$s";
const FRENCH: &str = "Salut, @ !#$e#${Monsieur^Madame}, les mines sont dangereuses.$s";

fn world() -> WorldSnapshot {
    WorldSnapshot {
        player_name: "Robin".to_string(),
        farm_name: "Hilltop".to_string(),
        ..Default::default()
    }
}

#[test]
fn persisted_pack_round_trips_indices() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = PackBuilder::new("abigail", "Abigail", "en", dir.path());
    builder.push_line(&RawLine::new(monday(), "en", ENGLISH));
    let built = builder.finish().pack;

    let path = dir.path().join("abigail.json");
    save_packs(&[&built], &path).unwrap();
    let reloaded = load_packs(&path).unwrap().remove(0);

    assert_eq!(reloaded.display_index(), built.display_index());
    assert_eq!(reloaded.key_page_index(), built.key_page_index());
    assert_eq!(reloaded.len(), 3);
}

#[test]
fn service_plays_debounced_same_language_line() {
    let dir = tempfile::tempdir().unwrap();
    let packs = dir.path().join("packs");
    build_pack(&packs.join("abigail"), "abigail", "en", ENGLISH);

    let mut service = VoiceService::builder()
        .packs_dir(packs.to_str().unwrap())
        .build()
        .unwrap();
    service.begin_session("save-1");

    let frame = DialogueFrame::dialogue("Abigail", "Hey, Robin!", "en");
    let world = world();
    let mut outcomes = Vec::new();
    for _ in 0..service.config().stable_ticks + 2 {
        outcomes.extend(service.tick(Some(&frame), &world));
    }

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0],
        Resolution::Matched {
            path: packs.join("abigail").join("1.ogg"),
            route: Route::Display,
        }
    );
    assert_eq!(
        service.playback().current_path(),
        Some(packs.join("abigail").join("1.ogg").as_path())
    );
}

#[test]
fn cross_language_pack_resolves_through_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let packs = dir.path().join("packs");
    build_pack(&packs.join("en"), "abigail", "en", ENGLISH);
    build_pack(&packs.join("fr"), "abigail_fr", "fr", FRENCH);

    let mut config = EngineConfig::default();
    config
        .pack_selection
        .insert("Abigail".to_string(), "abigail_fr".to_string());
    let mut service = VoiceService::builder()
        .config(config)
        .packs_dir(packs.to_str().unwrap())
        .build()
        .unwrap();
    service.begin_session("save-1");

    let frame = DialogueFrame::dialogue("Abigail", "Ma'am, the mines are dangerous.", "en");
    match service.resolve(&frame, &world()) {
        Resolution::Matched { path, route } => {
            assert_eq!(path, packs.join("fr").join("3_female.ogg"));
            assert!(matches!(route, Route::Dictionary(ref kp) if kp.page == 2));
        }
        other => panic!("expected match, got {other:?}"),
    }
    assert!(service.dictionary().is_loaded("Abigail", "en"));
    assert!(service.dictionary().is_loaded("Abigail", "fr"));

    service.end_session();
    assert!(!service.dictionary().is_loaded("Abigail", "en"));
}

#[test]
fn french_only_pack_with_english_text_is_unmatched() {
    let dir = tempfile::tempdir().unwrap();
    let fr = build_pack(&dir.path().join("fr"), "abigail_fr", "fr", FRENCH);

    let mut catalog = PackCatalog::new();
    catalog.insert(fr);
    let mut service = VoiceService::builder()
        .with_catalog(catalog)
        .build()
        .unwrap();

    let frame = DialogueFrame::dialogue("Abigail", "Hey, Robin!", "en");
    let resolution = service.resolve(&frame, &world());
    assert!(matches!(
        resolution,
        Resolution::Unmatched(ResolveFailure::CrossLanguageMiss { candidates: 0, .. })
    ));
    assert!(!service.playback().is_active());
}

#[test]
fn missing_audio_reported_separately() {
    let dir = tempfile::tempdir().unwrap();
    let pack = build_pack(dir.path(), "abigail", "en", ENGLISH);
    fs::remove_file(dir.path().join("2_male.ogg")).unwrap();

    let mut service = VoiceService::builder().with_pack(pack).build().unwrap();
    let frame = DialogueFrame::dialogue("Abigail", "Sir, the mines are dangerous.", "en");
    assert!(matches!(
        service.resolve(&frame, &world()),
        Resolution::Unmatched(ResolveFailure::FileMissing { .. })
    ));

    let frame = DialogueFrame::dialogue("Abigail", "Never said this.", "en");
    assert!(matches!(
        service.resolve(&frame, &world()),
        Resolution::Unmatched(ResolveFailure::KeyNotFound { .. })
    ));
}
