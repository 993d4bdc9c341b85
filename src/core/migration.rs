/// Migration of legacy one-file-per-raw-line packs onto a freshly built
/// current-format baseline.
///
/// Each legacy entry is re-canonicalized as a single page and matched
/// against baseline entries with the same display pattern. Matches get
/// their audio copied into the new layout; everything else becomes a
/// review row. Nothing is guessed. The output pack is the whole baseline
/// with matched audio filled in.
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::canonical::{canonicalize_with, CanonicalOptions};
use crate::core::pack::{save_packs, write_atomic, PackError, VoicePack};
use crate::schema::entry::{LegacyDocument, LegacyEntry, LEGACY_FORMAT};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pack error: {0}")]
    Pack(#[from] PackError),
}

/// Why a legacy entry was not ported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewReason {
    EmptyPattern,
    NoCandidate,
    AllCandidatesClaimed,
    PatternMismatch { baseline: String },
    AmbiguousVariants(usize),
    AudioMissing(PathBuf),
    AudioCopyFailed(String),
    AudioReused { pattern: String },
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPattern => write!(f, "empty display pattern after sanitization"),
            Self::NoCandidate => write!(f, "no baseline entry with this display pattern"),
            Self::AllCandidatesClaimed => {
                write!(f, "every baseline entry with this pattern is already claimed")
            }
            Self::PatternMismatch { baseline } => {
                write!(f, "baseline pattern {baseline:?} differs from recomputed pattern")
            }
            Self::AmbiguousVariants(n) => {
                write!(f, "raw text expands to {n} distinct patterns")
            }
            Self::AudioMissing(path) => write!(f, "audio source not found: {}", path.display()),
            Self::AudioCopyFailed(e) => write!(f, "audio copy failed: {e}"),
            Self::AudioReused { pattern } => {
                write!(f, "audio source already ported for pattern {pattern:?}")
            }
        }
    }
}

/// A legacy entry that was not ported. Successful matches never get a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRow {
    pub source_file: String,
    pub character: String,
    pub language: String,
    pub legacy_text: String,
    /// Pattern recomputed by the current canonicalizer.
    pub legacy_pattern: String,
    pub legacy_audio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub legacy_entries: usize,
    pub baseline_entries: usize,
    pub matched: usize,
    pub needs_review: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub character: String,
    pub language: String,
    pub summary: MigrationSummary,
    pub rows: Vec<MigrationRow>,
}

/// A legacy document together with the directory its audio lives in.
#[derive(Debug, Clone)]
pub struct LegacySource {
    pub path: PathBuf,
    pub document: LegacyDocument,
}

impl LegacySource {
    pub fn audio_root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Collect every legacy document under `dir` for one (character, language).
/// Documents that fail to parse or are not legacy-format are logged and
/// skipped.
pub fn load_legacy_dir(
    dir: &Path,
    character: &str,
    language: &str,
) -> Result<Vec<LegacySource>, MigrationError> {
    let mut found = Vec::new();
    collect_legacy(dir, character, language, &mut found)?;
    log::info!(
        "Found {} legacy documents for {character}/{language} in {}",
        found.len(),
        dir.display()
    );
    Ok(found)
}

fn collect_legacy(
    dir: &Path,
    character: &str,
    language: &str,
    found: &mut Vec<LegacySource>,
) -> Result<(), MigrationError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_legacy(&path, character, language, found)?;
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(MigrationError::from)
            .and_then(|s| serde_json::from_str::<LegacyDocument>(&s).map_err(MigrationError::from));
        match parsed {
            Ok(doc) if doc.format != LEGACY_FORMAT => {
                log::debug!("Skipping {}: format {}", path.display(), doc.format);
            }
            Ok(doc) if doc.character == character && doc.language == language => {
                found.push(LegacySource {
                    path,
                    document: doc,
                });
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping legacy document {}: {}", path.display(), e),
        }
    }
    Ok(())
}

/// The ported pack and the review report.
#[derive(Debug)]
pub struct MigrationOutcome {
    pub pack: VoicePack,
    pub report: MigrationReport,
}

pub fn file_hash(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// `{stem}_conflict{k}.{ext}` beside `relative`.
fn conflict_name(relative: &str, k: u32) -> String {
    let path = Path::new(relative);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("audio");
    let name = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_conflict{k}.{ext}"),
        None => format!("{stem}_conflict{k}"),
    };
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.join(name).to_string_lossy().replace('\\', "/"),
        None => name,
    }
}

/// Copy `source` to `relative` under `output_dir`. An existing file with
/// the same content is reused; different content moves to the next free
/// conflict name. Returns the relative path actually used.
fn place_audio(source: &Path, output_dir: &Path, relative: &str) -> std::io::Result<String> {
    let source_hash = file_hash(source)?;
    let mut candidate = relative.to_string();
    let mut k = 0;

    loop {
        let dest = output_dir.join(&candidate);
        if !dest.exists() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(source, &dest)?;
            return Ok(candidate);
        }
        if file_hash(&dest)? == source_hash {
            log::debug!("Reusing identical audio at {}", dest.display());
            return Ok(candidate);
        }
        k += 1;
        candidate = conflict_name(relative, k);
    }
}

struct Migrator<'a> {
    baseline: &'a VoicePack,
    output_dir: &'a Path,
    by_folded: FxHashMap<String, Vec<usize>>,
    claimed: FxHashSet<usize>,
    ported_audio: FxHashMap<PathBuf, String>,
    /// Baseline index to the audio path placed for it.
    filled: FxHashMap<usize, String>,
}

impl<'a> Migrator<'a> {
    fn new(baseline: &'a VoicePack, output_dir: &'a Path) -> Self {
        let mut by_folded: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (i, entry) in baseline.entries().iter().enumerate() {
            by_folded
                .entry(entry.display_text.to_lowercase())
                .or_default()
                .push(i);
        }
        Self {
            baseline,
            output_dir,
            by_folded,
            claimed: FxHashSet::default(),
            ported_audio: FxHashMap::default(),
            filled: FxHashMap::default(),
        }
    }

    /// Recompute the single display pattern a legacy line maps to.
    fn pattern_for(text: &str) -> Result<String, (String, ReviewReason)> {
        let segments = canonicalize_with(text, CanonicalOptions { split_pages: false });
        let mut patterns: Vec<&str> = Vec::new();
        for segment in &segments {
            if !patterns.contains(&segment.display_text.as_str()) {
                patterns.push(&segment.display_text);
            }
        }
        match patterns.as_slice() {
            [] => Err((String::new(), ReviewReason::EmptyPattern)),
            [one] if one.trim().is_empty() => Err((String::new(), ReviewReason::EmptyPattern)),
            [one] => Ok(one.to_string()),
            [first, ..] => Err((
                first.to_string(),
                ReviewReason::AmbiguousVariants(patterns.len()),
            )),
        }
    }

    fn port(&mut self, root: &Path, entry: &LegacyEntry) -> (String, Result<String, ReviewReason>) {
        let pattern = match Self::pattern_for(&entry.text) {
            Ok(p) => p,
            Err((p, reason)) => return (p, Err(reason)),
        };

        let Some(candidates) = self.by_folded.get(&pattern.to_lowercase()) else {
            return (pattern, Err(ReviewReason::NoCandidate));
        };
        let Some(&idx) = candidates.iter().find(|&&i| !self.claimed.contains(&i)) else {
            return (pattern, Err(ReviewReason::AllCandidatesClaimed));
        };

        let baseline = self.baseline;
        let target = &baseline.entries()[idx];
        if target.display_text != pattern {
            let baseline = target.display_text.clone();
            return (pattern, Err(ReviewReason::PatternMismatch { baseline }));
        }

        let source = root.join(&entry.audio);
        if !source.is_file() {
            return (pattern, Err(ReviewReason::AudioMissing(source)));
        }
        if let Some(previous) = self.ported_audio.get(&source) {
            if previous != &pattern {
                let pattern_used = previous.clone();
                return (pattern, Err(ReviewReason::AudioReused { pattern: pattern_used }));
            }
        }

        let audio = match place_audio(&source, self.output_dir, &target.audio) {
            Ok(a) => a,
            Err(e) => return (pattern, Err(ReviewReason::AudioCopyFailed(e.to_string()))),
        };

        self.claimed.insert(idx);
        self.ported_audio.insert(source, pattern.clone());
        self.filled.insert(idx, audio.clone());
        (pattern, Ok(audio))
    }

    /// Every baseline entry, rooted at the output directory. Entries no
    /// legacy line claimed keep their baseline audio reference.
    fn finish(self) -> (VoicePack, usize) {
        let baseline = self.baseline;
        let mut pack = VoicePack::new(
            baseline.name.clone(),
            baseline.character.clone(),
            baseline.language.clone(),
            self.output_dir,
        );
        for (i, entry) in baseline.entries().iter().enumerate() {
            let mut entry = entry.clone();
            if let Some(audio) = self.filled.get(&i) {
                entry.audio = audio.clone();
            }
            pack.insert(entry);
        }
        (pack, baseline.len() - self.filled.len())
    }
}

/// Port every legacy entry onto `baseline`, copying audio under
/// `output_dir`. Entries are processed in document order, so the first
/// legacy entry for a pattern claims the first baseline entry.
pub fn migrate(legacy: &[LegacySource], baseline: &VoicePack, output_dir: &Path) -> MigrationOutcome {
    let mut migrator = Migrator::new(baseline, output_dir);
    let mut rows = Vec::new();
    let mut legacy_entries = 0;
    let mut matched = 0;

    for source in legacy {
        let root = source.audio_root();
        for entry in &source.document.entries {
            legacy_entries += 1;
            let (pattern, reason) = match migrator.port(root, entry) {
                (_, Ok(audio)) => {
                    log::debug!("Ported {:?} ({}) to {audio}", entry.text, entry.audio);
                    matched += 1;
                    continue;
                }
                (pattern, Err(reason)) => (pattern, reason),
            };
            log::warn!("Review {:?} ({}): {}", entry.text, entry.audio, reason);
            rows.push(MigrationRow {
                source_file: source.path.display().to_string(),
                character: source.document.character.clone(),
                language: source.document.language.clone(),
                legacy_text: entry.text.clone(),
                legacy_pattern: pattern,
                legacy_audio: entry.audio.clone(),
                error: Some(reason.to_string()),
            });
        }
    }

    let (pack, unfilled) = migrator.finish();
    let summary = MigrationSummary {
        legacy_entries,
        baseline_entries: baseline.len(),
        matched,
        needs_review: rows.len(),
    };
    log::info!(
        "Migrated {}/{}: {} of {} legacy entries matched, {} need review, {} baseline entries without legacy audio",
        baseline.character,
        baseline.language,
        summary.matched,
        summary.legacy_entries,
        summary.needs_review,
        unfilled
    );

    MigrationOutcome {
        report: MigrationReport {
            character: baseline.character.clone(),
            language: baseline.language.clone(),
            summary,
            rows,
        },
        pack,
    }
}

/// Write `{name}.json` and `{character}_{language}_report.json` into the
/// output directory. Returns both paths.
pub fn write_outcome(
    outcome: &MigrationOutcome,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf), MigrationError> {
    let pack_path = output_dir.join(format!("{}.json", outcome.pack.name));
    save_packs(&[&outcome.pack], &pack_path)?;

    let report_path = output_dir.join(format!(
        "{}_{}_report.json",
        outcome.report.character, outcome.report.language
    ));
    let json = serde_json::to_string_pretty(&outcome.report)?;
    write_atomic(&report_path, json.as_bytes())?;
    Ok((pack_path, report_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_keep_directory_and_extension() {
        assert_eq!(conflict_name("3.ogg", 1), "3_conflict1.ogg");
        assert_eq!(conflict_name("sub/3_male.wav", 2), "sub/3_male_conflict2.wav");
    }

    #[test]
    fn pattern_for_single_page() {
        assert_eq!(
            Migrator::pattern_for("Hi.#$e#Bye.").unwrap(),
            "Hi.\nBye."
        );
        assert!(matches!(
            Migrator::pattern_for("$k"),
            Err((_, ReviewReason::EmptyPattern))
        ));
        assert!(matches!(
            Migrator::pattern_for("${Sir^Ma'am}!"),
            Err((_, ReviewReason::AmbiguousVariants(2)))
        ));
    }

    #[test]
    fn place_audio_dedups_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let a = dir.path().join("a.ogg");
        let b = dir.path().join("b.ogg");
        fs::write(&a, b"aaaa").unwrap();
        fs::write(&b, b"bbbb").unwrap();

        assert_eq!(place_audio(&a, &out, "1.ogg").unwrap(), "1.ogg");
        assert_eq!(place_audio(&a, &out, "1.ogg").unwrap(), "1.ogg");
        assert_eq!(place_audio(&b, &out, "1.ogg").unwrap(), "1_conflict1.ogg");
        assert_eq!(fs::read(out.join("1_conflict1.ogg")).unwrap(), b"bbbb");
    }

    #[test]
    fn review_reasons_render_distinctly() {
        let reasons = [
            ReviewReason::EmptyPattern,
            ReviewReason::NoCandidate,
            ReviewReason::AllCandidatesClaimed,
            ReviewReason::AmbiguousVariants(2),
        ];
        let rendered: FxHashSet<String> = reasons.iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered.len(), reasons.len());
    }
}
