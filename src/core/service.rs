/// Session-scoped voice service: the per-tick entry point the host calls.
///
/// Owns the pack catalog, per-character pack selection, the dictionary
/// cache, the display tracker and the single playback handle. All of it is
/// torn down synchronously by `end_session`. Built via
/// `VoiceService::builder()`.
use std::path::Path;
use thiserror::Error;

use crate::core::config::{ConfigError, EngineConfig};
use crate::core::dictionary::Dictionary;
use crate::core::pack::{PackCatalog, PackError, VoicePack};
use crate::core::playback::{AudioSink, Playback};
use crate::core::resolver::{self, DialogueFrame, Resolution};
use crate::core::tracker::{DisplayState, DisplayTracker, TrackerEvent};
use crate::schema::capture::{Capture, WorldSnapshot};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("pack error: {0}")]
    Pack(#[from] PackError),
}

pub struct VoiceService {
    config: EngineConfig,
    catalog: PackCatalog,
    dictionary: Dictionary,
    tracker: DisplayTracker,
    playback: Playback,
    session: Option<String>,
    ticks: u64,
}

pub struct VoiceServiceBuilder {
    config: Option<EngineConfig>,
    config_path: Option<String>,
    packs_dir: Option<String>,
    /// Directly provided catalog (for testing without files).
    catalog: Option<PackCatalog>,
    packs: Vec<VoicePack>,
    sink: Option<Box<dyn AudioSink>>,
}

impl VoiceService {
    pub fn builder() -> VoiceServiceBuilder {
        VoiceServiceBuilder {
            config: None,
            config_path: None,
            packs_dir: None,
            catalog: None,
            packs: Vec::new(),
            sink: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PackCatalog {
        &self.catalog
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn display_state(&self) -> &DisplayState {
        self.tracker.state()
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Bind to a save/session identity. Switching to a different identity
    /// drops every cache belonging to the previous one.
    pub fn begin_session(&mut self, id: &str) {
        if self.session.as_deref() == Some(id) {
            return;
        }
        if self.session.is_some() {
            self.end_session();
        }
        log::info!("Voice session started: {id}");
        self.dictionary.begin_session(id);
        self.session = Some(id.to_string());
    }

    /// Return-to-title teardown. Runs before any new session can query.
    pub fn end_session(&mut self) {
        if let Some(id) = self.session.take() {
            log::info!("Voice session ended: {id}");
        }
        self.dictionary.clear();
        self.tracker.reset();
        self.playback.stop();
        self.ticks = 0;
    }

    /// The pack that voices `character` when `language` is active.
    ///
    /// An explicit selection in the config wins (same language preferred),
    /// then a pack in the active language, then the first pack loaded.
    pub fn selected_pack(&self, character: &str, language: &str) -> Option<&VoicePack> {
        select_pack(&self.catalog, &self.config, character, language)
    }

    /// Run once per host tick. `frame` is `None` when no dialogue is shown.
    /// Returns the resolution outcome on the tick a page stabilizes.
    pub fn tick(
        &mut self,
        frame: Option<&DialogueFrame>,
        world: &WorldSnapshot,
    ) -> Option<Resolution> {
        self.ticks += 1;
        if self.ticks % u64::from(self.config.sweep_interval_ticks) == 0 && self.playback.sweep() {
            log::debug!("Disposed finished audio instance");
        }

        match self.tracker.observe(frame.map(|f| f.text.as_str())) {
            TrackerEvent::Nothing => None,
            TrackerEvent::ReturnedToIdle => {
                self.playback.stop();
                None
            }
            TrackerEvent::Stabilized(_) => {
                let frame = frame?;
                let resolution = self.resolve(frame, world);
                self.tracker.complete(resolution.is_matched());
                Some(resolution)
            }
        }
    }

    /// Resolve a frame immediately, bypassing the debounce, and start
    /// playback on a match.
    pub fn resolve(&mut self, frame: &DialogueFrame, world: &WorldSnapshot) -> Resolution {
        let language = if frame.language.is_empty() {
            self.config.default_language.as_str()
        } else {
            frame.language.as_str()
        };
        let frame = DialogueFrame {
            language: language.to_string(),
            ..frame.clone()
        };

        let capture = Capture::from_world(world);
        let pack = select_pack(&self.catalog, &self.config, &frame.speaker, &frame.language);
        let resolution = resolver::resolve(&self.catalog, &mut self.dictionary, pack, &frame, &capture);

        if let Resolution::Matched { path, .. } = &resolution {
            if let Err(e) = self.playback.start(path) {
                log::warn!("{e}");
            }
        }
        resolution
    }
}

fn select_pack<'a>(
    catalog: &'a PackCatalog,
    config: &EngineConfig,
    character: &str,
    language: &str,
) -> Option<&'a VoicePack> {
    let packs = catalog.packs_for(character);
    if let Some(name) = config.pack_selection.get(character) {
        let chosen = catalog
            .find(character, name, language)
            .or_else(|| packs.iter().find(|p| &p.name == name));
        if chosen.is_some() {
            return chosen;
        }
        log::warn!("Selected pack {name} for {character} is not loaded");
    }
    packs
        .iter()
        .find(|p| p.language == language)
        .or_else(|| packs.first())
}

impl VoiceServiceBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn packs_dir(mut self, path: &str) -> Self {
        self.packs_dir = Some(path.to_string());
        self
    }

    /// Provide a catalog directly (for testing without files).
    pub fn with_catalog(mut self, catalog: PackCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_pack(mut self, pack: VoicePack) -> Self {
        self.packs.push(pack);
        self
    }

    pub fn audio_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<VoiceService, ServiceError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => EngineConfig::load_from_ron(Path::new(path))?,
            (None, None) => EngineConfig::default(),
        };
        config.validate()?;

        let mut catalog = self.catalog.unwrap_or_default();
        if let Some(ref dir) = self.packs_dir {
            if Path::new(dir).exists() {
                catalog.merge(PackCatalog::load_dir(Path::new(dir))?);
            } else {
                log::warn!("Pack directory {dir} does not exist");
            }
        }
        for pack in self.packs {
            catalog.insert(pack);
        }

        let playback = match self.sink {
            Some(sink) => Playback::new(sink),
            None => Playback::default(),
        };

        Ok(VoiceService {
            tracker: DisplayTracker::new(config.stable_ticks, config.absent_ticks),
            config,
            catalog,
            dictionary: Dictionary::new(),
            playback,
            session: None,
            ticks: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playback::{AudioInstance, PlaybackError};
    use crate::core::resolver::ResolveFailure;
    use crate::schema::entry::VoiceEntry;
    use crate::schema::line::Gender;
    use crate::schema::source::SourceKey;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    struct Instance;

    impl AudioInstance for Instance {
        fn stop(&mut self) {}

        fn is_finished(&self) -> bool {
            false
        }
    }

    struct RecordingSink(Rc<RefCell<Vec<String>>>);

    impl AudioSink for RecordingSink {
        fn play(&mut self, path: &Path) -> Result<Box<dyn AudioInstance>, PlaybackError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.0.borrow_mut().push(name);
            Ok(Box::new(Instance))
        }
    }

    fn pack(root: &Path, name: &str, language: &str, text: &str, audio: &str) -> VoicePack {
        fs::write(root.join(audio), b"OggS").unwrap();
        let mut pack = VoicePack::new(name, "Penny", language, root);
        pack.insert(VoiceEntry {
            source: SourceKey::Dialogue {
                character: "Penny".to_string(),
                key: "Mon".to_string(),
            },
            display_text: text.to_string(),
            audio: audio.to_string(),
            translation_key: Some("Characters/Dialogue/Penny:Mon".to_string()),
            page: 0,
            gender: Gender::None,
        });
        pack
    }

    fn service(root: &Path) -> (VoiceService, Rc<RefCell<Vec<String>>>) {
        let played = Rc::new(RefCell::new(Vec::new()));
        let config = EngineConfig {
            stable_ticks: 2,
            absent_ticks: 2,
            ..EngineConfig::default()
        };
        let service = VoiceService::builder()
            .config(config)
            .with_pack(pack(root, "penny", "en", "Oh, hello.", "1.ogg"))
            .audio_sink(Box::new(RecordingSink(Rc::clone(&played))))
            .build()
            .unwrap();
        (service, played)
    }

    #[test]
    fn plays_once_per_stabilized_page() {
        let dir = tempfile::tempdir().unwrap();
        let (mut svc, played) = service(dir.path());
        let world = WorldSnapshot::default();
        let frame = DialogueFrame::dialogue("Penny", "Oh, hello.", "en");

        assert!(svc.tick(Some(&DialogueFrame::dialogue("Penny", "Oh,", "en")), &world).is_none());
        assert!(svc.tick(Some(&frame), &world).is_none());
        let res = svc.tick(Some(&frame), &world).unwrap();
        assert!(res.is_matched());

        for _ in 0..5 {
            assert!(svc.tick(Some(&frame), &world).is_none());
        }
        assert_eq!(*played.borrow(), vec!["1.ogg"]);
        assert!(svc.playback().is_active());
    }

    #[test]
    fn closing_dialogue_stops_audio() {
        let dir = tempfile::tempdir().unwrap();
        let (mut svc, _) = service(dir.path());
        let world = WorldSnapshot::default();
        let frame = DialogueFrame::dialogue("Penny", "Oh, hello.", "en");
        svc.tick(Some(&frame), &world);
        svc.tick(Some(&frame), &world);
        assert!(svc.playback().is_active());

        svc.tick(None, &world);
        assert!(svc.playback().is_active());
        svc.tick(None, &world);
        assert!(!svc.playback().is_active());
        assert_eq!(svc.display_state(), &DisplayState::Idle);
    }

    #[test]
    fn unknown_speaker_reports_no_pack() {
        let dir = tempfile::tempdir().unwrap();
        let (mut svc, played) = service(dir.path());
        let res = svc.resolve(
            &DialogueFrame::dialogue("Gus", "Welcome!", "en"),
            &WorldSnapshot::default(),
        );
        assert!(matches!(
            res,
            Resolution::Unmatched(ResolveFailure::NoPackSelected { .. })
        ));
        assert!(played.borrow().is_empty());
    }

    #[test]
    fn config_selection_and_language_preference() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config
            .pack_selection
            .insert("Penny".to_string(), "penny_alt".to_string());
        let svc = VoiceService::builder()
            .config(config)
            .with_pack(pack(dir.path(), "penny", "en", "Hi.", "1.ogg"))
            .with_pack(pack(dir.path(), "penny_alt", "fr", "Salut.", "2.ogg"))
            .build()
            .unwrap();
        assert_eq!(svc.selected_pack("Penny", "en").unwrap().name, "penny_alt");

        let svc = VoiceService::builder()
            .with_pack(pack(dir.path(), "penny", "en", "Hi.", "1.ogg"))
            .with_pack(pack(dir.path(), "penny_fr", "fr", "Salut.", "2.ogg"))
            .build()
            .unwrap();
        assert_eq!(svc.selected_pack("Penny", "fr").unwrap().name, "penny_fr");
        assert_eq!(svc.selected_pack("Penny", "de").unwrap().name, "penny");
    }

    #[test]
    fn session_change_clears_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut svc, _) = service(dir.path());
        let world = WorldSnapshot::default();
        svc.begin_session("farm-1");
        svc.resolve(&DialogueFrame::dialogue("Penny", "Oh, hello.", "en"), &world);
        assert!(svc.playback().is_active());

        svc.begin_session("farm-2");
        assert_eq!(svc.session(), Some("farm-2"));
        assert!(!svc.playback().is_active());

        svc.end_session();
        assert!(svc.session().is_none());
        assert!(svc.dictionary().session().is_none());
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let config = EngineConfig {
            sweep_interval_ticks: 0,
            ..EngineConfig::default()
        };
        let result = VoiceService::builder().config(config).build();
        assert!(matches!(
            result,
            Err(ServiceError::Config(ConfigError::Invalid(_)))
        ));
    }
}
