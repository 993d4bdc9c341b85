/// Single-owner handle for the one audio instance allowed to play.
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("failed to start playback of {path}: {reason}")]
    Start { path: PathBuf, reason: String },
}

/// A playing sound, owned by whoever started it.
pub trait AudioInstance {
    fn stop(&mut self);
    fn is_finished(&self) -> bool;
}

/// Host audio backend. Decoding and output live behind this seam.
pub trait AudioSink {
    fn play(&mut self, path: &Path) -> Result<Box<dyn AudioInstance>, PlaybackError>;
}

/// Sink that plays nothing; every instance is finished immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

struct SilentInstance;

impl AudioInstance for SilentInstance {
    fn stop(&mut self) {}

    fn is_finished(&self) -> bool {
        true
    }
}

impl AudioSink for SilentSink {
    fn play(&mut self, path: &Path) -> Result<Box<dyn AudioInstance>, PlaybackError> {
        log::debug!("silent playback of {}", path.display());
        Ok(Box::new(SilentInstance))
    }
}

/// Stops its instance when dropped, on every exit path.
struct ActiveAudio {
    path: PathBuf,
    instance: Box<dyn AudioInstance>,
}

impl Drop for ActiveAudio {
    fn drop(&mut self) {
        self.instance.stop();
    }
}

/// Owns the sink and at most one active instance.
pub struct Playback {
    sink: Box<dyn AudioSink>,
    current: Option<ActiveAudio>,
}

impl Playback {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            current: None,
        }
    }

    /// Stop whatever is playing, then start `path`.
    ///
    /// The previous instance is released before the new one starts, so two
    /// instances never overlap even when starting fails.
    pub fn start(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.current = None;
        let instance = self.sink.play(path)?;
        self.current = Some(ActiveAudio {
            path: path.to_path_buf(),
            instance,
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    /// Dispose a finished instance. Returns true if one was released.
    pub fn sweep(&mut self) -> bool {
        let finished = self
            .current
            .as_ref()
            .map(|a| a.instance.is_finished())
            .unwrap_or(false);
        if finished {
            self.current = None;
        }
        finished
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|a| a.path.as_path())
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(Box::new(SilentSink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        events: Vec<String>,
    }

    struct TestInstance {
        name: String,
        log: Rc<RefCell<Log>>,
        finished: bool,
    }

    impl AudioInstance for TestInstance {
        fn stop(&mut self) {
            self.log.borrow_mut().events.push(format!("stop {}", self.name));
        }

        fn is_finished(&self) -> bool {
            self.finished
        }
    }

    struct TestSink {
        log: Rc<RefCell<Log>>,
        finished: bool,
    }

    impl AudioSink for TestSink {
        fn play(&mut self, path: &Path) -> Result<Box<dyn AudioInstance>, PlaybackError> {
            let name = path.display().to_string();
            if name.contains("broken") {
                return Err(PlaybackError::Start {
                    path: path.to_path_buf(),
                    reason: "decode failed".to_string(),
                });
            }
            self.log.borrow_mut().events.push(format!("play {name}"));
            Ok(Box::new(TestInstance {
                name,
                log: Rc::clone(&self.log),
                finished: self.finished,
            }))
        }
    }

    fn playback(finished: bool) -> (Playback, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let sink = TestSink {
            log: Rc::clone(&log),
            finished,
        };
        (Playback::new(Box::new(sink)), log)
    }

    #[test]
    fn starting_stops_previous_first() {
        let (mut pb, log) = playback(false);
        pb.start(Path::new("a.ogg")).unwrap();
        pb.start(Path::new("b.ogg")).unwrap();
        assert_eq!(
            log.borrow().events,
            vec!["play a.ogg", "stop a.ogg", "play b.ogg"]
        );
        assert_eq!(pb.current_path(), Some(Path::new("b.ogg")));
    }

    #[test]
    fn failed_start_still_releases_previous() {
        let (mut pb, log) = playback(false);
        pb.start(Path::new("a.ogg")).unwrap();
        assert!(pb.start(Path::new("broken.ogg")).is_err());
        assert!(!pb.is_active());
        assert_eq!(log.borrow().events, vec!["play a.ogg", "stop a.ogg"]);
    }

    #[test]
    fn drop_stops_active_instance() {
        let (mut pb, log) = playback(false);
        pb.start(Path::new("a.ogg")).unwrap();
        drop(pb);
        assert_eq!(log.borrow().events.last().map(String::as_str), Some("stop a.ogg"));
    }

    #[test]
    fn sweep_releases_only_finished() {
        let (mut pb, _) = playback(false);
        pb.start(Path::new("a.ogg")).unwrap();
        assert!(!pb.sweep());
        assert!(pb.is_active());

        let (mut pb, _) = playback(true);
        pb.start(Path::new("a.ogg")).unwrap();
        assert!(pb.sweep());
        assert!(!pb.is_active());
    }
}
