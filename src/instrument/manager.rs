use super::active::ActiveKeys;
use super::cleanup::{CleanupQueue, PendingCleanup};
use super::clock::{Clock, SystemClock};
use crate::audio::{AudioEngine, VoiceHandle};
use crate::synth::config::SynthConfig;
use crate::synth::note::{NoteCatalog, NoteEvent, NoteId, NoteIntent};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// What a press or release ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Triggered,
    Released,
    Ignored,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceStats {
    pub triggered: u64,
    pub released: u64,
    pub ignored_presses: u64,
    pub ignored_releases: u64,
    pub trigger_failures: u64,
    pub freed: u64,
    /// Voices whose disposal failed and were left to the engine.
    pub abandoned: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Running,
    ShutDown,
}

/// A note that is currently sounding.
struct Voice<H> {
    handle: H,
    started_at: Instant,
}

/// Maps notes to at most one sounding engine voice each.
///
/// Releasing a note forgets it at once, so it can be played again right
/// away, and hands its voice to a cleanup queue that frees it once the
/// release ramp has had time to finish. Nothing here returns an error:
/// engine failures are logged and the note stays silent.
pub struct VoiceManager<E: AudioEngine, C: Clock = SystemClock> {
    catalog: NoteCatalog,
    engine: Option<E>,
    voices: HashMap<NoteId, Voice<E::Voice>>,
    cleanup: CleanupQueue<E::Voice>,
    cleanup_delay: Duration,
    clock: C,
    lifecycle: Lifecycle,
    stats: VoiceStats,
}

impl<E: AudioEngine> VoiceManager<E, SystemClock> {
    pub fn new(catalog: NoteCatalog, engine: E, config: &SynthConfig) -> Self {
        Self::with_clock(catalog, Some(engine), config, SystemClock)
    }

    /// A manager with no audio engine. Every note stays silent, but the rest
    /// of the instrument keeps working.
    pub fn without_engine(catalog: NoteCatalog, config: &SynthConfig) -> Self {
        Self::with_clock(catalog, None, config, SystemClock)
    }
}

impl<E: AudioEngine, C: Clock> VoiceManager<E, C> {
    pub fn with_clock(catalog: NoteCatalog, engine: Option<E>, config: &SynthConfig, clock: C) -> Self {
        Self {
            catalog,
            engine,
            voices: HashMap::new(),
            cleanup: CleanupQueue::new(),
            cleanup_delay: config.cleanup_delay(),
            clock,
            lifecycle: Lifecycle::Running,
            stats: VoiceStats::default(),
        }
    }

    pub fn handle(&mut self, event: &NoteEvent) -> Outcome {
        match event.intent {
            NoteIntent::Press => self.press(event.note.as_str()),
            NoteIntent::Release => self.release(event.note.as_str()),
        }
    }

    /// Starts `note` sounding unless it already is.
    pub fn press(&mut self, note: &str) -> Outcome {
        let outcome = self.try_press(note);
        if outcome == Outcome::Ignored {
            self.stats.ignored_presses += 1;
        }
        outcome
    }

    fn try_press(&mut self, note: &str) -> Outcome {
        if self.lifecycle != Lifecycle::Running {
            debug!(note, "press after shutdown ignored");
            return Outcome::Ignored;
        }
        let Some(engine) = self.engine.as_mut() else {
            return Outcome::Ignored;
        };
        if self.voices.contains_key(note) {
            return Outcome::Ignored;
        }
        let Some(definition) = self.catalog.get(note) else {
            warn!(note, "press for a note that is not in the catalog");
            return Outcome::Ignored;
        };

        if let Err(err) = engine.resume() {
            warn!(%err, "audio engine resume failed");
        }

        match engine.start_voice(definition.frequency) {
            Ok(handle) => {
                debug!(note, frequency = definition.frequency, "voice started");
                self.voices.insert(
                    definition.id.clone(),
                    Voice {
                        handle,
                        started_at: self.clock.now(),
                    },
                );
                self.stats.triggered += 1;
                Outcome::Triggered
            }
            Err(err) => {
                error!(note, %err, "failed to start voice");
                self.stats.trigger_failures += 1;
                Outcome::Ignored
            }
        }
    }

    /// Stops `note` if it is sounding. Its voice keeps ringing through the
    /// release ramp and is freed by a later [`tick`](Self::tick).
    pub fn release(&mut self, note: &str) -> Outcome {
        if self.lifecycle != Lifecycle::Running {
            debug!(note, "release after shutdown ignored");
            self.stats.ignored_releases += 1;
            return Outcome::Ignored;
        }
        let Some(voice) = self.voices.get(note) else {
            self.stats.ignored_releases += 1;
            return Outcome::Ignored;
        };
        if let Err(err) = voice.handle.release() {
            warn!(note, %err, "failed to start release ramp");
        }
        let Some((id, voice)) = self.voices.remove_entry(note) else {
            return Outcome::Ignored;
        };

        let now = self.clock.now();
        debug!(
            note,
            held_ms = now.duration_since(voice.started_at).as_millis() as u64,
            "voice released"
        );
        self.cleanup.schedule(id, voice.handle, now + self.cleanup_delay);
        self.stats.released += 1;
        Outcome::Released
    }

    /// Frees every released voice whose release ramp is over. Returns how
    /// many cleanups ran.
    pub fn tick(&mut self) -> usize {
        let due = self.cleanup.take_due(self.clock.now());
        let count = due.len();
        for PendingCleanup { note, handle, .. } in due {
            self.dispose(&note, handle);
        }
        count
    }

    fn dispose(&mut self, note: &NoteId, handle: E::Voice) {
        match handle.disconnect_and_free() {
            Ok(()) => self.stats.freed += 1,
            Err(err) => {
                warn!(%note, %err, "voice cleanup failed, abandoning it");
                self.stats.abandoned += 1;
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if self.lifecycle != Lifecycle::Running {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            if let Err(err) = engine.set_volume(volume) {
                warn!(%err, "failed to set volume");
            }
        }
    }

    /// Stops accepting input, frees every voice, then shuts the engine down.
    /// Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.lifecycle == Lifecycle::ShutDown {
            return;
        }
        self.lifecycle = Lifecycle::ShutDown;

        for PendingCleanup { note, handle, .. } in self.cleanup.take_all() {
            self.dispose(&note, handle);
        }
        for (note, voice) in std::mem::take(&mut self.voices) {
            if let Err(err) = voice.handle.release() {
                warn!(%note, %err, "failed to release voice during shutdown");
            }
            self.dispose(&note, voice.handle);
        }

        if let Some(mut engine) = self.engine.take() {
            if let Err(err) = engine.shutdown() {
                warn!(%err, "audio engine shutdown failed");
            }
        }
        debug!(stats = ?self.stats, "voice manager shut down");
    }

    pub fn is_active(&self, note: &str) -> bool {
        self.voices.contains_key(note)
    }

    pub fn active_keys(&self) -> ActiveKeys {
        ActiveKeys::from_notes(self.voices.keys())
    }

    pub fn sounding_count(&self) -> usize {
        self.voices.len()
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanup.len()
    }

    pub fn next_cleanup_due(&self) -> Option<Instant> {
        self.cleanup.next_due()
    }

    /// True while input is accepted and an engine is present.
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running && self.engine.is_some()
    }

    pub fn catalog(&self) -> &NoteCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> VoiceStats {
        self.stats
    }
}
