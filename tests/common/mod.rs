#![allow(dead_code)]

use rustpiano::audio::{AudioEngine, EngineError, VoiceHandle};
use rustpiano::instrument::{ManualClock, VoiceManager};
use rustpiano::synth::{NoteCatalog, SynthConfig};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Resume,
    Start { voice: u64, frequency: f32 },
    Release(u64),
    Free(u64),
    SetVolume(f32),
    Shutdown,
}

#[derive(Debug, Default)]
struct EngineLog {
    calls: Vec<Call>,
    next_voice: u64,
    fail_resume: bool,
    fail_start: bool,
    fail_release: bool,
    fail_free: bool,
}

/// Engine that records every call. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    log: Rc<RefCell<EngineLog>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().calls.clone()
    }

    pub fn started(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Start { voice, .. } => Some(voice),
                _ => None,
            })
            .collect()
    }

    pub fn freed(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Free(voice) => Some(voice),
                _ => None,
            })
            .collect()
    }

    pub fn fail_resume(&self, fail: bool) {
        self.log.borrow_mut().fail_resume = fail;
    }

    pub fn fail_start(&self, fail: bool) {
        self.log.borrow_mut().fail_start = fail;
    }

    pub fn fail_release(&self, fail: bool) {
        self.log.borrow_mut().fail_release = fail;
    }

    pub fn fail_free(&self, fail: bool) {
        self.log.borrow_mut().fail_free = fail;
    }
}

impl AudioEngine for MockEngine {
    type Voice = MockVoice;

    fn resume(&mut self) -> Result<(), EngineError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Resume);
        if log.fail_resume {
            return Err(EngineError::Stream("suspended".to_string()));
        }
        Ok(())
    }

    fn start_voice(&mut self, frequency: f32) -> Result<MockVoice, EngineError> {
        let mut log = self.log.borrow_mut();
        if log.fail_start {
            return Err(EngineError::VoiceLimit(0));
        }
        let voice = log.next_voice;
        log.next_voice += 1;
        log.calls.push(Call::Start { voice, frequency });
        Ok(MockVoice {
            id: voice,
            log: Rc::clone(&self.log),
        })
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), EngineError> {
        self.log.borrow_mut().calls.push(Call::SetVolume(volume));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().calls.push(Call::Shutdown);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockVoice {
    pub id: u64,
    log: Rc<RefCell<EngineLog>>,
}

impl VoiceHandle for MockVoice {
    fn release(&self) -> Result<(), EngineError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Release(self.id));
        if log.fail_release {
            return Err(EngineError::Disconnected);
        }
        Ok(())
    }

    fn disconnect_and_free(self) -> Result<(), EngineError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Free(self.id));
        if log.fail_free {
            return Err(EngineError::Disconnected);
        }
        Ok(())
    }
}

pub fn manager(engine: &MockEngine, clock: &ManualClock) -> VoiceManager<MockEngine, ManualClock> {
    VoiceManager::with_clock(
        NoteCatalog::two_row_layout(),
        Some(engine.clone()),
        &SynthConfig::default(),
        clock.clone(),
    )
}
