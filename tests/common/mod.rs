//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use restroute::lifecycle::Lifecycle;
use restroute::routing::{Handler, HandlerError, Scorer};
use restroute::{Request, Response};

/// Event log shared by recorders.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Handler that records its calls and lifecycle hooks, and answers with its
/// name.
pub struct Recorder {
    name: String,
    log: Log,
    calls: AtomicUsize,
    fail_start: bool,
}

impl Recorder {
    pub fn new(name: &str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            calls: AtomicUsize::new(0),
            fail_start: false,
        })
    }

    /// Recorder whose start hook fails.
    pub fn failing(name: &str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            calls: AtomicUsize::new(0),
            fail_start: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, event: &str) {
        self.log.lock().unwrap().push(format!("{event}:{}", self.name));
    }
}

#[async_trait]
impl Handler for Recorder {
    async fn handle(&self, _request: &mut Request, response: &mut Response) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record("handle");
        response.set_entity(self.name.clone(), Some("text/plain"));
        Ok(())
    }

    fn lifecycle(&self) -> Option<&dyn Lifecycle> {
        Some(self)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Lifecycle for Recorder {
    async fn start(&self) -> Result<(), HandlerError> {
        if self.fail_start {
            return Err(format!("{} refused to start", self.name).into());
        }
        self.record("start");
        Ok(())
    }

    async fn stop(&self) -> Result<(), HandlerError> {
        self.record("stop");
        Ok(())
    }
}

/// Scorer that only qualifies from its `qualify_on`-th read onwards.
pub struct EventuallyScorer {
    reads: AtomicUsize,
    qualify_on: usize,
}

impl EventuallyScorer {
    pub fn new(qualify_on: usize) -> Self {
        Self {
            reads: AtomicUsize::new(0),
            qualify_on,
        }
    }
}

impl Scorer for EventuallyScorer {
    fn score(&self, _request: &Request, _response: &Response) -> f32 {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if read >= self.qualify_on {
            1.0
        } else {
            0.0
        }
    }
}
