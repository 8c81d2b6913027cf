//! Scripted in-memory capability provider for executor tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use flowhand::capability::{BrowserSession, SessionFactory};
use flowhand::core::{FlowError, Result};
use flowhand::workflow::{ExtractSchema, ExtractionResult};

/// A dispatched capability call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Act(String),
    Extract(String),
}

/// How a scripted dispatch fails
#[derive(Debug, Clone)]
pub enum Fault {
    Navigation(String),
    Action(String),
    Extraction(String),
    /// A provider error outside the step taxonomy
    Untyped(String),
    /// The browser binary disappeared mid-run
    MissingBrowser,
    Panic,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub opens: usize,
    pub closes: usize,
    pub calls: Vec<Call>,
}

#[derive(Default)]
struct Script {
    faults: HashMap<usize, Fault>,
    extractions: HashMap<usize, Value>,
    fail_open: bool,
    fail_close: bool,
}

/// Factory whose sessions follow a script keyed by dispatch index
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    recorded: Arc<Mutex<Recorded>>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(self, dispatch: usize, fault: Fault) -> Self {
        self.script.lock().unwrap().faults.insert(dispatch, fault);
        self
    }

    pub fn extract_at(self, dispatch: usize, data: Value) -> Self {
        self.script.lock().unwrap().extractions.insert(dispatch, data);
        self
    }

    pub fn fail_open(self) -> Self {
        self.script.lock().unwrap().fail_open = true;
        self
    }

    pub fn fail_close(self) -> Self {
        self.script.lock().unwrap().fail_close = true;
        self
    }

    pub fn opens(&self) -> usize {
        self.recorded.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.recorded.lock().unwrap().closes
    }

    pub fn calls(&self) -> Vec<Call> {
        self.recorded.lock().unwrap().calls.clone()
    }

    pub fn shared(&self) -> Arc<dyn SessionFactory> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if self.script.lock().unwrap().fail_open {
            return Err(FlowError::session("remote browser refused the connection"));
        }
        self.recorded.lock().unwrap().opens += 1;
        Ok(Box::new(ScriptedSession {
            factory: self.clone(),
            closed: false,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedSession {
    factory: ScriptedFactory,
    closed: bool,
}

impl ScriptedSession {
    /// Record the call and return its dispatch index
    fn record(&self, call: Call) -> usize {
        let mut recorded = self.factory.recorded.lock().unwrap();
        recorded.calls.push(call);
        recorded.calls.len() - 1
    }

    fn fault(&self, index: usize) -> Result<()> {
        let fault = self.factory.script.lock().unwrap().faults.get(&index).cloned();
        match fault {
            None => Ok(()),
            Some(Fault::Navigation(m)) => Err(FlowError::navigation(m)),
            Some(Fault::Action(m)) => Err(FlowError::action(m)),
            Some(Fault::Extraction(m)) => Err(FlowError::extraction(m)),
            Some(Fault::Untyped(m)) => Err(FlowError::browser(m)),
            Some(Fault::MissingBrowser) => Err(FlowError::AgentBrowserNotFound),
            Some(Fault::Panic) => panic!("scripted panic at dispatch {}", index),
        }
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let index = self.record(Call::Navigate(url.to_string()));
        self.fault(index)
    }

    async fn act(&mut self, description: &str) -> Result<()> {
        let index = self.record(Call::Act(description.to_string()));
        self.fault(index)
    }

    async fn extract(
        &mut self,
        instruction: &str,
        schema: &ExtractSchema,
    ) -> Result<ExtractionResult> {
        let index = self.record(Call::Extract(instruction.to_string()));
        self.fault(index)?;
        let data = self
            .factory
            .script
            .lock()
            .unwrap()
            .extractions
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        schema.coerce(data)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.factory.recorded.lock().unwrap().closes += 1;
        if self.factory.script.lock().unwrap().fail_close {
            return Err(FlowError::browser("browser already gone"));
        }
        Ok(())
    }
}
