//! Application state management
use cookiegate_core::{Config, Engine, HeaderJar, RecordingTagManager, Result, SignalCall};
use std::sync::Arc;

/// One request's worth of engine, cookie jar and recorded signals
pub struct AppState {
    engine: Engine,
    jar: Arc<HeaderJar>,
    tag_manager: Arc<RecordingTagManager>,
    needs_prompt: bool,
}

impl AppState {
    /// Open the engine and run load-and-enforce before any command
    pub fn open(config: Config, cookie_header: &str) -> Result<Self> {
        let jar = Arc::new(HeaderJar::from_header(cookie_header));
        let tag_manager = Arc::new(RecordingTagManager::new());

        let engine = Engine::open(config, jar.clone(), Some(tag_manager.clone()))?;
        let needs_prompt = engine.initialize();

        Ok(Self {
            engine,
            jar,
            tag_manager,
            needs_prompt,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Prompt state as found at startup
    pub fn needed_prompt(&self) -> bool {
        self.needs_prompt
    }

    /// Deletion headers issued so far, in issue order
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.jar.set_cookie_headers()
    }

    pub fn take_signals(&self) -> Vec<SignalCall> {
        self.tag_manager.take()
    }
}
