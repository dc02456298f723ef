//! One-shot prompt code handoff.
//!
//! A prompt code selects a server-side prompt template for a single
//! exchange. Codes are staged under a key and consumed on first read, so a
//! template never leaks into the following exchange.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct PromptCodeStore {
    codes: Mutex<HashMap<String, String>>,
}

impl PromptCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a prompt code under `key`, replacing any previous one.
    pub fn put(&self, key: &str, code: &str) {
        self.lock().insert(key.to_string(), code.to_string());
    }

    /// Consume the code staged under `key`, if any. Read-then-delete: a
    /// second take for the same key returns `None`.
    pub fn take(&self, key: &str) -> Option<String> {
        self.lock().remove(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.codes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
