//! Voice-command dispatch table.
//!
//! Commands are named actions delivered by an external speech recognizer;
//! they only toggle visualization and never touch the pipeline's numerical
//! state.

use std::collections::HashMap;

/// String-keyed lookup from command phrase to action
#[derive(Default)]
pub struct CommandDispatcher {
    actions: HashMap<String, Box<dyn FnMut() + Send>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under a command phrase
    pub fn register<F: FnMut() + Send + 'static>(&mut self, phrase: &str, action: F) {
        self.actions.insert(phrase.to_string(), Box::new(action));
    }

    /// Invoke the action registered for a phrase; returns false when the
    /// phrase is unknown
    pub fn dispatch(&mut self, phrase: &str) -> bool {
        match self.actions.get_mut(phrase) {
            Some(action) => {
                action();
                true
            }
            None => {
                log::debug!("Unrecognized command: {phrase}");
                false
            }
        }
    }

    /// Registered command phrases
    pub fn phrases(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }
}
