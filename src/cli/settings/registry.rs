//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    audio_backend_handler, backend_handler, base_url_handler, default_model_handler,
    text_handlers, DefaultProviderHandler, LanguagesHandler, SilenceDurationHandler,
    SilenceThresholdHandler,
};
use super::SettingHandler;

pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `lingo set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(DefaultProviderHandler));
        registry.register(Box::new(default_model_handler()));
        registry.register(Box::new(backend_handler()));
        registry.register(Box::new(audio_backend_handler()));
        for handler in text_handlers() {
            registry.register(Box::new(handler));
        }
        registry.register(Box::new(LanguagesHandler));
        registry.register(Box::new(base_url_handler()));
        registry.register(Box::new(SilenceThresholdHandler));
        registry.register(Box::new(SilenceDurationHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
