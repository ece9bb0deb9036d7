//! `LoggerFactory`: registry of providers plus a `category -> Logger`
//! cache, guaranteeing one [`Logger`] per category (spec.md §4.10).

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;

use crate::settings::Settings;

use super::{logger::Logger, provider::LoggerProvider};

pub struct LoggerFactory {
    providers: Mutex<Vec<Arc<LoggerProvider>>>,
    loggers: DashMap<String, Arc<Logger>>,
    disposed: AtomicBool,
}

impl LoggerFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            providers: Mutex::new(Vec::new()),
            loggers: DashMap::new(),
            disposed: AtomicBool::new(false),
        })
    }

    /// Register a provider. Deduplicated by `Arc` identity: registering the
    /// same provider twice is a no-op.
    pub fn add_provider(&self, provider: Arc<LoggerProvider>) {
        let mut providers = self.providers.lock().unwrap();
        if providers.iter().any(|existing| Arc::ptr_eq(existing, &provider)) {
            return;
        }
        providers.push(provider);
    }

    /// Build or retrieve the cached logger for `category`. With more than
    /// one registered provider, the category's records fan out to every
    /// provider's publisher; the first provider carrying a fault analyzer
    /// supplies it (a process is expected to run a single analyzer
    /// instance, spec.md §9). With zero providers registered, falls back
    /// to a default console destination so a factory is usable without
    /// explicit setup (spec.md §9 "defaults supplied").
    pub fn create_logger(&self, category: impl Into<String>) -> Arc<Logger> {
        let category = category.into();
        if let Some(existing) = self.loggers.get(&category) {
            return existing.clone();
        }

        let providers = self.providers.lock().unwrap();
        let logger = if providers.is_empty() {
            Logger::new(
                category.clone(),
                &Settings::default(),
                crate::publisher::console(Duration::from_millis(100)),
                None,
            )
        } else {
            let publishers = providers.iter().map(|p| p.publisher()).collect();
            let analyzer = providers.iter().find_map(|p| p.analyzer());
            Logger::with_publishers(category.clone(), providers[0].settings(), publishers, analyzer)
        };

        let logger = Arc::new(logger);
        self.loggers.insert(category, logger.clone());
        logger
    }

    /// Dispose providers in registration order and clear the logger cache.
    /// Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.providers.lock().unwrap().clear();
        self.loggers.clear();
    }
}
