//! `LoggerProvider`: one destination (publisher + optional analyzer) a
//! [`super::LoggerFactory`] can register (spec.md §4.10).

use std::sync::Arc;

use crate::{analyzer::FaultAnalyzer, publisher::Publisher, settings::Settings};

use super::logger::Logger;

/// A single log destination: the settings snapshot, publisher, and
/// optional fault analyzer a category's [`Logger`] is built from.
///
/// Identity for `LoggerFactory::add_provider` dedup is the `Arc` pointer,
/// preferring reference identity over a hand-rolled id field wherever the
/// type is already behind an `Arc`.
pub struct LoggerProvider {
    settings: Settings,
    publisher: Arc<dyn Publisher>,
    analyzer: Option<Arc<FaultAnalyzer>>,
}

impl LoggerProvider {
    pub fn new(
        settings: Settings,
        publisher: Arc<dyn Publisher>,
        analyzer: Option<Arc<FaultAnalyzer>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            settings,
            publisher,
            analyzer,
        })
    }

    pub fn create_logger(&self, category: impl Into<String>) -> Logger {
        Logger::new(category, &self.settings, self.publisher.clone(), self.analyzer.clone())
    }

    pub(super) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(super) fn publisher(&self) -> Arc<dyn Publisher> {
        self.publisher.clone()
    }

    pub(super) fn analyzer(&self) -> Option<Arc<FaultAnalyzer>> {
        self.analyzer.clone()
    }
}
