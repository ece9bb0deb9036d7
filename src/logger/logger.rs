//! The per-category logger (spec.md §4.9).

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    analyzer::FaultAnalyzer,
    error::Error,
    event::{LogEvent, LogLevel, SerializedException},
    fingerprint::ExceptionFingerprint,
    publisher::Publisher,
    settings::Settings,
};

use super::scope::{self, ScopeGuard};

/// Identity and filter state baked in at construction; a fresh snapshot of
/// [`Settings`] rather than a live binding, so a logger's behavior doesn't
/// shift under a caller mutating settings after the fact.
pub struct Logger {
    category: String,
    min_level: LogLevel,
    logging_enabled: bool,
    fault_service_enabled: bool,
    application_id: String,
    component_id: String,
    deployment_id: String,
    environment: String,
    version: String,
    /// One entry per registered provider; a category with several
    /// providers fans its records out to all of them (spec.md §4.10).
    publishers: Vec<Arc<dyn Publisher>>,
    analyzer: Option<Arc<FaultAnalyzer>>,
}

impl Logger {
    pub fn new(
        category: impl Into<String>,
        settings: &Settings,
        publisher: Arc<dyn Publisher>,
        analyzer: Option<Arc<FaultAnalyzer>>,
    ) -> Self {
        Self::with_publishers(category, settings, vec![publisher], analyzer)
    }

    pub fn with_publishers(
        category: impl Into<String>,
        settings: &Settings,
        publishers: Vec<Arc<dyn Publisher>>,
        analyzer: Option<Arc<FaultAnalyzer>>,
    ) -> Self {
        Self {
            category: category.into(),
            min_level: settings.min_log_level,
            logging_enabled: settings.logging_enabled,
            fault_service_enabled: settings.fault_service_enabled,
            application_id: settings.application_id.clone(),
            component_id: settings.component_id.clone(),
            deployment_id: settings.deployment_id.clone(),
            environment: settings.environment.clone(),
            version: settings.version.clone(),
            publishers,
            analyzer,
        }
    }

    /// `level >= minLevel ∧ loggingEnabled` (spec.md §4.9, §8 property 4).
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.logging_enabled && level >= self.min_level
    }

    /// Push a scope onto the current thread's stack; popped when the
    /// returned guard drops.
    pub fn begin_scope(&self, state: impl Into<String>) -> ScopeGuard {
        scope::begin_scope(state)
    }

    /// Build and dispatch a record. No-op if `level` is below the
    /// configured filter. Never propagates a failure to the caller: any
    /// error during construction or dispatch is caught and, where
    /// possible, reported as a best-effort internal error record.
    pub async fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        exception: Option<SerializedException>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        if let Err(err) = self.log_inner(level, message.into(), exception).await {
            self.emit_internal_error(err).await;
        }
    }

    async fn log_inner(
        &self,
        level: LogLevel,
        message: String,
        exception: Option<SerializedException>,
    ) -> Result<(), Error> {
        let body = format!("{}{message}", scope::capture_prefix());
        let (trace_id, span_id, correlation_id) = resolve_correlation();

        let id = match &exception {
            Some(exc) => ExceptionFingerprint::compute(exc),
            None => ExceptionFingerprint::compute_body(&body),
        };

        let event = LogEvent {
            id,
            timestamp: Utc::now(),
            level,
            source: self.category.clone(),
            body,
            trace_id,
            span_id,
            correlation_id,
            application_id: self.application_id.clone(),
            component_id: self.component_id.clone(),
            deployment_id: self.deployment_id.clone(),
            environment: self.environment.clone(),
            version: self.version.clone(),
            tags: Default::default(),
            exception,
            line_number: None,
        };

        if event.exception.is_some() && self.fault_service_enabled {
            if let Some(analyzer) = &self.analyzer {
                analyzer.submit(event.clone());
            }
        }

        let wire = event.to_wire_json()?;
        for publisher in &self.publishers {
            publisher.write_line(&wire).await;
        }
        Ok(())
    }

    /// Best-effort internal error record (spec.md §4.9 error policy). This
    /// bypasses fault analysis entirely: it is the crate reporting on
    /// itself, not a record eligible for re-analysis.
    async fn emit_internal_error(&self, err: Error) {
        let body = format!("internal logging error: {err}");
        let event = LogEvent {
            id: ExceptionFingerprint::compute_body(&body),
            timestamp: Utc::now(),
            level: LogLevel::Error,
            source: self.category.clone(),
            body,
            trace_id: String::new(),
            span_id: String::new(),
            correlation_id: String::new(),
            application_id: self.application_id.clone(),
            component_id: self.component_id.clone(),
            deployment_id: self.deployment_id.clone(),
            environment: self.environment.clone(),
            version: self.version.clone(),
            tags: Default::default(),
            exception: None,
            line_number: None,
        };
        match event.to_wire_json() {
            Ok(wire) => {
                for publisher in &self.publishers {
                    publisher.write_line(&wire).await;
                }
            }
            Err(err) => tracing::error!(error = %err, "logger failed to report its own internal error"),
        }
    }
}

/// Resolve trace/span identity from the ambient tracing span, falling back
/// to a synthesized correlation id when no span is active (spec.md §4.9
/// step 4).
fn resolve_correlation() -> (String, String, String) {
    let span = tracing::Span::current();
    if let Some(id) = span.id() {
        (String::new(), id.into_u64().to_string(), String::new())
    } else {
        (String::new(), String::new(), Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct RecordingPublisher {
        lines: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn write(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
        async fn write_line(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    fn logger_with(settings: Settings, publisher: Arc<RecordingPublisher>) -> Logger {
        Logger::new("Cat", &settings, publisher, None)
    }

    #[tokio::test]
    async fn s1_basic_info_log() {
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let logger = logger_with(Settings::default(), publisher.clone());

        logger.log(LogLevel::Information, "hello", None).await;

        let lines = publisher.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["severity_text"], "INFORMATION");
        assert_eq!(value["body"], "hello");
        assert_eq!(value["attributes"]["source"], "Cat");
    }

    #[tokio::test]
    async fn s2_below_threshold_emits_nothing() {
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let logger = logger_with(Settings::default(), publisher.clone());

        logger.log(LogLevel::Debug, "quiet", None).await;

        assert!(publisher.lines.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn s3_scoped_log_prefixes_body() {
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let logger = logger_with(Settings::default(), publisher.clone());

        let outer = logger.begin_scope("Scope 1");
        let inner = logger.begin_scope("Scope 2");
        logger.log(LogLevel::Information, "inner", None).await;
        drop(inner);
        drop(outer);

        let lines = publisher.lines.lock().unwrap();
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["body"], "[Scopes: Scope 1 | Scope 2] inner");
    }

    #[tokio::test]
    async fn s4_exception_without_analyzer_still_logs() {
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let mut settings = Settings::default();
        settings.fault_service_enabled = false;
        let logger = logger_with(settings, publisher.clone());

        let exception = SerializedException::new("InvalidOperation", "fail");
        logger.log(LogLevel::Error, "boom", Some(exception)).await;

        let lines = publisher.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["attributes"]["exception.type"], "InvalidOperation");
        assert_eq!(value["attributes"]["exception.message"], "fail");
    }
}
