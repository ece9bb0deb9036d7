//! The fault-analysis side-channel (spec.md §4.8).
//!
//! Dedup-by-fingerprint, call the chat-completion client, cache the
//! response, and emit a diagnostic [`LogEvent`]. Fire-and-forget from the
//! Logger's perspective: scheduled onto a bounded task pool sized to the
//! bulkhead's concurrency limit, the way `dlq::worker` schedules background
//! work off the request path, so a burst of exceptions drops analysis
//! tasks rather than blocking or dropping logs (spec.md §9 design note).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::{
    cache::{Cache, CacheExt},
    chat::{ChatClient, ChatMessage, ChatResponse},
    event::{LogEvent, LogLevel},
    fingerprint::ExceptionFingerprint,
    publisher::Publisher,
};

const CACHE_PREFIX: &str = "fault";
const ANALYZER_SOURCE: &str = "FaultAnalyzer";

/// Identity attributes stamped onto diagnostic records, mirroring the
/// originating event's deployment identity.
#[derive(Debug, Clone, Default)]
pub struct EventIdentity {
    pub application_id: String,
    pub component_id: String,
    pub deployment_id: String,
    pub environment: String,
    pub version: String,
}

pub struct FaultAnalyzer {
    cache: Arc<dyn Cache>,
    chat_client: Arc<ChatClient>,
    publisher: Arc<dyn Publisher>,
    identity: EventIdentity,
    in_flight: Arc<Semaphore>,
}

impl FaultAnalyzer {
    /// `max_concurrent_tasks` should match the resilience pipeline's
    /// bulkhead `max_concurrent` so the analyzer never queues more parallel
    /// calls than the HTTP layer will admit.
    pub fn new(
        cache: Arc<dyn Cache>,
        chat_client: Arc<ChatClient>,
        publisher: Arc<dyn Publisher>,
        identity: EventIdentity,
        max_concurrent_tasks: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            cache,
            chat_client,
            publisher,
            identity,
            in_flight: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
        })
    }

    /// Fire-and-forget entry point: spawns the analysis pipeline off the
    /// caller's thread. If the bounded task pool is saturated, the task is
    /// dropped rather than queued (spec.md §9).
    pub fn submit(self: &Arc<Self>, event: LogEvent) {
        let Ok(permit) = self.in_flight.clone().try_acquire_owned() else {
            tracing::debug!(fingerprint = %event.id, "fault analysis task pool saturated, dropping");
            return;
        };
        let this = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            this.analyze_event(&event).await;
        });
    }

    /// Run the dedup → chat-completion → cache → emit pipeline for a single
    /// exception-bearing event. Returns `true` on a successful hit or
    /// successful new analysis, `false` if analysis ultimately failed (the
    /// failure diagnostic is still emitted; this never propagates to the
    /// caller).
    pub async fn analyze_event(&self, event: &LogEvent) -> bool {
        let Some(exception) = &event.exception else {
            return false;
        };
        let cache_key = crate::cache::keys::derive(CACHE_PREFIX, &event.id, None);

        if let Ok(Some(cached)) = self.cache.try_get::<ChatResponse>(&cache_key).await {
            self.emit_cached_hit(event, &cached).await;
            return true;
        }

        let messages = vec![
            ChatMessage::system("You are a debugging assistant for stack traces"),
            ChatMessage::user(exception.stack_trace.clone().unwrap_or_default()),
        ];

        match self.analyze_messages(messages).await {
            Ok(response) => {
                let _ = self
                    .cache
                    .create_entry(&cache_key, &response, None)
                    .await;
                self.emit_success(event, &response).await;
                true
            }
            Err(err) => {
                self.emit_failure(event, &err).await;
                false
            }
        }
    }

    /// Direct chat-completion call, exposed separately per spec.md §4.8's
    /// `analyze(messages) -> ChatResponse` signature.
    pub async fn analyze_messages(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, crate::error::Error> {
        self.chat_client.complete(messages).await
    }

    async fn emit_cached_hit(&self, event: &LogEvent, cached: &ChatResponse) {
        let body = crate::serializer::serialize(&cached.choices)
            .unwrap_or_else(|_| "[]".to_string());
        self.dispatch(event, LogLevel::Debug, format!("cached analysis found: {body}"))
            .await;
    }

    async fn emit_success(&self, event: &LogEvent, response: &ChatResponse) {
        let body = crate::serializer::serialize(&response.choices)
            .unwrap_or_else(|_| "[]".to_string());
        self.dispatch(event, LogLevel::Information, body).await;
    }

    async fn emit_failure(&self, event: &LogEvent, err: &crate::error::Error) {
        self.dispatch(
            event,
            LogLevel::Error,
            format!("Exception during fault analysis: {err}"),
        )
        .await;
    }

    async fn dispatch(&self, origin: &LogEvent, level: LogLevel, body: String) {
        let diagnostic = LogEvent {
            id: ExceptionFingerprint::compute_body(&body),
            timestamp: Utc::now(),
            level,
            source: ANALYZER_SOURCE.to_string(),
            body,
            trace_id: origin.trace_id.clone(),
            span_id: origin.span_id.clone(),
            correlation_id: origin.correlation_id.clone(),
            application_id: self.identity.application_id.clone(),
            component_id: self.identity.component_id.clone(),
            deployment_id: self.identity.deployment_id.clone(),
            environment: self.identity.environment.clone(),
            version: self.identity.version.clone(),
            tags: Default::default(),
            exception: None,
            line_number: None,
        };
        match diagnostic.to_wire_json() {
            Ok(json) => self.publisher.write_line(&json).await,
            Err(err) => tracing::warn!(error = %err, "failed to serialize fault-analysis diagnostic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::method,
    };

    use crate::{
        cache::TwoTierCache,
        event::SerializedException,
        resilience::{ResilientHttp, ResilientHttpConfig, RetryPolicy},
        settings::ChatSettings,
    };

    use super::*;

    struct RecordingPublisher {
        lines: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Publisher for RecordingPublisher {
        async fn write(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
        async fn write_line(&self, message: &str) {
            self.lines.lock().unwrap().push(message.to_string());
        }
    }

    fn exception_event(id: &str) -> LogEvent {
        LogEvent {
            id: id.to_string(),
            timestamp: Utc::now(),
            level: LogLevel::Error,
            source: "Cat".to_string(),
            body: "boom".to_string(),
            trace_id: String::new(),
            span_id: String::new(),
            correlation_id: String::new(),
            application_id: String::new(),
            component_id: String::new(),
            deployment_id: String::new(),
            environment: String::new(),
            version: String::new(),
            tags: Default::default(),
            exception: Some(
                SerializedException::new("InvalidOperation", "fail")
                    .with_stack_trace("at A.B()"),
            ),
            line_number: None,
        }
    }

    async fn analyzer_for(server: &MockServer, publisher: Arc<RecordingPublisher>) -> Arc<FaultAnalyzer> {
        let resilience = Arc::new(ResilientHttp::new(ResilientHttpConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                ..RetryPolicy::default()
            },
            bulkhead_enabled: false,
            ..ResilientHttpConfig::default()
        }));
        let chat_client = Arc::new(ChatClient::new(
            reqwest::Client::new(),
            ChatSettings {
                api_key: "k".to_string(),
                base_address: server.uri(),
                endpoint: "/chat".to_string(),
                model: "m".to_string(),
            },
            resilience,
        ));
        let cache: Arc<dyn Cache> = Arc::new(TwoTierCache::memory_only());
        FaultAnalyzer::new(cache, chat_client, publisher, EventIdentity::default(), 10)
    }

    #[tokio::test]
    async fn s5_success_emits_diagnostic_with_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c1", "model": "m",
                "choices": [{"message": {"role": "assistant", "content": "try X"}}]
            })))
            .mount(&server)
            .await;
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let analyzer = analyzer_for(&server, publisher.clone()).await;

        let ok = analyzer.analyze_event(&exception_event("fp-1")).await;
        assert!(ok);
        let lines = publisher.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("try X"));
    }

    #[tokio::test]
    async fn s6_failure_after_retries_emits_failure_diagnostic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let analyzer = analyzer_for(&server, publisher.clone()).await;

        let ok = analyzer.analyze_event(&exception_event("fp-2")).await;
        assert!(!ok);
        let lines = publisher.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert!(parsed["body"].as_str().unwrap().starts_with("Exception during fault analysis"));
    }

    #[tokio::test]
    async fn s7_dedup_second_call_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c1", "model": "m",
                "choices": [{"message": {"role": "assistant", "content": "try X"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let analyzer = analyzer_for(&server, publisher.clone()).await;

        let event = exception_event("fp-3");
        assert!(analyzer.analyze_event(&event).await);
        assert!(analyzer.analyze_event(&event).await);

        let lines = publisher.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert!(second["body"].as_str().unwrap().contains("cached analysis found"));
    }

    #[tokio::test]
    async fn submit_is_fire_and_forget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c1", "model": "m",
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .mount(&server)
            .await;
        let publisher = Arc::new(RecordingPublisher { lines: Mutex::new(Vec::new()) });
        let analyzer = analyzer_for(&server, publisher.clone()).await;

        analyzer.submit(exception_event("fp-4"));

        for _ in 0..200 {
            if !publisher.lines.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(publisher.lines.lock().unwrap().len(), 1);
    }
}
