//! The OTEL-shaped log record and its self-serialization (spec.md §3, §4.2).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, ser::SerializeMap};

/// Severity level. Ordinal order matches spec.md §3 and is used both for
/// `severity_number` and for `Logger::is_enabled` filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Numeric ordinal used as `severity_number` on the wire.
    pub fn ordinal(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Information => 2,
            LogLevel::Warning => 3,
            LogLevel::Error => 4,
            LogLevel::Critical => 5,
        }
    }

    /// Upper-case name used as `severity_text` on the wire.
    pub fn as_upper_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Information => "INFORMATION",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Information
    }
}

/// A recursive, depth-bounded rendering of an exception and its causes.
///
/// Cyclic cause chains are broken at a depth bound (spec.md §3, §9: ≥ 32)
/// or on first repeat occurrence within the chain being built, whichever
/// comes first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerializedException {
    #[serde(rename = "type")]
    pub type_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_exceptions: Vec<SerializedException>,
}

/// Maximum depth of an inner-exception chain before truncation (spec.md §9).
pub const MAX_EXCEPTION_DEPTH: usize = 32;

impl SerializedException {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: None,
            inner_exceptions: Vec::new(),
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Build a chain from `self` followed by `causes`, breaking at
    /// [`MAX_EXCEPTION_DEPTH`] or when an already-seen `(type, message)` pair
    /// recurs (occurrence-set check for cycles).
    pub fn chain_from(
        mut self,
        causes: impl IntoIterator<Item = SerializedException>,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        seen.insert((self.type_name.clone(), self.message.clone()));

        let mut node = &mut self;
        for (depth, cause) in causes.into_iter().enumerate() {
            if depth + 1 >= MAX_EXCEPTION_DEPTH {
                break;
            }
            let key = (cause.type_name.clone(), cause.message.clone());
            if !seen.insert(key) {
                break;
            }
            node.inner_exceptions = vec![cause];
            node = node.inner_exceptions.last_mut().expect("just inserted");
        }
        self
    }

    /// Normalize the stack trace text into `Type.Method` frames with no
    /// file paths or line numbers, for stable fingerprinting (spec.md §4.3).
    pub fn normalized_frames(&self) -> Vec<String> {
        normalize_frames(self.stack_trace.as_deref().unwrap_or(""))
    }
}

/// Extract `Type.Method` tokens from a stack-trace line, stripping file
/// paths and line numbers. Lines are expected in the common
/// `at Namespace.Type.Method(args) in /path/file:line` or
/// `Type.Method` shape; anything not matching that is dropped.
pub(crate) fn normalize_frames(stack_trace: &str) -> Vec<String> {
    stack_trace
        .lines()
        .filter_map(|line| {
            let line = line.trim().trim_start_matches("at ").trim();
            if line.is_empty() {
                return None;
            }
            // Drop everything from the first '(' onward (args, "in <path>:<line>").
            let head = line.split('(').next().unwrap_or(line).trim();
            if head.is_empty() {
                None
            } else {
                Some(head.to_string())
            }
        })
        .collect()
}

/// The primary log record (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Stable fingerprint: exception hash if present, else body hash.
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub source: String,
    pub body: String,
    pub trace_id: String,
    pub span_id: String,
    pub correlation_id: String,
    pub application_id: String,
    pub component_id: String,
    pub deployment_id: String,
    pub environment: String,
    pub version: String,
    pub tags: BTreeMap<String, String>,
    pub exception: Option<SerializedException>,
    pub line_number: Option<u32>,
}

impl LogEvent {
    /// Serialize to the exact OTEL-shaped wire object from spec.md §4.2.
    pub fn to_wire_json(&self) -> Result<String, crate::error::Error> {
        crate::serializer::serialize(&WireEvent(self))
    }
}

struct WireEvent<'a>(&'a LogEvent);

impl Serialize for WireEvent<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let event = self.0;
        // Required keys are always present (spec.md §8 property 2); trace/span
        // are omitted when empty; attributes nests everything else and omits
        // null/empty entries.
        let mut fields = 4;
        if !event.trace_id.is_empty() {
            fields += 1;
        }
        if !event.span_id.is_empty() {
            fields += 1;
        }
        fields += 1; // attributes always present, possibly empty

        let mut map = serializer.serialize_map(Some(fields))?;
        let nanos = event
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| event.timestamp.timestamp() * 1_000_000_000);
        map.serialize_entry("timestamp", &nanos)?;
        map.serialize_entry("severity_text", event.level.as_upper_str())?;
        map.serialize_entry("severity_number", &event.level.ordinal())?;
        map.serialize_entry("body", &event.body)?;
        if !event.trace_id.is_empty() {
            map.serialize_entry("trace_id", &event.trace_id)?;
        }
        if !event.span_id.is_empty() {
            map.serialize_entry("span_id", &event.span_id)?;
        }
        map.serialize_entry("attributes", &Attributes(event))?;
        map.end()
    }
}

struct Attributes<'a>(&'a LogEvent);

impl Serialize for Attributes<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let event = self.0;
        let mut map = serializer.serialize_map(None)?;
        if !event.source.is_empty() {
            map.serialize_entry("source", &event.source)?;
        }
        if !event.correlation_id.is_empty() {
            map.serialize_entry("correlation_id", &event.correlation_id)?;
        }
        if let Some(exception) = &event.exception {
            map.serialize_entry("exception.type", &exception.type_name)?;
            map.serialize_entry("exception.message", &exception.message)?;
            if let Some(stack) = &exception.stack_trace {
                if !stack.is_empty() {
                    map.serialize_entry("exception.stacktrace", stack)?;
                }
            }
        }
        if !event.application_id.is_empty() {
            map.serialize_entry("application_id", &event.application_id)?;
        }
        if !event.component_id.is_empty() {
            map.serialize_entry("component_id", &event.component_id)?;
        }
        if !event.deployment_id.is_empty() {
            map.serialize_entry("deployment_id", &event.deployment_id)?;
        }
        if !event.environment.is_empty() {
            map.serialize_entry("environment", &event.environment)?;
        }
        if !event.version.is_empty() {
            map.serialize_entry("version", &event.version)?;
        }
        if let Some(line) = event.line_number {
            map.serialize_entry("line_number", &line)?;
        }
        for (key, value) in &event.tags {
            if !value.is_empty() {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_event() -> LogEvent {
        LogEvent {
            id: "abc".to_string(),
            timestamp: Utc::now(),
            level: LogLevel::Information,
            source: "Cat".to_string(),
            body: "hello".to_string(),
            trace_id: String::new(),
            span_id: String::new(),
            correlation_id: String::new(),
            application_id: String::new(),
            component_id: String::new(),
            deployment_id: String::new(),
            environment: String::new(),
            version: String::new(),
            tags: BTreeMap::new(),
            exception: None,
            line_number: None,
        }
    }

    #[test]
    fn s1_basic_info_log_shape() {
        let event = base_event();
        let json = event.to_wire_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["severity_text"], "INFORMATION");
        assert_eq!(value["body"], "hello");
        assert_eq!(value["attributes"]["source"], "Cat");
        assert!(value.get("exception.type").is_none());
        assert!(value.get("trace_id").is_none());
    }

    #[test]
    fn required_top_level_keys_always_present() {
        let event = base_event();
        let json = event.to_wire_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["timestamp", "severity_text", "severity_number", "body"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn empty_attributes_serializes_as_empty_object() {
        let event = base_event();
        let mut event = event;
        event.source = String::new();
        let json = event.to_wire_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["attributes"].is_object());
        assert_eq!(value["attributes"].as_object().unwrap().len(), 0);
    }

    #[test]
    fn exception_fields_nested_under_attributes() {
        let mut event = base_event();
        event.exception = Some(SerializedException::new("InvalidOperation", "fail"));
        let json = event.to_wire_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["attributes"]["exception.type"], "InvalidOperation");
        assert_eq!(value["attributes"]["exception.message"], "fail");
    }

    #[test]
    fn normalize_frames_strips_paths_and_args() {
        let trace = "at MyApp.Service.DoWork(Int32 x) in /src/service.cs:line 42\nat MyApp.Program.Main()";
        let frames = normalize_frames(trace);
        assert_eq!(frames, vec!["MyApp.Service.DoWork", "MyApp.Program.Main"]);
    }

    #[test]
    fn chain_from_breaks_on_cycle() {
        let root = SerializedException::new("A", "msg");
        let cause = SerializedException::new("A", "msg"); // identical -> cycle
        let chained = root.chain_from(vec![cause]);
        assert!(chained.inner_exceptions.is_empty());
    }

    #[test]
    fn chain_from_respects_depth_bound() {
        let root = SerializedException::new("Root", "m");
        let causes = (0..40).map(|i| SerializedException::new(format!("T{i}"), "m"));
        let chained = root.chain_from(causes);
        let mut depth = 0;
        let mut node = &chained;
        while let Some(inner) = node.inner_exceptions.first() {
            depth += 1;
            node = inner;
        }
        assert!(depth < MAX_EXCEPTION_DEPTH);
    }
}
