//! Process-wide JSON codec, initialized once with fixed options.
//!
//! Mirrors the once-initialized process state used elsewhere in this
//! codebase (`once_cell`-backed globals in `config`/`observability`):
//! `init` is idempotent after the first successful call, and all other
//! components in this crate go through [`serialize`]/[`deserialize`]
//! rather than calling `serde_json` directly, so serializer options stay
//! in one place.

use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Error;

/// Fixed serializer options. Matches spec.md §4.1: compact by default, UTF-8.
/// Unlike a host with a global "omit nulls" switch, `serde_json` has no
/// process-wide ignore-condition knob; the omit-when-null behavior spec.md
/// §4.2 requires is instead implemented per-type via `#[serde(skip_serializing_if)]`
/// (see `LogEvent`'s custom `Serialize` impl), matching the `IgnoreCondition`
/// setting's *effect* without a global hook `serde_json` doesn't expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializerOptions {
    pub write_indented: bool,
    pub unsafe_relaxed_json_escaping: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            write_indented: false,
            unsafe_relaxed_json_escaping: false,
        }
    }
}

static OPTIONS: Lazy<RwLock<Option<SerializerOptions>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the shared serializer. Idempotent for the options it was
/// first initialized with: a later call passing the same options is a
/// no-op success, matching spec.md §4.1 ("Re-initialization attempts after
/// first successful init are a no-op"). A later call passing *different*
/// options is the misconfiguration spec.md §6/§7 calls out as fatal and
/// surfaces as `Error::Initialization`.
pub fn init(options: SerializerOptions) -> Result<(), Error> {
    let mut guard = OPTIONS.write().expect("serializer options lock poisoned");
    match *guard {
        Some(existing) if existing == options => Ok(()),
        Some(_existing) => Err(Error::Initialization(
            "serializer already initialized with incompatible options".to_string(),
        )),
        None => {
            *guard = Some(options);
            Ok(())
        }
    }
}

fn options() -> SerializerOptions {
    OPTIONS
        .read()
        .expect("serializer options lock poisoned")
        .unwrap_or_default()
}

/// Test-only reset hook (spec.md §9: "Tests require a reset hook gated to
/// test builds only"), so one test's `init` call can't leak into another's.
#[cfg(test)]
pub(crate) fn reset_for_test() {
    *OPTIONS.write().expect("serializer options lock poisoned") = None;
}

/// Serialize a value with the shared options.
pub fn serialize<T: Serialize>(value: &T) -> Result<String, Error> {
    let opts = options();
    if opts.write_indented {
        serde_json::to_string_pretty(value).map_err(Into::into)
    } else {
        serde_json::to_string(value).map_err(Into::into)
    }
}

/// Deserialize a value with the shared options. Malformed input fails with
/// a distinct `Error::Serialization`, never a panic.
pub fn deserialize<T: DeserializeOwned>(input: &str) -> Result<T, Error> {
    serde_json::from_str(input).map_err(Into::into)
}
