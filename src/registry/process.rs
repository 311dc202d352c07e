// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::traits::ModuleId;

/// Process identifier.
///
/// Allocated from a monotonic counter and rendered as 16 lowercase hex digits,
/// so a pid is never reissued for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u64);

impl Pid {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Error for strings that are not a well-formed pid
#[derive(Debug, Clone, PartialEq)]
pub struct ParsePidError(pub String);

impl fmt::Display for ParsePidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed process id '{}'", self.0)
    }
}

impl std::error::Error for ParsePidError {}

impl FromStr for Pid {
    type Err = ParsePidError;

    /// Accepts only the `Display` form: exactly 16 lowercase hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.len() == 16
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !canonical {
            return Err(ParsePidError(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(Pid)
            .map_err(|_| ParsePidError(s.to_string()))
    }
}

impl Serialize for Pid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a process.
///
/// `Running` and `Suspended` are live; `Completed` and `Failed` are terminal and
/// final: once a process enters one of them nothing about it changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    Running,
    Suspended,
    Completed,
    Failed,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Completed | ProcessState::Failed)
    }
}

/// Point-in-time view of a process: its state, value and revision plus the
/// identity fields needed to interpret them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pid: Pid,
    pub mid: ModuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub state: ProcessState,
    pub value: Option<Value>,
    pub revision: u64,
    pub created_at_ms: u64,
}

impl Snapshot {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pid_round_trips_through_display() {
        let pid = Pid::from_raw(0xabc);
        let rendered = pid.to_string();
        assert_eq!(rendered, "0000000000000abc");
        assert_eq!(rendered.parse::<Pid>().unwrap(), pid);
        assert_eq!("ffffffffffffffff".parse::<Pid>().unwrap(), Pid::from_raw(u64::MAX));
    }

    #[test]
    fn test_pid_has_one_text_form() {
        for alias in ["+1", "1", "01", "abc", "+000000000000001", "000000000000000A"] {
            assert!(alias.parse::<Pid>().is_err(), "{} should not parse", alias);
        }
        assert_eq!("0000000000000001".parse::<Pid>().unwrap(), Pid::from_raw(1));
    }

    #[test]
    fn test_pid_rejects_garbage() {
        assert!("".parse::<Pid>().is_err());
        assert!("not-a-pid".parse::<Pid>().is_err());
        assert!("00000000000000001".parse::<Pid>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ProcessState::Running.is_terminal());
        assert!(!ProcessState::Suspended.is_terminal());
        assert!(ProcessState::Completed.is_terminal());
        assert!(ProcessState::Failed.is_terminal());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = Snapshot {
            pid: Pid::from_raw(1),
            mid: ModuleId::from("m1"),
            name: None,
            state: ProcessState::Completed,
            value: Some(json!(42)),
            revision: 3,
            created_at_ms: 1_700_000_000_000,
        };

        let encoded = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(encoded["pid"], json!("0000000000000001"));
        assert_eq!(encoded["mid"], json!("m1"));
        assert_eq!(encoded["state"], json!("Completed"));
        assert_eq!(encoded["value"], json!(42));
        assert_eq!(encoded["revision"], json!(3));
        assert!(encoded.get("name").is_none());
    }
}
