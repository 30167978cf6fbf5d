//! Write-concern (durability) specifications.
//!
//! A write concern is parsed from a JSON document of the shape
//! `{"w": 1 | "majority", "j": bool, "wtimeout": millis}`. Parse failures
//! surface as a structured [`WriteError`] with code `FailedToParse`; the
//! enforcer reports them without waiting.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ErrorCode, WriteError};

/// Default wait deadline applied when the spec does not carry `wtimeout`
/// (or carries `wtimeout: 0`).
pub const DEFAULT_WRITE_CONCERN_TIMEOUT: Duration = Duration::from_secs(10);

/// Acknowledgment mode: a fixed replica count or a majority of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WMode {
    /// Acknowledged by `n` members. `0` and `1` are satisfied locally.
    Count(u32),
    /// Acknowledged by a majority of the replica set.
    Majority,
}

/// A resolved durability requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteConcern {
    /// Acknowledgment mode.
    pub w: WMode,
    /// Require the write to be journaled before acknowledging.
    pub journal: bool,
    /// Deadline for the durability wait.
    pub timeout: Duration,
}

impl Default for WriteConcern {
    fn default() -> Self {
        WriteConcern {
            w: WMode::Count(1),
            journal: false,
            timeout: DEFAULT_WRITE_CONCERN_TIMEOUT,
        }
    }
}

impl WriteConcern {
    /// True when the concern is satisfied by the local write alone and no
    /// replication or journal wait is needed.
    pub fn is_local_only(&self) -> bool {
        !self.journal && matches!(self.w, WMode::Count(0) | WMode::Count(1))
    }

    /// Parse a write-concern document.
    ///
    /// Unknown fields are rejected; wrong types produce `FailedToParse`.
    pub fn parse(doc: &JsonValue) -> Result<Self, WriteError> {
        let obj = doc.as_object().ok_or_else(|| {
            parse_error(format!("write concern must be an object, got {doc}"))
        })?;

        let mut concern = WriteConcern::default();
        for (field, value) in obj {
            match field.as_str() {
                "w" => {
                    concern.w = match value {
                        JsonValue::Number(n) => {
                            let w = n.as_u64().ok_or_else(|| {
                                parse_error(format!("w must be a non-negative integer, got {n}"))
                            })?;
                            let w = u32::try_from(w).map_err(|_| {
                                parse_error(format!("w is out of range: {w}"))
                            })?;
                            WMode::Count(w)
                        }
                        JsonValue::String(s) if s == "majority" => WMode::Majority,
                        other => {
                            return Err(parse_error(format!(
                                "w must be an integer or \"majority\", got {other}"
                            )))
                        }
                    };
                }
                "j" => {
                    concern.journal = value.as_bool().ok_or_else(|| {
                        parse_error(format!("j must be a boolean, got {value}"))
                    })?;
                }
                "wtimeout" => {
                    let millis = value.as_u64().ok_or_else(|| {
                        parse_error(format!("wtimeout must be a non-negative integer, got {value}"))
                    })?;
                    if millis > 0 {
                        concern.timeout = Duration::from_millis(millis);
                    }
                }
                other => {
                    return Err(parse_error(format!(
                        "unrecognized write concern field: {other}"
                    )))
                }
            }
        }
        Ok(concern)
    }
}

fn parse_error(message: String) -> WriteError {
    WriteError::new(ErrorCode::FailedToParse, message)
}
