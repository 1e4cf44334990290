//! Per-directory status records emitted by the probe

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Whether the local branch can be reached by advancing its remote-tracking branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FastForward {
    /// Remote-tracking tip is an ancestor of the local tip
    True,
    /// Local and remote-tracking tips have diverged
    False,
    /// No remote-tracking ref exists for the branch
    Missing,
    /// The probe reported nothing usable; renders as an empty field
    #[default]
    Unknown,
}

impl FastForward {
    /// Interpret the textual indicator written by the probe
    pub fn from_indicator(s: &str) -> Self {
        match s.trim() {
            "true" => Self::True,
            "false" => Self::False,
            "missing" => Self::Missing,
            _ => Self::Unknown,
        }
    }

    /// The indicator as it appears in annotations
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Missing => "missing",
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for FastForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FastForward {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FastForward {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(true) => Self::True,
            Value::Bool(false) => Self::False,
            Value::String(s) => Self::from_indicator(&s),
            _ => Self::Unknown,
        })
    }
}

/// Accept any scalar where a string is expected; everything else becomes empty
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Columns of an annotation, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Branch,
    Remote,
    FastForward,
}

impl Field {
    /// All fields in display order
    pub const ALL: [Field; 3] = [Field::Branch, Field::Remote, Field::FastForward];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Remote => "remote",
            Self::FastForward => "fastForward",
        }
    }
}

/// Status of one probed subdirectory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStatusRecord {
    /// Absolute path of the working tree
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: String,

    /// Current branch, empty when HEAD is detached
    #[serde(default, deserialize_with = "lenient_string")]
    pub branch: String,

    /// Remote configured for the branch
    #[serde(default, deserialize_with = "lenient_string")]
    pub remote: String,

    /// Fast-forward state against the remote-tracking branch
    #[serde(default, rename = "ff", alias = "fast_forward")]
    pub fast_forward: FastForward,
}

impl DirectoryStatusRecord {
    /// Text of a single column
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Branch => &self.branch,
            Field::Remote => &self.remote,
            Field::FastForward => self.fast_forward.as_str(),
        }
    }
}

/// Canonical lookup key for a directory path: no trailing slash except for `/`
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// [`normalize_path`] for filesystem paths
pub fn path_key(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}
