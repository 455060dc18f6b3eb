//! JSON Schema draft identifiers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A versioned revision of the JSON Schema specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaDraft {
    #[serde(rename = "draft3")]
    Draft3,
    #[serde(rename = "draft4")]
    Draft4,
    #[serde(rename = "draft6")]
    Draft6,
    #[serde(rename = "draft7")]
    Draft7,
    #[serde(rename = "draft2019-09")]
    Draft2019_09,
    #[serde(rename = "draft2020-12")]
    Draft2020_12,
}

impl SchemaDraft {
    /// All drafts, oldest first
    pub const ALL: [SchemaDraft; 6] = [
        SchemaDraft::Draft3,
        SchemaDraft::Draft4,
        SchemaDraft::Draft6,
        SchemaDraft::Draft7,
        SchemaDraft::Draft2019_09,
        SchemaDraft::Draft2020_12,
    ];

    /// Name of the draft's directory inside the test suite's `tests/` folder
    pub fn dir_name(self) -> &'static str {
        match self {
            SchemaDraft::Draft3 => "draft3",
            SchemaDraft::Draft4 => "draft4",
            SchemaDraft::Draft6 => "draft6",
            SchemaDraft::Draft7 => "draft7",
            SchemaDraft::Draft2019_09 => "draft2019-09",
            SchemaDraft::Draft2020_12 => "draft2020-12",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SchemaDraft::Draft3 => "Draft 3",
            SchemaDraft::Draft4 => "Draft 4",
            SchemaDraft::Draft6 => "Draft 6",
            SchemaDraft::Draft7 => "Draft 7",
            SchemaDraft::Draft2019_09 => "Draft 2019-09",
            SchemaDraft::Draft2020_12 => "Draft 2020-12",
        }
    }

    /// The draft's meta-schema URI, as used in `$schema`
    pub fn meta_schema_uri(self) -> &'static str {
        match self {
            SchemaDraft::Draft3 => "http://json-schema.org/draft-03/schema#",
            SchemaDraft::Draft4 => "http://json-schema.org/draft-04/schema#",
            SchemaDraft::Draft6 => "http://json-schema.org/draft-06/schema#",
            SchemaDraft::Draft7 => "http://json-schema.org/draft-07/schema#",
            SchemaDraft::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
            SchemaDraft::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.dir_name() == name)
    }

    /// Match a `$schema` value, ignoring scheme and a trailing empty fragment
    pub fn from_schema_uri(uri: &str) -> Option<Self> {
        let normalized = normalize_uri(uri);
        Self::ALL
            .into_iter()
            .find(|d| normalize_uri(d.meta_schema_uri()) == normalized)
    }

    /// Detect the draft declared by a schema document, defaulting to draft-07
    pub fn detect(schema: &Value) -> Self {
        schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_schema_uri)
            .unwrap_or(SchemaDraft::Draft7)
    }
}

fn normalize_uri(uri: &str) -> &str {
    let uri = uri.trim_end_matches('#');
    uri.strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri)
}

impl fmt::Display for SchemaDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for SchemaDraft {
    type Err = String;

    /// Accepts directory names (`draft7`), hyphenated forms (`draft-07`,
    /// `draft-2020-12`) and bare versions (`7`, `2019-09`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let bare = lowered
            .strip_prefix("draft")
            .unwrap_or(&lowered)
            .trim_start_matches('-')
            .trim_start_matches('0');
        match bare {
            "3" => Ok(SchemaDraft::Draft3),
            "4" => Ok(SchemaDraft::Draft4),
            "6" => Ok(SchemaDraft::Draft6),
            "7" => Ok(SchemaDraft::Draft7),
            "2019-09" => Ok(SchemaDraft::Draft2019_09),
            "2020-12" => Ok(SchemaDraft::Draft2020_12),
            _ => Err(format!("unknown schema draft '{}'", s)),
        }
    }
}
