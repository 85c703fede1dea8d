//! Body of the public status endpoint polled by the update detector.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Release identifier. The backend sends either a string or a number; both are
/// normalised to their string form so they key the seen-registry the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReleaseId(pub String);

impl ReleaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReleaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for ReleaseId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Str(s) => ReleaseId(s),
            Raw::Int(n) => ReleaseId(n.to_string()),
            Raw::Float(n) => ReleaseId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusPayload {
    pub maintenance_active: bool,
    pub maintenance_warning: bool,
    pub maintenance_message: Option<String>,
    pub release_notes: Option<String>,
    pub release_id: Option<ReleaseId>,
    pub release_title: Option<String>,
}

impl StatusPayload {
    /// The release announcement carried by this payload, if it has both a
    /// non-blank id and non-blank notes.
    pub fn release(&self) -> Option<(&ReleaseId, &str)> {
        let notes = self.release_notes.as_deref()?;
        if notes.trim().is_empty() {
            return None;
        }
        self.release_id
            .as_ref()
            .filter(|id| !id.is_blank())
            .map(|id| (id, notes))
    }
}
