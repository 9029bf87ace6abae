use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric release version such as `1.10.3`.
///
/// Missing trailing components compare as zero, so `1.0` equals `1.0.0`.
/// Serialized as its dotted string.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion {
    components: Vec<u64>,
}

impl ReleaseVersion {
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, i: usize) -> u64 {
        self.components.get(i).copied().unwrap_or(0)
    }
}

impl FromStr for ReleaseVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let components = s
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("invalid release version '{}'", s))?;
        if components.len() < 2 {
            return Err(format!(
                "release version '{}' needs at least major and minor numbers",
                s
            ));
        }
        Ok(Self { components })
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ReleaseVersion> for String {
    fn from(version: ReleaseVersion) -> Self {
        version.to_string()
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// An inline cross-reference such as ``:func:`~.calcRMSD` ``.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    pub role: String,
    /// Target with display prefixes (`~`, `.`) and explicit titles removed.
    pub target: String,
    pub line_number: usize,
}

/// One bullet, with continuation lines joined by single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseItem {
    pub text: String,
    pub line_number: usize,
    pub roles: Vec<RoleRef>,
}

/// A group of bullets under an informal heading ("New Features", ...).
/// Bullets that precede any heading go into a section without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSection {
    pub heading: Option<String>,
    pub items: Vec<ReleaseItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: ReleaseVersion,
    pub date: Option<NaiveDate>,
    pub sections: Vec<ReleaseSection>,
    pub line_number: usize,
}

impl Release {
    pub fn new(version: ReleaseVersion, date: Option<NaiveDate>, line_number: usize) -> Self {
        Self {
            version,
            date,
            sections: Vec::new(),
            line_number,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &ReleaseItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub line: usize,
    pub message: String,
}

impl Issue {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            line,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.message)
    }
}

/// A parsed release-notes document, newest release first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    pub title: Option<String>,
    pub releases: Vec<Release>,
    /// Markup problems found while parsing.
    pub issues: Vec<Issue>,
}

impl Changelog {
    pub fn release(&self, version: &ReleaseVersion) -> Option<&Release> {
        self.releases.iter().find(|r| &r.version == version)
    }

    pub fn latest(&self) -> Option<&Release> {
        self.releases.first()
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleRef> {
        self.releases
            .iter()
            .flat_map(|r| r.items())
            .flat_map(|i| i.roles.iter())
    }
}
