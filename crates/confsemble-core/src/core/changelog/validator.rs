use super::ChangelogError;
use super::types::{Changelog, Issue, ReleaseVersion, Severity};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

const DEFAULT_SYMBOL_ROLES: &[&str] = &["func", "meth", "class", "mod", "attr", "data", "exc", "obj"];

/// Known documented symbols, given as dotted names (`prody.ensemble.Ensemble.getWeights`).
///
/// A cross-reference target resolves when it equals any dotted suffix of a
/// known symbol, or when its last component matches the last component of
/// one.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    suffixes: HashSet<String>,
    last_components: HashSet<String>,
    count: usize,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str) {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return;
        }
        let parts: Vec<&str> = symbol.split('.').collect();
        for start in 0..parts.len() {
            self.suffixes.insert(parts[start..].join("."));
        }
        if let Some(last) = parts.last() {
            self.last_components.insert(last.to_string());
        }
        self.count += 1;
    }

    /// One symbol per line; blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Self {
        let mut index = Self::new();
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .for_each(|line| index.insert(line));
        index
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ChangelogError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ChangelogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn resolves(&self, target: &str) -> bool {
        if self.suffixes.contains(target) {
            return true;
        }
        target
            .rsplit('.')
            .next()
            .is_some_and(|last| self.last_components.contains(last))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<S: AsRef<str>> FromIterator<S> for SymbolIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut index = Self::new();
        for symbol in iter {
            index.insert(symbol.as_ref());
        }
        index
    }
}

#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Roles whose targets must resolve against `symbols`.
    pub symbol_roles: Vec<String>,
    /// Cross-references are only checked when an index is given.
    pub symbols: Option<SymbolIndex>,
    pub warn_empty_releases: bool,
    pub require_dates: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            symbol_roles: DEFAULT_SYMBOL_ROLES.iter().map(|r| r.to_string()).collect(),
            symbols: None,
            warn_empty_releases: true,
            require_dates: false,
        }
    }
}

impl LintConfig {
    pub fn symbols(mut self, symbols: SymbolIndex) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn require_dates(mut self, require: bool) -> Self {
        self.require_dates = require;
        self
    }

    pub fn warn_empty_releases(mut self, warn: bool) -> Self {
        self.warn_empty_releases = warn;
        self
    }
}

fn check_order(changelog: &Changelog, issues: &mut Vec<Issue>) {
    let mut seen: BTreeMap<&ReleaseVersion, usize> = BTreeMap::new();
    let mut last_dated = None;

    for (i, release) in changelog.releases.iter().enumerate() {
        if let Some(first_line) = seen.get(&release.version) {
            issues.push(Issue::error(
                release.line_number,
                format!(
                    "duplicate release {} (first listed on line {})",
                    release.version, first_line
                ),
            ));
        } else {
            seen.insert(&release.version, release.line_number);
        }

        if let Some(previous) = i.checked_sub(1).map(|p| &changelog.releases[p]) {
            if release.version > previous.version {
                issues.push(Issue::error(
                    release.line_number,
                    format!(
                        "release {} is listed below older release {} (line {})",
                        release.version, previous.version, previous.line_number
                    ),
                ));
            }
        }

        if let Some(date) = release.date {
            if let Some((newer_date, newer_version)) = last_dated {
                if date > newer_date {
                    issues.push(Issue::error(
                        release.line_number,
                        format!(
                            "release {} dated {} is listed below release {} dated {}",
                            release.version, date, newer_version, newer_date
                        ),
                    ));
                }
            }
            last_dated = Some((date, &release.version));
        }
    }
}

/// Checks a parsed changelog.
///
/// Reports markup issues from parsing, releases out of newest-first order
/// (by version and by date), duplicate versions, empty or undated releases
/// (as configured) and cross-references that do not resolve. Issues are
/// sorted by line.
pub fn validate(changelog: &Changelog, config: &LintConfig) -> Vec<Issue> {
    let mut issues = changelog.issues.clone();
    check_order(changelog, &mut issues);

    for release in &changelog.releases {
        if config.warn_empty_releases && release.is_empty() {
            issues.push(Issue::warning(
                release.line_number,
                format!("release {} has no items", release.version),
            ));
        }
        if config.require_dates && release.date.is_none() {
            issues.push(Issue::warning(
                release.line_number,
                format!("release {} has no date", release.version),
            ));
        }
    }

    if let Some(symbols) = &config.symbols {
        for role in changelog.roles() {
            if config.symbol_roles.iter().any(|r| *r == role.role) && !symbols.resolves(&role.target)
            {
                issues.push(Issue::error(
                    role.line_number,
                    format!("unresolved cross-reference :{}:`{}`", role.role, role.target),
                ));
            }
        }
    }

    issues.sort_by_key(|issue| issue.line);
    issues
}

/// Whether `issues` should fail a check; with `strict`, warnings fail too.
pub fn is_failure(issues: &[Issue], strict: bool) -> bool {
    issues
        .iter()
        .any(|i| i.severity == Severity::Error || (strict && i.severity == Severity::Warning))
}
