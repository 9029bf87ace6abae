use super::ChangelogError;
use super::types::{Changelog, Issue, Release, ReleaseItem, ReleaseSection, ReleaseVersion, RoleRef};
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const UNDERLINE_CHARS: &[char] = &['=', '-', '~', '^', '*', '#'];
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"];

static RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[Rr]elease\s+)?[vV]?(\d+(?:\.\d+)+)(?:\s*\(([^)]*)\))?\s*$")
        .expect("Invalid release heading regex")
});
static BOLD_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*([^*]+)\*\*:?\s*$").expect("Invalid section heading regex")
});
static ROLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z][\w.+-]*):`").expect("Invalid role regex"));

/// Returns the underline character if `line` is an RST section adornment.
fn underline_char(line: &str) -> Option<char> {
    let line = line.trim_end();
    let first = line.chars().next()?;
    if line.len() < 2 || !UNDERLINE_CHARS.contains(&first) {
        return None;
    }
    line.chars().all(|c| c == first).then_some(first)
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn bullet_text(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
        .map(str::trim)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn clean_target(raw: &str) -> String {
    let raw = raw.trim();
    let target = match (raw.rfind('<'), raw.ends_with('>')) {
        (Some(start), true) => &raw[start + 1..raw.len() - 1],
        _ => raw,
    };
    target
        .trim_start_matches(['~', '.'])
        .trim_end_matches("()")
        .to_string()
}

/// A bullet whose continuation lines are still being collected.
struct PendingItem {
    text: String,
    indent: usize,
    /// Byte offset in `text` where each source line starts.
    line_starts: Vec<(usize, usize)>,
}

impl PendingItem {
    fn new(text: &str, line_number: usize, indent: usize) -> Self {
        Self {
            text: text.to_string(),
            indent,
            line_starts: vec![(0, line_number)],
        }
    }

    fn append(&mut self, text: &str, line_number: usize) {
        self.text.push(' ');
        self.line_starts.push((self.text.len(), line_number));
        self.text.push_str(text);
    }

    fn line_at(&self, offset: usize) -> usize {
        self.line_starts
            .iter()
            .rev()
            .find(|(start, _)| *start <= offset)
            .map_or(self.line_starts[0].1, |(_, line)| *line)
    }

    fn finish(self, issues: &mut Vec<Issue>) -> ReleaseItem {
        let mut roles = Vec::new();
        for caps in ROLE_RE.captures_iter(&self.text) {
            let (Some(whole), Some(role)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let line_number = self.line_at(whole.start());
            match self.text[whole.end()..].find('`') {
                Some(close) => roles.push(RoleRef {
                    role: role.as_str().to_string(),
                    target: clean_target(&self.text[whole.end()..whole.end() + close]),
                    line_number,
                }),
                None => issues.push(Issue::error(
                    line_number,
                    format!("unterminated role ':{}:'", role.as_str()),
                )),
            }
        }
        ReleaseItem {
            text: self.text,
            line_number: self.line_starts[0].1,
            roles,
        }
    }
}

#[derive(Default)]
struct Parser {
    changelog: Changelog,
    pending: Option<PendingItem>,
    release_underline: Option<char>,
}

impl Parser {
    fn flush_item(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let item = pending.finish(&mut self.changelog.issues);
        if let Some(release) = self.changelog.releases.last_mut() {
            if release.sections.is_empty() {
                release.sections.push(ReleaseSection {
                    heading: None,
                    items: Vec::new(),
                });
            }
            if let Some(section) = release.sections.last_mut() {
                section.items.push(item);
            }
        }
    }

    fn start_section(&mut self, heading: &str) {
        if let Some(release) = self.changelog.releases.last_mut() {
            release.sections.push(ReleaseSection {
                heading: Some(heading.to_string()),
                items: Vec::new(),
            });
        }
    }

    fn heading(&mut self, text: &str, underline: char, underline_len: usize, line_number: usize) {
        self.flush_item();
        if underline_len < text.chars().count() {
            self.changelog.issues.push(Issue::error(
                line_number + 1,
                format!("title underline too short for '{}'", text),
            ));
        }

        if let Some(caps) = RELEASE_RE.captures(text) {
            let version_text = caps.get(1).map_or("", |m| m.as_str());
            let version = match version_text.parse::<ReleaseVersion>() {
                Ok(version) => version,
                Err(message) => {
                    self.changelog.issues.push(Issue::error(line_number, message));
                    return;
                }
            };
            let date = caps.get(2).and_then(|m| {
                let parsed = parse_date(m.as_str());
                if parsed.is_none() {
                    self.changelog.issues.push(Issue::error(
                        line_number,
                        format!("unparseable release date '{}'", m.as_str().trim()),
                    ));
                }
                parsed
            });
            self.release_underline.get_or_insert(underline);
            self.changelog
                .releases
                .push(Release::new(version, date, line_number));
            return;
        }

        let numbered = text
            .get(..8)
            .filter(|prefix| prefix.eq_ignore_ascii_case("release "))
            .and_then(|_| text[8..].trim_start().chars().next())
            .is_some_and(|c| c.is_ascii_digit());
        let looks_like_release = numbered || self.release_underline == Some(underline);
        if looks_like_release {
            self.changelog.issues.push(Issue::error(
                line_number,
                format!("unparseable release version in heading '{}'", text),
            ));
        } else if self.changelog.releases.is_empty() {
            if self.changelog.title.is_none() {
                self.changelog.title = Some(text.to_string());
            }
        } else {
            self.start_section(text);
        }
    }

    fn bullet(&mut self, text: &str, line_number: usize, indent: usize) {
        self.flush_item();
        if self.changelog.releases.is_empty() {
            self.changelog.issues.push(Issue::error(
                line_number,
                "bullet item outside of any release",
            ));
            return;
        }
        self.pending = Some(PendingItem::new(text, line_number, indent));
    }

    fn run(mut self, content: &str) -> Changelog {
        let lines: Vec<&str> = content.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            let line_number = i + 1;
            let trimmed = line.trim();
            let indent = indentation(line);

            if trimmed.is_empty() {
                i += 1;
                continue;
            }

            let next_underline = lines.get(i + 1).and_then(|next| underline_char(next));
            if let Some(c) = next_underline {
                if indent == 0 && underline_char(line).is_none() && bullet_text(trimmed).is_none() {
                    let underline_len = lines[i + 1].trim_end().chars().count();
                    self.heading(trimmed, c, underline_len, line_number);
                    i += 2;
                    continue;
                }
            }

            if underline_char(line).is_some() {
                // overline or transition
                self.flush_item();
            } else if let Some(caps) = BOLD_HEADING_RE.captures(trimmed) {
                self.flush_item();
                let heading = caps.get(1).map_or("", |m| m.as_str()).trim();
                self.start_section(heading);
            } else if let Some(text) = bullet_text(trimmed) {
                self.bullet(text, line_number, indent);
            } else if let Some(pending) = self.pending.as_mut().filter(|p| indent > p.indent) {
                pending.append(trimmed, line_number);
            } else {
                self.flush_item();
            }
            i += 1;
        }
        self.flush_item();

        debug!(
            releases = self.changelog.releases.len(),
            issues = self.changelog.issues.len(),
            "Parsed changelog."
        );
        self.changelog
    }
}

/// Parses release notes written in reStructuredText.
///
/// Markup problems do not abort parsing; they are collected in
/// [`Changelog::issues`].
pub fn parse_str(content: &str) -> Changelog {
    Parser::default().run(content)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Changelog, ChangelogError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ChangelogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_str(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::changelog::types::Severity;

    const NOTES: &str = "\
Release Notes
=============

Release 0.7.2 (May 20, 2011)
============================

**New Features**:

  * :meth:`~.Ensemble.getWeights` returns a copy of the
    weights, see :func:`.calcRMSD`.
  * Plotting helper :func:`showProjection`.

**Bug Fixes and Improvements**:

  * Fixed :class:`Ensemble` slicing.

Release 0.7.1 (Apr 28, 2011)
============================

  * Initial ensemble support.
";

    fn v(s: &str) -> ReleaseVersion {
        s.parse().unwrap()
    }

    #[test]
    fn parses_releases_sections_and_items() {
        let changelog = parse_str(NOTES);

        assert!(changelog.issues.is_empty(), "{:?}", changelog.issues);
        assert_eq!(changelog.title.as_deref(), Some("Release Notes"));
        assert_eq!(changelog.releases.len(), 2);

        let latest = &changelog.releases[0];
        assert_eq!(latest.version, v("0.7.2"));
        assert_eq!(latest.date, NaiveDate::from_ymd_opt(2011, 5, 20));
        assert_eq!(latest.line_number, 4);
        assert_eq!(latest.sections.len(), 2);
        assert_eq!(latest.sections[0].heading.as_deref(), Some("New Features"));
        assert_eq!(latest.sections[0].items.len(), 2);
        assert_eq!(
            latest.sections[0].items[0].text,
            ":meth:`~.Ensemble.getWeights` returns a copy of the weights, see :func:`.calcRMSD`."
        );

        let older = &changelog.releases[1];
        assert_eq!(older.sections[0].heading, None);
        assert_eq!(older.sections[0].items[0].text, "Initial ensemble support.");
    }

    #[test]
    fn roles_are_extracted_with_clean_targets_and_lines() {
        let changelog = parse_str(NOTES);
        let roles: Vec<_> = changelog.roles().collect();
        assert_eq!(roles.len(), 4);
        assert_eq!(roles[0].role, "meth");
        assert_eq!(roles[0].target, "Ensemble.getWeights");
        assert_eq!(roles[0].line_number, 9);
        assert_eq!(roles[1].target, "calcRMSD");
        assert_eq!(roles[1].line_number, 10);
        assert_eq!(roles[3].role, "class");
    }

    #[test]
    fn explicit_titles_are_removed_from_targets() {
        assert_eq!(clean_target("the ensemble <prody.Ensemble>"), "prody.Ensemble");
        assert_eq!(clean_target("~.calcRMSD()"), "calcRMSD");
    }

    #[test]
    fn accepts_all_date_formats() {
        assert_eq!(parse_date("Apr 8, 2011"), NaiveDate::from_ymd_opt(2011, 4, 8));
        assert_eq!(parse_date("April 8, 2011"), NaiveDate::from_ymd_opt(2011, 4, 8));
        assert_eq!(parse_date("2011-04-08"), NaiveDate::from_ymd_opt(2011, 4, 8));
        assert_eq!(parse_date("someday"), None);
    }

    #[test]
    fn reports_markup_errors() {
        let content = "\
* orphan bullet

1.0 (sometime)
===

* broken :func:`calcRMSD

Release 1.x
===========
";
        let changelog = parse_str(content);
        let messages: Vec<(usize, &str)> = changelog
            .issues
            .iter()
            .map(|i| (i.line, i.message.as_str()))
            .collect();

        assert!(changelog.issues.iter().all(|i| i.severity == Severity::Error));
        assert!(messages.contains(&(1, "bullet item outside of any release")));
        assert!(messages.contains(&(3, "unparseable release date 'sometime'")));
        assert!(messages.iter().any(|(l, m)| *l == 4 && m.contains("underline too short")));
        assert!(messages.contains(&(6, "unterminated role ':func:'")));
        assert!(messages.iter().any(|(l, m)| *l == 8 && m.contains("unparseable release version")));

        assert_eq!(changelog.releases.len(), 1);
        assert_eq!(changelog.releases[0].date, None);
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.rst");
        fs::write(&path, NOTES).unwrap();

        let changelog = parse_file(&path).unwrap();
        assert_eq!(changelog.releases.len(), 2);

        let missing = parse_file(dir.path().join("missing.rst"));
        assert!(matches!(missing, Err(ChangelogError::Io { .. })));
    }
}
