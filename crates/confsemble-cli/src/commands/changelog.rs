use crate::cli::{ChangelogArgs, ChangelogCommands, ReportFormat};
use crate::error::{CliError, Result};
use confsemble::core::changelog::parser;
use confsemble::core::changelog::types::{Changelog, Issue, Severity};
use confsemble::core::changelog::validator::{self, LintConfig, SymbolIndex};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Machine-readable result of `changelog check --format toml`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct CheckReport<'a> {
    file: String,
    passed: bool,
    errors: usize,
    warnings: usize,
    issues: &'a [Issue],
}

pub fn run(args: ChangelogArgs) -> Result<()> {
    match args.command {
        ChangelogCommands::Check {
            file,
            symbols,
            strict,
            require_dates,
            format,
        } => handle_check(&file, symbols.as_deref(), strict, require_dates, format),
        ChangelogCommands::Show { file } => handle_show(&file),
    }
}

fn handle_check(
    file: &Path,
    symbols: Option<&Path>,
    strict: bool,
    require_dates: bool,
    format: ReportFormat,
) -> Result<()> {
    let issues = check(file, symbols, require_dates)?;
    let (errors, warnings) = count(&issues);
    let failed = validator::is_failure(&issues, strict);

    match format {
        ReportFormat::Text => {
            for issue in &issues {
                println!("{}:{}", file.display(), issue);
            }
            if !failed {
                println!("✓ {} passed ({} warning(s)).", file.display(), warnings);
            }
        }
        ReportFormat::Toml => print!("{}", render_report(file, &issues, strict)?),
    }

    if failed {
        return Err(CliError::LintFailed { errors, warnings });
    }
    Ok(())
}

fn handle_show(file: &Path) -> Result<()> {
    let changelog = parser::parse_file(file)?;
    print!("{}", render_changelog(&changelog)?);
    Ok(())
}

fn check(file: &Path, symbols: Option<&Path>, require_dates: bool) -> Result<Vec<Issue>> {
    let changelog = parser::parse_file(file)?;
    info!(
        releases = changelog.releases.len(),
        latest = %changelog.latest().map(|r| r.version.to_string()).unwrap_or_default(),
        "Parsed changelog."
    );

    let mut config = LintConfig::default().require_dates(require_dates);
    if let Some(path) = symbols {
        let index = SymbolIndex::from_path(path)?;
        info!(symbols = index.len(), "Loaded symbol index.");
        config = config.symbols(index);
    }
    Ok(validator::validate(&changelog, &config))
}

fn render_report(file: &Path, issues: &[Issue], strict: bool) -> Result<String> {
    let (errors, warnings) = count(issues);
    let report = CheckReport {
        file: file.display().to_string(),
        passed: !validator::is_failure(issues, strict),
        errors,
        warnings,
        issues,
    };
    toml::to_string(&report).map_err(|e| CliError::Other(e.into()))
}

fn render_changelog(changelog: &Changelog) -> Result<String> {
    toml::to_string_pretty(changelog).map_err(|e| CliError::Other(e.into()))
}

fn count(issues: &[Issue]) -> (usize, usize) {
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    (errors, issues.len() - errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NOTES: &str = "\
Release Notes
=============

Release 1.1 (Mar 3, 2012)
=========================

**New Features**:

* :meth:`.Ensemble.iterpose` superposes iteratively.

Release 1.0 (Jan 5, 2012)
=========================

* First release.
";

    #[test]
    fn clean_changelog_passes() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("CHANGES.rst");
        let symbols = dir.path().join("symbols.txt");
        fs::write(&notes, NOTES).unwrap();
        fs::write(&symbols, "prody.ensemble.Ensemble.iterpose\n").unwrap();

        assert!(handle_check(&notes, Some(&symbols), true, false, ReportFormat::Text).is_ok());
    }

    #[test]
    fn unresolved_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("CHANGES.rst");
        let symbols = dir.path().join("symbols.txt");
        fs::write(&notes, NOTES).unwrap();
        fs::write(&symbols, "prody.ensemble.Ensemble.superpose\n").unwrap();

        let result = handle_check(&notes, Some(&symbols), false, false, ReportFormat::Text);
        assert!(matches!(
            result,
            Err(CliError::LintFailed {
                errors: 1,
                warnings: 0
            })
        ));
    }

    #[test]
    fn warnings_fail_only_in_strict_mode() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("CHANGES.rst");
        fs::write(
            &notes,
            "Release 1.1\n===========\n\n* Faster.\n\nRelease 1.0\n===========\n\n* First.\n",
        )
        .unwrap();

        assert!(handle_check(&notes, None, false, true, ReportFormat::Text).is_ok());
        assert!(matches!(
            handle_check(&notes, None, true, false, ReportFormat::Text),
            Ok(())
        ));
        assert!(matches!(
            handle_check(&notes, None, true, true, ReportFormat::Text),
            Err(CliError::LintFailed {
                errors: 0,
                warnings: 2
            })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = handle_check(
            Path::new("/nonexistent/CHANGES.rst"),
            None,
            false,
            false,
            ReportFormat::Text,
        );
        assert!(matches!(result, Err(CliError::Changelog(_))));
    }

    #[test]
    fn toml_report_lists_counts_and_issues() {
        let issues = vec![
            Issue::error(9, "unresolved reference :meth:`Ensemble.iterpose`"),
            Issue::warning(4, "release 1.1 has no date"),
        ];
        let text = render_report(Path::new("CHANGES.rst"), &issues, false).unwrap();
        let table: toml::Table = toml::from_str(&text).unwrap();

        assert_eq!(table["file"].as_str(), Some("CHANGES.rst"));
        assert_eq!(table["passed"].as_bool(), Some(false));
        assert_eq!(table["errors"].as_integer(), Some(1));
        assert_eq!(table["warnings"].as_integer(), Some(1));
        let listed = table["issues"].as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1]["severity"].as_str(), Some("warning"));
        assert_eq!(listed[1]["line"].as_integer(), Some(4));
    }

    #[test]
    fn toml_report_passes_without_issues() {
        let text = render_report(Path::new("CHANGES.rst"), &[], true).unwrap();
        let table: toml::Table = toml::from_str(&text).unwrap();
        assert_eq!(table["passed"].as_bool(), Some(true));
        assert_eq!(table["issues"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn toml_format_still_fails_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("CHANGES.rst");
        let symbols = dir.path().join("symbols.txt");
        fs::write(&notes, NOTES).unwrap();
        fs::write(&symbols, "prody.ensemble.Ensemble.superpose\n").unwrap();

        let result = handle_check(&notes, Some(&symbols), false, false, ReportFormat::Toml);
        assert!(matches!(result, Err(CliError::LintFailed { errors: 1, .. })));
    }

    #[test]
    fn parsed_changelog_survives_a_toml_round_trip() {
        let changelog = parser::parse_str(NOTES);
        let text = render_changelog(&changelog).unwrap();

        let table: toml::Table = toml::from_str(&text).unwrap();
        assert_eq!(table["releases"][0]["version"].as_str(), Some("1.1"));
        assert_eq!(table["releases"][0]["date"].as_str(), Some("2012-03-03"));
        assert!(table["releases"][1].get("date").is_some());

        let restored: Changelog = toml::from_str(&text).unwrap();
        assert_eq!(restored, changelog);
    }

    #[test]
    fn show_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("CHANGES.rst");
        fs::write(&notes, NOTES).unwrap();
        assert!(handle_show(&notes).is_ok());
        assert!(matches!(
            handle_show(&dir.path().join("missing.rst")),
            Err(CliError::Changelog(_))
        ));
    }
}
