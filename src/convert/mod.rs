//! Convert command for rewriting SQLite dumps into MySQL dumps.
//!
//! The whole dump is held in memory and passed through a fixed sequence of
//! textual rewrites:
//! - PRAGMA removal
//! - Transaction framing (BEGIN TRANSACTION / COMMIT → MySQL session setup)
//! - CREATE TABLE guards (DROP TABLE IF EXISTS) and backtick quoting
//! - Generic identifier requoting (double quotes → backticks)
//! - Column type mapping (see [`TypeMapper`])
//! - ENGINE/CHARSET/COLLATE epilogues on CREATE TABLE
//! - Generated header
//!
//! Each stage consumes the previous stage's output, and the order is fixed.
//! The pipeline only understands SQLite input, so running it over its own
//! output is not a no-op.

mod epilogue;
mod types;
mod warnings;

pub use epilogue::{annotate, annotate_with_origins, Annotated, EpilogueScanner, ScanState};
pub use types::{apply_rules, RewriteRule, TypeMapper};
pub use warnings::{ConvertWarning, WarningCollector};

use crate::input::read_dump;
use crate::profile::TargetProfile;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Configuration for the convert command
#[derive(Debug)]
pub struct ConvertConfig {
    /// Input SQLite dump
    pub input: PathBuf,
    /// Output SQL file (None for stdout)
    pub output: Option<PathBuf>,
    /// MySQL target parameters
    pub profile: TargetProfile,
    /// Prepend the generated header
    pub header: bool,
    /// Dry run mode
    pub dry_run: bool,
    /// Show progress
    pub progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            profile: TargetProfile::default(),
            header: true,
            dry_run: false,
            progress: false,
        }
    }
}

/// Per-stage rewrite counts
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub pragmas_removed: usize,
    pub transactions_opened: usize,
    pub transactions_committed: usize,
    pub tables_guarded: usize,
    pub identifiers_requoted: usize,
    pub types_rewritten: usize,
    pub epilogues_appended: usize,
}

/// Statistics from convert operation
#[derive(Debug, Default, Serialize)]
pub struct ConvertStats {
    pub input: String,
    pub output: Option<String>,
    pub input_bytes: u64,
    pub output_bytes: u64,
    #[serde(flatten)]
    pub rewrites: RewriteStats,
    pub warnings: Vec<ConvertWarning>,
    /// More warnings occurred than `warnings` holds
    pub warnings_truncated: bool,
}

static RE_PRAGMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)PRAGMA.*?;").unwrap());
static RE_CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"CREATE TABLE (?:IF NOT EXISTS )?"(\w+)""#).unwrap());
static RE_CREATE_TABLE_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"CREATE TABLE (?:IF NOT EXISTS )?"([^"]+)""#).unwrap());
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());
static RE_DOUBLE_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

const BEGIN_TRANSACTION: &str = "BEGIN TRANSACTION;";
const COMMIT: &str = "COMMIT;";
const CREATE_TABLE: &str = "CREATE TABLE";

/// SQLite → MySQL dump rewriter
pub struct Converter {
    profile: TargetProfile,
    warnings: WarningCollector,
    stats: RewriteStats,
}

impl Converter {
    pub fn new(profile: TargetProfile) -> Self {
        Self {
            profile,
            warnings: WarningCollector::new(),
            stats: RewriteStats::default(),
        }
    }

    /// Run every rewrite stage over a dump, returning the MySQL body
    /// (without header)
    pub fn rewrite(&mut self, dump: &str) -> String {
        let origins = creation_source_lines(dump);
        let result = self.strip_pragmas(dump);
        let result = self.convert_transactions(&result);
        let result = self.convert_create_tables(&result);
        let result = self.double_quotes_to_backticks(&result);
        let result = self.convert_data_types(&result);
        self.append_table_epilogues(&result, &origins)
    }

    /// Remove `PRAGMA ...;` directives, including ones spanning lines
    pub fn strip_pragmas(&mut self, content: &str) -> String {
        self.stats.pragmas_removed += RE_PRAGMA.find_iter(content).count();
        RE_PRAGMA.replace_all(content, "").into_owned()
    }

    /// Replace SQLite transaction markers with MySQL session setup/teardown.
    ///
    /// Plain substring replacement: occurrences inside string literals are
    /// rewritten too.
    pub fn convert_transactions(&mut self, content: &str) -> String {
        self.stats.transactions_opened += content.matches(BEGIN_TRANSACTION).count();
        self.stats.transactions_committed += content.matches(COMMIT).count();

        let begin = format!(
            "SET NAMES {};\nSET FOREIGN_KEY_CHECKS=0;\nSET SQL_MODE = 'NO_AUTO_VALUE_ON_ZERO';\nSTART TRANSACTION;\n",
            self.profile.charset
        );
        content
            .replace(BEGIN_TRANSACTION, &begin)
            .replace(COMMIT, "\nCOMMIT;\nSET FOREIGN_KEY_CHECKS=1;")
    }

    /// `CREATE TABLE "name"` → DROP guard plus backtick-quoted CREATE TABLE.
    ///
    /// Only names made of word characters are converted; others are left for
    /// generic requoting and reported as warnings.
    pub fn convert_create_tables(&mut self, content: &str) -> String {
        for caps in RE_CREATE_TABLE_ANY.captures_iter(content) {
            let name = &caps[1];
            if !RE_WORD.is_match(name) {
                self.warnings.add(ConvertWarning::UnconvertedTableName {
                    name: name.to_string(),
                });
            }
        }

        self.stats.tables_guarded += RE_CREATE_TABLE.find_iter(content).count();
        RE_CREATE_TABLE
            .replace_all(
                content,
                "DROP TABLE IF EXISTS `${1}`;\nCREATE TABLE `${1}`",
            )
            .into_owned()
    }

    /// Requote every `"x"` span as `` `x` ``.
    ///
    /// Not string-aware: SQLite dumps use single quotes for literals, so any
    /// double-quoted span is taken to be an identifier.
    pub fn double_quotes_to_backticks(&mut self, content: &str) -> String {
        self.stats.identifiers_requoted += RE_DOUBLE_QUOTED.find_iter(content).count();
        RE_DOUBLE_QUOTED
            .replace_all(content, "`${1}`")
            .into_owned()
    }

    /// Column-name overrides followed by the ordered type table
    pub fn convert_data_types(&mut self, content: &str) -> String {
        let (result, count) = TypeMapper::convert(content, &self.profile);
        self.stats.types_rewritten += count;
        result
    }

    /// Append ENGINE/CHARSET/COLLATE to CREATE TABLE closing lines.
    ///
    /// `origins` holds the input line of each `CREATE TABLE`, used in
    /// warnings; pass `&[]` to report lines of `content` itself.
    pub fn append_table_epilogues(&mut self, content: &str, origins: &[usize]) -> String {
        let annotated = annotate_with_origins(content, &self.profile.table_epilogue(), origins);
        self.stats.epilogues_appended += annotated.appended;
        for warning in annotated.warnings {
            self.warnings.add(warning);
        }
        annotated.content
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    /// Get collected warnings
    pub fn warnings(&self) -> &[ConvertWarning] {
        self.warnings.warnings()
    }

    /// Whether warnings were dropped at the collector's limit
    pub fn warnings_truncated(&self) -> bool {
        self.warnings.is_truncated()
    }
}

/// 1-based input line of every `CREATE TABLE` occurrence that survives
/// PRAGMA removal, in order.
///
/// Later stages never add or remove `CREATE TABLE` text, so the n-th
/// occurrence the epilogue scan meets is the n-th entry here.
fn creation_source_lines(dump: &str) -> Vec<usize> {
    // (offset in `kept`, offset in `dump`) where each kept segment starts
    let mut segments = Vec::new();
    let mut kept = String::with_capacity(dump.len());
    let mut last = 0;
    for m in RE_PRAGMA.find_iter(dump) {
        segments.push((kept.len(), last));
        kept.push_str(&dump[last..m.start()]);
        last = m.end();
    }
    segments.push((kept.len(), last));
    kept.push_str(&dump[last..]);

    let mut lines = Vec::new();
    let mut line = 1;
    let mut counted = 0;
    for (pos, _) in kept.match_indices(CREATE_TABLE) {
        let idx = segments.partition_point(|&(start, _)| start <= pos) - 1;
        let (kept_start, dump_start) = segments[idx];
        let offset = dump_start + (pos - kept_start);
        line += dump.as_bytes()[counted..offset]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        counted = offset;
        lines.push(line);
    }
    lines
}

/// Generated `--` comment block placed before the rewritten dump
pub fn render_header(
    profile: &TargetProfile,
    source: &Path,
    output: Option<&Path>,
    generated_at: &str,
) -> String {
    let source_name = source
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source.display().to_string());
    let output_name = output
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "dump.sql".to_string());

    let mut header = String::new();
    header.push_str("-- MySQL Database Dump\n");
    header.push_str(&format!("-- Converted from SQLite dump: {}\n", source_name));
    header.push_str(&format!(
        "-- Conversion Tool: sqlite2mysql {}\n",
        env!("CARGO_PKG_VERSION")
    ));
    header.push_str(&format!("-- Date: {}\n", generated_at));
    header.push_str("--\n");
    header.push_str("-- Instructions:\n");
    header.push_str(&format!(
        "--   1. Create database: CREATE DATABASE IF NOT EXISTS {};\n",
        profile.database
    ));
    header.push_str(&format!(
        "--   2. Import: {}\n",
        profile.import_command(&output_name)
    ));
    header.push_str("--\n\n");
    header
}

/// Run the convert command
pub fn run(config: ConvertConfig) -> anyhow::Result<ConvertStats> {
    let progress_bar = if config.progress {
        let total = std::fs::metadata(&config.input).map(|m| m.len()).unwrap_or(0);
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")?
                .progress_chars("█▓▒░  "),
        );
        pb.set_message("Reading...");
        Some(pb)
    } else {
        None
    };

    let callback: Option<Box<dyn Fn(u64)>> = progress_bar.clone().map(|pb| {
        Box::new(move |bytes: u64| pb.set_position(bytes)) as Box<dyn Fn(u64)>
    });
    let dump = read_dump(&config.input, callback)?;

    if let Some(ref pb) = progress_bar {
        pb.set_message("Rewriting...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
    }

    let mut converter = Converter::new(config.profile.clone());
    let body = converter.rewrite(&dump);

    let header = if config.header {
        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        render_header(
            &config.profile,
            &config.input,
            config.output.as_deref(),
            &generated_at,
        )
    } else {
        String::new()
    };

    if !config.dry_run {
        write_output(config.output.as_deref(), &header, &body)?;
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "Converted {} tables",
            converter.stats().tables_guarded
        ));
    }

    Ok(ConvertStats {
        input: config.input.display().to_string(),
        output: config.output.as_ref().map(|p| p.display().to_string()),
        input_bytes: dump.len() as u64,
        output_bytes: (header.len() + body.len()) as u64,
        rewrites: converter.stats().clone(),
        warnings: converter.warnings().to_vec(),
        warnings_truncated: converter.warnings_truncated(),
    })
}

/// Write header and body, overwriting any existing file
fn write_output(output: Option<&Path>, header: &str, body: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Cannot create output directory: {}", parent.display())
                    })?;
                }
            }
            let file = File::create(path)
                .with_context(|| format!("Cannot create output file: {}", path.display()))?;
            let mut writer = BufWriter::with_capacity(256 * 1024, file);
            writer.write_all(header.as_bytes())?;
            writer.write_all(body.as_bytes())?;
            writer
                .flush()
                .with_context(|| format!("Cannot write output file: {}", path.display()))?;
        }
        None => {
            let mut writer = BufWriter::new(std::io::stdout().lock());
            writer.write_all(header.as_bytes())?;
            writer.write_all(body.as_bytes())?;
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> Converter {
        Converter::new(TargetProfile::default())
    }

    #[test]
    fn test_strip_pragmas_multiline() {
        let mut c = converter();
        let output = c.strip_pragmas("PRAGMA foreign_keys=OFF;\nPRAGMA\n  journal_mode\n= WAL;\nSELECT 1;");
        assert_eq!(output, "\n\nSELECT 1;");
        assert_eq!(c.stats().pragmas_removed, 2);
    }

    #[test]
    fn test_convert_transactions() {
        let mut c = converter();
        let output = c.convert_transactions("BEGIN TRANSACTION;\nINSERT INTO t VALUES(1);\nCOMMIT;\n");
        assert!(output.starts_with("SET NAMES utf8mb4;\nSET FOREIGN_KEY_CHECKS=0;\n"));
        assert!(output.contains("START TRANSACTION;\n"));
        assert!(output.ends_with("\nCOMMIT;\nSET FOREIGN_KEY_CHECKS=1;\n"));
        assert!(!output.contains(BEGIN_TRANSACTION));
        assert_eq!(c.stats().transactions_opened, 1);
        assert_eq!(c.stats().transactions_committed, 1);
    }

    #[test]
    fn test_convert_create_tables() {
        let mut c = converter();
        assert_eq!(
            c.convert_create_tables("CREATE TABLE \"orders\" ("),
            "DROP TABLE IF EXISTS `orders`;\nCREATE TABLE `orders` ("
        );
        assert_eq!(
            c.convert_create_tables("CREATE TABLE IF NOT EXISTS \"users\" ("),
            "DROP TABLE IF EXISTS `users`;\nCREATE TABLE `users` ("
        );
        assert_eq!(c.stats().tables_guarded, 2);
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn test_non_word_table_name_left_alone() {
        let mut c = converter();
        let input = "CREATE TABLE \"order-items\" (";
        assert_eq!(c.convert_create_tables(input), input);
        assert_eq!(
            c.warnings(),
            &[ConvertWarning::UnconvertedTableName {
                name: "order-items".to_string()
            }]
        );
    }

    #[test]
    fn test_double_quotes_to_backticks() {
        let mut c = converter();
        assert_eq!(
            c.double_quotes_to_backticks("INSERT INTO \"users\" VALUES(1,'a \"b\"');"),
            "INSERT INTO `users` VALUES(1,'a `b`');"
        );
        assert_eq!(c.stats().identifiers_requoted, 2);
    }

    #[test]
    fn test_creation_source_lines() {
        let dump = "PRAGMA a;\nPRAGMA b\n= 1;\nCREATE TABLE \"x\" (\n\"id\" INT\n);\nCREATE TABLE \"y\" (\"id\" INT); CREATE TABLE \"z\" (\"id\" INT);\n";
        assert_eq!(creation_source_lines(dump), vec![4, 7, 7]);
    }

    #[test]
    fn test_creation_inside_pragma_is_not_counted() {
        let dump = "PRAGMA note='CREATE TABLE ignored';\nCREATE TABLE \"t\" (\"id\" INT);\n";
        assert_eq!(creation_source_lines(dump), vec![2]);
    }

    #[test]
    fn test_append_table_epilogues_without_origins() {
        let mut c = converter();
        c.append_table_epilogues("\nCREATE TABLE `t` (`id` INT);", &[]);
        assert_eq!(
            c.warnings(),
            &[ConvertWarning::MissingEpilogue {
                table: Some("t".to_string()),
                line: 2,
            }]
        );
    }

    #[test]
    fn test_header() {
        let header = render_header(
            &TargetProfile::default(),
            Path::new("/tmp/medlab_sqlite_dump.sql"),
            Some(Path::new("out.sql")),
            "2026-01-01 00:00:00",
        );
        assert!(header.starts_with("-- MySQL Database Dump\n"));
        assert!(header.contains("-- Converted from SQLite dump: medlab_sqlite_dump.sql\n"));
        assert!(header.contains("-- Date: 2026-01-01 00:00:00\n"));
        assert!(header.contains("CREATE DATABASE IF NOT EXISTS labs;"));
        assert!(header.contains("mysql -u root -p labs < \"out.sql\""));
        assert!(header.ends_with("--\n\n"));
        assert!(header.lines().all(|l| l.is_empty() || l.starts_with("--")));
    }
}
