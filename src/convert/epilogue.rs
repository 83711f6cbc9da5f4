//! Appends the MySQL table options to CREATE TABLE statements.
//!
//! A single top-to-bottom line scan. `CREATE TABLE` on a line opens a
//! statement; while open, the first line that is exactly `);` (ignoring
//! surrounding whitespace) is replaced by the profile's epilogue and the
//! statement closes. Creations closed any other way keep their original
//! closing line and stay open until the next `CREATE TABLE`.
//!
//! Earlier stages add and remove lines, so warnings report the line each
//! creation had in the input dump when the caller supplies it.

use super::warnings::ConvertWarning;
use once_cell::sync::Lazy;
use regex::Regex;

const CREATE_TABLE: &str = "CREATE TABLE";

static RE_TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"CREATE TABLE\s+(?:IF NOT EXISTS\s+)?[`"]?(\w+)"#).unwrap()
});

/// Scanner position relative to CREATE TABLE statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Outside,
    Inside {
        table: Option<String>,
        /// 1-based line of the CREATE TABLE in the input
        line: usize,
    },
}

/// Result of an epilogue pass
#[derive(Debug)]
pub struct Annotated {
    pub content: String,
    pub appended: usize,
    pub warnings: Vec<ConvertWarning>,
}

pub struct EpilogueScanner<'a> {
    epilogue: &'a str,
    /// Input line of the n-th `CREATE TABLE` occurrence
    origins: &'a [usize],
    /// `CREATE TABLE` occurrences seen so far
    creations: usize,
    state: ScanState,
    appended: usize,
    warnings: Vec<ConvertWarning>,
}

impl<'a> EpilogueScanner<'a> {
    pub fn new(epilogue: &'a str) -> Self {
        Self::with_origins(epilogue, &[])
    }

    /// Report warnings against `origins` instead of scanned line numbers.
    /// Creations past the end of `origins` fall back to the scanned line.
    pub fn with_origins(epilogue: &'a str, origins: &'a [usize]) -> Self {
        Self {
            epilogue,
            origins,
            creations: 0,
            state: ScanState::Outside,
            appended: 0,
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Feed one line (without its `\n`), returning the line to emit
    pub fn feed(&mut self, line_no: usize, line: &str) -> String {
        if line.contains(CREATE_TABLE) {
            self.close_unterminated();
            let origin = self.origins.get(self.creations).copied().unwrap_or(line_no);
            self.creations += line.matches(CREATE_TABLE).count();
            self.state = ScanState::Inside {
                table: RE_TABLE_NAME
                    .captures(line)
                    .map(|caps| caps[1].to_string()),
                line: origin,
            };
            return line.to_string();
        }

        if matches!(self.state, ScanState::Inside { .. }) && line.trim() == ");" {
            self.state = ScanState::Outside;
            self.appended += 1;
            return self.closing_line(line);
        }

        line.to_string()
    }

    /// Finish the scan, reporting a creation left open at end of input
    pub fn finish(mut self) -> (usize, Vec<ConvertWarning>) {
        self.close_unterminated();
        (self.appended, self.warnings)
    }

    fn close_unterminated(&mut self) {
        let previous = std::mem::replace(&mut self.state, ScanState::Outside);
        if let ScanState::Inside { table, line } = previous {
            self.warnings
                .push(ConvertWarning::MissingEpilogue { table, line });
        }
    }

    /// Epilogue with the original line's indentation and `\r` preserved
    fn closing_line(&self, line: &str) -> String {
        let indent_len = line.len() - line.trim_start().len();
        let mut out = String::with_capacity(indent_len + self.epilogue.len() + 1);
        out.push_str(&line[..indent_len]);
        out.push_str(self.epilogue);
        if line.ends_with('\r') {
            out.push('\r');
        }
        out
    }
}

/// Run the epilogue scan over a whole buffer
pub fn annotate(content: &str, epilogue: &str) -> Annotated {
    annotate_with_origins(content, epilogue, &[])
}

/// Epilogue scan whose warnings use `origins`, the input line of each
/// `CREATE TABLE` occurrence in order
pub fn annotate_with_origins(content: &str, epilogue: &str, origins: &[usize]) -> Annotated {
    let mut scanner = EpilogueScanner::with_origins(epilogue, origins);
    let lines: Vec<String> = content
        .split('\n')
        .enumerate()
        .map(|(idx, line)| scanner.feed(idx + 1, line))
        .collect();
    let (appended, warnings) = scanner.finish();

    Annotated {
        content: lines.join("\n"),
        appended,
        warnings,
    }
}
