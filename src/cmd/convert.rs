//! Convert command CLI handler.

use crate::convert::{self, ConvertConfig, ConvertStats};
use crate::input::Compression;
use crate::profile::TargetProfile;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::glob_util::{expand_file_pattern, MultiFileResult};
use super::profile::load_profile;

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    profile: Option<PathBuf>,
    database: Option<String>,
    no_header: bool,
    progress: bool,
    dry_run: bool,
    json: bool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let profile = load_profile(profile, database)?;
    let expanded = expand_file_pattern(&file)?;

    if !expanded.pattern_was_glob {
        let Some(input) = expanded.files.into_iter().next() else {
            anyhow::bail!("file does not exist: {}", file.display());
        };
        run_single(input, output, profile, no_header, progress, dry_run, json)
    } else {
        let output_dir = match output {
            Some(dir) => dir,
            None => {
                anyhow::bail!(
                    "Output directory required when using glob patterns. Use --output <dir>"
                );
            }
        };

        run_multi(
            expanded.files,
            output_dir,
            profile,
            no_header,
            dry_run,
            json,
            fail_fast,
        )
    }
}

fn run_single(
    file: PathBuf,
    output: Option<PathBuf>,
    profile: TargetProfile,
    no_header: bool,
    progress: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    // The converted dump owns stdout when no output file is given
    let to_stdout = output.is_none() && !dry_run;

    let config = ConvertConfig {
        input: file,
        output,
        profile: profile.clone(),
        header: !no_header,
        dry_run,
        progress,
    };

    let stats = convert::run(config)?;

    let mut sink: Box<dyn Write> = if to_stdout {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };

    if json {
        writeln!(sink, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        print_summary(&mut sink, &stats, &profile, dry_run, progress)?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_multi(
    files: Vec<PathBuf>,
    output_dir: PathBuf,
    profile: TargetProfile,
    no_header: bool,
    dry_run: bool,
    json: bool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let total = files.len();
    let mut result = MultiFileResult::new();
    let mut all_stats = Vec::new();

    if !dry_run {
        std::fs::create_dir_all(&output_dir)?;
    }

    eprintln!("Converting {} files to MySQL...\n", total);

    for (idx, file) in files.iter().enumerate() {
        eprintln!("[{}/{}] Converting: {}", idx + 1, total, file.display());

        let output_file = if dry_run {
            None
        } else {
            // Output is always plain text, so drop a compression suffix
            let name_source = if Compression::from_path(file) == Compression::None {
                file.file_name()
            } else {
                file.file_stem()
            };
            let file_name = name_source
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("output_{}.sql", idx));
            Some(output_dir.join(file_name))
        };

        if let Some(out) = output_file.as_deref().filter(|out| is_same_file(out, file)) {
            let error = format!("output {} would overwrite the input", out.display());
            eprintln!("  Error: {}\n", error);
            result.record_failure(file.clone(), error);
            if fail_fast {
                break;
            }
            continue;
        }

        let config = ConvertConfig {
            input: file.clone(),
            output: output_file.clone(),
            profile: profile.clone(),
            header: !no_header,
            dry_run,
            progress: false,
        };

        match convert::run(config) {
            Ok(stats) => {
                let warning_str = if stats.warnings.is_empty() {
                    String::new()
                } else if stats.warnings_truncated {
                    format!(" ({}+ warnings)", stats.warnings.len())
                } else {
                    format!(" ({} warnings)", stats.warnings.len())
                };

                eprintln!(
                    "  {:.2} KB → {:.2} KB, {} tables{}",
                    stats.input_bytes as f64 / 1024.0,
                    stats.output_bytes as f64 / 1024.0,
                    stats.rewrites.tables_guarded,
                    warning_str
                );

                if let Some(out) = output_file {
                    eprintln!("  → {}", out.display());
                }
                eprintln!();

                result.record_success();
                all_stats.push(stats);
            }
            Err(e) => {
                eprintln!("  Error: {:#}\n", e);
                result.record_failure(file.clone(), format!("{:#}", e));
                if fail_fast {
                    break;
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&all_stats)?);
    }

    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("Conversion Summary:");
    eprintln!("  Total files: {}", total);
    eprintln!("  Succeeded: {}", result.succeeded);
    eprintln!("  Failed: {}", result.failed);

    if result.has_failures() {
        eprintln!();
        eprintln!("Failed files:");
        for (path, error) in &result.errors {
            eprintln!("  - {}: {}", path.display(), error);
        }
        anyhow::bail!("{} of {} files failed to convert", result.failed, total);
    }

    Ok(())
}

/// Same path, or both resolve to the same existing file
fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn print_summary(
    out: &mut dyn Write,
    stats: &ConvertStats,
    profile: &TargetProfile,
    dry_run: bool,
    verbose: bool,
) -> std::io::Result<()> {
    let output_name = stats.output.as_deref().unwrap_or("<stdout>");

    if dry_run {
        writeln!(out, "Dry run complete (no output written)")?;
    } else {
        writeln!(out, "Conversion complete!")?;
        writeln!(out, "Output file: {}", output_name)?;
    }
    writeln!(out, "File size: {:.2} KB", stats.output_bytes as f64 / 1024.0)?;

    if verbose || dry_run {
        let r = &stats.rewrites;
        writeln!(out)?;
        writeln!(out, "Conversion Statistics:")?;
        writeln!(out, "  PRAGMAs removed: {}", r.pragmas_removed)?;
        writeln!(out, "  Transactions opened: {}", r.transactions_opened)?;
        writeln!(out, "  Transactions committed: {}", r.transactions_committed)?;
        writeln!(out, "  Tables guarded: {}", r.tables_guarded)?;
        writeln!(out, "  Identifiers requoted: {}", r.identifiers_requoted)?;
        writeln!(out, "  Column types rewritten: {}", r.types_rewritten)?;
        writeln!(out, "  Table epilogues appended: {}", r.epilogues_appended)?;
    }

    if !stats.warnings.is_empty() {
        writeln!(out)?;
        if stats.warnings_truncated {
            writeln!(out, "Warnings ({}, truncated):", stats.warnings.len())?;
        } else {
            writeln!(out, "Warnings ({}):", stats.warnings.len())?;
        }
        for warning in &stats.warnings {
            writeln!(out, "  ⚠ {}", warning)?;
        }
        if stats.warnings_truncated {
            writeln!(out, "  ... further warnings not shown")?;
        }
    }

    if !dry_run {
        writeln!(out)?;
        writeln!(out, "To import into MySQL:")?;
        let import_target = stats.output.as_deref().unwrap_or("dump.sql");
        writeln!(out, "   {}", profile.import_command(import_target))?;
    }

    Ok(())
}
