//! Profile command CLI handler.

use crate::profile::TargetProfile;
use anyhow::Context;
use std::path::PathBuf;

/// Defaults, overlaid with an optional YAML file and `--database`
pub fn load_profile(
    profile: Option<PathBuf>,
    database: Option<String>,
) -> anyhow::Result<TargetProfile> {
    let base = match profile {
        Some(path) => TargetProfile::load(&path)
            .with_context(|| format!("Cannot load profile: {}", path.display()))?,
        None => TargetProfile::default(),
    };

    Ok(match database {
        Some(db) => base.with_database(db),
        None => base,
    })
}

pub fn run(profile: Option<PathBuf>, database: Option<String>) -> anyhow::Result<()> {
    let profile = load_profile(profile, database)?;
    print!("{}", profile.to_yaml()?);
    Ok(())
}
