//! On-disk layout of the configuration directory.
//!
//! One YAML file per step, named `{step}.yaml`. Supplemental binary
//! artifacts sit next to it as `{step}-{supplemental}.{content_type}`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{StepConfig, SupplementalObject};
use crate::error::RegistryError;

pub const CONFIG_EXT: &str = "yaml";

/// Path of a step's main config file.
pub fn config_path(dir: &Path, step: &str) -> PathBuf {
    dir.join(format!("{step}.{CONFIG_EXT}"))
}

/// Path of one supplemental artifact belonging to a step.
pub fn supplemental_path(dir: &Path, step: &str, suppl: &SupplementalObject) -> PathBuf {
    dir.join(format!("{step}-{}.{}", suppl.name, suppl.content_type))
}

/// Read and validate a step config file.
pub fn read_config(path: &Path) -> Result<StepConfig, RegistryError> {
    let text = fs::read_to_string(path)?;
    let config: StepConfig = serde_yaml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

/// Write a step config file, overwriting any existing one. Supplemental
/// content must already have been stripped to references.
pub fn write_config(dir: &Path, config: &StepConfig) -> Result<(), RegistryError> {
    let text = serde_yaml::to_string(config)?;
    fs::write(config_path(dir, &config.name), text)?;
    Ok(())
}

/// Persist every supplemental object's bytes to its own file and strip the
/// config down to lightweight references.
pub fn write_supplemental(dir: &Path, config: &mut StepConfig) -> Result<(), RegistryError> {
    for suppl in &mut config.supplemental {
        let content = suppl.content.take().ok_or_else(|| {
            RegistryError::Validation(format!(
                "supplemental object {:?} of step {:?} has no content",
                suppl.name, config.name
            ))
        })?;
        fs::write(supplemental_path(dir, &config.name, suppl), content)?;
    }
    Ok(())
}

/// Read the bytes of every referenced supplemental object back into the
/// config, for reconstruction.
pub fn read_supplemental(dir: &Path, config: &mut StepConfig) -> Result<(), RegistryError> {
    let step = config.name.clone();
    for suppl in &mut config.supplemental {
        let path = supplemental_path(dir, &step, suppl);
        suppl.content = Some(fs::read(&path)?);
    }
    Ok(())
}

/// Delete a file, treating "already gone" as success.
pub fn remove_if_present(path: &Path) -> Result<(), RegistryError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
