use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use modelmanager_orchestration::{OrchestrationError, Orchestrator, StepBody};

use crate::config::{StepConfig, StepDescriptor};
use crate::error::RegistryError;
use crate::step::Step;
use crate::store;
use crate::template::TemplateSet;
use crate::version::version_greater_or_equal;
use crate::MODELMANAGER_VERSION;

/// Conventional configuration directory when none is given.
pub const DEFAULT_DIR: &str = "configs";

/// Names that cannot be used for steps (version header key in older file
/// formats).
const RESERVED_NAMES: &[&str] = &["modelmanager_version"];

/// How `initialize` treats stored steps it cannot resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateMode {
    /// Every stored step must parse and have its template type registered;
    /// anything else fails the scan.
    Strict,
    /// Malformed files and unknown template types are skipped with a
    /// diagnostic.
    #[default]
    Lenient,
}

struct StepEntry {
    path: PathBuf,
    config: StepConfig,
    instance: Option<Box<dyn Step>>,
}

/// Catalog of named steps backed by one config file per step.
///
/// Owns the configuration directory, the template lookup table, and a handle
/// to the orchestration collaborator. Step names are unique; registering an
/// existing name overwrites it (last write wins) with a warning.
pub struct ModelManager {
    dir: PathBuf,
    mode: TemplateMode,
    templates: Arc<TemplateSet>,
    orchestrator: Arc<dyn Orchestrator>,
    steps: BTreeMap<String, StepEntry>,
}

impl ModelManager {
    /// Open a registry over a configuration directory, creating the
    /// directory if absent and loading every stored step.
    ///
    /// Each loaded step is declared with the orchestrator as a deferred
    /// runnable; nothing is executed unless its config asks for `autorun`.
    pub fn initialize(
        dir: Option<PathBuf>,
        mode: TemplateMode,
        templates: Arc<TemplateSet>,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Result<Self, RegistryError> {
        let dir = dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DIR));
        fs::create_dir_all(&dir)?;
        let mut manager = Self {
            dir,
            mode,
            templates,
            orchestrator,
            steps: BTreeMap::new(),
        };
        manager.rescan()?;
        Ok(manager)
    }

    /// Re-scan the configuration directory. Unchanged files are no-ops,
    /// changed files overwrite their entries, new files are loaded.
    pub fn rescan(&mut self) -> Result<(), RegistryError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(store::CONFIG_EXT) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            if let Err(e) = self.scan_file(&path) {
                match self.mode {
                    TemplateMode::Strict => return Err(e),
                    TemplateMode::Lenient => {
                        warn!(path = %path.display(), error = %e, "skipping stored step");
                    }
                }
            }
        }
        Ok(())
    }

    fn scan_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        let config = store::read_config(path)?;
        if RESERVED_NAMES.contains(&config.name.as_str()) {
            return Err(RegistryError::ReservedName(config.name));
        }
        if !self.templates.contains(&config.template) {
            return Err(RegistryError::UnknownTemplate(config.template));
        }
        match version_greater_or_equal(MODELMANAGER_VERSION, &config.modelmanager_version) {
            Ok(true) => {}
            Ok(false) => warn!(
                step = %config.name,
                version = %config.modelmanager_version,
                "config was written by a newer library version"
            ),
            Err(_) => warn!(
                step = %config.name,
                version = %config.modelmanager_version,
                "config carries an unparseable version string"
            ),
        }

        if let Some(existing) = self.steps.get(&config.name) {
            if existing.config == config {
                return Ok(());
            }
            warn!(step = %config.name, "stored config changed, reloading");
        }

        let name = config.name.clone();
        let autorun = config.autorun;
        self.declare(&config)?;
        self.steps.insert(
            name.clone(),
            StepEntry {
                path: path.to_path_buf(),
                config,
                instance: None,
            },
        );
        if autorun {
            self.orchestrator.run_steps(&[&name])?;
        }
        Ok(())
    }

    /// Declare a deferred runnable with the orchestrator, replacing any
    /// prior declaration under the same name. The body reconstructs the
    /// step from its stored config at invocation time.
    fn declare(&self, config: &StepConfig) -> Result<(), RegistryError> {
        let templates = Arc::clone(&self.templates);
        let dir = self.dir.clone();
        let stored = config.clone();
        let body: StepBody = Box::new(move |orch| {
            let mut config = stored.clone();
            store::read_supplemental(&dir, &mut config)
                .and_then(|_| templates.build(&config))
                .and_then(|step| step.run(orch))
                .map_err(|e| OrchestrationError::StepFailed {
                    name: config.name.clone(),
                    message: e.to_string(),
                })
        });
        self.orchestrator.add_step(&config.name, body)?;
        Ok(())
    }

    /// Persist a step and declare it as runnable.
    ///
    /// Supplemental objects are written to their own files and replaced by
    /// references in the stored config. After a successful return the step
    /// is both durable on disk and runnable in-process without a reload.
    pub fn register(&mut self, step: &dyn Step) -> Result<(), RegistryError> {
        let name = step.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::Validation("step has no name".into()));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(RegistryError::ReservedName(name));
        }
        if !self.templates.contains(step.template()) {
            return Err(RegistryError::UnknownTemplate(step.template().to_string()));
        }

        let mut config = step.to_config()?;
        config.validate()?;

        let previous = self.steps.get(&name).map(|e| e.config.supplemental.clone());
        if previous.is_some() {
            warn!(step = %name, "overwriting existing step");
        }

        store::write_supplemental(&self.dir, &mut config)?;
        store::write_config(&self.dir, &config)?;

        // Supplemental files of the replaced version that the new config no
        // longer references.
        if let Some(old) = previous {
            let kept: Vec<PathBuf> = config
                .supplemental
                .iter()
                .map(|s| store::supplemental_path(&self.dir, &name, s))
                .collect();
            for suppl in &old {
                let path = store::supplemental_path(&self.dir, &name, suppl);
                if !kept.contains(&path) {
                    store::remove_if_present(&path)?;
                }
            }
        }

        self.declare(&config)?;
        let autorun = config.autorun;
        self.steps.insert(
            name.clone(),
            StepEntry {
                path: store::config_path(&self.dir, &name),
                config,
                instance: Some(step.clone_box()),
            },
        );
        info!(step = %name, "registered step");

        if autorun {
            self.orchestrator.run_steps(&[&name])?;
        }
        Ok(())
    }

    /// Return an owned instance of a step, materializing it from disk on
    /// first access.
    pub fn get_step(&mut self, name: &str) -> Result<Box<dyn Step>, RegistryError> {
        let templates = Arc::clone(&self.templates);
        let dir = self.dir.clone();
        let entry = self
            .steps
            .get_mut(name)
            .ok_or_else(|| RegistryError::StepNotFound(name.to_string()))?;

        let instance = match entry.instance.take() {
            Some(instance) => instance,
            None => {
                let mut config = entry.config.clone();
                store::read_supplemental(&dir, &mut config)?;
                let instance = templates.build(&config)?;
                debug!(step = %name, "materialized step from stored config");
                instance
            }
        };
        let result = instance.clone_box();
        entry.instance = Some(instance);
        Ok(result)
    }

    /// Materialize a step if needed and run it against the orchestrator.
    pub fn run_step(&mut self, name: &str) -> Result<(), RegistryError> {
        let step = self.get_step(name)?;
        step.run(self.orchestrator.as_ref())
    }

    /// Descriptors for every known step, sorted by name. Does not
    /// materialize anything.
    pub fn list_steps(&self) -> Vec<StepDescriptor> {
        self.steps.values().map(|e| e.config.descriptor()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Delete a step's files and forget it in-process and in the
    /// orchestrator. Unknown names and already-deleted files are treated as
    /// removed, not as errors.
    pub fn remove_step(&mut self, name: &str) -> Result<(), RegistryError> {
        let Some(entry) = self.steps.remove(name) else {
            debug!(step = %name, "remove of unknown step ignored");
            return Ok(());
        };
        for suppl in &entry.config.supplemental {
            store::remove_if_present(&store::supplemental_path(&self.dir, name, suppl))?;
        }
        store::remove_if_present(&entry.path)?;
        self.orchestrator.remove_step(name)?;
        info!(step = %name, "removed step");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mode(&self) -> TemplateMode {
        self.mode
    }

    /// Explicit teardown. In-process state is discarded; files written so
    /// far stay on disk, and steps stay declared with the orchestrator
    /// until the process exits.
    pub fn close(self) {}
}
