//! Restrained and production MD setup stages.
//!
//! These stages only prepare run inputs: they render the run configuration,
//! compile it with `grompp`, and stage a copy of the queue-submission script
//! next to it. Launching `mdrun` is left to the operator or the batch system,
//! so there is no automatic chaining beyond the conventional output paths.

use crate::core::mdp::{self, MdpKey, MdpOverrides};
use crate::core::stages::Stage;
use crate::engine::config::MdConfig;
use crate::engine::error::SetupError;
use crate::engine::tools::Toolchain;
use crate::engine::workdir::run_in;
use serde::Serialize;
use std::fs;
use std::path::{self, Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct MdSetupOutput {
    pub dirname: PathBuf,
    /// Absolute path of the compiled run input (`<deffnm>.tpr`).
    pub run_input: PathBuf,
}

/// Shared setup for both MD stages.
///
/// Requires an explicit input structure; the stage wrappers inject their
/// predecessor's conventional output, but at this layer there is no sensible
/// default to fall back to.
pub fn setup_md(
    toolchain: &Toolchain,
    dirname: &Path,
    config: &MdConfig,
) -> Result<MdSetupOutput, SetupError> {
    let structure = config.structure.as_ref().ok_or(SetupError::MissingInput(
        "an input structure is required to set up an MD run",
    ))?;

    // Resolve before the directory switch invalidates relative paths.
    let structure = path::absolute(structure)?;
    let topology = path::absolute(&config.topology)?;
    let template = path::absolute(&config.mdp_template)?;
    let queue_script = path::absolute(&config.queue_script)?;
    let index = config.index.as_ref().map(|p| path::absolute(p)).transpose()?;

    let overrides = MdpOverrides::for_dynamics(config.dt, config.runtime, &config.overrides);
    let nsteps = overrides.get(MdpKey::Nsteps).unwrap_or("?").to_string();

    let mdp_name = format!("{}.mdp", config.deffnm);
    let tpr_name = format!("{}.tpr", config.deffnm);

    run_in(dirname, |stage_dir| {
        mdp::render(&template, Path::new(&mdp_name), &overrides).map_err(|source| {
            SetupError::Template {
                path: template.clone(),
                source,
            }
        })?;

        toolchain.grompp(
            Path::new(&mdp_name),
            &structure,
            &topology,
            index.as_deref(),
            &tpr_name,
            0,
        )?;

        // Staged verbatim; editing the script for the site queue is manual.
        let script_name = queue_script
            .file_name()
            .ok_or(SetupError::MissingInput("queue script path has no filename"))?;
        fs::copy(&queue_script, script_name)?;

        info!(
            "All files set up for a run time of {} ps (dt={}, nsteps={})",
            config.runtime, config.dt, nsteps
        );
        Ok(MdSetupOutput {
            dirname: dirname.to_path_buf(),
            run_input: stage_dir.join(&tpr_name),
        })
    })
}

/// Sets up MD with position restraints active.
///
/// Defaults the input structure to the minimization stage's output and forces
/// `define = -DPOSRES` into the run configuration.
#[instrument(skip_all, name = "restrained_md_stage")]
pub fn restrained(toolchain: &Toolchain, config: &MdConfig) -> Result<MdSetupOutput, SetupError> {
    let mut config = config.clone();
    if config.structure.is_none() {
        config.structure = Some(Stage::EnergyMinimize.conventional_output());
    }
    config.overrides.set(MdpKey::Define, "-DPOSRES");
    let dirname = config
        .dirname
        .clone()
        .unwrap_or_else(|| PathBuf::from(Stage::RestrainedMd.dirname()));
    setup_md(toolchain, &dirname, &config)
}

/// Sets up equilibrium (production) MD.
///
/// Defaults the input structure to the restrained stage's final coordinates.
#[instrument(skip_all, name = "production_md_stage")]
pub fn production(toolchain: &Toolchain, config: &MdConfig) -> Result<MdSetupOutput, SetupError> {
    let mut config = config.clone();
    if config.structure.is_none() {
        config.structure = Some(Stage::RestrainedMd.conventional_output());
    }
    let dirname = config
        .dirname
        .clone()
        .unwrap_or_else(|| PathBuf::from(Stage::ProductionMd.dirname()));
    setup_md(toolchain, &dirname, &config)
}
