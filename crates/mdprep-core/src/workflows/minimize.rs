//! Energy-minimization stage.
//!
//! Renders `em.mdp` from the template, compiles the run input, and runs the
//! integrator in minimization mode. Unlike the MD setup stages this one does
//! execute `mdrun`, so it can take a while.

use crate::core::mdp;
use crate::core::stages::Stage;
use crate::engine::config::MinimizeConfig;
use crate::engine::error::SetupError;
use crate::engine::tools::Toolchain;
use crate::engine::workdir::run_in;
use serde::Serialize;
use std::path::{self, Path, PathBuf};
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct MinimizeOutput {
    pub dirname: PathBuf,
    /// Absolute path of the minimized structure (`em.pdb`).
    pub structure: PathBuf,
}

/// The input structure the stage will use, resolved to an absolute path
/// against the caller's working directory (i.e. before any directory
/// switch). Falls back to the solvation stage's conventional output.
pub fn resolved_structure(config: &MinimizeConfig) -> Result<PathBuf, SetupError> {
    let structure = config
        .structure
        .clone()
        .unwrap_or_else(|| Stage::Solvate.conventional_output());
    Ok(path::absolute(structure)?)
}

#[instrument(skip_all, name = "minimize_stage")]
pub fn run(toolchain: &Toolchain, config: &MinimizeConfig) -> Result<MinimizeOutput, SetupError> {
    let structure = resolved_structure(config)?;
    let topology = path::absolute(&config.topology)?;
    let template = path::absolute(&config.mdp_template)?;

    run_in(&config.dirname, |stage_dir| {
        mdp::render(&template, Path::new("em.mdp"), &config.overrides).map_err(|source| {
            SetupError::Template {
                path: template.clone(),
                source,
            }
        })?;

        // maxwarn 1: solvated systems routinely trip one benign grompp
        // warning about unidentified atom name mismatches.
        toolchain.grompp(
            Path::new("em.mdp"),
            &structure,
            &topology,
            None,
            "em.tpr",
            1,
        )?;
        toolchain.mdrun("em", "em.pdb")?;

        info!(
            "Energy minimization finished, structure written to '{}'",
            stage_dir.join("em.pdb").display()
        );
        Ok(MinimizeOutput {
            dirname: config.dirname.clone(),
            structure: stage_dir.join("em.pdb"),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{MinimizeConfigBuilder, TemplateSet};
    use crate::workflows::test_support::{CwdGuard, write_stub_gmx};
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::tempdir;

    fn templates(root: &Path) -> TemplateSet {
        let em = root.join("em.mdp.template");
        fs::write(&em, "integrator = steep\nemtol = 1000\n").unwrap();
        TemplateSet {
            em_mdp: em,
            md_mdp: root.join("md.mdp.template"),
            queue_script: root.join("run.sge"),
        }
    }

    #[test]
    #[serial]
    fn default_structure_resolves_to_the_solvate_output_before_the_switch() {
        let project = tempdir().unwrap();
        let _cwd = CwdGuard::enter(project.path());

        let config = MinimizeConfigBuilder::new()
            .build(&templates(project.path()))
            .unwrap();
        let resolved = resolved_structure(&config).unwrap();

        assert_eq!(
            resolved,
            env::current_dir().unwrap().join("solvate/ionized.gro")
        );
    }

    #[test]
    #[serial]
    fn explicit_structure_overrides_the_conventional_default() {
        let project = tempdir().unwrap();
        let _cwd = CwdGuard::enter(project.path());

        let config = MinimizeConfigBuilder::new()
            .structure(PathBuf::from("elsewhere/frame.gro"))
            .build(&templates(project.path()))
            .unwrap();
        let resolved = resolved_structure(&config).unwrap();

        assert_eq!(
            resolved,
            env::current_dir().unwrap().join("elsewhere/frame.gro")
        );
    }

    #[test]
    #[serial]
    fn minimization_renders_compiles_and_runs() {
        let project = tempdir().unwrap();
        let toolchain = Toolchain::new(write_stub_gmx(project.path()));
        let _cwd = CwdGuard::enter(project.path());
        fs::create_dir_all("top").unwrap();
        fs::write("top/system.top", "; topology\n").unwrap();

        let config = MinimizeConfigBuilder::new()
            .build(&templates(project.path()))
            .unwrap();
        let output = run(&toolchain, &config).unwrap();

        assert!(output.structure.ends_with("em/em.pdb"));
        assert!(project.path().join("em/em.mdp").exists());
        assert!(project.path().join("em/em.tpr").exists());
        assert!(project.path().join("em/em.pdb").exists());

        let rendered = fs::read_to_string(project.path().join("em/em.mdp")).unwrap();
        assert!(rendered.contains("integrator = steep"));
    }

    #[test]
    #[serial]
    fn unreadable_template_is_a_template_error() {
        let project = tempdir().unwrap();
        let toolchain = Toolchain::new(write_stub_gmx(project.path()));
        let _cwd = CwdGuard::enter(project.path());

        let missing = TemplateSet {
            em_mdp: project.path().join("does-not-exist.mdp"),
            md_mdp: project.path().join("md.mdp.template"),
            queue_script: project.path().join("run.sge"),
        };
        let config = MinimizeConfigBuilder::new().build(&missing).unwrap();
        let err = run(&toolchain, &config).unwrap_err();

        assert!(matches!(err, SetupError::Template { .. }));
    }
}
