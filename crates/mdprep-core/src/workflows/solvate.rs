//! Solvation and charge neutralization stage.
//!
//! Boxes the input structure, fills the box with solvent, reads the net
//! charge off a dry preprocessing pass, replaces solvent molecules with
//! counter-ions until neutral, and exports a compact structure for
//! inspection. The dry pass uses an empty `.mdp` so it cannot contaminate
//! the topology.

use crate::core::ions::neutralizing_counts;
use crate::engine::config::SolvateConfig;
use crate::engine::error::SetupError;
use crate::engine::tools::Toolchain;
use crate::engine::workdir::run_in;
use serde::Serialize;
use std::fs;
use std::path::{self, Path, PathBuf};
use tracing::{info, instrument};

/// Residual charge above this magnitude (in elementary charges) after ion
/// placement is treated as a failed neutralization. Absorbs printf rounding
/// in the toolchain's diagnostics, nothing more.
const CHARGE_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Serialize)]
pub struct SolvateOutput {
    pub dirname: PathBuf,
    /// Absolute path of the neutralized structure (`ionized.gro`).
    pub structure: PathBuf,
    /// Net charge after ion placement; within tolerance of zero.
    pub charge: f64,
}

#[instrument(skip_all, name = "solvate_stage")]
pub fn run(toolchain: &Toolchain, config: &SolvateConfig) -> Result<SolvateOutput, SetupError> {
    if config.concentration != 0.0 {
        return Err(SetupError::NotSupported(format!(
            "target ion concentration {} mol/l; only plain neutralization (concentration = 0) is implemented",
            config.concentration
        )));
    }

    // Resolve before the directory switch invalidates relative paths.
    let structure = path::absolute(&config.structure)?;
    let topology = path::absolute(&config.topology)?;

    run_in(&config.dirname, |stage_dir| {
        toolchain.editconf(&structure, "boxed.gro", &config.box_type, config.distance)?;
        toolchain.solvate("boxed.gro", &config.solvent, &topology, "solvated.gro")?;

        // Dry preprocessing pass purely to read off the net charge.
        fs::write("none.mdp", "; empty\n")?;
        let report = toolchain.grompp(
            Path::new("none.mdp"),
            Path::new("solvated.gro"),
            &topology,
            None,
            "topol.tpr",
            0,
        )?;
        info!(
            "After solvation: total charge qtot = {:+.4}",
            report.total_charge
        );

        let counts = neutralizing_counts(report.total_charge);
        toolchain.genion(
            Path::new("topol.tpr"),
            "ionized.gro",
            &topology,
            &config.ions,
            counts,
            "SOL",
        )?;

        let report = toolchain.grompp(
            Path::new("none.mdp"),
            Path::new("ionized.gro"),
            &topology,
            None,
            "ionized.tpr",
            0,
        )?;
        if report.total_charge.abs() > CHARGE_TOLERANCE {
            return Err(SetupError::ChargeResidual {
                charge: report.total_charge,
            });
        }

        toolchain.trjconv_compact(
            Path::new("ionized.gro"),
            Path::new("ionized.tpr"),
            "compact.pdb",
        )?;

        info!(
            "Solvation finished: charge {:+.4}, structure '{}'",
            report.total_charge,
            stage_dir.join("ionized.gro").display()
        );
        Ok(SolvateOutput {
            dirname: config.dirname.clone(),
            structure: stage_dir.join("ionized.gro"),
            charge: report.total_charge,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::SolvateConfigBuilder;
    use crate::workflows::test_support::{CwdGuard, write_stub_gmx};
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    fn project_with_inputs() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("top")).unwrap();
        fs::write(dir.path().join("top/protein.pdb"), "REMARK test\n").unwrap();
        fs::write(dir.path().join("top/system.top"), "; test topology\n").unwrap();
        dir
    }

    #[test]
    #[serial]
    fn charged_system_is_neutralized_with_counter_ions() {
        let project = project_with_inputs();
        let toolchain = Toolchain::new(write_stub_gmx(project.path()));
        let _cwd = CwdGuard::enter(project.path());

        // The stub reports this charge on the first preprocessing pass.
        fs::create_dir_all("solvate").unwrap();
        fs::write("solvate/qtot.txt", "2\n").unwrap();

        let config = SolvateConfigBuilder::new().build().unwrap();
        let output = run(&toolchain, &config).unwrap();

        assert_eq!(output.charge, 0.0);
        assert!(output.structure.ends_with("solvate/ionized.gro"));
        assert!(output.structure.is_absolute());
        assert!(project.path().join("solvate/compact.pdb").exists());

        let genion_args = fs::read_to_string("solvate/genion.args").unwrap();
        assert!(genion_args.contains("-np 0"), "args: {}", genion_args);
        assert!(genion_args.contains("-nn 2"), "args: {}", genion_args);
        let selection = fs::read_to_string("solvate/genion.stdin").unwrap();
        assert_eq!(selection.trim(), "SOL");
    }

    #[test]
    #[serial]
    fn nonzero_concentration_is_rejected_before_any_tool_runs() {
        let project = project_with_inputs();
        // Deliberately broken toolchain: the stage must fail fast without
        // ever invoking it.
        let toolchain = Toolchain::new("/nonexistent/gmx");
        let _cwd = CwdGuard::enter(project.path());

        let config = SolvateConfigBuilder::new()
            .concentration(0.1)
            .build()
            .unwrap();
        let err = run(&toolchain, &config).unwrap_err();
        assert!(matches!(err, SetupError::NotSupported(_)));
    }

    #[test]
    #[serial]
    fn residual_charge_after_ion_placement_is_fatal() {
        let project = project_with_inputs();
        let toolchain = Toolchain::new(write_stub_gmx(project.path()));
        let _cwd = CwdGuard::enter(project.path());

        fs::create_dir_all("solvate").unwrap();
        fs::write("solvate/qtot.txt", "2\n").unwrap();
        unsafe { env::set_var("GMX_STUB_RESIDUAL", "1") };

        let config = SolvateConfigBuilder::new().build().unwrap();
        let result = run(&toolchain, &config);
        unsafe { env::remove_var("GMX_STUB_RESIDUAL") };

        match result {
            Err(SetupError::ChargeResidual { charge }) => assert_eq!(charge, 1.0),
            other => panic!("expected ChargeResidual, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    #[serial]
    fn working_directory_is_restored_after_a_failing_stage() {
        let project = project_with_inputs();
        let toolchain = Toolchain::new("/nonexistent/gmx");
        let _cwd = CwdGuard::enter(project.path());
        let before = env::current_dir().unwrap();

        let config = SolvateConfigBuilder::new().build().unwrap();
        let err = run(&toolchain, &config).unwrap_err();

        assert!(matches!(err, SetupError::ExternalTool { .. }));
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
