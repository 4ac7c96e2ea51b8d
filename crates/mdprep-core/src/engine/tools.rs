//! Adapter around the GROMACS command-line toolchain.
//!
//! All numerical work is delegated to the `gmx` driver binary. Every call
//! here is a blocking, synchronous invocation of one subcommand; a missing
//! executable or non-zero exit status is fatal and surfaced with the captured
//! stderr. Nothing is retried.

use crate::core::ions::{IonCounts, IonSpecies};
use crate::engine::error::SetupError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Environment variable the CLI honors to point at a non-default `gmx`
/// binary (e.g. a site-specific wrapper or an MPI build).
pub const GMX_ENV_OVERRIDE: &str = "MDPREP_GMX";

const DEFAULT_GMX: &str = "gmx";

/// Captured output of a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// What `grompp` reported while compiling a run input.
#[derive(Debug, Clone, Copy)]
pub struct GromppReport {
    /// Net system charge in elementary charges. `grompp` only prints the
    /// charge line when it is nonzero, so absence means neutral.
    pub total_charge: f64,
}

#[derive(Debug, Clone)]
pub struct Toolchain {
    gmx: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        let gmx = std::env::var_os(GMX_ENV_OVERRIDE)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GMX));
        Self { gmx }
    }
}

impl Toolchain {
    pub fn new(gmx: impl Into<PathBuf>) -> Self {
        Self { gmx: gmx.into() }
    }

    /// Puts `structure` into a simulation box of the given type, keeping at
    /// least `distance` nm between solute and box boundary.
    pub fn editconf(
        &self,
        structure: &Path,
        output: &str,
        box_type: &str,
        distance: f64,
    ) -> Result<ToolOutput, SetupError> {
        self.run(
            "editconf",
            &[
                "-f".into(),
                structure.display().to_string(),
                "-o".into(),
                output.into(),
                "-bt".into(),
                box_type.into(),
                "-d".into(),
                distance.to_string(),
            ],
            None,
        )
    }

    /// Fills the boxed structure with solvent from the `solvent` coordinate
    /// file, updating the molecule counts in `topology`.
    pub fn solvate(
        &self,
        boxed_structure: &str,
        solvent: &str,
        topology: &Path,
        output: &str,
    ) -> Result<ToolOutput, SetupError> {
        self.run(
            "solvate",
            &[
                "-cp".into(),
                boxed_structure.into(),
                "-cs".into(),
                solvent.into(),
                "-p".into(),
                topology.display().to_string(),
                "-o".into(),
                output.into(),
            ],
            None,
        )
    }

    /// Compiles a run input from an `.mdp` file, a structure and a topology,
    /// and reads the net system charge off the diagnostics.
    pub fn grompp(
        &self,
        mdp: &Path,
        structure: &Path,
        topology: &Path,
        index: Option<&Path>,
        output: &str,
        maxwarn: u32,
    ) -> Result<GromppReport, SetupError> {
        let mut args = vec![
            "-f".to_string(),
            mdp.display().to_string(),
            "-c".into(),
            structure.display().to_string(),
            "-p".into(),
            topology.display().to_string(),
            "-o".into(),
            output.into(),
        ];
        if let Some(index) = index {
            args.push("-n".into());
            args.push(index.display().to_string());
        }
        if maxwarn > 0 {
            args.push("-maxwarn".into());
            args.push(maxwarn.to_string());
        }

        let out = self.run("grompp", &args, None)?;
        let total_charge = parse_total_charge(&out.stderr)
            .or_else(|| parse_total_charge(&out.stdout))
            .unwrap_or(0.0);
        Ok(GromppReport { total_charge })
    }

    /// Replaces solvent molecules from the `solvent_group` selection with the
    /// requested counter-ions.
    pub fn genion(
        &self,
        run_input: &Path,
        output: &str,
        topology: &Path,
        species: &IonSpecies,
        counts: IonCounts,
        solvent_group: &str,
    ) -> Result<ToolOutput, SetupError> {
        info!(
            "Adding {} {} and {} {} ions to neutralize the system",
            counts.cations, species.cation, counts.anions, species.anion
        );
        self.run(
            "genion",
            &[
                "-s".into(),
                run_input.display().to_string(),
                "-o".into(),
                output.into(),
                "-p".into(),
                topology.display().to_string(),
                "-pname".into(),
                species.cation.clone(),
                "-nname".into(),
                species.anion.clone(),
                "-np".into(),
                counts.cations.to_string(),
                "-nn".into(),
                counts.anions.to_string(),
            ],
            Some(solvent_group),
        )
    }

    /// Writes a compact, whole-molecule export of `structure` for visual
    /// inspection.
    pub fn trjconv_compact(
        &self,
        structure: &Path,
        run_input: &Path,
        output: &str,
    ) -> Result<ToolOutput, SetupError> {
        self.run(
            "trjconv",
            &[
                "-f".into(),
                structure.display().to_string(),
                "-s".into(),
                run_input.display().to_string(),
                "-o".into(),
                output.into(),
                "-pbc".into(),
                "mol".into(),
                "-ur".into(),
                "compact".into(),
            ],
            Some("System"),
        )
    }

    /// Runs the integrator against the compiled run input named by `deffnm`,
    /// writing the final structure to `final_structure`.
    pub fn mdrun(&self, deffnm: &str, final_structure: &str) -> Result<ToolOutput, SetupError> {
        self.run(
            "mdrun",
            &[
                "-v".into(),
                "-deffnm".into(),
                deffnm.into(),
                "-c".into(),
                final_structure.into(),
            ],
            None,
        )
    }

    fn run(
        &self,
        subcommand: &str,
        args: &[String],
        stdin_input: Option<&str>,
    ) -> Result<ToolOutput, SetupError> {
        let program = format!("{} {}", self.gmx.display(), subcommand);
        debug!("Invoking external tool: {} {}", program, args.join(" "));

        let mut command = Command::new(&self.gmx);
        command
            .arg(subcommand)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if stdin_input.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|err| {
            let reason = if err.kind() == std::io::ErrorKind::NotFound {
                format!(
                    "executable '{}' not found (set {} to override)",
                    self.gmx.display(),
                    GMX_ENV_OVERRIDE
                )
            } else {
                err.to_string()
            };
            SetupError::ExternalTool {
                program: program.clone(),
                reason,
            }
        })?;

        if let Some(input) = stdin_input {
            // Dropping the handle closes the pipe so the child sees EOF.
            let mut stdin = child.stdin.take().ok_or_else(|| SetupError::ExternalTool {
                program: program.clone(),
                reason: "could not open stdin".to_string(),
            })?;
            stdin
                .write_all(format!("{}\n", input).as_bytes())
                .map_err(|err| SetupError::ExternalTool {
                    program: program.clone(),
                    reason: format!("failed to write selection to stdin: {}", err),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| SetupError::ExternalTool {
                program: program.clone(),
                reason: err.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(SetupError::ExternalTool {
                program,
                reason: format!("exit status {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

/// Extracts the net charge from `grompp` diagnostics.
///
/// Matches lines like "System has non-zero total charge: 2.000001" and keeps
/// the last occurrence, which corresponds to the final preprocessing pass.
fn parse_total_charge(diagnostics: &str) -> Option<f64> {
    diagnostics
        .lines()
        .filter(|line| line.contains("total charge"))
        .filter_map(|line| {
            line.rsplit([':', ' '])
                .find_map(|token| token.trim().parse::<f64>().ok())
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_line_is_parsed_from_diagnostics() {
        let stderr = "NOTE 1 [file none.mdp]:\n  ...\nSystem has non-zero total charge: 2.000001\n";
        assert_eq!(parse_total_charge(stderr), Some(2.000001));
    }

    #[test]
    fn negative_charges_are_parsed() {
        let stderr = "System has non-zero total charge: -3\n";
        assert_eq!(parse_total_charge(stderr), Some(-3.0));
    }

    #[test]
    fn missing_charge_line_means_neutral() {
        assert_eq!(parse_total_charge("all quiet on stderr\n"), None);
    }

    #[test]
    fn last_charge_line_wins() {
        let stderr = "System has non-zero total charge: 2\nSystem has non-zero total charge: 0.5\n";
        assert_eq!(parse_total_charge(stderr), Some(0.5));
    }

    #[test]
    fn missing_executable_reports_external_tool_error() {
        let toolchain = Toolchain::new("/nonexistent/gmx-binary");
        let err = toolchain
            .mdrun("em", "em.pdb")
            .expect_err("spawn should fail");
        match err {
            SetupError::ExternalTool { program, reason } => {
                assert!(program.contains("mdrun"));
                assert!(reason.contains("not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
