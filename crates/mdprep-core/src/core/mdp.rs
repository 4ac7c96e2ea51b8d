//! `.mdp` run-parameter templating.
//!
//! A run configuration is produced by taking a template `.mdp` file and
//! applying a set of key/value overrides: lines whose parameter name matches
//! an override get the new value, overrides with no matching line are
//! appended, and everything else (comments, unrecognized parameters) passes
//! through unchanged.
//!
//! Override keys are drawn from a closed set ([`MdpKey`]) so that a typo in a
//! parameter name fails loudly instead of being silently appended as a new,
//! ignored parameter.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MdpError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Unrecognized .mdp parameter: '{0}'")]
    UnknownKey(String),
}

/// The set of `.mdp` parameters stages are allowed to override.
///
/// GROMACS accepts `-` and `_` interchangeably in parameter names; parsing
/// normalizes both to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MdpKey {
    Integrator,
    Dt,
    Nsteps,
    Define,
    EmTol,
    EmStep,
    NstList,
    NstLog,
    NstEnergy,
    NstXout,
    NstVout,
    NstFout,
    NstXtcOut,
    Rlist,
    Rcoulomb,
    Rvdw,
    CoulombType,
    Constraints,
    ConstraintAlgorithm,
    Tcoupl,
    TcGrps,
    TauT,
    RefT,
    Pcoupl,
    TauP,
    RefP,
    Compressibility,
    GenVel,
    GenTemp,
    GenSeed,
    Pbc,
}

impl MdpKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MdpKey::Integrator => "integrator",
            MdpKey::Dt => "dt",
            MdpKey::Nsteps => "nsteps",
            MdpKey::Define => "define",
            MdpKey::EmTol => "emtol",
            MdpKey::EmStep => "emstep",
            MdpKey::NstList => "nstlist",
            MdpKey::NstLog => "nstlog",
            MdpKey::NstEnergy => "nstenergy",
            MdpKey::NstXout => "nstxout",
            MdpKey::NstVout => "nstvout",
            MdpKey::NstFout => "nstfout",
            MdpKey::NstXtcOut => "nstxtcout",
            MdpKey::Rlist => "rlist",
            MdpKey::Rcoulomb => "rcoulomb",
            MdpKey::Rvdw => "rvdw",
            MdpKey::CoulombType => "coulombtype",
            MdpKey::Constraints => "constraints",
            MdpKey::ConstraintAlgorithm => "constraint_algorithm",
            MdpKey::Tcoupl => "tcoupl",
            MdpKey::TcGrps => "tc_grps",
            MdpKey::TauT => "tau_t",
            MdpKey::RefT => "ref_t",
            MdpKey::Pcoupl => "pcoupl",
            MdpKey::TauP => "tau_p",
            MdpKey::RefP => "ref_p",
            MdpKey::Compressibility => "compressibility",
            MdpKey::GenVel => "gen_vel",
            MdpKey::GenTemp => "gen_temp",
            MdpKey::GenSeed => "gen_seed",
            MdpKey::Pbc => "pbc",
        }
    }
}

impl fmt::Display for MdpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MdpKey {
    type Err = MdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_key(s);
        const ALL: &[MdpKey] = &[
            MdpKey::Integrator,
            MdpKey::Dt,
            MdpKey::Nsteps,
            MdpKey::Define,
            MdpKey::EmTol,
            MdpKey::EmStep,
            MdpKey::NstList,
            MdpKey::NstLog,
            MdpKey::NstEnergy,
            MdpKey::NstXout,
            MdpKey::NstVout,
            MdpKey::NstFout,
            MdpKey::NstXtcOut,
            MdpKey::Rlist,
            MdpKey::Rcoulomb,
            MdpKey::Rvdw,
            MdpKey::CoulombType,
            MdpKey::Constraints,
            MdpKey::ConstraintAlgorithm,
            MdpKey::Tcoupl,
            MdpKey::TcGrps,
            MdpKey::TauT,
            MdpKey::RefT,
            MdpKey::Pcoupl,
            MdpKey::TauP,
            MdpKey::RefP,
            MdpKey::Compressibility,
            MdpKey::GenVel,
            MdpKey::GenTemp,
            MdpKey::GenSeed,
            MdpKey::Pbc,
        ];
        ALL.iter()
            .find(|key| key.as_str() == normalized)
            .copied()
            .ok_or_else(|| MdpError::UnknownKey(s.to_string()))
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

/// A validated set of `.mdp` parameter overrides.
///
/// Keys are unique; insertion order does not matter (appended parameters come
/// out in a stable, sorted order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdpOverrides {
    values: BTreeMap<MdpKey, String>,
}

impl MdpOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: MdpKey, value: impl ToString) -> &mut Self {
        self.values.insert(key, value.to_string());
        self
    }

    /// Sets an override from a free-form parameter name, rejecting names
    /// outside the recognized set.
    pub fn set_named(&mut self, name: &str, value: impl ToString) -> Result<&mut Self, MdpError> {
        let key = MdpKey::from_str(name)?;
        Ok(self.set(key, value))
    }

    pub fn get(&self, key: MdpKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merges `other` into `self`; values from `other` win on collision.
    pub fn merge(&mut self, other: &MdpOverrides) -> &mut Self {
        for (key, value) in &other.values {
            self.values.insert(*key, value.clone());
        }
        self
    }

    /// Builds the override set for a dynamics run of `runtime` ps simulated
    /// with a `dt` ps integration step, merged with `extra` (which takes
    /// precedence on key collision).
    ///
    /// The step count is `int(runtime / dt)`, truncated as the integrator
    /// itself would count whole steps.
    pub fn for_dynamics(dt: f64, runtime: f64, extra: &MdpOverrides) -> Self {
        let nsteps = (runtime / dt) as i64;
        let mut overrides = MdpOverrides::new();
        overrides.set(MdpKey::Dt, dt);
        overrides.set(MdpKey::Nsteps, nsteps);
        overrides.merge(extra);
        overrides
    }
}

/// Renders `template_path` with `overrides` applied and writes the result to
/// `output_path`.
///
/// Template lines whose parameter matches an override keep their key spelling
/// but get the new value (any trailing comment is dropped with the old
/// value); overrides with no matching line are appended at the end. Comment
/// lines and parameters outside [`MdpKey`] pass through untouched.
pub fn render(
    template_path: &Path,
    output_path: &Path,
    overrides: &MdpOverrides,
) -> Result<(), MdpError> {
    let template = fs::read_to_string(template_path)?;

    let mut remaining = overrides.values.clone();
    let mut rendered = String::with_capacity(template.len());

    for line in template.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            rendered.push_str(line);
            rendered.push('\n');
            continue;
        }
        match line.split_once('=') {
            Some((name, _)) => {
                let replacement = MdpKey::from_str(name)
                    .ok()
                    .and_then(|key| remaining.remove(&key));
                match replacement {
                    Some(value) => {
                        rendered.push_str(&format!("{:<12} = {}\n", name.trim(), value));
                    }
                    None => {
                        rendered.push_str(line);
                        rendered.push('\n');
                    }
                }
            }
            None => {
                rendered.push_str(line);
                rendered.push('\n');
            }
        }
    }

    if !remaining.is_empty() {
        rendered.push_str("; parameters added by mdprep\n");
        for (key, value) in &remaining {
            rendered.push_str(&format!("{:<12} = {}\n", key.as_str(), value));
        }
    }

    fs::write(output_path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn render_to_string(template: &str, overrides: &MdpOverrides) -> String {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("template.mdp");
        let output_path = dir.path().join("out.mdp");
        fs::write(&template_path, template).unwrap();
        render(&template_path, &output_path, overrides).unwrap();
        fs::read_to_string(&output_path).unwrap()
    }

    /// Returns the trimmed value of `name` in rendered output, whatever the
    /// column alignment.
    fn value_of(rendered: &str, name: &str) -> Option<String> {
        rendered.lines().find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (normalize_key(key) == normalize_key(name)).then(|| value.trim().to_string())
        })
    }

    #[test]
    fn override_replaces_existing_parameter_value() {
        let mut overrides = MdpOverrides::new();
        overrides.set(MdpKey::Nsteps, 1000);
        let out = render_to_string("integrator = md\nnsteps = 50 ; short\n", &overrides);
        assert_eq!(value_of(&out, "nsteps").as_deref(), Some("1000"));
        assert_eq!(value_of(&out, "integrator").as_deref(), Some("md"));
    }

    #[test]
    fn override_without_matching_line_is_appended() {
        let mut overrides = MdpOverrides::new();
        overrides.set(MdpKey::Define, "-DPOSRES");
        let out = render_to_string("integrator = md\n", &overrides);
        assert_eq!(value_of(&out, "define").as_deref(), Some("-DPOSRES"));
    }

    #[test]
    fn comments_and_unrecognized_parameters_pass_through() {
        let mut overrides = MdpOverrides::new();
        overrides.set(MdpKey::Dt, 0.001);
        let template = "; a comment\nsome_exotic_option = yes\ndt = 0.002\n";
        let out = render_to_string(template, &overrides);
        assert!(out.contains("; a comment"));
        assert_eq!(value_of(&out, "some_exotic_option").as_deref(), Some("yes"));
        assert_eq!(value_of(&out, "dt").as_deref(), Some("0.001"));
    }

    #[test]
    fn dash_and_underscore_key_spellings_match() {
        let mut overrides = MdpOverrides::new();
        overrides.set(MdpKey::TcGrps, "Protein SOL");
        let out = render_to_string("tc-grps = System\n", &overrides);
        assert_eq!(value_of(&out, "tc_grps").as_deref(), Some("Protein SOL"));
    }

    #[test]
    fn unknown_override_name_is_rejected() {
        let mut overrides = MdpOverrides::new();
        let err = overrides.set_named("nstepz", 100).unwrap_err();
        assert!(matches!(err, MdpError::UnknownKey(name) if name == "nstepz"));
    }

    #[test]
    fn unreadable_template_propagates_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.mdp");
        let out = dir.path().join("out.mdp");
        let err = render(&missing, &out, &MdpOverrides::new()).unwrap_err();
        assert!(matches!(err, MdpError::Io(_)));
    }

    #[test]
    fn dynamics_params_compute_step_count_from_runtime_and_dt() {
        let overrides = MdpOverrides::for_dynamics(0.002, 1000.0, &MdpOverrides::new());
        assert_eq!(overrides.get(MdpKey::Nsteps), Some("500000"));
        assert_eq!(overrides.get(MdpKey::Dt), Some("0.002"));
    }

    #[test]
    fn halving_dt_doubles_step_count() {
        let coarse = MdpOverrides::for_dynamics(0.004, 1000.0, &MdpOverrides::new());
        let fine = MdpOverrides::for_dynamics(0.002, 1000.0, &MdpOverrides::new());
        let coarse_steps: i64 = coarse.get(MdpKey::Nsteps).unwrap().parse().unwrap();
        let fine_steps: i64 = fine.get(MdpKey::Nsteps).unwrap().parse().unwrap();
        assert_eq!(fine_steps, 2 * coarse_steps);
    }

    #[test]
    fn extra_overrides_take_precedence_in_dynamics_params() {
        let mut extra = MdpOverrides::new();
        extra.set(MdpKey::Nsteps, 42);
        let overrides = MdpOverrides::for_dynamics(0.002, 1000.0, &extra);
        assert_eq!(overrides.get(MdpKey::Nsteps), Some("42"));
    }

    #[test]
    fn step_count_truncates_rather_than_rounds() {
        let overrides = MdpOverrides::for_dynamics(0.003, 1.0, &MdpOverrides::new());
        // 1.0 / 0.003 = 333.33…
        assert_eq!(overrides.get(MdpKey::Nsteps), Some("333"));
    }
}
