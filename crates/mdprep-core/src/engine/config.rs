//! Stage configuration records and builders.
//!
//! Template locations are carried in an explicit [`TemplateSet`] handed to
//! each stage instead of a process-wide lookup table, so two pipelines with
//! different templates can coexist in one program.

use crate::core::ions::IonSpecies;
use crate::core::mdp::MdpOverrides;
use crate::core::stages::Stage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {message}")]
    InvalidParameter {
        parameter: &'static str,
        message: String,
    },
}

/// Locations of the run-configuration and queue-script templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub em_mdp: PathBuf,
    pub md_mdp: PathBuf,
    pub queue_script: PathBuf,
}

/// Configuration of the solvation/neutralization stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvateConfig {
    pub structure: PathBuf,
    pub topology: PathBuf,
    pub box_type: String,
    /// Minimum solute-box distance in nm.
    pub distance: f64,
    /// Solvent coordinate file `gmx solvate` fills the box from.
    pub solvent: String,
    pub ions: IonSpecies,
    /// Target bulk ion concentration in mol/l. Only 0 (plain
    /// neutralization) is supported.
    pub concentration: f64,
    pub dirname: PathBuf,
}

#[derive(Default)]
pub struct SolvateConfigBuilder {
    structure: Option<PathBuf>,
    topology: Option<PathBuf>,
    box_type: Option<String>,
    distance: Option<f64>,
    solvent: Option<String>,
    ions: Option<IonSpecies>,
    concentration: Option<f64>,
    dirname: Option<PathBuf>,
}

impl SolvateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure(mut self, path: PathBuf) -> Self {
        self.structure = Some(path);
        self
    }
    pub fn topology(mut self, path: PathBuf) -> Self {
        self.topology = Some(path);
        self
    }
    pub fn box_type(mut self, box_type: impl Into<String>) -> Self {
        self.box_type = Some(box_type.into());
        self
    }
    pub fn distance(mut self, nm: f64) -> Self {
        self.distance = Some(nm);
        self
    }
    pub fn solvent(mut self, solvent: impl Into<String>) -> Self {
        self.solvent = Some(solvent.into());
        self
    }
    pub fn ions(mut self, species: IonSpecies) -> Self {
        self.ions = Some(species);
        self
    }
    pub fn concentration(mut self, mol_per_l: f64) -> Self {
        self.concentration = Some(mol_per_l);
        self
    }
    pub fn dirname(mut self, path: PathBuf) -> Self {
        self.dirname = Some(path);
        self
    }

    pub fn build(self) -> Result<SolvateConfig, ConfigError> {
        let distance = self.distance.unwrap_or(0.9);
        if distance <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "distance",
                message: format!("{} nm is not a usable solute-box distance", distance),
            });
        }
        Ok(SolvateConfig {
            structure: self
                .structure
                .unwrap_or_else(|| PathBuf::from("top/protein.pdb")),
            topology: self
                .topology
                .unwrap_or_else(|| PathBuf::from("top/system.top")),
            box_type: self.box_type.unwrap_or_else(|| "dodecahedron".to_string()),
            distance,
            solvent: self.solvent.unwrap_or_else(|| "spc216".to_string()),
            ions: self.ions.unwrap_or_default(),
            concentration: self.concentration.unwrap_or(0.0),
            dirname: self
                .dirname
                .unwrap_or_else(|| PathBuf::from(Stage::Solvate.dirname())),
        })
    }
}

/// Configuration of the energy-minimization stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeConfig {
    pub mdp_template: PathBuf,
    /// Input structure; `None` falls back to the solvation stage's
    /// conventional output.
    pub structure: Option<PathBuf>,
    pub topology: PathBuf,
    pub overrides: MdpOverrides,
    pub dirname: PathBuf,
}

#[derive(Default)]
pub struct MinimizeConfigBuilder {
    mdp_template: Option<PathBuf>,
    structure: Option<PathBuf>,
    topology: Option<PathBuf>,
    overrides: Option<MdpOverrides>,
    dirname: Option<PathBuf>,
}

impl MinimizeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mdp_template(mut self, path: PathBuf) -> Self {
        self.mdp_template = Some(path);
        self
    }
    pub fn structure(mut self, path: PathBuf) -> Self {
        self.structure = Some(path);
        self
    }
    pub fn topology(mut self, path: PathBuf) -> Self {
        self.topology = Some(path);
        self
    }
    pub fn overrides(mut self, overrides: MdpOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }
    pub fn dirname(mut self, path: PathBuf) -> Self {
        self.dirname = Some(path);
        self
    }

    pub fn build(self, templates: &TemplateSet) -> Result<MinimizeConfig, ConfigError> {
        Ok(MinimizeConfig {
            mdp_template: self.mdp_template.unwrap_or_else(|| templates.em_mdp.clone()),
            structure: self.structure,
            topology: self
                .topology
                .unwrap_or_else(|| PathBuf::from("top/system.top")),
            overrides: self.overrides.unwrap_or_default(),
            dirname: self
                .dirname
                .unwrap_or_else(|| PathBuf::from(Stage::EnergyMinimize.dirname())),
        })
    }
}

/// Configuration shared by the restrained and production MD setup stages.
#[derive(Debug, Clone, PartialEq)]
pub struct MdConfig {
    pub mdp_template: PathBuf,
    pub queue_script: PathBuf,
    /// Input structure. The shared setup has no default; the stage wrappers
    /// inject their predecessor's conventional output when unset.
    pub structure: Option<PathBuf>,
    pub topology: PathBuf,
    pub index: Option<PathBuf>,
    /// Default filename stem for the run (`md` → `md.mdp`, `md.tpr`, ...).
    pub deffnm: String,
    /// Integration time step in ps.
    pub dt: f64,
    /// Total simulated time in ps.
    pub runtime: f64,
    pub overrides: MdpOverrides,
    /// Stage directory; `None` lets the stage wrapper pick its conventional
    /// directory name.
    pub dirname: Option<PathBuf>,
}

#[derive(Default)]
pub struct MdConfigBuilder {
    mdp_template: Option<PathBuf>,
    queue_script: Option<PathBuf>,
    structure: Option<PathBuf>,
    topology: Option<PathBuf>,
    index: Option<PathBuf>,
    deffnm: Option<String>,
    dt: Option<f64>,
    runtime: Option<f64>,
    overrides: Option<MdpOverrides>,
    dirname: Option<PathBuf>,
}

impl MdConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mdp_template(mut self, path: PathBuf) -> Self {
        self.mdp_template = Some(path);
        self
    }
    pub fn queue_script(mut self, path: PathBuf) -> Self {
        self.queue_script = Some(path);
        self
    }
    pub fn structure(mut self, path: PathBuf) -> Self {
        self.structure = Some(path);
        self
    }
    pub fn topology(mut self, path: PathBuf) -> Self {
        self.topology = Some(path);
        self
    }
    pub fn index(mut self, path: PathBuf) -> Self {
        self.index = Some(path);
        self
    }
    pub fn deffnm(mut self, stem: impl Into<String>) -> Self {
        self.deffnm = Some(stem.into());
        self
    }
    pub fn dt(mut self, ps: f64) -> Self {
        self.dt = Some(ps);
        self
    }
    pub fn runtime(mut self, ps: f64) -> Self {
        self.runtime = Some(ps);
        self
    }
    pub fn overrides(mut self, overrides: MdpOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }
    pub fn dirname(mut self, path: PathBuf) -> Self {
        self.dirname = Some(path);
        self
    }

    pub fn build(self, templates: &TemplateSet) -> Result<MdConfig, ConfigError> {
        let dt = self.dt.unwrap_or(0.002);
        let runtime = self.runtime.unwrap_or(1000.0);
        if dt <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "dt",
                message: format!("time step must be positive, got {}", dt),
            });
        }
        if runtime <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "runtime",
                message: format!("simulated time must be positive, got {}", runtime),
            });
        }
        Ok(MdConfig {
            mdp_template: self.mdp_template.unwrap_or_else(|| templates.md_mdp.clone()),
            queue_script: self
                .queue_script
                .unwrap_or_else(|| templates.queue_script.clone()),
            structure: self.structure,
            topology: self
                .topology
                .unwrap_or_else(|| PathBuf::from("top/system.top")),
            index: self.index,
            deffnm: self.deffnm.unwrap_or_else(|| "md".to_string()),
            dt,
            runtime,
            overrides: self.overrides.unwrap_or_default(),
            dirname: self.dirname,
        })
    }
}
