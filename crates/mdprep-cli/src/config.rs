//! Pipeline configuration file handling.
//!
//! A `mdprep.toml` file supplies project-wide defaults (template locations,
//! ion species, stage parameters); explicit CLI flags override it, and
//! built-in defaults cover everything else. The file layer is kept separate
//! from the engine's config types and converted via the merge functions
//! below.

use crate::cli::{EmArgs, MdArgs, SolvateArgs};
use crate::error::{CliError, Result};
use mdprep::core::ions::IonSpecies;
use mdprep::core::mdp::MdpOverrides;
use mdprep::engine::config::{
    MdConfig, MdConfigBuilder, MinimizeConfig, MinimizeConfigBuilder, SolvateConfig,
    SolvateConfigBuilder, TemplateSet,
};
use mdprep::engine::tools::Toolchain;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "mdprep.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Path of the gmx driver binary.
    pub gmx: Option<PathBuf>,
    #[serde(default)]
    pub templates: FileTemplates,
    #[serde(default)]
    pub ions: FileIons,
    #[serde(default)]
    pub solvate: FileSolvate,
    #[serde(default)]
    pub minimize: FileMinimize,
    #[serde(default)]
    pub md: FileMd,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileTemplates {
    #[serde(rename = "em-mdp")]
    pub em_mdp: Option<PathBuf>,
    #[serde(rename = "md-mdp")]
    pub md_mdp: Option<PathBuf>,
    #[serde(rename = "queue-script")]
    pub queue_script: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileIons {
    pub cation: Option<String>,
    pub anion: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSolvate {
    pub structure: Option<PathBuf>,
    pub topology: Option<PathBuf>,
    #[serde(rename = "box-type")]
    pub box_type: Option<String>,
    pub distance: Option<f64>,
    pub solvent: Option<String>,
    pub concentration: Option<f64>,
    pub dirname: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileMinimize {
    pub structure: Option<PathBuf>,
    pub topology: Option<PathBuf>,
    pub dirname: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileMd {
    pub structure: Option<PathBuf>,
    pub topology: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub deffnm: Option<String>,
    pub dt: Option<f64>,
    pub runtime: Option<f64>,
}

impl FileConfig {
    /// Loads the configuration file. An explicitly given path must exist;
    /// without one, `./mdprep.toml` is used when present and built-in
    /// defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("No configuration file found, using built-in defaults.");
                    return Ok(Self::default());
                }
                default
            }
        };

        info!("Loading configuration from '{}'", path.display());
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path,
            source: e.into(),
        })
    }

    pub fn template_set(&self) -> TemplateSet {
        TemplateSet {
            em_mdp: self
                .templates
                .em_mdp
                .clone()
                .unwrap_or_else(|| PathBuf::from("templates/em.mdp")),
            md_mdp: self
                .templates
                .md_mdp
                .clone()
                .unwrap_or_else(|| PathBuf::from("templates/md.mdp")),
            queue_script: self
                .templates
                .queue_script
                .clone()
                .unwrap_or_else(|| PathBuf::from("templates/run.sge")),
        }
    }

    fn ion_species(&self) -> IonSpecies {
        let mut species = IonSpecies::default();
        if let Some(cation) = &self.ions.cation {
            species.cation = cation.clone();
        }
        if let Some(anion) = &self.ions.anion {
            species.anion = anion.clone();
        }
        species
    }
}

pub fn toolchain(file: &FileConfig, cli_gmx: Option<&Path>) -> Toolchain {
    match cli_gmx.or(file.gmx.as_deref()) {
        Some(path) => Toolchain::new(path),
        None => Toolchain::default(),
    }
}

/// Parses repeated `--set key=value` pairs into a validated override set.
pub fn overrides_from_pairs(pairs: &[String]) -> Result<MdpOverrides> {
    let mut overrides = MdpOverrides::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            CliError::Argument(format!("expected KEY=VALUE, got '{}'", pair))
        })?;
        overrides
            .set_named(key, value.trim())
            .map_err(|e| CliError::Argument(e.to_string()))?;
    }
    Ok(overrides)
}

pub fn solvate_config(file: &FileConfig, args: &SolvateArgs) -> Result<SolvateConfig> {
    let mut species = file.ion_species();
    if let Some(cation) = &args.cation {
        species.cation = cation.clone();
    }
    if let Some(anion) = &args.anion {
        species.anion = anion.clone();
    }

    let mut builder = SolvateConfigBuilder::new().ions(species);
    if let Some(v) = args.structure.clone().or(file.solvate.structure.clone()) {
        builder = builder.structure(v);
    }
    if let Some(v) = args.topology.clone().or(file.solvate.topology.clone()) {
        builder = builder.topology(v);
    }
    if let Some(v) = args.box_type.clone().or(file.solvate.box_type.clone()) {
        builder = builder.box_type(v);
    }
    if let Some(v) = args.distance.or(file.solvate.distance) {
        builder = builder.distance(v);
    }
    if let Some(v) = args.solvent.clone().or(file.solvate.solvent.clone()) {
        builder = builder.solvent(v);
    }
    if let Some(v) = args.concentration.or(file.solvate.concentration) {
        builder = builder.concentration(v);
    }
    if let Some(v) = args.dirname.clone().or(file.solvate.dirname.clone()) {
        builder = builder.dirname(v);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

pub fn minimize_config(file: &FileConfig, args: &EmArgs) -> Result<MinimizeConfig> {
    let mut builder = MinimizeConfigBuilder::new();
    if let Some(v) = args.mdp.clone() {
        builder = builder.mdp_template(v);
    }
    if let Some(v) = args.structure.clone().or(file.minimize.structure.clone()) {
        builder = builder.structure(v);
    }
    if let Some(v) = args.topology.clone().or(file.minimize.topology.clone()) {
        builder = builder.topology(v);
    }
    if let Some(v) = args.dirname.clone().or(file.minimize.dirname.clone()) {
        builder = builder.dirname(v);
    }
    builder = builder.overrides(overrides_from_pairs(&args.overrides)?);
    builder
        .build(&file.template_set())
        .map_err(|e| CliError::Config(e.to_string()))
}

pub fn md_config(file: &FileConfig, args: &MdArgs) -> Result<MdConfig> {
    let mut builder = MdConfigBuilder::new();
    if let Some(v) = args.mdp.clone() {
        builder = builder.mdp_template(v);
    }
    if let Some(v) = args.queue_script.clone() {
        builder = builder.queue_script(v);
    }
    if let Some(v) = args.structure.clone().or(file.md.structure.clone()) {
        builder = builder.structure(v);
    }
    if let Some(v) = args.topology.clone().or(file.md.topology.clone()) {
        builder = builder.topology(v);
    }
    if let Some(v) = args.index.clone().or(file.md.index.clone()) {
        builder = builder.index(v);
    }
    if let Some(v) = args.deffnm.clone().or(file.md.deffnm.clone()) {
        builder = builder.deffnm(v);
    }
    if let Some(v) = args.dt.or(file.md.dt) {
        builder = builder.dt(v);
    }
    if let Some(v) = args.runtime.or(file.md.runtime) {
        builder = builder.runtime(v);
    }
    if let Some(v) = args.dirname.clone() {
        builder = builder.dirname(v);
    }
    builder = builder.overrides(overrides_from_pairs(&args.overrides)?);
    builder
        .build(&file.template_set())
        .map_err(|e| CliError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert!(config.gmx.is_none());
        assert_eq!(
            config.template_set().em_mdp,
            PathBuf::from("templates/em.mdp")
        );
    }

    #[test]
    fn file_values_parse_with_kebab_case_keys() {
        let config: FileConfig = toml::from_str(
            r#"
            gmx = "/opt/gromacs/bin/gmx"

            [templates]
            em-mdp = "conf/em.mdp"

            [ions]
            cation = "K"

            [solvate]
            box-type = "cubic"
            distance = 1.2
            "#,
        )
        .unwrap();

        assert_eq!(config.gmx, Some(PathBuf::from("/opt/gromacs/bin/gmx")));
        assert_eq!(config.template_set().em_mdp, PathBuf::from("conf/em.mdp"));
        assert_eq!(config.ions.cation.as_deref(), Some("K"));
        assert_eq!(config.solvate.box_type.as_deref(), Some("cubic"));
        assert_eq!(config.solvate.distance, Some(1.2));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let result: std::result::Result<FileConfig, _> =
            toml::from_str("[solvate]\nboxtype = \"cubic\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn override_pairs_are_validated_against_the_known_key_set() {
        let overrides = overrides_from_pairs(&["emtol=500".to_string()]).unwrap();
        assert!(!overrides.is_empty());

        let err = overrides_from_pairs(&["emtoll=500".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));

        let err = overrides_from_pairs(&["no-equals-sign".to_string()]).unwrap_err();
        assert!(matches!(err, CliError::Argument(_)));
    }
}
