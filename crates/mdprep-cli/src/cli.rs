use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "mdprep developers",
    version,
    about = "mdprep - stages GROMACS molecular dynamics workflows: solvation and neutralization, energy minimization, and restrained/production MD input preparation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to the pipeline configuration file in TOML format.
    /// Defaults to ./mdprep.toml when that file exists.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the gmx driver binary (also settable via MDPREP_GMX)
    #[arg(long, global = true, value_name = "PATH")]
    pub gmx: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Put the structure into a box, add solvent, and neutralize with ions.
    Solvate(SolvateArgs),
    /// Set up energy minimization and run it.
    Em(EmArgs),
    /// Set up position-restrained MD (prepares inputs, does not run them).
    Posres(MdArgs),
    /// Set up equilibrium (production) MD (prepares inputs, does not run them).
    Md(MdArgs),
    /// Run the solvate, em and posres stages back to back.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct SolvateArgs {
    /// Input structure file [default: top/protein.pdb]
    #[arg(short = 'f', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// System topology file [default: top/system.top]
    #[arg(short = 'p', long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Box geometry type (e.g. cubic, dodecahedron)
    #[arg(long, value_name = "TYPE")]
    pub box_type: Option<String>,

    /// Minimum solute-box distance in nm
    #[arg(short, long, value_name = "NM")]
    pub distance: Option<f64>,

    /// Solvent coordinate file used to fill the box
    #[arg(long, value_name = "NAME")]
    pub solvent: Option<String>,

    /// Cation species name
    #[arg(long, value_name = "NAME")]
    pub cation: Option<String>,

    /// Anion species name
    #[arg(long, value_name = "NAME")]
    pub anion: Option<String>,

    /// Target bulk ion concentration in mol/l (only 0 is supported)
    #[arg(long, value_name = "MOL_PER_L")]
    pub concentration: Option<f64>,

    /// Directory to run the stage in [default: solvate]
    #[arg(long, value_name = "DIR")]
    pub dirname: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EmArgs {
    /// Input structure [default: solvate/ionized.gro]
    #[arg(short = 'f', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// System topology file [default: top/system.top]
    #[arg(short = 'p', long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Run-configuration template [default: templates/em.mdp]
    #[arg(long, value_name = "PATH")]
    pub mdp: Option<PathBuf>,

    /// Override a template parameter (repeatable), e.g. --set emtol=500
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Directory to run the stage in [default: em]
    #[arg(long, value_name = "DIR")]
    pub dirname: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MdArgs {
    /// Input structure [default: the previous stage's output]
    #[arg(short = 'f', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// System topology file [default: top/system.top]
    #[arg(short = 'p', long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Run-configuration template [default: templates/md.mdp]
    #[arg(long, value_name = "PATH")]
    pub mdp: Option<PathBuf>,

    /// Index file with custom atom groups
    #[arg(short = 'n', long, value_name = "PATH")]
    pub index: Option<PathBuf>,

    /// Default filename stem for the run files
    #[arg(long, value_name = "NAME")]
    pub deffnm: Option<String>,

    /// Integration time step in ps [default: 0.002]
    #[arg(long, value_name = "PS")]
    pub dt: Option<f64>,

    /// Total simulated time in ps [default: 1000]
    #[arg(long, value_name = "PS")]
    pub runtime: Option<f64>,

    /// Queue-submission script copied next to the run input
    #[arg(long, value_name = "PATH")]
    pub queue_script: Option<PathBuf>,

    /// Override a template parameter (repeatable), e.g. --set nstxtcout=250
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Directory to run the stage in [default: md_posres or md]
    #[arg(long, value_name = "DIR")]
    pub dirname: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input structure for the solvation stage [default: top/protein.pdb]
    #[arg(short = 'f', long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// System topology file [default: top/system.top]
    #[arg(short = 'p', long, value_name = "PATH")]
    pub topology: Option<PathBuf>,
}
