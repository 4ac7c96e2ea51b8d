use crate::cli::{EmArgs, MdArgs, RunArgs, SolvateArgs};
use crate::config::FileConfig;
use crate::error::Result;
use crate::{commands, commands::md::Kind};
use mdprep::engine::tools::Toolchain;
use tracing::info;

/// Runs solvation, minimization and restrained-MD setup back to back, each
/// stage reading its predecessor's conventional output. Production MD is left
/// out on purpose: the restrained run has to be executed (typically on the
/// batch system) before its final coordinates exist.
pub fn run(toolchain: &Toolchain, file: &FileConfig, args: &RunArgs) -> Result<()> {
    info!("Running the solvate → em → posres pipeline");

    let solvate_args = SolvateArgs {
        structure: args.structure.clone(),
        topology: args.topology.clone(),
        box_type: None,
        distance: None,
        solvent: None,
        cation: None,
        anion: None,
        concentration: None,
        dirname: None,
    };
    commands::solvate::run(toolchain, file, &solvate_args)?;

    let em_args = EmArgs {
        structure: None,
        topology: args.topology.clone(),
        mdp: None,
        overrides: Vec::new(),
        dirname: None,
    };
    commands::minimize::run(toolchain, file, &em_args)?;

    let md_args = MdArgs {
        structure: None,
        topology: args.topology.clone(),
        mdp: None,
        index: None,
        deffnm: None,
        dt: None,
        runtime: None,
        queue_script: None,
        overrides: Vec::new(),
        dirname: None,
    };
    commands::md::run(toolchain, file, &md_args, Kind::Restrained)?;

    println!("Pipeline staged. Submit the restrained MD run, then use 'mdprep md'.");
    Ok(())
}
