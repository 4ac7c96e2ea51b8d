use crate::cli::MdArgs;
use crate::config::{self, FileConfig};
use crate::error::Result;
use crate::ui;
use mdprep::engine::tools::Toolchain;
use mdprep::workflows;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Restrained,
    Production,
}

pub fn run(toolchain: &Toolchain, file: &FileConfig, args: &MdArgs, kind: Kind) -> Result<()> {
    let stage_config = config::md_config(file, args)?;

    let (label, result) = match kind {
        Kind::Restrained => {
            info!("Setting up position-restrained MD");
            let spinner = ui::stage_spinner("Preparing position-restrained MD inputs...");
            let result = workflows::md::restrained(toolchain, &stage_config);
            match &result {
                Ok(_) => ui::finish_success(&spinner, "restrained MD inputs staged"),
                Err(_) => ui::finish_failure(&spinner),
            }
            ("Position-restrained", result)
        }
        Kind::Production => {
            info!("Setting up production MD");
            let spinner = ui::stage_spinner("Preparing production MD inputs...");
            let result = workflows::md::production(toolchain, &stage_config);
            match &result {
                Ok(_) => ui::finish_success(&spinner, "production MD inputs staged"),
                Err(_) => ui::finish_failure(&spinner),
            }
            ("Production", result)
        }
    };
    let output = result?;

    println!(
        "{} MD run input: {} (submit the staged queue script to run it)",
        label,
        output.run_input.display()
    );
    Ok(())
}
