use crate::cli::SolvateArgs;
use crate::config::{self, FileConfig};
use crate::error::Result;
use crate::ui;
use mdprep::engine::tools::Toolchain;
use mdprep::workflows;
use tracing::info;

pub fn run(toolchain: &Toolchain, file: &FileConfig, args: &SolvateArgs) -> Result<()> {
    let stage_config = config::solvate_config(file, args)?;
    info!(
        "Solvating '{}' with topology '{}'",
        stage_config.structure.display(),
        stage_config.topology.display()
    );

    let spinner = ui::stage_spinner("Solvating and neutralizing the system...");
    let result = workflows::solvate::run(toolchain, &stage_config);
    match &result {
        Ok(_) => ui::finish_success(&spinner, "system solvated and neutralized"),
        Err(_) => ui::finish_failure(&spinner),
    }
    let output = result?;

    println!(
        "Ionized structure: {} (net charge {:+.4} e)",
        output.structure.display(),
        output.charge
    );
    Ok(())
}
