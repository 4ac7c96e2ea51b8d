use crate::cli::EmArgs;
use crate::config::{self, FileConfig};
use crate::error::Result;
use crate::ui;
use mdprep::engine::tools::Toolchain;
use mdprep::workflows;
use tracing::info;

pub fn run(toolchain: &Toolchain, file: &FileConfig, args: &EmArgs) -> Result<()> {
    let stage_config = config::minimize_config(file, args)?;
    let structure = workflows::minimize::resolved_structure(&stage_config)?;
    info!("Minimizing '{}'", structure.display());

    let spinner = ui::stage_spinner("Running energy minimization (this can take a while)...");
    let result = workflows::minimize::run(toolchain, &stage_config);
    match &result {
        Ok(_) => ui::finish_success(&spinner, "energy minimization finished"),
        Err(_) => ui::finish_failure(&spinner),
    }
    let output = result?;

    println!("Minimized structure: {}", output.structure.display());
    Ok(())
}
