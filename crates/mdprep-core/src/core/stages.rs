//! Stage naming and the conventional output paths that chain stages.
//!
//! Each pipeline stage writes its primary output to a fixed, documented
//! location inside its own directory. Downstream stages use that location as
//! their default input, so the whole default wiring of the pipeline lives
//! here instead of being repeated as string literals at every call site.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Solvate,
    EnergyMinimize,
    RestrainedMd,
    ProductionMd,
}

impl Stage {
    /// Directory the stage runs in, relative to the project root.
    pub fn dirname(&self) -> &'static str {
        match self {
            Stage::Solvate => "solvate",
            Stage::EnergyMinimize => "em",
            Stage::RestrainedMd => "md_posres",
            Stage::ProductionMd => "md",
        }
    }

    /// The structure file the stage is documented to produce, relative to the
    /// project root. This is the next stage's default input.
    pub fn conventional_output(&self) -> PathBuf {
        let file = match self {
            Stage::Solvate => "ionized.gro",
            Stage::EnergyMinimize => "em.pdb",
            // mdrun -deffnm md writes its final coordinates to md.gro
            Stage::RestrainedMd | Stage::ProductionMd => "md.gro",
        };
        PathBuf::from(self.dirname()).join(file)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dirname())
    }
}
