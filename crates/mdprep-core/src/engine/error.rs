use crate::core::mdp::MdpError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to enter stage directory '{path}': {source}", path = path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("External tool '{program}' failed: {reason}")]
    ExternalTool { program: String, reason: String },

    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Run-configuration template '{path}' could not be rendered: {source}", path = path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: MdpError,
    },

    #[error("System charge is {charge:+.4} e after ion placement; expected a neutral system")]
    ChargeResidual { charge: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
