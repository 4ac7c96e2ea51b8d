//! # mdprep Core Library
//!
//! A library for staging multi-step GROMACS molecular dynamics workflows:
//! solvating and neutralizing a structure, energy-minimizing it, and
//! preparing position-restrained and production MD runs. Each step is set up
//! in its own directory and chained to its predecessor through conventional
//! output paths.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to keep the
//! decision logic separated from process-global state and from the external
//! toolchain.
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: ion-count
//!   arithmetic for charge neutralization, `.mdp` run-parameter templating,
//!   and the stage naming scheme with its conventional output paths.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer: the scoped
//!   working-directory switch every stage runs inside, the adapter around the
//!   GROMACS command-line tools, stage configuration records, and the error
//!   taxonomy shared by all stages.
//!
//! - **[`workflows`]: The Public API.** One entry point per pipeline stage
//!   (solvate, energy minimization, restrained/production MD setup), each
//!   composing the engine pieces into a complete, directory-scoped step whose
//!   output feeds the next stage by convention.

pub mod core;
pub mod engine;
pub mod workflows;
