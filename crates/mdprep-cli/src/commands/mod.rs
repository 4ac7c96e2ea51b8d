pub mod md;
pub mod minimize;
pub mod run;
pub mod solvate;
