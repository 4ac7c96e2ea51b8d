pub mod ions;
pub mod mdp;
pub mod stages;
