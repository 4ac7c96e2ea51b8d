//! Ion-count arithmetic for charge neutralization.
//!
//! Implements the exact-neutralization policy: given the net charge `grompp`
//! reports for a solvated system, decide how many counter-ions `genion` must
//! substitute for solvent molecules so the total charge becomes zero. Target
//! bulk ionic concentrations are out of scope and rejected upstream.

use serde::Serialize;

/// Names of the ion species `genion` should place, as they appear in the
/// force field (e.g. `NA` / `CL` for the default models).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IonSpecies {
    pub cation: String,
    pub anion: String,
}

impl Default for IonSpecies {
    fn default() -> Self {
        Self {
            cation: "NA".to_string(),
            anion: "CL".to_string(),
        }
    }
}

/// Counter-ion counts needed to neutralize a system.
///
/// At most one of the two counts is nonzero: a positive net charge is
/// balanced with anions, a negative one with cations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IonCounts {
    pub cations: u32,
    pub anions: u32,
}

impl IonCounts {
    pub fn is_neutral_already(&self) -> bool {
        self.cations == 0 && self.anions == 0
    }
}

/// Computes the counter-ion counts that neutralize a net charge of
/// `net_charge` elementary charges.
///
/// Fractional charges (force fields rarely sum to exact integers) are rounded
/// to the nearest whole ion.
pub fn neutralizing_counts(net_charge: f64) -> IonCounts {
    let magnitude = net_charge.abs().round() as u32;
    if net_charge > 0.0 {
        IonCounts {
            cations: 0,
            anions: magnitude,
        }
    } else if net_charge < 0.0 {
        IonCounts {
            cations: magnitude,
            anions: 0,
        }
    } else {
        IonCounts {
            cations: 0,
            anions: 0,
        }
    }
}
