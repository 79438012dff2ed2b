//! Appliance program catalogs.
//!
//! Programs are configuration data, not code: alternate catalogs can be
//! substituted in [`crate::config::SimulationConfig`] without touching
//! the selection algorithm in [`crate::variate`].

use std::time::Duration;

use crate::config::minutes;

/// A named wash or dry cycle with a fixed duration and a selection weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceProgram {
    /// Display name of the cycle.
    pub name: String,
    /// How long the cycle keeps the appliance busy.
    pub duration: Duration,
    /// Selection weight in `0..=100`, interpreted by
    /// [`crate::variate::select_program`]. Catalog order matters: earlier
    /// entries get an intrinsic priority advantage.
    pub weight: u8,
}

impl ApplianceProgram {
    /// Creates a program from a name, a duration in minutes, and a weight.
    pub fn new(name: &str, duration_minutes: u64, weight: u8) -> Self {
        Self {
            name: name.to_string(),
            duration: minutes(duration_minutes),
            weight,
        }
    }
}

/// The default washing-machine catalog.
///
/// Order and weights shape the selection probabilities; see
/// [`crate::variate::select_program`].
pub fn default_wash_programs() -> Vec<ApplianceProgram> {
    vec![
        ApplianceProgram::new("delicate", 90, 10),
        ApplianceProgram::new("cotton", 150, 70),
        ApplianceProgram::new("cotton with presoak", 240, 20),
    ]
}

/// The default dryer catalog.
pub fn default_dry_programs() -> Vec<ApplianceProgram> {
    vec![
        ApplianceProgram::new("cupboard dry", 90, 66),
        ApplianceProgram::new("extra dry", 120, 33),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogs_match_the_facility() {
        let wash = default_wash_programs();
        assert_eq!(wash.len(), 3);
        assert_eq!(wash[1].name, "cotton");
        assert_eq!(wash[1].duration, minutes(150));
        assert_eq!(wash.iter().map(|p| p.weight).collect::<Vec<_>>(), [10, 70, 20]);

        let dry = default_dry_programs();
        assert_eq!(dry.len(), 2);
        assert_eq!(dry.iter().map(|p| p.weight).collect::<Vec<_>>(), [66, 33]);
    }
}
