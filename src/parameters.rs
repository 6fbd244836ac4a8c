use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::energy::EnergyMethod;
use crate::ics::IcsParameters;

/// Parameters of the halo finder proper. Defaults are the values used
/// in production runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinderParameters {
    /// Host spatial linking length coefficient.
    #[serde(default = "default_llcoeff")]
    pub llcoeff: f64,
    /// Subhalo spatial linking length coefficient.
    #[serde(default = "default_sub_llcoeff")]
    pub sub_llcoeff: f64,
    /// Initial velocity-linking coefficient.
    #[serde(default = "default_ini_alpha_v")]
    pub ini_alpha_v: f64,
    /// Floor below which unbound candidates are abandoned.
    #[serde(default = "default_min_alpha_v")]
    pub min_alpha_v: f64,
    /// Multiplicative step applied to the coefficient per iteration.
    #[serde(default = "default_decrement")]
    pub decrement: f64,
    /// Requested number of spatial tasks. Adjusted upwards to a
    /// multiple of the worker count.
    #[serde(default = "default_n_cells")]
    pub n_cells: usize,
    /// Whether to search accepted hosts for substructure.
    #[serde(default)]
    pub findsubs: bool,
    /// Minimum number of particles per halo.
    #[serde(default = "default_part_threshold")]
    pub part_threshold: usize,
    #[serde(default)]
    pub energy_method: EnergyMethod,
}

fn default_llcoeff() -> f64 {
    0.2
}

fn default_sub_llcoeff() -> f64 {
    0.1
}

fn default_ini_alpha_v() -> f64 {
    10.0
}

fn default_min_alpha_v() -> f64 {
    0.8
}

fn default_decrement() -> f64 {
    0.1
}

fn default_n_cells() -> usize {
    16
}

fn default_part_threshold() -> usize {
    10
}

impl Default for FinderParameters {
    fn default() -> Self {
        serde_yaml::from_str("{}").unwrap()
    }
}

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("failed to read parameter file: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("failed to parse parameter file: {0}")]
    Unparseable(#[from] serde_yaml::Error),
    #[error("invalid parameters: {0}")]
    Invalid(String),
}

impl FinderParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        let invalid = |message: String| Err(ParameterError::Invalid(message));
        if self.llcoeff <= 0.0 || self.sub_llcoeff <= 0.0 {
            return invalid(format!(
                "linking length coefficients must be positive, got {} and {}",
                self.llcoeff, self.sub_llcoeff
            ));
        }
        if self.sub_llcoeff >= self.llcoeff {
            return invalid(format!(
                "the subhalo coefficient ({}) must be below the host coefficient ({})",
                self.sub_llcoeff, self.llcoeff
            ));
        }
        if !(0.0 < self.decrement && self.decrement < 1.0) {
            return invalid(format!(
                "the coefficient decrement must lie in (0, 1), got {}",
                self.decrement
            ));
        }
        if self.min_alpha_v <= 0.0 || self.min_alpha_v > self.ini_alpha_v {
            return invalid(format!(
                "velocity coefficients must satisfy 0 < min <= ini, got min {} ini {}",
                self.min_alpha_v, self.ini_alpha_v
            ));
        }
        if self.part_threshold < 2 {
            return invalid(format!(
                "the particle threshold must be at least 2, got {}",
                self.part_threshold
            ));
        }
        Ok(())
    }
}

/// Contents of a parameter file: the finder configuration plus the
/// description of the synthetic snapshot the binary runs on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterFile {
    #[serde(default = "FinderParameters::default")]
    pub finder: FinderParameters,
    pub ics: IcsParameters,
}

impl ParameterFile {
    pub fn from_file(path: &Path) -> Result<Self, ParameterError> {
        let contents = fs::read_to_string(path)?;
        let parameters: ParameterFile = serde_yaml::from_str(&contents)?;
        parameters.finder.validate()?;
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::FinderParameters;

    #[test]
    fn defaults_are_valid() {
        let params = FinderParameters::default();
        assert_eq!(params.llcoeff, 0.2);
        assert_eq!(params.sub_llcoeff, 0.1);
        assert_eq!(params.ini_alpha_v, 10.0);
        assert_eq!(params.min_alpha_v, 0.8);
        assert_eq!(params.part_threshold, 10);
        assert!(!params.findsubs);
        params.validate().unwrap();
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let params: FinderParameters =
            serde_yaml::from_str("llcoeff: 0.25\nfindsubs: true").unwrap();
        assert_eq!(params.llcoeff, 0.25);
        assert!(params.findsubs);
        assert_eq!(params.min_alpha_v, 0.8);
    }

    #[test]
    fn rejects_inverted_coefficients() {
        let mut params = FinderParameters::default();
        params.sub_llcoeff = 0.3;
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_bad_decrement() {
        let mut params = FinderParameters::default();
        params.decrement = 1.0;
        assert!(params.validate().is_err());
    }
}
