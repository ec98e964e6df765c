//! Project configuration
//!
//! [`AnalysisConfig`] collects the body-part layout of a project together with
//! the parameters of each analysis. Every field has a default, so a config file
//! only needs to spell out what differs:
//!
//! ```json
//! {
//!   "bodyparts": ["nose", "left_ear", "right_ear", "spine", "tail_base"],
//!   "use_bodyparts": ["nose", "spine", "tail_base"],
//!   "anterior_bodyparts": ["nose"],
//!   "posterior_bodyparts": ["tail_base"],
//!   "fps": 30.0,
//!   "changepoint": { "alpha": 0.05 }
//! }
//! ```
//!
//! Body parts are referenced by name. Names in `anterior_bodyparts`,
//! `posterior_bodyparts` and `skeleton` resolve against `use_bodyparts` when it
//! is set, otherwise against `bodyparts`.

use serde::{Deserialize, Serialize};

use crate::{changepoint::ChangepointParams, group_stats::KruskalParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Names of all tracked keypoints, in the order they appear in the data
    pub bodyparts: Vec<String>,
    /// Subset of `bodyparts` used for analysis
    pub use_bodyparts: Option<Vec<String>>,
    /// Keypoints whose mean position marks the front of the body
    pub anterior_bodyparts: Vec<String>,
    /// Keypoints whose mean position marks the back of the body
    pub posterior_bodyparts: Vec<String>,
    /// Pairs of connected keypoints
    pub skeleton: Vec<[String; 2]>,
    /// Recording frame rate
    pub fps: f64,
    pub changepoint: ChangepointParams,
    pub kruskal: KruskalParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bodyparts: vec![],
            use_bodyparts: None,
            anterior_bodyparts: vec![],
            posterior_bodyparts: vec![],
            skeleton: vec![],
            fps: 30.0,
            changepoint: ChangepointParams::default(),
            kruskal: KruskalParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum BodypartError {
    #[display("unknown body part '{name}' in {option}")]
    Unknown { name: String, option: &'static str },
    #[display("{option} must name at least one body part")]
    Empty { option: &'static str },
    #[display("use_bodyparts is set but bodyparts is empty")]
    MissingBodyparts,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(
    "invalid configuration: {}",
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
)]
pub struct ConfigError {
    pub errors: Vec<BodypartError>,
}

impl AnalysisConfig {
    /// Names that body-part references resolve against.
    #[must_use]
    pub fn effective_bodyparts(&self) -> &[String] {
        self.use_bodyparts.as_deref().unwrap_or(&self.bodyparts)
    }

    /// Positions of `use_bodyparts` within `bodyparts`.
    ///
    /// Returns `None` when no subset is requested.
    pub fn use_indices(&self) -> Result<Option<Vec<usize>>, BodypartError> {
        let Some(use_bodyparts) = &self.use_bodyparts else {
            return Ok(None);
        };
        if self.bodyparts.is_empty() {
            return Err(BodypartError::MissingBodyparts);
        }
        resolve(&self.bodyparts, use_bodyparts, "use_bodyparts").map(Some)
    }

    pub fn anterior_indices(&self) -> Result<Vec<usize>, BodypartError> {
        resolve(
            self.effective_bodyparts(),
            &self.anterior_bodyparts,
            "anterior_bodyparts",
        )
    }

    pub fn posterior_indices(&self) -> Result<Vec<usize>, BodypartError> {
        resolve(
            self.effective_bodyparts(),
            &self.posterior_bodyparts,
            "posterior_bodyparts",
        )
    }

    /// Skeleton edges as index pairs into the effective body parts.
    pub fn skeleton_indices(&self) -> Result<Vec<[usize; 2]>, BodypartError> {
        let names = self.effective_bodyparts();
        self.skeleton
            .iter()
            .map(|[a, b]| {
                Ok([
                    position(names, a, "skeleton")?,
                    position(names, b, "skeleton")?,
                ])
            })
            .collect()
    }

    /// Reports every unresolvable body-part reference at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = vec![];
        if let Err(e) = self.use_indices() {
            errors.push(e);
        }
        let names = self.effective_bodyparts();
        for (option, list) in [
            ("anterior_bodyparts", &self.anterior_bodyparts),
            ("posterior_bodyparts", &self.posterior_bodyparts),
        ] {
            if list.is_empty() {
                errors.push(BodypartError::Empty { option });
            }
            errors.extend(
                list.iter()
                    .filter_map(|name| position(names, name, option).err()),
            );
        }
        errors.extend(
            self.skeleton
                .iter()
                .flatten()
                .filter_map(|name| position(names, name, "skeleton").err()),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { errors })
        }
    }
}

fn position(names: &[String], name: &str, option: &'static str) -> Result<usize, BodypartError> {
    names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| BodypartError::Unknown {
            name: name.to_owned(),
            option,
        })
}

fn resolve(
    names: &[String],
    requested: &[String],
    option: &'static str,
) -> Result<Vec<usize>, BodypartError> {
    if requested.is_empty() {
        return Err(BodypartError::Empty { option });
    }
    requested
        .iter()
        .map(|name| position(names, name, option))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn mouse() -> AnalysisConfig {
        AnalysisConfig {
            bodyparts: names(&["nose", "ear", "spine", "tail"]),
            anterior_bodyparts: names(&["nose"]),
            posterior_bodyparts: names(&["tail"]),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_resolve_against_bodyparts() {
        let config = mouse();
        assert_eq!(config.use_indices().unwrap(), None);
        assert_eq!(config.anterior_indices().unwrap(), vec![0]);
        assert_eq!(config.posterior_indices().unwrap(), vec![3]);
    }

    #[test]
    fn test_resolve_against_use_bodyparts() {
        let config = AnalysisConfig {
            use_bodyparts: Some(names(&["spine", "nose", "tail"])),
            ..mouse()
        };
        assert_eq!(config.use_indices().unwrap(), Some(vec![2, 0, 3]));
        assert_eq!(config.anterior_indices().unwrap(), vec![1]);
        assert_eq!(config.posterior_indices().unwrap(), vec![2]);
    }

    #[test]
    fn test_unknown_name_reports_option() {
        let config = AnalysisConfig {
            anterior_bodyparts: names(&["snout"]),
            ..mouse()
        };
        let err = config.anterior_indices().unwrap_err();
        assert_eq!(
            err,
            BodypartError::Unknown {
                name: "snout".to_owned(),
                option: "anterior_bodyparts"
            }
        );
        assert!(err.to_string().contains("snout"));
        assert!(err.to_string().contains("anterior_bodyparts"));
    }

    #[test]
    fn test_validate_collects_every_error() {
        let config = AnalysisConfig {
            anterior_bodyparts: names(&["snout"]),
            posterior_bodyparts: vec![],
            skeleton: vec![["nose".to_owned(), "paw".to_owned()]],
            ..mouse()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(mouse().validate().is_ok());
    }

    #[test]
    fn test_skeleton_indices() {
        let config = AnalysisConfig {
            skeleton: vec![["nose".to_owned(), "spine".to_owned()]],
            ..mouse()
        };
        assert_eq!(config.skeleton_indices().unwrap(), vec![[0, 2]]);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"fps": 60.0}"#).unwrap();
        assert_eq!(config.fps, 60.0);
        assert_eq!(config.changepoint, ChangepointParams::default());
        assert!(config.use_bodyparts.is_none());
    }
}
