//! Normalized availability computed from raw availability annotations.
//!
//! The front end hands over the strings carried by the versioning macros'
//! `annotate` attributes:
//!
//! - `introduced_in=N`, `deprecated_in=N`, `obsoleted_in=N` apply globally
//! - the same keys suffixed with an architecture (`introduced_in_arm=9`)
//!   apply to that architecture only
//! - `introduced_in_future` marks the architecture the declaration was
//!   compiled for as future (never checked against the platform)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Arch;

/// The versioned properties a declaration can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    Introduced,
    Deprecated,
    Obsoleted,
}

impl Property {
    const ALL: [Property; 3] = [Property::Introduced, Property::Deprecated, Property::Obsoleted];

    /// Annotation key for this property, without any arch suffix.
    pub fn annotation_key(&self) -> &'static str {
        match self {
            Property::Introduced => "introduced_in",
            Property::Deprecated => "deprecated_in",
            Property::Obsoleted => "obsoleted_in",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Introduced => "introduced",
            Property::Deprecated => "deprecated",
            Property::Obsoleted => "obsoleted",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an availability value applies: everywhere, or one architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope(pub Option<Arch>);

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(arch) => write!(f, "{}", arch),
            None => f.write_str("global"),
        }
    }
}

/// Error computing or merging availability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("invalid availability annotation `{annotation}`: {reason}")]
    InvalidAnnotation { annotation: String, reason: String },

    #[error("conflicting {scope} {property} versions: {existing} and {new}")]
    Conflict {
        property: Property,
        scope: Scope,
        existing: u32,
        new: u32,
    },
}

/// Versions for one scope (global or a single architecture).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityValues {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub future: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsoleted: Option<u32>,
}

impl AvailabilityValues {
    pub fn empty(&self) -> bool {
        !self.future
            && self.introduced.is_none()
            && self.deprecated.is_none()
            && self.obsoleted.is_none()
    }

    pub fn get(&self, property: Property) -> Option<u32> {
        match property {
            Property::Introduced => self.introduced,
            Property::Deprecated => self.deprecated,
            Property::Obsoleted => self.obsoleted,
        }
    }

    fn slot(&mut self, property: Property) -> &mut Option<u32> {
        match property {
            Property::Introduced => &mut self.introduced,
            Property::Deprecated => &mut self.deprecated,
            Property::Obsoleted => &mut self.obsoleted,
        }
    }

    /// Set a property, failing if it already holds a different version.
    fn set(&mut self, property: Property, version: u32, scope: Scope) -> Result<(), AvailabilityError> {
        let slot = self.slot(property);
        match *slot {
            Some(existing) if existing != version => Err(AvailabilityError::Conflict {
                property,
                scope,
                existing,
                new: version,
            }),
            _ => {
                *slot = Some(version);
                Ok(())
            }
        }
    }

    fn merge(&mut self, other: &AvailabilityValues, scope: Scope) -> Result<(), AvailabilityError> {
        self.future |= other.future;
        for property in Property::ALL {
            if let Some(version) = other.get(property) {
                self.set(property, version, scope)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AvailabilityValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.future {
            parts.push("future".to_string());
        }
        for property in Property::ALL {
            if let Some(version) = self.get(property) {
                parts.push(format!("{} = {}", property, version));
            }
        }
        f.write_str(&parts.join(", "))
    }
}

/// One parsed availability annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Versioned {
        property: Property,
        arch: Option<Arch>,
        version: u32,
    },
    Future,
}

impl Annotation {
    /// Parse a raw annotate string.
    ///
    /// Returns `Ok(None)` for annotations that are not about availability.
    pub fn parse(raw: &str) -> Result<Option<Annotation>, AvailabilityError> {
        let raw = raw.trim();
        if raw == "introduced_in_future" {
            return Ok(Some(Annotation::Future));
        }

        let Some((key, value)) = raw.split_once('=') else {
            return Ok(None);
        };

        let invalid = |reason: String| AvailabilityError::InvalidAnnotation {
            annotation: raw.to_string(),
            reason,
        };

        for property in Property::ALL {
            let prefix = property.annotation_key();
            let arch = if key == prefix {
                None
            } else if let Some(suffix) = key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                Some(suffix.parse::<Arch>().map_err(|e| invalid(e.to_string()))?)
            } else {
                continue;
            };

            let version = value
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("`{}` is not an API level", value.trim())))?;

            return Ok(Some(Annotation::Versioned {
                property,
                arch,
                version,
            }));
        }

        Ok(None)
    }
}

/// Normalized availability of a declaration or symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationAvailability {
    pub global: AvailabilityValues,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arch: BTreeMap<Arch, AvailabilityValues>,
}

impl DeclarationAvailability {
    /// Normalize raw annotations observed while compiling for `observed`.
    pub fn from_annotations<S: AsRef<str>>(
        annotations: &[S],
        observed: Arch,
    ) -> Result<Self, AvailabilityError> {
        let mut result = DeclarationAvailability::default();
        for raw in annotations {
            match Annotation::parse(raw.as_ref())? {
                Some(Annotation::Future) => {
                    result.arch.entry(observed).or_default().future = true;
                }
                Some(Annotation::Versioned {
                    property,
                    arch: None,
                    version,
                }) => {
                    result.global.set(property, version, Scope(None))?;
                }
                Some(Annotation::Versioned {
                    property,
                    arch: Some(arch),
                    version,
                }) => {
                    result
                        .arch
                        .entry(arch)
                        .or_default()
                        .set(property, version, Scope(Some(arch)))?;
                }
                None => {}
            }
        }
        Ok(result)
    }

    pub fn empty(&self) -> bool {
        self.global.empty() && self.arch.values().all(AvailabilityValues::empty)
    }

    /// Values for one architecture (empty if none were declared).
    pub fn for_arch(&self, arch: Arch) -> AvailabilityValues {
        self.arch.get(&arch).copied().unwrap_or_default()
    }

    /// Fold `other` into `self`.
    ///
    /// Unset values take the other side's value. Two different versions for
    /// the same property and scope are a conflict.
    pub fn merge(&mut self, other: &DeclarationAvailability) -> Result<(), AvailabilityError> {
        self.global.merge(&other.global, Scope(None))?;
        for (arch, values) in &other.arch {
            self.arch
                .entry(*arch)
                .or_default()
                .merge(values, Scope(Some(*arch)))?;
        }
        Ok(())
    }
}

impl fmt::Display for DeclarationAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty() {
            return f.write_str("no availability");
        }

        let mut parts = Vec::new();
        if !self.global.empty() {
            parts.push(self.global.to_string());
        }
        for (arch, values) in &self.arch {
            if !values.empty() {
                parts.push(format!("{}: [{}]", arch, values));
            }
        }
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn availability(annotations: &[&str]) -> Result<DeclarationAvailability, AvailabilityError> {
        DeclarationAvailability::from_annotations(annotations, Arch::Arm)
    }

    #[test]
    fn test_parse_global_and_arch_annotations() {
        assert_eq!(
            Annotation::parse("introduced_in=21").unwrap(),
            Some(Annotation::Versioned {
                property: Property::Introduced,
                arch: None,
                version: 21,
            })
        );
        assert_eq!(
            Annotation::parse("obsoleted_in_x86_64=24").unwrap(),
            Some(Annotation::Versioned {
                property: Property::Obsoleted,
                arch: Some(Arch::X86_64),
                version: 24,
            })
        );
        assert_eq!(
            Annotation::parse("introduced_in_future").unwrap(),
            Some(Annotation::Future)
        );
    }

    #[test]
    fn test_unrelated_annotations_are_ignored() {
        assert_eq!(Annotation::parse("nonnull").unwrap(), None);
        assert_eq!(Annotation::parse("visibility=hidden").unwrap(), None);
    }

    #[test]
    fn test_malformed_annotations_fail() {
        assert!(matches!(
            Annotation::parse("introduced_in=abc"),
            Err(AvailabilityError::InvalidAnnotation { .. })
        ));
        assert!(matches!(
            Annotation::parse("introduced_in_sparc=9"),
            Err(AvailabilityError::InvalidAnnotation { .. })
        ));
    }

    #[test]
    fn test_from_annotations() {
        let avail = availability(&["introduced_in=21", "deprecated_in=23", "obsoleted_in_arm=24"])
            .unwrap();
        assert_eq!(avail.global.introduced, Some(21));
        assert_eq!(avail.global.deprecated, Some(23));
        assert_eq!(avail.for_arch(Arch::Arm).obsoleted, Some(24));
        assert!(avail.for_arch(Arch::X86).empty());
    }

    #[test]
    fn test_future_tags_observed_arch() {
        let avail =
            DeclarationAvailability::from_annotations(&["introduced_in_future"], Arch::X86).unwrap();
        assert!(avail.for_arch(Arch::X86).future);
        assert!(!avail.global.future);
        assert!(!avail.empty());
    }

    #[test]
    fn test_contradictory_annotations_fail() {
        let err = availability(&["introduced_in=21", "introduced_in=23"]).unwrap_err();
        assert_eq!(
            err,
            AvailabilityError::Conflict {
                property: Property::Introduced,
                scope: Scope(None),
                existing: 21,
                new: 23,
            }
        );

        // Repeating the same value is fine.
        assert!(availability(&["introduced_in=21", "introduced_in=21"]).is_ok());
    }

    #[test]
    fn test_merge_fills_unset_values() {
        let mut a = availability(&["introduced_in=21"]).unwrap();
        let b = availability(&["deprecated_in=24", "introduced_in_arm=9"]).unwrap();
        a.merge(&b).unwrap();

        assert_eq!(a.global.introduced, Some(21));
        assert_eq!(a.global.deprecated, Some(24));
        assert_eq!(a.for_arch(Arch::Arm).introduced, Some(9));
    }

    #[test]
    fn test_merge_conflict() {
        let mut a = availability(&["obsoleted_in_arm=21"]).unwrap();
        let b = availability(&["obsoleted_in_arm=23"]).unwrap();
        assert!(matches!(
            a.merge(&b),
            Err(AvailabilityError::Conflict {
                scope: Scope(Some(Arch::Arm)),
                ..
            })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(availability(&[]).unwrap().to_string(), "no availability");
        let avail = availability(&["introduced_in=21", "introduced_in_x86=23"]).unwrap();
        assert_eq!(avail.to_string(), "introduced = 21, x86: [introduced = 23]");
    }
}
