//! Target architectures and the platform constants attached to them.
//!
//! Every architecture has a minimum API level (configurations below it are
//! never generated), a clang target triple, and possibly some headers that do
//! not apply to it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A platform architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    Arm,
    Arm64,
    Mips,
    Mips64,
    X86,
    X86_64,
}

/// API levels the headers may be compiled for.
pub const SUPPORTED_LEVELS: &[u32] = &[9, 12, 13, 14, 15, 16, 17, 18, 19, 21, 23, 24];

/// Headers that must not be compiled for some architectures.
///
/// Entries match on a `/<entry>` suffix of the header path.
pub const HEADER_BLACKLIST: &[(&str, &[Arch])] = &[
    // Internal header.
    ("sys/_system_properties.h", Arch::ALL),
    // time64.h #errors when included on LP64 archs.
    ("time64.h", &[Arch::Arm64, Arch::Mips64, Arch::X86_64]),
];

impl Arch {
    /// Every supported architecture.
    pub const ALL: &'static [Arch] = &[
        Arch::Arm,
        Arch::Arm64,
        Arch::Mips,
        Arch::Mips64,
        Arch::X86,
        Arch::X86_64,
    ];

    /// Get the architecture name as used in paths and annotations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Mips => "mips",
            Arch::Mips64 => "mips64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }

    /// The first API level this architecture shipped in.
    pub fn min_api(&self) -> u32 {
        match self {
            Arch::Arm | Arch::Mips | Arch::X86 => 9,
            Arch::Arm64 | Arch::Mips64 | Arch::X86_64 => 21,
        }
    }

    /// The clang target triple for this architecture.
    pub fn target_triple(&self) -> &'static str {
        match self {
            Arch::Arm => "arm-linux-androideabi",
            Arch::Arm64 => "aarch64-linux-android",
            Arch::Mips => "mipsel-linux-android",
            Arch::Mips64 => "mips64el-linux-android",
            Arch::X86 => "i686-linux-android",
            Arch::X86_64 => "x86_64-linux-android",
        }
    }

    /// Check whether `header` is blacklisted for this architecture.
    pub fn is_blacklisted(&self, header: &str) -> bool {
        HEADER_BLACKLIST.iter().any(|(entry, archs)| {
            archs.contains(self) && header.ends_with(&format!("/{}", entry))
        })
    }
}

/// All supported architectures as a set.
pub fn supported_archs() -> BTreeSet<Arch> {
    Arch::ALL.iter().copied().collect()
}

/// All supported API levels as a set.
pub fn supported_levels() -> BTreeSet<u32> {
    SUPPORTED_LEVELS.iter().copied().collect()
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = ArchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::ALL
            .iter()
            .find(|arch| arch.as_str() == s)
            .copied()
            .ok_or_else(|| ArchParseError(s.to_string()))
    }
}

/// Error returned when parsing an unknown architecture name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture '{0}', valid values: {valid}", valid = valid_names())]
pub struct ArchParseError(pub String);

fn valid_names() -> String {
    let names: Vec<&str> = Arch::ALL.iter().map(|a| a.as_str()).collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_round_trips_through_name() {
        for arch in Arch::ALL {
            assert_eq!(arch.as_str().parse::<Arch>().unwrap(), *arch);
        }
    }

    #[test]
    fn test_unknown_arch_is_rejected() {
        let err = "sparc".parse::<Arch>().unwrap_err();
        assert_eq!(err, ArchParseError("sparc".to_string()));
        assert!(err.to_string().contains("x86_64"));
    }

    #[test]
    fn test_lp64_archs_start_at_21() {
        assert_eq!(Arch::Arm.min_api(), 9);
        assert_eq!(Arch::Arm64.min_api(), 21);
        assert_eq!(Arch::X86_64.min_api(), 21);
    }

    #[test]
    fn test_blacklist_is_per_arch() {
        assert!(Arch::Arm64.is_blacklisted("/src/include/time64.h"));
        assert!(!Arch::Arm.is_blacklisted("/src/include/time64.h"));
        assert!(Arch::Arm.is_blacklisted("/src/include/sys/_system_properties.h"));
        // Suffix must start at a path component.
        assert!(!Arch::Arm64.is_blacklisted("/src/include/nottime64.h"));
    }
}
