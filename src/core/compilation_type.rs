//! A single compilation configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::arch::Arch;

/// One synthetic compilation environment: architecture, API level and
/// `off_t` width.
///
/// Ordered by architecture, then level, then width so that sets of
/// configurations iterate and print in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompilationType {
    pub arch: Arch,
    pub api_level: u32,
    /// Value of `_FILE_OFFSET_BITS`, either 32 or 64.
    pub file_offset_bits: u32,
}

/// The `_FILE_OFFSET_BITS` variants compiled for every (arch, level) pair.
pub const FILE_OFFSET_BITS: [u32; 2] = [32, 64];

impl CompilationType {
    pub fn new(arch: Arch, api_level: u32, file_offset_bits: u32) -> Self {
        CompilationType {
            arch,
            api_level,
            file_offset_bits,
        }
    }
}

impl fmt::Display for CompilationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} [fob = {}]",
            self.arch, self.api_level, self.file_offset_bits
        )
    }
}

/// Join compilation types for a one-line report.
pub fn join_types<'a>(types: impl IntoIterator<Item = &'a CompilationType>) -> String {
    types
        .into_iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_display() {
        let ty = CompilationType::new(Arch::X86_64, 23, 64);
        assert_eq!(ty.to_string(), "x86_64-23 [fob = 64]");
    }

    #[test]
    fn test_ordering_is_arch_level_width() {
        let set: BTreeSet<_> = [
            CompilationType::new(Arch::X86, 9, 64),
            CompilationType::new(Arch::Arm, 21, 32),
            CompilationType::new(Arch::Arm, 9, 64),
            CompilationType::new(Arch::Arm, 9, 32),
        ]
        .into_iter()
        .collect();

        let ordered: Vec<_> = set.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            ordered,
            [
                "arm-9 [fob = 32]",
                "arm-9 [fob = 64]",
                "arm-21 [fob = 32]",
                "x86-9 [fob = 64]",
            ]
        );
    }

    #[test]
    fn test_join_types() {
        let types = [
            CompilationType::new(Arch::Arm, 9, 32),
            CompilationType::new(Arch::Arm, 9, 64),
        ];
        assert_eq!(join_types(&types), "arm-9 [fob = 32], arm-9 [fob = 64]");
    }
}
