//! The configuration matrix.

use std::collections::BTreeSet;

use crate::core::compilation_type::FILE_OFFSET_BITS;
use crate::core::{supported_archs, supported_levels, Arch, CompilationType};

/// Every configuration to compile for.
///
/// An empty selection means "all supported". Levels below an architecture's
/// minimum API are skipped for that architecture, so one level set can be
/// shared by every architecture.
pub fn generate_compilation_types(
    archs: &BTreeSet<Arch>,
    levels: &BTreeSet<u32>,
) -> BTreeSet<CompilationType> {
    let archs = if archs.is_empty() {
        supported_archs()
    } else {
        archs.clone()
    };
    let levels = if levels.is_empty() {
        supported_levels()
    } else {
        levels.clone()
    };

    let mut types = BTreeSet::new();
    for &arch in &archs {
        for &level in levels.iter().filter(|&&level| level >= arch.min_api()) {
            for bits in FILE_OFFSET_BITS {
                types.insert(CompilationType::new(arch, level, bits));
            }
        }
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_below_floor_are_dropped() {
        let archs = BTreeSet::from([Arch::Arm, Arch::Arm64]);
        let levels = BTreeSet::from([9, 19, 21]);

        let types = generate_compilation_types(&archs, &levels);

        assert_eq!(types.len(), 8);
        assert!(types.contains(&CompilationType::new(Arch::Arm, 9, 32)));
        assert!(types.contains(&CompilationType::new(Arch::Arm64, 21, 64)));
        assert!(!types.iter().any(|t| t.arch == Arch::Arm64 && t.api_level < 21));
    }

    #[test]
    fn test_membership_matches_min_api() {
        let types = generate_compilation_types(&BTreeSet::new(), &BTreeSet::new());

        for &arch in Arch::ALL {
            for level in supported_levels() {
                for bits in FILE_OFFSET_BITS {
                    let ty = CompilationType::new(arch, level, bits);
                    assert_eq!(types.contains(&ty), level >= arch.min_api(), "{}", ty);
                }
            }
        }
    }

    #[test]
    fn test_both_widths_present() {
        let types = generate_compilation_types(&BTreeSet::from([Arch::X86]), &BTreeSet::new());
        for ty in &types {
            let other = if ty.file_offset_bits == 32 { 64 } else { 32 };
            assert!(types.contains(&CompilationType::new(ty.arch, ty.api_level, other)));
        }
    }

    #[test]
    fn test_all_levels_below_floor_yields_nothing() {
        let types =
            generate_compilation_types(&BTreeSet::from([Arch::Mips64]), &BTreeSet::from([9, 19]));
        assert!(types.is_empty());
    }
}
