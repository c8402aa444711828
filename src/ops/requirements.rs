//! Per-architecture compile requirements: which headers to compile and
//! which include roots to compile them with.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::{Arch, CompilationType};
use crate::util::fs::{child_directories, collect_files};

/// Inputs shared by every configuration of one architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationRequirements {
    /// Headers to compile, blacklisted ones removed.
    pub headers: Vec<PathBuf>,
    /// Include roots, the header directory first.
    pub dependencies: Vec<PathBuf>,
}

/// Collect the requirements for one architecture.
///
/// Dependency roots are the children of `<deps>/common` and `<deps>/<arch>`;
/// each must be a directory. Symlinks are taken as-is.
pub fn collect_requirements(
    arch: Arch,
    header_dir: &Path,
    dependency_dir: Option<&Path>,
) -> Result<CompilationRequirements> {
    let headers = collect_files(header_dir)?
        .into_iter()
        .filter(|header| {
            let blacklisted = arch.is_blacklisted(&header.to_string_lossy());
            if blacklisted {
                tracing::debug!("skipping {} for {}", header.display(), arch);
            }
            !blacklisted
        })
        .collect();

    let mut dependencies = vec![header_dir.to_path_buf()];
    if let Some(deps) = dependency_dir {
        for subdir in ["common", arch.as_str()] {
            let root = deps.join(subdir);
            let children = child_directories(&root)
                .with_context(|| format!("failed to collect dependencies for {}", arch))?;
            dependencies.extend(children);
        }
    }

    Ok(CompilationRequirements {
        headers,
        dependencies,
    })
}

/// Collect requirements once for every architecture in `types`.
pub fn collect_all_requirements(
    types: &BTreeSet<CompilationType>,
    header_dir: &Path,
    dependency_dir: Option<&Path>,
) -> Result<BTreeMap<Arch, CompilationRequirements>> {
    let archs: BTreeSet<Arch> = types.iter().map(|ty| ty.arch).collect();

    let mut requirements = BTreeMap::new();
    for arch in archs {
        let reqs = collect_requirements(arch, header_dir, dependency_dir)?;
        tracing::debug!(
            "{}: {} header(s), {} include root(s)",
            arch,
            reqs.headers.len(),
            reqs.dependencies.len()
        );
        requirements.insert(arch, reqs);
    }
    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HeaderTree;

    #[test]
    fn test_blacklisted_header_only_removed_for_listed_archs() {
        let tree = HeaderTree::new()
            .header("stdio.h", "")
            .header("time64.h", "")
            .header("sys/_system_properties.h", "");

        let arm = collect_requirements(Arch::Arm, &tree.headers(), None).unwrap();
        let arm64 = collect_requirements(Arch::Arm64, &tree.headers(), None).unwrap();

        assert_eq!(
            arm.headers,
            [tree.headers().join("stdio.h"), tree.headers().join("time64.h")]
        );
        assert_eq!(arm64.headers, [tree.headers().join("stdio.h")]);
    }

    #[test]
    fn test_dependencies_common_then_arch() {
        let tree = HeaderTree::new()
            .header("stdio.h", "")
            .dependency("common/kernel")
            .dependency("common/.git")
            .dependency("arm/asm")
            .dependency("x86/asm");

        let reqs = collect_requirements(Arch::Arm, &tree.headers(), Some(&tree.deps())).unwrap();

        assert_eq!(
            reqs.dependencies,
            [
                tree.headers(),
                tree.deps().join("common/kernel"),
                tree.deps().join("arm/asm"),
            ]
        );
    }

    #[test]
    fn test_non_directory_dependency_is_fatal() {
        let tree = HeaderTree::new()
            .header("stdio.h", "")
            .dependency("common/kernel")
            .dependency("arm/asm")
            .file("deps/arm/README", "");

        let err =
            collect_requirements(Arch::Arm, &tree.headers(), Some(&tree.deps())).unwrap_err();
        assert!(format!("{:#}", err).contains("is not a directory"));
    }

    #[test]
    fn test_missing_arch_dependency_root_is_fatal() {
        let tree = HeaderTree::new()
            .header("stdio.h", "")
            .dependency("common/kernel");

        let err =
            collect_requirements(Arch::X86, &tree.headers(), Some(&tree.deps())).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to open dependency directory"));
    }

    #[test]
    fn test_collect_all_once_per_arch() {
        let tree = HeaderTree::new().header("stdio.h", "").header("time64.h", "");
        let types = BTreeSet::from([
            CompilationType::new(Arch::Arm, 9, 32),
            CompilationType::new(Arch::Arm, 21, 64),
            CompilationType::new(Arch::X86_64, 21, 64),
        ]);

        let all = collect_all_requirements(&types, &tree.headers(), None).unwrap();

        assert_eq!(all.keys().copied().collect::<Vec<_>>(), [Arch::Arm, Arch::X86_64]);
        assert_eq!(all[&Arch::Arm].headers.len(), 2);
        assert_eq!(all[&Arch::X86_64].headers.len(), 1);
    }
}
