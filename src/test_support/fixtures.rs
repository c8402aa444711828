//! Test fixtures for common test scenarios.
//!
//! Declaration builders for index and checker tests, and [`HeaderTree`], a
//! temporary on-disk layout of headers, dependency roots and platform
//! symbol lists.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::{Arch, CompilationType};
use crate::database::{Declaration, Location};
use crate::frontend::{ParsedDeclaration, TranslationUnit};
use crate::platform::symbols_dir;

/// A prototype of `name` at `file:line` observed under `ty`.
pub fn declaration(
    name: &str,
    file: &str,
    line: u32,
    ty: CompilationType,
    annotations: &[&str],
) -> Declaration {
    Declaration {
        name: name.to_string(),
        location: Location::new(file, line, 1),
        is_definition: false,
        annotations: annotations.iter().map(|a| a.to_string()).collect(),
        compilation_type: ty,
    }
}

/// An unannotated inline definition of `name` at `file:line`.
pub fn definition(name: &str, file: &str, line: u32, ty: CompilationType) -> Declaration {
    Declaration {
        is_definition: true,
        ..declaration(name, file, line, ty, &[])
    }
}

/// A diagnostic-free unit for `source` with `(name, line, is_definition,
/// annotations)` declarations, all located in `source`.
pub fn unit(source: impl AsRef<Path>, decls: &[(&str, u32, bool, &[&str])]) -> TranslationUnit {
    let source = source.as_ref();
    let mut unit = TranslationUnit::new(source);
    unit.declarations = decls
        .iter()
        .map(|(name, line, is_definition, annotations)| ParsedDeclaration {
            name: name.to_string(),
            location: Location::new(source, *line, 1),
            is_definition: *is_definition,
            annotations: annotations.iter().map(|a| a.to_string()).collect(),
        })
        .collect();
    unit
}

/// A temporary directory holding `include/`, `deps/` and `platforms/`.
///
/// The directory is removed when the fixture is dropped.
pub struct HeaderTree {
    dir: TempDir,
}

impl HeaderTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("include")).unwrap();
        HeaderTree { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn headers(&self) -> PathBuf {
        self.root().join("include")
    }

    pub fn deps(&self) -> PathBuf {
        self.root().join("deps")
    }

    pub fn platforms(&self) -> PathBuf {
        self.root().join("platforms")
    }

    /// Add a header under `include/`.
    pub fn header(self, path: &str, contents: &str) -> Self {
        let path = format!("include/{}", path);
        self.file(&path, contents)
    }

    /// Add a dependency root directory under `deps/` (e.g. `common/kernel`).
    pub fn dependency(self, path: &str) -> Self {
        fs::create_dir_all(self.deps().join(path)).unwrap();
        self
    }

    /// Add a platform symbol list for one `(arch, level)`.
    pub fn platform(self, arch: Arch, level: u32, file: &str, contents: &str) -> Self {
        let dir = symbols_dir(&self.platforms(), arch, level);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), contents).unwrap();
        self
    }

    /// Add an arbitrary file relative to the root.
    pub fn file(self, path: &str, contents: &str) -> Self {
        let path = self.root().join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
        self
    }
}

impl Default for HeaderTree {
    fn default() -> Self {
        Self::new()
    }
}
