//! Compile invocations: one header compiled for one configuration.

use std::path::{Path, PathBuf};

use crate::core::CompilationType;

/// Warning flags applied to every header. Most warnings become errors.
const WARNING_FLAGS: &[&str] = &[
    "-Wall",
    "-Wextra",
    "-Werror",
    "-Wundef",
    "-Wno-unused-macros",
    "-Wno-unused-function",
    "-Wno-unused-variable",
    "-Wno-unknown-attributes",
    "-Wno-pragma-once-outside-header",
];

/// Everything needed to compile one header under one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileInvocation {
    pub compilation_type: CompilationType,
    pub source: PathBuf,
    /// Root of the header tree being versioned.
    pub header_root: PathBuf,
    /// Include roots, passed as `-isystem`.
    pub include_dirs: Vec<PathBuf>,
    /// Header force-included before the source (`-include`).
    pub inject_header: Option<PathBuf>,
    /// Extra flags appended after the standard set.
    pub extra_flags: Vec<String>,
}

impl CompileInvocation {
    pub fn new(
        compilation_type: CompilationType,
        source: impl Into<PathBuf>,
        header_root: impl Into<PathBuf>,
        include_dirs: Vec<PathBuf>,
    ) -> Self {
        CompileInvocation {
            compilation_type,
            source: source.into(),
            header_root: header_root.into(),
            include_dirs,
            inject_header: None,
            extra_flags: Vec::new(),
        }
    }

    pub fn with_inject_header(mut self, header: Option<&Path>) -> Self {
        self.inject_header = header.map(Path::to_path_buf);
        self
    }

    pub fn with_extra_flags(mut self, flags: &[String]) -> Self {
        self.extra_flags = flags.to_vec();
        self
    }

    /// Predefined macros for the configuration, as `(name, value)`.
    pub fn defines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ANDROID", String::new()),
            ("__ANDROID_API__", self.compilation_type.api_level.to_string()),
            ("_FORTIFY_SOURCE", "2".to_string()),
            ("_GNU_SOURCE", String::new()),
        ]
    }

    /// Compiler arguments, excluding the source file.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = vec!["-nostdlibinc".to_string()];

        for dir in &self.include_dirs {
            args.push("-isystem".to_string());
            args.push(dir.display().to_string());
        }

        args.push("-std=c11".to_string());

        for (name, value) in self.defines() {
            if value.is_empty() {
                args.push(format!("-D{}", name));
            } else {
                args.push(format!("-D{}={}", name, value));
            }
        }

        args.extend(WARNING_FLAGS.iter().map(|f| f.to_string()));

        args.push("-target".to_string());
        args.push(self.compilation_type.arch.target_triple().to_string());

        if let Some(ref header) = self.inject_header {
            args.push("-include".to_string());
            args.push(header.display().to_string());
        }

        args.extend(self.extra_flags.iter().cloned());

        args.push(format!(
            "-D_FILE_OFFSET_BITS={}",
            self.compilation_type.file_offset_bits
        ));

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Arch;

    fn invocation() -> CompileInvocation {
        CompileInvocation::new(
            CompilationType::new(Arch::Arm64, 23, 64),
            "/top/current/stdio.h",
            "/top/current",
            vec![PathBuf::from("/top/current"), PathBuf::from("/top/deps/common/kernel")],
        )
    }

    #[test]
    fn test_arguments_encode_configuration() {
        let args = invocation().arguments();

        assert_eq!(args[0], "-nostdlibinc");
        assert_eq!(args[1..5], ["-isystem", "/top/current", "-isystem", "/top/deps/common/kernel"]);
        assert!(args.contains(&"-D__ANDROID_API__=23".to_string()));
        assert!(args.contains(&"-DANDROID".to_string()));
        assert!(args.contains(&"-Werror".to_string()));
        assert_eq!(args.last().unwrap(), "-D_FILE_OFFSET_BITS=64");

        let target = args.iter().position(|a| a == "-target").unwrap();
        assert_eq!(args[target + 1], "aarch64-linux-android");
        assert!(!args.contains(&"-include".to_string()));
    }

    #[test]
    fn test_inject_header_and_extra_flags() {
        let args = invocation()
            .with_inject_header(Some(Path::new("/top/versioning.h")))
            .with_extra_flags(&["-Wno-gnu".to_string()])
            .arguments();

        let include = args.iter().position(|a| a == "-include").unwrap();
        assert_eq!(args[include + 1], "/top/versioning.h");
        assert_eq!(args[include + 2], "-Wno-gnu");
        assert_eq!(args.last().unwrap(), "-D_FILE_OFFSET_BITS=64");
    }
}
