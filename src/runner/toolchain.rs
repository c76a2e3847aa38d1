//! Toolchain command templates
//!
//! Every toolchain interaction is a shell command line with placeholders:
//! `{source}`, `{test}`, `{artifact}` and `{name}`. Values are shell-escaped
//! before substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// File created in an exercise directory before the first build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scaffold {
    pub file: String,
    /// May contain `{name}`
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    pub source_extension: String,
    pub build: String,
    pub run: String,
    pub test: String,
    pub test_suffix: String,
    /// A partial `[toolchain]` table leaves this unset rather than inheriting go.mod
    #[serde(default)]
    pub scaffold: Option<Scaffold>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            source_extension: "go".to_string(),
            build: "go build -o {artifact} .".to_string(),
            run: "{artifact}".to_string(),
            test: "go test -v .".to_string(),
            test_suffix: "_test".to_string(),
            scaffold: Some(Scaffold {
                file: "go.mod".to_string(),
                contents: "module {name}\n\ngo 1.21\n".to_string(),
            }),
        }
    }
}

/// Values substituted into a command template
#[derive(Debug, Clone)]
pub struct CommandContext<'a> {
    pub source: &'a Path,
    pub test: &'a Path,
    pub artifact: &'a Path,
    pub name: &'a str,
}

impl Toolchain {
    /// Companion test file name for a source stem, e.g. `hello_test.go`
    pub fn test_file_name(&self, stem: &str) -> String {
        format!("{stem}{}.{}", self.test_suffix, self.source_extension)
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        has_source_extension(path, &self.source_extension)
    }

    /// Substitute placeholders in a command template
    pub fn render(&self, template: &str, ctx: &CommandContext<'_>) -> String {
        template
            .replace("{source}", &escape_path(ctx.source))
            .replace("{test}", &escape_path(ctx.test))
            .replace("{artifact}", &escape_path(ctx.artifact))
            .replace("{name}", &shell_escape::escape(Cow::Borrowed(ctx.name)))
    }

    /// Create the scaffold file in `dir` if missing
    ///
    /// Returns true when a file was written.
    pub fn bootstrap(&self, dir: &Path, name: &str) -> Result<bool> {
        let Some(scaffold) = &self.scaffold else {
            return Ok(false);
        };

        let path = dir.join(&scaffold.file);
        if path.exists() {
            return Ok(false);
        }

        let contents = scaffold.contents.replace("{name}", name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Created toolchain scaffold");
        Ok(true)
    }

    /// Program the build command starts with
    pub fn program(&self) -> Option<&str> {
        self.build.split_whitespace().next()
    }

    /// Resolve the build program on PATH
    pub fn check_available(&self) -> Result<PathBuf> {
        let program = self
            .program()
            .context("toolchain.build command is empty")?;
        which::which(program)
            .with_context(|| format!("Toolchain program '{program}' not found on PATH"))
    }
}

fn escape_path(path: &Path) -> String {
    shell_escape::escape(path.to_string_lossy()).into_owned()
}

/// Whether `path` ends in `.{extension}`
pub fn has_source_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy() == extension)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_go() {
        let toolchain = Toolchain::default();
        assert_eq!(toolchain.test_file_name("hello"), "hello_test.go");
        assert!(toolchain.is_source_file(Path::new("/x/hello.go")));
        assert!(!toolchain.is_source_file(Path::new("/x/hello.go.swp")));
        assert!(!toolchain.is_source_file(Path::new("/x/Makefile")));
        assert_eq!(toolchain.program(), Some("go"));
    }

    #[test]
    fn test_render_escapes_paths() {
        let toolchain = Toolchain::default();
        let ctx = CommandContext {
            source: Path::new("/tmp/my dir/hello.go"),
            test: Path::new("/tmp/my dir/hello_test.go"),
            artifact: Path::new("/tmp/bin/hello"),
            name: "hello",
        };

        assert_eq!(
            toolchain.render("cat {source} && {artifact} {name}", &ctx),
            "cat '/tmp/my dir/hello.go' && /tmp/bin/hello hello"
        );
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let toolchain = Toolchain::default();

        assert!(toolchain.bootstrap(temp_dir.path(), "hello").unwrap());
        let content = fs::read_to_string(temp_dir.path().join("go.mod")).unwrap();
        assert!(content.starts_with("module hello"));

        fs::write(temp_dir.path().join("go.mod"), "module custom\n").unwrap();
        assert!(!toolchain.bootstrap(temp_dir.path(), "hello").unwrap());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("go.mod")).unwrap(),
            "module custom\n"
        );
    }

    #[test]
    fn test_bootstrap_without_scaffold() {
        let temp_dir = TempDir::new().unwrap();
        let toolchain = Toolchain {
            scaffold: None,
            ..Toolchain::default()
        };

        assert!(!toolchain.bootstrap(temp_dir.path(), "hello").unwrap());
        assert!(fs::read_dir(temp_dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_check_available_finds_sh() {
        let toolchain = Toolchain {
            build: "sh -n {source}".to_string(),
            ..Toolchain::default()
        };
        assert!(toolchain.check_available().is_ok());

        let missing = Toolchain {
            build: "definitely-not-a-kata-toolchain build".to_string(),
            ..Toolchain::default()
        };
        assert!(missing.check_available().is_err());
    }
}
