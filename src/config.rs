use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable consulted for the export directory.
pub const OUTPUT_DIR_ENV: &str = "DOCLABEL_OUTPUT_DIR";

/// Where and under which name exports of one input file are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    dir: PathBuf,
    stem: String,
    extension: String,
}

impl ExportTarget {
    /// Resolve the export directory from, in order of priority:
    /// 1. An explicit path (from --output-dir)
    /// 2. The DOCLABEL_OUTPUT_DIR environment variable
    /// 3. The directory holding the input file
    pub fn resolve(input: &Path, explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from);
        Self::resolve_with(input, explicit, env)
    }

    fn resolve_with(
        input: &Path,
        explicit: Option<&Path>,
        env: Option<PathBuf>,
    ) -> Result<Self> {
        let dir = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            path
        } else {
            match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    parent.to_path_buf()
                }
                _ => PathBuf::from("."),
            }
        };

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "input path has no file name: {}",
                    input.display()
                ))
            })?;
        let extension = input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "csv".to_string());

        std::fs::create_dir_all(&dir)
            .map_err(|_| Error::OutputDir(dir.clone()))?;

        Ok(Self {
            dir,
            stem,
            extension,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<stem>-output-<timestamp>.<ext>`, with `-<n>` before the extension
    /// for `attempt > 0`.
    pub fn file_path(&self, timestamp: &str, attempt: u32) -> PathBuf {
        let name = if attempt == 0 {
            format!("{}-output-{timestamp}.{}", self.stem, self.extension)
        } else {
            format!(
                "{}-output-{timestamp}-{attempt}.{}",
                self.stem, self.extension
            )
        };
        self.dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_input_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("demo.csv");
        let target = ExportTarget::resolve_with(&input, None, None).unwrap();

        assert_eq!(target.dir(), tmp.path());
        assert_eq!(
            target.file_path("20240102_030405", 0),
            tmp.path().join("demo-output-20240102_030405.csv")
        );
    }

    #[test]
    fn explicit_dir_wins_over_env() {
        let tmp = tempfile::tempdir().unwrap();
        let explicit = tmp.path().join("explicit");
        let env = tmp.path().join("env");
        let target = ExportTarget::resolve_with(
            Path::new("data/demo.csv"),
            Some(&explicit),
            Some(env.clone()),
        )
        .unwrap();

        assert_eq!(target.dir(), explicit);
        assert!(explicit.is_dir());
        assert!(!env.exists());
    }

    #[test]
    fn env_dir_used_without_explicit() {
        let tmp = tempfile::tempdir().unwrap();
        let env = tmp.path().join("exports");
        let target = ExportTarget::resolve_with(
            Path::new("demo.csv"),
            None,
            Some(env.clone()),
        )
        .unwrap();
        assert_eq!(target.dir(), env);
    }

    #[test]
    fn bare_file_name_exports_to_current_dir() {
        let target =
            ExportTarget::resolve_with(Path::new("demo.csv"), None, None)
                .unwrap();
        assert_eq!(target.dir(), Path::new("."));
    }

    #[test]
    fn keeps_extension_and_numbers_retries() {
        let tmp = tempfile::tempdir().unwrap();
        let target = ExportTarget::resolve_with(
            &tmp.path().join("points.tsv"),
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            target.file_path("20240102_030405", 2),
            tmp.path().join("points-output-20240102_030405-2.tsv")
        );
    }

    #[test]
    fn missing_extension_falls_back_to_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let target =
            ExportTarget::resolve_with(&tmp.path().join("table"), None, None)
                .unwrap();
        assert_eq!(
            target.file_path("t", 0),
            tmp.path().join("table-output-t.csv")
        );
    }
}
