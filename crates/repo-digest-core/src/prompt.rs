//! Prompt Generator
//!
//! Produces the textual representation of each classified file. The external
//! renderer is preferred; when it is not installed the raw file is read as
//! UTF-8. A failing file never stops the batch.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::classifier::FileRecord;

/// Relative-path key -> generated text
pub type PromptMap = BTreeMap<String, String>;

/// Suffix appended to a file's key to form the renderer's output file
const OUTPUT_SUFFIX: &str = ".prompt.txt";

/// Prefix of the value recorded for a file that failed to render
pub const ERROR_PREFIX: &str = "Error processing file: ";

/// Why a single file could not be rendered
#[derive(Debug, Error)]
pub enum RenderError {
    /// Content is not valid UTF-8. The file is skipped.
    #[error("file is not valid UTF-8 text")]
    NotText,

    /// Renderer ran but reported failure
    #[error("{0}")]
    Tool(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    /// Only undecodable content is skipped; every other failure is recorded
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::NotText)
    }
}

/// Renders files through an external prompt tool with a raw-read fallback
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    program: String,
}

impl PromptGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Render every file independently.
    ///
    /// Renderer output goes to a scratch directory owned by this call, so no
    /// file inside the repository is ever written or removed.
    pub fn render(&self, files: &[FileRecord]) -> PromptMap {
        let mut prompts = PromptMap::new();

        let scratch = match scratch_dir() {
            Ok(dir) => dir,
            Err(e) => {
                error!("Failed to create renderer scratch directory: {}", e);
                for file in files {
                    prompts.insert(file.key(), format!("{}{}", ERROR_PREFIX, e));
                }
                return prompts;
            }
        };

        for file in files {
            let key = file.key();
            debug!("Generating prompt for: {}", key);

            let output_file = output_path(scratch.path(), file);
            let result = self.render_one(file, &key, &output_file);
            remove_output_file(&output_file);

            match result {
                Ok(text) => {
                    prompts.insert(key, text);
                }
                Err(e) if e.is_skippable() => {
                    warn!("Could not read {} as text file, skipping", key);
                }
                Err(e) => {
                    error!("Error processing {}: {}", key, e);
                    prompts.insert(key, format!("{}{}", ERROR_PREFIX, e));
                }
            }
        }

        prompts
    }

    fn render_one(
        &self,
        file: &FileRecord,
        key: &str,
        output_file: &Path,
    ) -> Result<String, RenderError> {
        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Attempting to use {} for {}", self.program, key);
        let spawned = Command::new(&self.program)
            .arg(file.absolute())
            .arg(format!("--output={}", output_file.display()))
            .output();

        let output = match spawned {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} not found, reading raw content for {}", self.program, key);
                return read_text(&file.absolute());
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RenderError::Tool(format!(
                "{} exited with {}: {}",
                self.program, output.status, stderr
            )));
        }

        if output_file.exists() {
            let text = read_text(output_file)?;
            info!("Generated prompt using {} for {}", self.program, key);
            Ok(text)
        } else {
            warn!("Output file not found for {}, using command output", key);
            String::from_utf8(output.stdout).map_err(|_| RenderError::NotText)
        }
    }
}

impl Default for PromptGenerator {
    fn default() -> Self {
        Self::new("code2prompt")
    }
}

fn scratch_dir() -> io::Result<TempDir> {
    tempfile::Builder::new().prefix("repo-digest-prompts-").tempdir()
}

/// Transient renderer output, mirrored under `scratch`
fn output_path(scratch: &Path, file: &FileRecord) -> PathBuf {
    let mut name = file.relative().as_os_str().to_os_string();
    name.push(OUTPUT_SUFFIX);
    scratch.join(name)
}

fn remove_output_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to clean up temporary file {}: {}", path.display(), e);
    }
}

/// Read a file as UTF-8, tagging undecodable content separately from IO errors
fn read_text(path: &Path) -> Result<String, RenderError> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| RenderError::NotText)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_TOOL: &str = "repo-digest-no-such-renderer";

    fn fallback() -> PromptGenerator {
        PromptGenerator::new(MISSING_TOOL)
    }

    #[test]
    fn test_default_program() {
        assert_eq!(PromptGenerator::default().program(), "code2prompt");
    }

    #[test]
    fn test_output_path_lives_under_scratch() {
        let record = FileRecord::new("/ws", "src/main.py");
        assert_eq!(
            output_path(Path::new("/scratch"), &record),
            PathBuf::from("/scratch/src/main.py.prompt.txt")
        );
    }

    #[test]
    fn test_existing_prompt_named_file_is_untouched() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1").unwrap();
        fs::write(temp.path().join("a.py.prompt.txt"), "real notes").unwrap();

        let generator = fallback();
        let code = generator.render(&[FileRecord::new(temp.path(), "a.py")]);
        let doc = generator.render(&[FileRecord::new(temp.path(), "a.py.prompt.txt")]);

        assert_eq!(code["a.py"], "x = 1");
        assert_eq!(doc["a.py.prompt.txt"], "real notes");
        assert_eq!(
            fs::read_to_string(temp.path().join("a.py.prompt.txt")).unwrap(),
            "real notes"
        );
    }

    #[test]
    fn test_raw_read_fallback() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/main.py"), "print(1)").unwrap();
        fs::write(temp.path().join("README.md"), "# Title").unwrap();

        let files = vec![
            FileRecord::new(temp.path(), "src/main.py"),
            FileRecord::new(temp.path(), "README.md"),
        ];
        let prompts = fallback().render(&files);

        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts["src/main.py"], "print(1)");
        assert_eq!(prompts["README.md"], "# Title");
        assert!(!temp.path().join("src/main.py.prompt.txt").exists());
    }

    #[test]
    fn test_non_text_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("blob.rs"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        fs::write(temp.path().join("ok.rs"), "fn ok() {}").unwrap();

        let files = vec![
            FileRecord::new(temp.path(), "blob.rs"),
            FileRecord::new(temp.path(), "ok.rs"),
        ];
        let prompts = fallback().render(&files);

        assert!(!prompts.contains_key("blob.rs"));
        assert_eq!(prompts["ok.rs"], "fn ok() {}");
    }

    #[test]
    fn test_missing_file_records_error() {
        let temp = TempDir::new().unwrap();
        let files = vec![FileRecord::new(temp.path(), "gone.py")];

        let prompts = fallback().render(&files);

        assert!(prompts["gone.py"].starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_error_kind_decides_skip() {
        assert!(RenderError::NotText.is_skippable());
        assert!(!RenderError::Tool("binary not allowed".into()).is_skippable());
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "binary file locked");
        assert!(!RenderError::Io(io).is_skippable());
    }

    #[cfg(unix)]
    mod with_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-renderer");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_tool_output_file_is_used_and_removed() {
            let tools = TempDir::new().unwrap();
            let ws = TempDir::new().unwrap();
            fs::write(ws.path().join("lib.rs"), "pub fn a() {}").unwrap();
            let seen = tools.path().join("seen");
            // $2 is `--output=<path>`
            let tool = script(
                tools.path(),
                &format!(
                    r#"out="${{2#--output=}}"; echo "$out" > "{}"; printf 'rendered:%s' "$(cat "$1")" > "$out""#,
                    seen.display()
                ),
            );

            let generator = PromptGenerator::new(tool.to_string_lossy());
            let prompts = generator.render(&[FileRecord::new(ws.path(), "lib.rs")]);

            assert_eq!(prompts["lib.rs"], "rendered:pub fn a() {}");
            let written = PathBuf::from(fs::read_to_string(&seen).unwrap().trim());
            assert!(!written.starts_with(ws.path()));
            assert!(written.ends_with("lib.rs.prompt.txt"));
            assert!(!written.exists());
            assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 1);
        }

        #[test]
        fn test_tool_stdout_used_without_output_file() {
            let tools = TempDir::new().unwrap();
            let ws = TempDir::new().unwrap();
            fs::write(ws.path().join("notes.txt"), "ignored").unwrap();
            let tool = script(tools.path(), "printf 'from stdout'");

            let generator = PromptGenerator::new(tool.to_string_lossy());
            let prompts = generator.render(&[FileRecord::new(ws.path(), "notes.txt")]);

            assert_eq!(prompts["notes.txt"], "from stdout");
        }

        #[test]
        fn test_tool_failure_recorded_and_batch_continues() {
            let tools = TempDir::new().unwrap();
            let ws = TempDir::new().unwrap();
            fs::write(ws.path().join("a.go"), "package a").unwrap();
            fs::write(ws.path().join("b.go"), "package b").unwrap();
            let tool = script(
                tools.path(),
                r#"out="${2#--output=}"; echo partial > "$out"; echo "binary crash" >&2; exit 3"#,
            );

            let generator = PromptGenerator::new(tool.to_string_lossy());
            let prompts = generator.render(&[
                FileRecord::new(ws.path(), "a.go"),
                FileRecord::new(ws.path(), "b.go"),
            ]);

            assert_eq!(prompts.len(), 2);
            for key in ["a.go", "b.go"] {
                assert!(prompts[key].starts_with(ERROR_PREFIX));
                assert!(prompts[key].contains("binary crash"));
            }
            assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 2);
        }
    }
}
