use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Suffix `git describe --dirty` appends when the work tree has changes.
pub const DIRTY_MARKER: &str = "-dirty";

/// Exit code git uses for "not a git repository" and friends.
const NOT_A_REPOSITORY: i32 = 128;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("not a git repository")]
    NotARepository,
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("{stderr} ({status})")]
    Failed { status: ExitStatus, stderr: String },
    #[error("unexpected git output: {0}")]
    InvalidOutput(String),
}

pub type Result<T> = std::result::Result<T, GitError>;

/// The three repository queries version resolution needs.
///
/// Every method answers `None` when the information is unavailable. Failures
/// are absorbed here so that callers never abort a build over a VCS hiccup.
pub trait Describer {
    /// `git describe --always --long --tags --dirty --abbrev=<abbrev>`
    fn describe(&self, abbrev: usize) -> Option<String>;

    /// Author date (`%ai`) of the commit `reference` points at.
    fn log_date(&self, reference: &str) -> Option<String>;

    /// Number of commits reachable from `reference`.
    fn commit_count(&self, reference: &str) -> Option<u64>;
}

impl<D: Describer + ?Sized> Describer for &D {
    fn describe(&self, abbrev: usize) -> Option<String> {
        (**self).describe(abbrev)
    }

    fn log_date(&self, reference: &str) -> Option<String> {
        (**self).log_date(reference)
    }

    fn commit_count(&self, reference: &str) -> Option<u64> {
        (**self).commit_count(reference)
    }
}

/// Removes a trailing dirty marker; a dirty-suffixed ref is not a commit-ish.
pub fn strip_dirty(reference: &str) -> &str {
    reference.strip_suffix(DIRTY_MARKER).unwrap_or(reference)
}

/// [`Describer`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitDescriber {
    program: PathBuf,
    dir: Option<PathBuf>,
}

impl Default for GitDescriber {
    fn default() -> Self {
        GitDescriber {
            program: PathBuf::from("git"),
            dir: None,
        }
    }
}

impl GitDescriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every query inside `dir` instead of the current directory.
    pub fn in_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Use another git executable.
    pub fn program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        debug!("running git {}", args.join(" "));

        //output() waits for the child and drains both pipes on every path.
        let output = command.output()?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            if output.status.code() == Some(NOT_A_REPOSITORY) {
                debug!("{} (exit: {})", stderr, output.status);
                return Err(GitError::NotARepository);
            }
            return Err(GitError::Failed {
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            //git warns on success too, e.g. a tag known under another name
            warn!("{} ({})", stderr, output.status);
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| GitError::InvalidOutput(e.to_string()))?;
        Ok(stdout.trim().to_string())
    }

    /// Runs a query, reporting unexpected failures and mapping every failure to `None`.
    fn query(&self, args: &[&str]) -> Option<String> {
        match self.run(args) {
            Ok(out) => Some(out),
            Err(GitError::NotARepository) => None,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

impl Describer for GitDescriber {
    fn describe(&self, abbrev: usize) -> Option<String> {
        let abbrev = format!("--abbrev={}", abbrev);
        self.query(&[
            "describe", "--always", "--long", "--tags", "--dirty", &abbrev,
        ])
    }

    fn log_date(&self, reference: &str) -> Option<String> {
        self.query(&["log", "-1", "--format=%ai", strip_dirty(reference)])
    }

    fn commit_count(&self, reference: &str) -> Option<u64> {
        let out = self.query(&["rev-list", "--count", strip_dirty(reference)])?;
        match out.parse::<u64>() {
            Ok(count) => Some(count),
            Err(_) => {
                warn!("{}", GitError::InvalidOutput(out));
                None
            }
        }
    }
}
