//! Compile-time evaluation plumbing: the scratch directory handle and the
//! interpreter subprocess.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Fixed name of the scratch directory.
pub const SCRATCH_DIR: &str = ".complua";

/// The scratch directory: created once at process start, removed on
/// successful completion. Files inside are overwritten per directive;
/// the compiler must not run in parallel against the same directory.
#[derive(Debug)]
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    /// Create the scratch directory under the working directory.
    pub fn create() -> io::Result<Scratch> {
        Scratch::create_in(Path::new("."))
    }

    /// Create the scratch directory under `base` (tests use a tempdir).
    pub fn create_in(base: &Path) -> io::Result<Scratch> {
        let dir = base.join(SCRATCH_DIR);
        fs::create_dir_all(&dir)?;
        Ok(Scratch { dir })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Remove the directory. Called on clean exit only; a failed build
    /// leaves the generated programs behind for inspection.
    pub fn cleanup(self) -> io::Result<()> {
        fs::remove_dir_all(&self.dir)
    }
}

/// Which directive family is being evaluated; selects the scratch file
/// names (`.eval` / `.load` and their artefacts).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvalKind {
    Eval,
    Load,
}

impl EvalKind {
    fn program_name(self) -> &'static str {
        match self {
            EvalKind::Eval => ".eval",
            EvalKind::Load => ".load",
        }
    }

    fn dump_name(self) -> &'static str {
        match self {
            EvalKind::Eval => ".eval.temp",
            EvalKind::Load => ".load.temp",
        }
    }

    fn text_name(self) -> &'static str {
        match self {
            EvalKind::Eval => ".eval.temp.expr",
            EvalKind::Load => ".load.temp.expr",
        }
    }
}

/// The two artefacts a compile-time program writes: the byte-dump of a
/// zero-argument function returning the value, and the serialised text.
#[derive(Debug)]
pub struct EvalOutcome {
    pub dump: Vec<u8>,
    pub text: Vec<u8>,
}

#[derive(Debug)]
pub enum EvalFailure {
    /// The interpreter could not be started or artefacts not read.
    Io(io::Error),
    /// The interpreter wrote to stderr (or failed without output).
    Interpreter(String),
}

impl From<io::Error> for EvalFailure {
    fn from(e: io::Error) -> Self {
        EvalFailure::Io(e)
    }
}

impl Scratch {
    /// Absolute-ish path strings for the trailer to write its artefacts to.
    pub fn artefact_paths(&self, kind: EvalKind) -> (PathBuf, PathBuf) {
        (self.path(kind.dump_name()), self.path(kind.text_name()))
    }

    /// Write `program`, run `interpreter` on it, and read back both
    /// artefacts. Stdout is propagated; stderr is captured.
    pub fn run(
        &self,
        kind: EvalKind,
        program: &str,
        interpreter: &str,
    ) -> Result<EvalOutcome, EvalFailure> {
        let program_path = self.path(kind.program_name());
        fs::write(&program_path, program)?;

        let output = Command::new(interpreter)
            .arg(&program_path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(EvalFailure::Interpreter(stderr.into_owned()));
        }
        if !output.status.success() {
            return Err(EvalFailure::Interpreter(format!(
                "{interpreter} exited with {}",
                output.status
            )));
        }

        let (dump_path, text_path) = self.artefact_paths(kind);
        Ok(EvalOutcome {
            dump: fs::read(dump_path)?,
            text: fs::read(text_path)?,
        })
    }
}
