//! Optional hand-off of the record CSV to an external plotting script.

use std::path::{Path, PathBuf};
use std::process::Command;

/// External plotter invocation: `<program> <script> <csv>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotHook {
    /// Interpreter to launch, looked up on `PATH`.
    pub program: String,
    /// Script passed as the first argument.
    pub script: PathBuf,
}

impl PlotHook {
    /// Default interpreter.
    pub const DEFAULT_PROGRAM: &str = "Rscript";
    /// Default plotting script.
    pub const DEFAULT_SCRIPT: &str = "autoplotter.R";

    /// The command that would be run for `csv`.
    #[must_use]
    pub fn command(&self, csv: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(&self.script).arg(csv);
        command
    }

    /// Run the plotter and wait for it.
    ///
    /// Failures are logged and otherwise ignored: the analysis outputs are
    /// already written by the time this runs.
    pub fn run(&self, csv: &Path) {
        tracing::info!(
            program = %self.program,
            script = %self.script.display(),
            "plotting {}",
            csv.display()
        );
        match self.command(csv).status() {
            Ok(status) if status.success() => tracing::info!("plotter finished"),
            Ok(status) => tracing::warn!(%status, "plotter exited unsuccessfully"),
            Err(e) => tracing::warn!(program = %self.program, "could not launch plotter: {e}"),
        }
    }
}

impl Default for PlotHook {
    fn default() -> Self {
        Self {
            program: Self::DEFAULT_PROGRAM.to_owned(),
            script: PathBuf::from(Self::DEFAULT_SCRIPT),
        }
    }
}
