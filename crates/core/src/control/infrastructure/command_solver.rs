use std::path::PathBuf;
use std::process::Command;

use crate::control::domain::cube_solver::{CubeSolver, SolverError};

/// Runs an external program as `<program> [args..] <facelets>` and reads the
/// move sequence from its stdout.
pub struct CommandSolver {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the facelet string.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl CubeSolver for CommandSolver {
    fn solve(&self, facelets: &str) -> Result<String, SolverError> {
        let program = self.program.display().to_string();
        log::debug!("Running solver {program} on {facelets}");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(facelets)
            .output()
            .map_err(|source| SolverError::Launch {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SolverError::Rejected {
                status: output.status.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let moves = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if moves.is_empty() {
            return Err(SolverError::EmptySolution);
        }
        Ok(moves)
    }
}
