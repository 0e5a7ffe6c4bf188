use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("failed to launch solver `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("solver rejected the cube ({status}): {message}")]
    Rejected { status: String, message: String },
    #[error("solver produced no moves")]
    EmptySolution,
}

/// Turns a 54-character facelet string into a move sequence.
pub trait CubeSolver: Send {
    fn solve(&self, facelets: &str) -> Result<String, SolverError>;
}
