use serde::Serialize;
use thiserror::Error;

use crate::control::domain::command_transport::{CommandTransport, TransportError, TransportResponse};
use crate::control::domain::cube_solver::{CubeSolver, SolverError};
use crate::cube::orientation_resolver::{resolve, OrientationError};
use crate::pipeline::cube_state::CubeState;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("Cube state is incomplete. Capture a full state first.")]
    Incomplete,
    #[error("Failed to generate solver input: {0}")]
    Resolve(#[from] OrientationError),
    #[error("Solver failed: {0}")]
    Solver(#[from] SolverError),
    #[error("No command transport configured to send solution {solution:?}")]
    NoTransport { solution: String },
    /// The cube was solved but the moves never reached the robot.
    #[error("Sending solution {solution:?} failed: {source}")]
    Transport {
        solution: String,
        #[source]
        source: TransportError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolveOutcome {
    pub captured_at: Option<f64>,
    pub solver_input: String,
    pub solution: String,
    pub transport: Option<TransportResponse>,
}

/// Solves a captured state and optionally forwards the moves.
pub struct SolveUseCase {
    solver: Box<dyn CubeSolver>,
    transport: Option<Box<dyn CommandTransport>>,
}

impl SolveUseCase {
    pub fn new(solver: Box<dyn CubeSolver>, transport: Option<Box<dyn CommandTransport>>) -> Self {
        Self { solver, transport }
    }

    pub fn execute(&self, state: &CubeState, send: bool) -> Result<SolveOutcome, SolveError> {
        if !state.complete {
            return Err(SolveError::Incomplete);
        }
        let solver_input = match &state.solver_input {
            Some(input) if !input.is_empty() => input.clone(),
            _ => resolve(&state.faces)?,
        };

        let solution = self.solver.solve(&solver_input)?;
        log::info!("Solution: {solution}");

        let transport = if send {
            let Some(link) = self.transport.as_ref() else {
                return Err(SolveError::NoTransport { solution });
            };
            match link.send(&solution) {
                Ok(response) => Some(response),
                Err(source) => return Err(SolveError::Transport { solution, source }),
            }
        } else {
            None
        };

        Ok(SolveOutcome {
            captured_at: state.captured_at,
            solver_input,
            solution,
            transport,
        })
    }
}
