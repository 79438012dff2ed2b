use thiserror::Error;

/// Errors that can occur while configuring or driving a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The simulation world has been dropped and is no longer accessible.
    #[error("simulation has been shut down")]
    SimulationShutdown,
    /// The simulation reached an invalid state.
    #[error("invalid simulation state: {0}")]
    InvalidState(String),
    /// The static configuration cannot produce a meaningful run.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// A type alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;
