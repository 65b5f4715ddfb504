use chrono::NaiveDateTime;
use gf_intake::IntakeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("engine configuration error: {0}")]
    Config(String),

    #[error("solution has no route assignments")]
    EmptySolution,

    #[error("simulation has not been started")]
    NotStarted,

    #[error("playback clock is not running")]
    NotRunning,

    #[error("no solution available for the cycle starting {at}: {reason}")]
    SolutionUnavailable {
        at:     NaiveDateTime,
        reason: String,
    },

    #[error("intake error: {0}")]
    Intake(#[from] IntakeError),
}

pub type SimResult<T> = Result<T, SimError>;
