//! Domain layer of the FGI simulator.
//!
//! A focus group interview (FGI) simulation pairs an AI moderator with a
//! panel of participant personas; this crate holds the pure state that
//! drives it: the persona registry, the two transcript logs, the progress
//! clock and the session phase machine. Everything that talks to a
//! generation backend lives in the application layer.

pub mod error;
pub mod persona;
pub mod progress;
pub mod session;
pub mod transcript;

pub use error::{FgiError, Result};
pub use persona::{Persona, PersonaRegistry};
pub use progress::{MINUTES_PER_TURN, Progress, Stage};
pub use session::{Phase, Session, SessionConfig, TurnIncrements};
pub use transcript::{
    HISTORY_WINDOW, Speaker, SpeechContent, SpeechRecord, StrategyExchange, StrategyLog,
    StrategyRole, Transcript,
};
