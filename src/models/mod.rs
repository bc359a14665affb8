pub mod automaton;
pub mod question;
pub mod status;

pub use automaton::{AutomatonKind, FiniteAutomaton, State, Transition};
pub use question::{QuestionEntry, Section, SegmentedDocument};
pub use status::{ProcessingStatus, StatusLedger, StatusStore};
