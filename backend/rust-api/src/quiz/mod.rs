pub mod engine;

pub use engine::{CompletionSubmission, QuizEngine, QuizPhase, QuizRules, SelectionOutcome};
