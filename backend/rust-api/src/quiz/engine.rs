//! Client-side quiz session state machine.
//!
//! The engine is pure and synchronous: it owns question sequencing, lives
//! and score tracking, and tells the host what to submit on completion. The
//! host (UI layer) owns the clock — it schedules the feedback dwell and the
//! per-question countdown from the durations in `QuizRules` and calls back
//! into the engine (`advance`, `timeout`). Tearing the host component down
//! simply stops scheduling; no cancellation token is needed.

use std::time::Duration;

use crate::models::completion::Difficulty;
use crate::models::question::WordQuestion;

/// Per-difficulty tuning for a quiz run.
#[derive(Debug, Clone, Copy)]
pub struct QuizRules {
    pub lives: u32,
    /// How long correctness feedback stays on screen.
    pub feedback_dwell: Duration,
    /// Per-question countdown; elapsing counts as an incorrect "no answer".
    pub question_timer: Option<Duration>,
}

impl QuizRules {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Beginner => QuizRules {
                lives: 3,
                feedback_dwell: Duration::from_millis(1000),
                question_timer: Some(Duration::from_secs(15)),
            },
            Difficulty::Intermediate => QuizRules {
                lives: 3,
                feedback_dwell: Duration::from_millis(2000),
                question_timer: None,
            },
            Difficulty::Advanced => QuizRules {
                lives: 3,
                feedback_dwell: Duration::from_millis(2500),
                question_timer: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    /// Question set not loaded yet.
    Loading,
    /// Fetch failed or returned nothing; terminal display state.
    NoQuestions,
    /// A question is on screen awaiting the single-shot answer.
    Question { index: usize },
    /// Correctness feedback is showing for the dwell window.
    Feedback { index: usize, correct: bool },
    /// Terminal: lives ran out or the last question was answered.
    Completed { score_percent: i32 },
}

/// What `select_option`/`timeout` tell the host to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Show feedback for `QuizRules::feedback_dwell`, then call `advance`.
    Feedback { correct: bool },
    /// Click arrived outside the answering window or after a selection was
    /// already registered; nothing changed.
    Ignored,
}

/// Score submission for the achievements write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSubmission {
    pub difficulty: Difficulty,
    pub score_percent: i32,
}

pub struct QuizEngine {
    difficulty: Difficulty,
    rules: QuizRules,
    questions: Vec<WordQuestion>,
    phase: QuizPhase,
    lives: u32,
    correct_count: u32,
}

impl QuizEngine {
    pub fn new(difficulty: Difficulty) -> Self {
        let rules = QuizRules::for_difficulty(difficulty);
        Self {
            difficulty,
            rules,
            questions: Vec::new(),
            phase: QuizPhase::Loading,
            lives: rules.lives,
            correct_count: 0,
        }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn rules(&self) -> QuizRules {
        self.rules
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn current_question(&self) -> Option<&WordQuestion> {
        match self.phase {
            QuizPhase::Question { index, .. } | QuizPhase::Feedback { index, .. } => {
                self.questions.get(index)
            }
            _ => None,
        }
    }

    /// Loads the fetched question set. An empty set lands in `NoQuestions`,
    /// the same terminal state the host uses for a failed fetch.
    pub fn load(&mut self, questions: Vec<WordQuestion>) {
        if self.phase != QuizPhase::Loading {
            return;
        }
        if questions.is_empty() {
            self.phase = QuizPhase::NoQuestions;
        } else {
            self.questions = questions;
            self.phase = QuizPhase::Question { index: 0 };
        }
    }

    pub fn load_failed(&mut self) {
        if self.phase == QuizPhase::Loading {
            self.phase = QuizPhase::NoQuestions;
        }
    }

    /// Registers an answer for the current question. Single-shot: once a
    /// selection is in, further clicks are ignored until the question
    /// advances.
    pub fn select_option(&mut self, option_id: &str) -> SelectionOutcome {
        let index = match &self.phase {
            QuizPhase::Question { index } => *index,
            _ => return SelectionOutcome::Ignored,
        };

        let correct = self
            .questions
            .get(index)
            .map(|q| q.correct_option_id == option_id)
            .unwrap_or(false);

        self.register_result(index, correct);
        SelectionOutcome::Feedback { correct }
    }

    /// Per-question countdown elapsed: counts as an incorrect "no answer".
    /// Only meaningful for variants with a `question_timer`.
    pub fn timeout(&mut self) -> SelectionOutcome {
        let index = match &self.phase {
            QuizPhase::Question { index } => *index,
            _ => return SelectionOutcome::Ignored,
        };
        if self.rules.question_timer.is_none() {
            return SelectionOutcome::Ignored;
        }

        self.register_result(index, false);
        SelectionOutcome::Feedback { correct: false }
    }

    fn register_result(&mut self, index: usize, correct: bool) {
        if correct {
            self.correct_count += 1;
        } else {
            self.lives = self.lives.saturating_sub(1);
        }
        self.phase = QuizPhase::Feedback { index, correct };
    }

    /// Called by the host after the feedback dwell: moves to the next
    /// question, or to `Completed` when lives hit zero or the last question
    /// has been answered, whichever comes first.
    pub fn advance(&mut self) {
        let index = match self.phase {
            QuizPhase::Feedback { index, .. } => index,
            _ => return,
        };

        let exhausted = self.lives == 0;
        let last_answered = index + 1 >= self.questions.len();
        if exhausted || last_answered {
            self.phase = QuizPhase::Completed {
                score_percent: self.score_percent(),
            };
        } else {
            self.phase = QuizPhase::Question { index: index + 1 };
        }
    }

    /// round(correct / total × 100); total is the full question set, not
    /// just the questions reached before lives ran out.
    pub fn score_percent(&self) -> i32 {
        if self.questions.is_empty() {
            return 0;
        }
        let ratio = f64::from(self.correct_count) / self.questions.len() as f64;
        (ratio * 100.0).round() as i32
    }

    /// Present once the run is complete; the host posts this to the
    /// achievements update endpoint.
    pub fn completion(&self) -> Option<CompletionSubmission> {
        match self.phase {
            QuizPhase::Completed { score_percent } => Some(CompletionSubmission {
                difficulty: self.difficulty,
                score_percent,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerOption;

    fn question(n: usize) -> WordQuestion {
        WordQuestion {
            id: None,
            difficulty: Difficulty::Beginner,
            prompt: format!("word {}", n),
            options: vec![
                AnswerOption {
                    id: "a".into(),
                    text: "right".into(),
                },
                AnswerOption {
                    id: "b".into(),
                    text: "wrong".into(),
                },
            ],
            correct_option_id: "a".into(),
        }
    }

    fn questions(count: usize) -> Vec<WordQuestion> {
        (0..count).map(question).collect()
    }

    #[test]
    fn empty_set_and_fetch_failure_both_end_in_no_questions() {
        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load(Vec::new());
        assert_eq!(*engine.phase(), QuizPhase::NoQuestions);

        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load_failed();
        assert_eq!(*engine.phase(), QuizPhase::NoQuestions);
    }

    #[test]
    fn perfect_run_scores_100() {
        let mut engine = QuizEngine::new(Difficulty::Intermediate);
        engine.load(questions(4));

        for _ in 0..4 {
            assert_eq!(
                engine.select_option("a"),
                SelectionOutcome::Feedback { correct: true }
            );
            engine.advance();
        }

        assert_eq!(
            engine.completion(),
            Some(CompletionSubmission {
                difficulty: Difficulty::Intermediate,
                score_percent: 100,
            })
        );
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn selection_is_single_shot() {
        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load(questions(2));

        assert_eq!(
            engine.select_option("b"),
            SelectionOutcome::Feedback { correct: false }
        );
        // Second click on the same question changes nothing.
        assert_eq!(engine.select_option("a"), SelectionOutcome::Ignored);
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn lives_exhaustion_completes_early() {
        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load(questions(10));

        for _ in 0..3 {
            engine.select_option("b");
            engine.advance();
        }

        // 0 correct out of 10 questions.
        assert_eq!(
            *engine.phase(),
            QuizPhase::Completed { score_percent: 0 }
        );
        assert_eq!(engine.lives(), 0);
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        let mut engine = QuizEngine::new(Difficulty::Advanced);
        engine.load(questions(3));

        engine.select_option("a");
        engine.advance();
        engine.select_option("a");
        engine.advance();
        engine.select_option("b");
        engine.advance();

        // 2/3 -> 66.67 -> 67
        assert_eq!(
            engine.completion().unwrap().score_percent,
            67
        );
    }

    #[test]
    fn timeout_counts_as_incorrect_on_beginner_only() {
        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load(questions(2));
        assert!(engine.rules().question_timer.is_some());

        assert_eq!(
            engine.timeout(),
            SelectionOutcome::Feedback { correct: false }
        );
        assert_eq!(engine.lives(), 2);

        // Variants without a countdown ignore timeouts.
        let mut engine = QuizEngine::new(Difficulty::Advanced);
        engine.load(questions(2));
        assert_eq!(engine.timeout(), SelectionOutcome::Ignored);
        assert_eq!(engine.lives(), 3);
    }

    #[test]
    fn timeout_after_selection_is_ignored() {
        let mut engine = QuizEngine::new(Difficulty::Beginner);
        engine.load(questions(2));

        engine.select_option("a");
        assert_eq!(engine.timeout(), SelectionOutcome::Ignored);
    }

    #[test]
    fn feedback_dwell_windows_are_bounded() {
        for difficulty in Difficulty::ALL {
            let dwell = QuizRules::for_difficulty(difficulty).feedback_dwell;
            assert!(dwell >= Duration::from_millis(1000));
            assert!(dwell <= Duration::from_millis(2500));
        }
    }
}
