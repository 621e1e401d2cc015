//! Per-question talliers.
//!
//! A tallier is created for one question, folds in ballots with
//! [`QuestionTallier::add_vote`] and computes its result exactly once with
//! [`QuestionTallier::finish_tally`]. Adding a vote after the tally is finished,
//! finishing twice or reading a result before finishing are errors.

mod histogram_range;
mod plurality;
mod schulze;
mod stv;

use std::collections::HashMap;

use log::debug;
use snafu::{ensure, OptionExt, Snafu};

use crate::ballot::{DecodeError, QuestionScores};
use crate::config::*;
use crate::results::*;

pub(crate) use crate::tally::histogram_range::HistogramRangeTallier;
pub(crate) use crate::tally::plurality::PluralityTallier;
pub(crate) use crate::tally::schulze::SchulzeTallier;
pub(crate) use crate::tally::stv::StvTallier;
pub use crate::tally::stv::{droop_quota, reduced_keep_factor, MAX_ROUNDS, QUOTA_EPSILON};

/// Errors that stop a tally run. None of them can be skipped for a single vote.
#[derive(Debug, Snafu, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("record #{record_index} is malformed: {source}"))]
    MalformedRecord {
        record_index: u64,
        source: DecodeError,
    },
    #[snafu(display("the ballot answers question {question_id}, which is not part of this election"))]
    UnknownQuestion { question_id: QuestionId },
    #[snafu(display("question {question_id} has no option {option_id}"))]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[snafu(display("question {question_id}: score {score} of option {option_id} is outside [{min}, {max}]"))]
    ScoreOutOfRange {
        question_id: QuestionId,
        option_id: OptionId,
        score: Score,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id}: the total of option {option_id} overflows"))]
    ScoreOverflow {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[snafu(display("question {question_id}: the tally is already finished"))]
    AlreadyFinished { question_id: QuestionId },
    #[snafu(display("question {question_id}: the tally is not finished yet"))]
    NotFinished { question_id: QuestionId },
    #[snafu(display("question {question_id}: no result after {rounds} rounds"))]
    NoConvergence { question_id: QuestionId, rounds: u32 },
    #[snafu(display("the tally run was aborted by an earlier error"))]
    RunAborted,
    #[snafu(display("the tally run is already finished"))]
    RunFinished,
    #[snafu(display("invalid election: {source}"))]
    InvalidConfiguration { source: ConfigError },
}

/// Position of each option in question order.
#[derive(Debug, Clone)]
pub(crate) struct OptionIndex {
    question_id: QuestionId,
    ids: Vec<OptionId>,
    positions: HashMap<OptionId, usize>,
}

impl OptionIndex {
    pub(crate) fn new(question: &Question) -> OptionIndex {
        let ids: Vec<OptionId> = question.option_ids().collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(idx, oid)| (*oid, idx))
            .collect();
        OptionIndex {
            question_id: question.id,
            ids,
            positions,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn id(&self, idx: usize) -> OptionId {
        self.ids[idx]
    }

    pub(crate) fn ids(&self) -> &[OptionId] {
        &self.ids
    }

    pub(crate) fn position(&self, option_id: OptionId) -> Result<usize, TallyError> {
        self.positions
            .get(&option_id)
            .cloned()
            .context(UnknownOptionSnafu {
                question_id: self.question_id,
                option_id,
            })
    }

    /// Resolves every option of a vote before anything is accumulated, so that a
    /// rejected vote leaves the tally untouched.
    pub(crate) fn resolve(
        &self,
        scores: &QuestionScores,
    ) -> Result<Vec<(usize, Score)>, TallyError> {
        scores
            .iter()
            .map(|(oid, score)| self.position(*oid).map(|idx| (idx, *score)))
            .collect()
    }
}

/// Ranks values sorted from best to worst. Equal neighbours share a rank, and the
/// next distinct value is ranked after all the entries before it (1, 1, 3, ...).
pub(crate) fn competition_ranks<T: PartialEq>(sorted: &[T]) -> Vec<u32> {
    let mut ranks: Vec<u32> = Vec::with_capacity(sorted.len());
    for (idx, value) in sorted.iter().enumerate() {
        let rank = match ranks.last() {
            Some(prev_rank) if sorted[idx - 1] == *value => *prev_rank,
            _ => idx as u32 + 1,
        };
        ranks.push(rank);
    }
    ranks
}

#[derive(Debug, Clone)]
enum Counter {
    Plurality(PluralityTallier),
    HistogramRange(HistogramRangeTallier),
    Schulze(SchulzeTallier),
    Stv(StvTallier),
}

#[derive(Debug, Clone)]
enum Phase {
    Accumulating,
    Finished(QuestionResult),
}

/// The tally state of one question.
#[derive(Debug, Clone)]
pub struct QuestionTallier {
    question_id: QuestionId,
    votes: u64,
    phase: Phase,
    counter: Counter,
}

impl QuestionTallier {
    pub fn new(question: &Question, tally_type: TallyType) -> Result<QuestionTallier, ConfigError> {
        let counter = match tally_type {
            TallyType::Plurality => Counter::Plurality(PluralityTallier::new(question)),
            TallyType::HistogramRange => {
                Counter::HistogramRange(HistogramRangeTallier::new(question)?)
            }
            TallyType::Schulze => Counter::Schulze(SchulzeTallier::new(question)),
            TallyType::Stv => Counter::Stv(StvTallier::new(question)?),
        };
        debug!(
            "QuestionTallier::new: question {} tallied with {}",
            question.id, tally_type
        );
        Ok(QuestionTallier {
            question_id: question.id,
            votes: 0,
            phase: Phase::Accumulating,
            counter,
        })
    }

    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// The number of votes accepted so far.
    pub fn votes(&self) -> u64 {
        self.votes
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Fails exactly when [`QuestionTallier::add_vote`] would, without changing
    /// anything.
    pub fn check_vote(&self, scores: &QuestionScores) -> Result<(), TallyError> {
        ensure!(
            !self.is_finished(),
            AlreadyFinishedSnafu {
                question_id: self.question_id
            }
        );
        match &self.counter {
            Counter::Plurality(t) => t.check_vote(scores).map(|_| ()),
            Counter::HistogramRange(t) => t.check_vote(scores).map(|_| ()),
            Counter::Schulze(t) => t.check_vote(scores).map(|_| ()),
            Counter::Stv(t) => t.check_vote(scores).map(|_| ()),
        }
    }

    /// Folds one ballot's answers to this question into the tally. A rejected
    /// vote leaves the tally untouched.
    pub fn add_vote(&mut self, scores: &QuestionScores) -> Result<(), TallyError> {
        ensure!(
            !self.is_finished(),
            AlreadyFinishedSnafu {
                question_id: self.question_id
            }
        );
        match &mut self.counter {
            Counter::Plurality(t) => t.add_vote(scores)?,
            Counter::HistogramRange(t) => t.add_vote(scores)?,
            Counter::Schulze(t) => t.add_vote(scores)?,
            Counter::Stv(t) => t.add_vote(scores)?,
        }
        self.votes += 1;
        Ok(())
    }

    /// Computes the result from everything accumulated. Can only run once.
    pub fn finish_tally(&mut self) -> Result<&QuestionResult, TallyError> {
        ensure!(
            !self.is_finished(),
            AlreadyFinishedSnafu {
                question_id: self.question_id
            }
        );
        let result = match &self.counter {
            Counter::Plurality(t) => QuestionResult::Plurality(t.finish()),
            Counter::HistogramRange(t) => QuestionResult::HistogramRange(t.finish()),
            Counter::Schulze(t) => QuestionResult::Schulze(t.finish()),
            Counter::Stv(t) => QuestionResult::Stv(t.finish()?),
        };
        debug!(
            "finish_tally: question {} finished after {} votes",
            self.question_id, self.votes
        );
        self.phase = Phase::Finished(result);
        self.result()
    }

    pub fn result(&self) -> Result<&QuestionResult, TallyError> {
        match &self.phase {
            Phase::Finished(result) => Ok(result),
            Phase::Accumulating => NotFinishedSnafu {
                question_id: self.question_id,
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn competition_ranking() {
        assert_eq!(competition_ranks::<u32>(&[]), Vec::<u32>::new());
        assert_eq!(competition_ranks(&[9, 7, 7, 5, 5, 5, 1]), vec![1, 2, 2, 4, 4, 4, 7]);
        assert_eq!(competition_ranks(&[3, 3]), vec![1, 1]);
    }

    #[test]
    fn lifecycle_is_checked() {
        init_logs();
        let mut t = QuestionTallier::new(&question(1, &[1, 2]), TallyType::Plurality).unwrap();
        assert_eq!(
            t.result().unwrap_err(),
            TallyError::NotFinished { question_id: 1 }
        );
        t.add_vote(&[(1, 1)].into_iter().collect()).unwrap();
        assert!(t.finish_tally().is_ok());
        assert!(t.is_finished());
        assert_eq!(
            t.add_vote(&[(2, 1)].into_iter().collect()),
            Err(TallyError::AlreadyFinished { question_id: 1 })
        );
        assert_eq!(
            t.check_vote(&[(2, 1)].into_iter().collect()),
            Err(TallyError::AlreadyFinished { question_id: 1 })
        );
        assert_eq!(
            t.finish_tally().unwrap_err(),
            TallyError::AlreadyFinished { question_id: 1 }
        );
        assert_eq!(t.votes(), 1);
        assert!(t.result().is_ok());
    }

    #[test]
    fn unknown_options_are_rejected_without_side_effects() {
        let mut t = QuestionTallier::new(&question(1, &[1, 2]), TallyType::Plurality).unwrap();
        let bad: QuestionScores = [(1, 1), (5, 1)].into_iter().collect();
        assert_eq!(t.check_vote(&bad), t.add_vote(&bad));
        assert_eq!(
            t.add_vote(&bad),
            Err(TallyError::UnknownOption {
                question_id: 1,
                option_id: 5
            })
        );
        assert_eq!(t.votes(), 0);
        match t.finish_tally().unwrap() {
            QuestionResult::Plurality(r) => assert!(r.rows.iter().all(|row| row.total == 0)),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn configuration_errors_come_first() {
        assert_eq!(
            QuestionTallier::new(&question(3, &[1, 2]), TallyType::Stv).unwrap_err(),
            ConfigError::MissingSeats { question_id: 3 }
        );
        assert_eq!(
            QuestionTallier::new(&question(3, &[1, 2]), TallyType::HistogramRange).unwrap_err(),
            ConfigError::MissingScoreBounds { question_id: 3 }
        );
    }
}
