//! Ballot records: the fixed-width text form of a voter's choices.
//!
//! Every ballot type writes one group of fixed-width fields per (question, option)
//! pair, each group closed by `--`. Ids are 8 upper-case hexadecimal digits and
//! range scores carry an explicit sign followed by 10 digits, so that two records
//! of the same election always have the same length, whatever was chosen.

mod approval;
mod choose;
mod preferential;
mod radio_range;
mod record_common;
mod stv;

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::config::*;

pub use crate::ballot::preferential::{MAX_RANK, UNRANKED};

/// Option id to score, rank or rank position, depending on the ballot type.
pub type QuestionScores = BTreeMap<OptionId, Score>;

/// The free-text comment of a radio-range-comment ballot.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    pub native: String,
    pub en: String,
}

/// A ballot after decoding. It only lives inside the tally pipeline.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DecodedBallot {
    pub votes: BTreeMap<QuestionId, QuestionScores>,
    pub comment: Option<Comment>,
}

impl DecodedBallot {
    pub fn new() -> DecodedBallot {
        DecodedBallot::default()
    }

    /// Adds a question to the ballot. Builder style, mostly for tests and forms.
    pub fn with_question(mut self, question_id: QuestionId, scores: &[(OptionId, Score)]) -> Self {
        self.votes
            .insert(question_id, scores.iter().cloned().collect());
        self
    }

    pub fn with_comment(mut self, native: &str, en: &str) -> Self {
        self.comment = Some(Comment {
            native: native.to_string(),
            en: en.to_string(),
        });
        self
    }
}

/// The ballot does not describe a valid submission for this election.
#[derive(Debug, Snafu, Eq, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum EncodeError {
    #[snafu(display("no answer for question {question_id}"))]
    MissingQuestion { question_id: QuestionId },
    #[snafu(display("question {question_id} is not part of this election"))]
    UnexpectedQuestion { question_id: QuestionId },
    #[snafu(display("question {question_id}: no answer for option {option_id}"))]
    MissingOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[snafu(display("question {question_id}: option {option_id} does not exist"))]
    UnexpectedOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[snafu(display("question {question_id}: approval of option {option_id} must be 0 or 1, got {score}"))]
    InvalidApproval {
        question_id: QuestionId,
        option_id: OptionId,
        score: Score,
    },
    #[snafu(display("question {question_id}: nothing was selected"))]
    NoSelection { question_id: QuestionId },
    #[snafu(display("question {question_id}: more than one option was selected"))]
    MultipleSelections { question_id: QuestionId },
    #[snafu(display("question {question_id}: option {option_id} has invalid rank {rank}"))]
    InvalidRank {
        question_id: QuestionId,
        option_id: OptionId,
        rank: Score,
    },
    #[snafu(display("question {question_id}: score {score} of option {option_id} is outside [{min}, {max}]"))]
    ScoreOutOfBounds {
        question_id: QuestionId,
        option_id: OptionId,
        score: Score,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id}: candidate {option_id} has position {position}, rankings must be contiguous from 0"))]
    RankGap {
        question_id: QuestionId,
        option_id: OptionId,
        position: Score,
    },
    #[snafu(display("this ballot type requires a comment"))]
    MissingComment,
    #[snafu(display("this ballot type does not carry a comment"))]
    UnexpectedComment,
}

/// The record is not a well-formed record of this election's ballot type.
#[derive(Debug, Snafu, Eq, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("malformed field group at offset {offset}"))]
    MalformedGroup { offset: usize },
    #[snafu(display("question {question_id}, option {option_id} appears twice (offset {offset})"))]
    DuplicateGroup {
        question_id: QuestionId,
        option_id: OptionId,
        offset: usize,
    },
    #[snafu(display("question {question_id}: expected {expected} field groups, found {found}"))]
    GroupCountMismatch {
        question_id: QuestionId,
        expected: usize,
        found: usize,
    },
    #[snafu(display("unknown question {question_id} at offset {offset}"))]
    UnknownQuestion {
        question_id: QuestionId,
        offset: usize,
    },
    #[snafu(display("unknown option {option_id} of question {question_id} at offset {offset}"))]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
        offset: usize,
    },
    #[snafu(display("question {question_id}: score {score} of option {option_id} is outside [{min}, {max}]"))]
    ScoreOutOfRange {
        question_id: QuestionId,
        option_id: OptionId,
        score: Score,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id}: rank {rank} of option {option_id} is not valid"))]
    RankOutOfRange {
        question_id: QuestionId,
        option_id: OptionId,
        rank: Score,
    },
    #[snafu(display("question {question_id}: candidate {option_id} is at position {found}, expected {expected}"))]
    PositionMismatch {
        question_id: QuestionId,
        option_id: OptionId,
        expected: Score,
        found: Score,
    },
    #[snafu(display("malformed comment at offset {offset}"))]
    MalformedComment { offset: usize },
    #[snafu(display("unexpected data after the end of the record at offset {offset}"))]
    TrailingData { offset: usize },
}

/// Encoder and decoder for the records of one election.
///
/// The codec keeps its own copy of the questions: the order of questions and options
/// decides the order of the groups, and range questions need their bounds while
/// decoding.
#[derive(Debug, Clone)]
pub struct BallotCodec {
    ballot_type: BallotType,
    questions: Vec<Question>,
    bounds: HashMap<QuestionId, (Score, Score)>,
}

impl BallotCodec {
    pub fn new(election: &Election) -> Result<BallotCodec, ConfigError> {
        election.validate()?;
        let mut bounds: HashMap<QuestionId, (Score, Score)> = HashMap::new();
        if election.ballot_type.is_range() {
            for q in election.questions.iter() {
                bounds.insert(q.id, q.score_range()?);
            }
        }
        debug!(
            "BallotCodec::new: election {} ballot type {} with {} questions",
            election.id,
            election.ballot_type,
            election.questions.len()
        );
        Ok(BallotCodec {
            ballot_type: election.ballot_type,
            questions: election.questions.clone(),
            bounds,
        })
    }

    pub fn ballot_type(&self) -> BallotType {
        self.ballot_type
    }

    pub(crate) fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub(crate) fn bounds(&self, question_id: QuestionId) -> Option<(Score, Score)> {
        self.bounds.get(&question_id).cloned()
    }

    /// Serializes a ballot. Identical ballots always give identical records.
    pub fn encode(&self, ballot: &DecodedBallot) -> Result<String, EncodeError> {
        record_common::check_known_questions(&self.questions, ballot)?;
        match self.ballot_type {
            BallotType::Approval => approval::encode_approval(self, ballot),
            BallotType::Choose => choose::encode_choose(self, ballot),
            BallotType::Preferential => preferential::encode_preferential(self, ballot),
            BallotType::RadioRange => radio_range::encode_radio_range(self, ballot, false),
            BallotType::RadioRangeComment => radio_range::encode_radio_range(self, ballot, true),
            BallotType::Stv => stv::encode_stv(self, ballot),
        }
    }

    /// Parses a record. Any deviation from the layout is an error, never a partial ballot.
    pub fn decode(&self, record: &str) -> Result<DecodedBallot, DecodeError> {
        match self.ballot_type {
            BallotType::Approval => approval::decode_approval(self, record),
            BallotType::Choose => choose::decode_choose(self, record),
            BallotType::Preferential => preferential::decode_preferential(self, record),
            BallotType::RadioRange => radio_range::decode_radio_range(self, record, false),
            BallotType::RadioRangeComment => radio_range::decode_radio_range(self, record, true),
            BallotType::Stv => stv::decode_stv(self, record),
        }
    }

    /// The length shared by every record of this election, when the ballot type
    /// has one. Comments and truncated STV rankings make the length vary.
    pub fn record_len(&self) -> Option<usize> {
        let per_option = |group_len: usize| -> usize {
            self.questions
                .iter()
                .map(|q| q.options.len() * group_len)
                .sum()
        };
        match self.ballot_type {
            BallotType::Approval => Some(per_option(approval::GROUP_LEN)),
            BallotType::Choose => Some(self.questions.len() * choose::GROUP_LEN),
            BallotType::Preferential => Some(per_option(preferential::GROUP_LEN)),
            BallotType::RadioRange => Some(per_option(radio_range::GROUP_LEN)),
            BallotType::RadioRangeComment | BallotType::Stv => None,
        }
    }
}
