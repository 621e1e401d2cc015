// ********* Election definitions ***********

use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, Snafu};

pub type QuestionId = u32;
pub type OptionId = u32;
pub type Score = i64;

/// The largest magnitude a range score may have: the wire format keeps ten digits.
pub const MAX_SCORE_MAGNITUDE: Score = 9_999_999_999;

/// Histograms keep one bucket per admissible score.
pub const MAX_HISTOGRAM_SPAN: Score = 10_000;

/// The ballot form used by an election. It decides the record layout.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallotType {
    /// One yes/no flag per option.
    Approval,
    /// Exactly one option per question.
    Choose,
    /// A rank per option, 1 being the favourite. 1000 means unranked.
    Preferential,
    /// A bounded integer score per option.
    RadioRange,
    /// Like `RadioRange`, with a free-text comment in two languages.
    RadioRangeComment,
    /// An ordered, possibly truncated, list of candidates.
    Stv,
}

impl BallotType {
    pub const ALL: [BallotType; 6] = [
        BallotType::Approval,
        BallotType::Choose,
        BallotType::Preferential,
        BallotType::RadioRange,
        BallotType::RadioRangeComment,
        BallotType::Stv,
    ];

    /// The tally types that can consume the ballots of this type.
    pub fn tally_types(&self) -> &'static [TallyType] {
        match self {
            BallotType::Approval | BallotType::Choose => &[TallyType::Plurality],
            BallotType::Preferential => &[TallyType::Schulze],
            BallotType::RadioRange | BallotType::RadioRangeComment => {
                &[TallyType::Plurality, TallyType::HistogramRange]
            }
            BallotType::Stv => &[TallyType::Stv],
        }
    }

    pub fn supports(&self, tally_type: TallyType) -> bool {
        self.tally_types().contains(&tally_type)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BallotType::Approval => "approval",
            BallotType::Choose => "choose",
            BallotType::Preferential => "preferential",
            BallotType::RadioRange => "radio-range",
            BallotType::RadioRangeComment => "radio-range-comment",
            BallotType::Stv => "stv",
        }
    }

    pub fn from_name(name: &str) -> Option<BallotType> {
        BallotType::ALL.iter().find(|bt| bt.name() == name).copied()
    }

    pub(crate) fn is_range(&self) -> bool {
        matches!(self, BallotType::RadioRange | BallotType::RadioRangeComment)
    }
}

impl Display for BallotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The counting method applied to every question of an election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TallyType {
    Plurality,
    HistogramRange,
    Schulze,
    Stv,
}

impl TallyType {
    pub const ALL: [TallyType; 4] = [
        TallyType::Plurality,
        TallyType::HistogramRange,
        TallyType::Schulze,
        TallyType::Stv,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TallyType::Plurality => "plurality",
            TallyType::HistogramRange => "histogram-range",
            TallyType::Schulze => "schulze",
            TallyType::Stv => "stv",
        }
    }

    pub fn from_name(name: &str) -> Option<TallyType> {
        TallyType::ALL.iter().find(|tt| tt.name() == name).copied()
    }
}

impl Display for TallyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    /// Display text. Never interpreted by the codec or the talliers.
    pub text: String,
}

/// Settings that only some ballot and tally types look at.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionProperties {
    pub min_score: Option<Score>,
    pub max_score: Option<Score>,
    pub seats: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub properties: QuestionProperties,
}

impl Question {
    pub fn new(id: QuestionId, options: Vec<PollOption>) -> Question {
        Question {
            id,
            options,
            properties: QuestionProperties::default(),
        }
    }

    pub fn with_score_range(mut self, min_score: Score, max_score: Score) -> Question {
        self.properties.min_score = Some(min_score);
        self.properties.max_score = Some(max_score);
        self
    }

    pub fn with_seats(mut self, seats: u32) -> Question {
        self.properties.seats = Some(seats);
        self
    }

    pub fn option_ids(&self) -> impl Iterator<Item = OptionId> + '_ {
        self.options.iter().map(|o| o.id)
    }

    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn option_text(&self, option_id: OptionId) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.id == option_id)
            .map(|o| o.text.as_str())
    }

    /// The validated `[min, max]` bounds of a range question.
    pub fn score_range(&self) -> Result<(Score, Score), ConfigError> {
        let min = self
            .properties
            .min_score
            .context(MissingScoreBoundsSnafu { question_id: self.id })?;
        let max = self
            .properties
            .max_score
            .context(MissingScoreBoundsSnafu { question_id: self.id })?;
        ensure!(
            max > min,
            InvalidScoreBoundsSnafu {
                question_id: self.id,
                min,
                max
            }
        );
        ensure!(
            min >= -MAX_SCORE_MAGNITUDE && max <= MAX_SCORE_MAGNITUDE,
            ScoreBoundsTooWideSnafu {
                question_id: self.id,
                min,
                max
            }
        );
        Ok((min, max))
    }

    /// The validated seat count of an STV question.
    pub fn seats(&self) -> Result<u32, ConfigError> {
        let seats = self
            .properties
            .seats
            .context(MissingSeatsSnafu { question_id: self.id })?;
        ensure!(seats > 0, NoSeatsSnafu { question_id: self.id });
        Ok(seats)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    pub id: u32,
    pub ballot_type: BallotType,
    pub tally_type: TallyType,
    pub questions: Vec<Question>,
}

impl Election {
    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Checks everything that can be checked before the first vote is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.ballot_type.supports(self.tally_type),
            IncompatibleTallyTypeSnafu {
                ballot_type: self.ballot_type,
                tally_type: self.tally_type
            }
        );
        ensure!(
            !self.questions.is_empty(),
            NoQuestionsSnafu {
                election_id: self.id
            }
        );
        let mut seen_questions: HashSet<QuestionId> = HashSet::new();
        for q in self.questions.iter() {
            ensure!(
                seen_questions.insert(q.id),
                DuplicateQuestionSnafu { question_id: q.id }
            );
            ensure!(
                !q.options.is_empty(),
                NoOptionsSnafu { question_id: q.id }
            );
            let mut seen_options: HashSet<OptionId> = HashSet::new();
            for o in q.options.iter() {
                ensure!(
                    seen_options.insert(o.id),
                    DuplicateOptionSnafu {
                        question_id: q.id,
                        option_id: o.id
                    }
                );
            }
            if self.ballot_type.is_range() {
                q.score_range()?;
            }
            if self.tally_type == TallyType::HistogramRange {
                let (min, max) = q.score_range()?;
                ensure!(
                    max - min <= MAX_HISTOGRAM_SPAN,
                    HistogramTooWideSnafu {
                        question_id: q.id,
                        min,
                        max
                    }
                );
            }
            if self.tally_type == TallyType::Stv {
                q.seats()?;
            }
        }
        Ok(())
    }
}

/// Errors in an election definition. They are reported before any vote is processed.
#[derive(Debug, Snafu, Eq, PartialEq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("ballot type {ballot_type} cannot be tallied with {tally_type}"))]
    IncompatibleTallyType {
        ballot_type: BallotType,
        tally_type: TallyType,
    },
    #[snafu(display("election {election_id} has no questions"))]
    NoQuestions { election_id: u32 },
    #[snafu(display("question {question_id} appears more than once"))]
    DuplicateQuestion { question_id: QuestionId },
    #[snafu(display("question {question_id} has no options"))]
    NoOptions { question_id: QuestionId },
    #[snafu(display("option {option_id} appears more than once in question {question_id}"))]
    DuplicateOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[snafu(display("question {question_id} needs both a minimum and a maximum score"))]
    MissingScoreBounds { question_id: QuestionId },
    #[snafu(display("question {question_id}: maximum score {max} must be above minimum {min}"))]
    InvalidScoreBounds {
        question_id: QuestionId,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id}: scores [{min}, {max}] do not fit in ten digits"))]
    ScoreBoundsTooWide {
        question_id: QuestionId,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id}: histogram over [{min}, {max}] is too wide"))]
    HistogramTooWide {
        question_id: QuestionId,
        min: Score,
        max: Score,
    },
    #[snafu(display("question {question_id} needs a seat count"))]
    MissingSeats { question_id: QuestionId },
    #[snafu(display("question {question_id} must have at least one seat"))]
    NoSeats { question_id: QuestionId },
}
