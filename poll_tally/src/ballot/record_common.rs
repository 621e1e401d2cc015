// Field primitives shared by all the record layouts.

use snafu::{ensure, OptionExt};

use crate::ballot::*;

pub(crate) const GROUP_END: &str = "--";

/// A cursor over a record. Every read either consumes a complete field or
/// nothing useful: callers abandon the record on the first `None`.
pub(crate) struct RecordReader<'a> {
    record: &'a str,
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(record: &'a str) -> RecordReader<'a> {
        RecordReader { record, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn at_end(&self) -> bool {
        self.offset >= self.record.len()
    }

    fn rest(&self) -> &'a str {
        self.record.get(self.offset..).unwrap_or("")
    }

    pub(crate) fn starts_with(&self, lit: &str) -> bool {
        self.rest().starts_with(lit)
    }

    pub(crate) fn literal(&mut self, lit: &str) -> Option<()> {
        if self.starts_with(lit) {
            self.offset += lit.len();
            Some(())
        } else {
            None
        }
    }

    /// Exactly `len` bytes, as long as they fall on character boundaries.
    fn take(&mut self, len: usize) -> Option<&'a str> {
        let end = self.offset.checked_add(len)?;
        let field = self.record.get(self.offset..end)?;
        self.offset = end;
        Some(field)
    }

    /// 8 upper-case hexadecimal digits.
    pub(crate) fn hex_id(&mut self) -> Option<u32> {
        let field = self.rest().get(..8)?;
        if !field
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        {
            return None;
        }
        let id = u32::from_str_radix(field, 16).ok()?;
        self.offset += 8;
        Some(id)
    }

    /// An explicit sign followed by 10 decimal digits. Zero is always written `+`.
    pub(crate) fn signed_score(&mut self) -> Option<Score> {
        let field = self.rest().get(..11)?;
        let negative = match field.as_bytes().first()? {
            b'+' => false,
            b'-' => true,
            _ => return None,
        };
        let digits = field.get(1..)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let magnitude: Score = digits.parse().ok()?;
        if negative && magnitude == 0 {
            return None;
        }
        self.offset += 11;
        Some(if negative { -magnitude } else { magnitude })
    }

    /// `y` or `n`.
    pub(crate) fn flag(&mut self) -> Option<bool> {
        if self.literal("y").is_some() {
            Some(true)
        } else if self.literal("n").is_some() {
            Some(false)
        } else {
            None
        }
    }

    /// `/`, an ASCII decimal byte count, `/`, then exactly that many bytes.
    pub(crate) fn length_prefixed(&mut self) -> Option<&'a str> {
        self.literal("/")?;
        let end = self.rest().find('/')?;
        let digits = self.take(end)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let len: usize = digits.parse().ok()?;
        self.literal("/")?;
        self.take(len)
    }
}

pub(crate) fn format_id(prefix: &str, id: u32) -> String {
    format!("{}{:08X}", prefix, id)
}

pub(crate) fn format_length_prefixed(text: &str) -> String {
    format!("/{}/{}", text.len(), text)
}

/// Records a decoded score, refusing a second group for the same pair.
pub(crate) fn insert_score(
    ballot: &mut DecodedBallot,
    question_id: QuestionId,
    option_id: OptionId,
    score: Score,
    offset: usize,
) -> Result<(), DecodeError> {
    let scores = ballot.votes.entry(question_id).or_default();
    ensure!(
        !scores.contains_key(&option_id),
        DuplicateGroupSnafu {
            question_id,
            option_id,
            offset
        }
    );
    scores.insert(option_id, score);
    Ok(())
}

/// Every question of the election must come with the expected number of groups.
/// This is what catches a record cut at a group boundary.
pub(crate) fn check_group_counts(
    questions: &[Question],
    ballot: &DecodedBallot,
    expected_groups: impl Fn(&Question) -> usize,
) -> Result<(), DecodeError> {
    for q in questions.iter() {
        let found = ballot.votes.get(&q.id).map_or(0, |s| s.len());
        let expected = expected_groups(q);
        ensure!(
            found == expected,
            GroupCountMismatchSnafu {
                question_id: q.id,
                expected,
                found
            }
        );
    }
    Ok(())
}

pub(crate) fn check_known_questions(
    questions: &[Question],
    ballot: &DecodedBallot,
) -> Result<(), EncodeError> {
    for question_id in ballot.votes.keys() {
        ensure!(
            questions.iter().any(|q| q.id == *question_id),
            UnexpectedQuestionSnafu {
                question_id: *question_id
            }
        );
    }
    Ok(())
}

/// The answers to a question, with every answered option checked against the question.
pub(crate) fn question_scores<'b>(
    question: &Question,
    ballot: &'b DecodedBallot,
) -> Result<&'b QuestionScores, EncodeError> {
    let scores = ballot.votes.get(&question.id).context(MissingQuestionSnafu {
        question_id: question.id,
    })?;
    for option_id in scores.keys() {
        ensure!(
            question.has_option(*option_id),
            UnexpectedOptionSnafu {
                question_id: question.id,
                option_id: *option_id
            }
        );
    }
    Ok(scores)
}

/// The score of an option on a ballot that must score every option.
pub(crate) fn option_score(
    question: &Question,
    scores: &QuestionScores,
    option_id: OptionId,
) -> Result<Score, EncodeError> {
    scores
        .get(&option_id)
        .cloned()
        .context(MissingOptionSnafu {
            question_id: question.id,
            option_id,
        })
}

pub(crate) fn check_no_comment(ballot: &DecodedBallot) -> Result<(), EncodeError> {
    ensure!(ballot.comment.is_none(), UnexpectedCommentSnafu);
    Ok(())
}
