// Range ballots: Q{qid}-A{oid}-{score:+011}--, optionally followed by a comment
// written as /{len}/{native}--/{len}/{en}.

use snafu::{ensure, OptionExt};

use crate::ballot::record_common::*;
use crate::ballot::*;

pub(crate) const GROUP_LEN: usize = 33;

pub(crate) fn encode_radio_range(
    codec: &BallotCodec,
    ballot: &DecodedBallot,
    with_comment: bool,
) -> Result<String, EncodeError> {
    let mut record = String::new();
    for q in codec.questions() {
        let scores = question_scores(q, ballot)?;
        // Bounds exist for every question: the codec checked them at construction.
        let (min, max) = codec.bounds(q.id).unwrap_or((0, 0));
        for option_id in q.option_ids() {
            let score = option_score(q, scores, option_id)?;
            ensure!(
                score >= min && score <= max,
                ScoreOutOfBoundsSnafu {
                    question_id: q.id,
                    option_id,
                    score,
                    min,
                    max
                }
            );
            record.push_str(&format!(
                "{}-{}-{:+011}{}",
                format_id("Q", q.id),
                format_id("A", option_id),
                score,
                GROUP_END
            ));
        }
    }
    if with_comment {
        let comment = ballot.comment.as_ref().context(MissingCommentSnafu)?;
        record.push_str(&format_length_prefixed(&comment.native));
        record.push_str(GROUP_END);
        record.push_str(&format_length_prefixed(&comment.en));
    } else {
        check_no_comment(ballot)?;
    }
    Ok(record)
}

pub(crate) fn decode_radio_range(
    codec: &BallotCodec,
    record: &str,
    with_comment: bool,
) -> Result<DecodedBallot, DecodeError> {
    let mut reader = RecordReader::new(record);
    let mut ballot = DecodedBallot::new();
    loop {
        if reader.at_end() || (with_comment && reader.starts_with("/")) {
            break;
        }
        let offset = reader.offset();
        let (question_id, option_id, score) =
            read_group(&mut reader).context(MalformedGroupSnafu { offset })?;
        // The bounds depend on the question named in the group.
        let (min, max) = codec.bounds(question_id).context(UnknownQuestionSnafu {
            question_id,
            offset,
        })?;
        let known_option = codec
            .questions()
            .iter()
            .any(|q| q.id == question_id && q.has_option(option_id));
        ensure!(
            known_option,
            UnknownOptionSnafu {
                question_id,
                option_id,
                offset
            }
        );
        ensure!(
            score >= min && score <= max,
            ScoreOutOfRangeSnafu {
                question_id,
                option_id,
                score,
                min,
                max
            }
        );
        insert_score(&mut ballot, question_id, option_id, score, offset)?;
    }
    check_group_counts(codec.questions(), &ballot, |q| q.options.len())?;

    if with_comment {
        let offset = reader.offset();
        let native = reader
            .length_prefixed()
            .context(MalformedCommentSnafu { offset })?;
        reader
            .literal(GROUP_END)
            .context(MalformedCommentSnafu { offset })?;
        let en = reader
            .length_prefixed()
            .context(MalformedCommentSnafu { offset })?;
        ensure!(
            reader.at_end(),
            TrailingDataSnafu {
                offset: reader.offset()
            }
        );
        ballot.comment = Some(Comment {
            native: native.to_string(),
            en: en.to_string(),
        });
    }
    Ok(ballot)
}

fn read_group(reader: &mut RecordReader) -> Option<(QuestionId, OptionId, Score)> {
    reader.literal("Q")?;
    let question_id = reader.hex_id()?;
    reader.literal("-A")?;
    let option_id = reader.hex_id()?;
    reader.literal("-")?;
    let score = reader.signed_score()?;
    reader.literal(GROUP_END)?;
    Some((question_id, option_id, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn range_election(ballot_type: BallotType) -> Election {
        election(
            ballot_type,
            TallyType::HistogramRange,
            vec![
                question(1, &[1, 2]).with_score_range(-2, 2),
                question(2, &[3]).with_score_range(0, 10),
            ],
        )
    }

    fn codec() -> BallotCodec {
        BallotCodec::new(&range_election(BallotType::RadioRange)).unwrap()
    }

    fn comment_codec() -> BallotCodec {
        BallotCodec::new(&range_election(BallotType::RadioRangeComment)).unwrap()
    }

    #[test]
    fn signed_fixed_width_scores() {
        let ballot = DecodedBallot::new()
            .with_question(1, &[(1, -2), (2, 0)])
            .with_question(2, &[(3, 10)]);
        let record = codec().encode(&ballot).unwrap();
        assert_eq!(
            record,
            "Q00000001-A00000001--0000000002--Q00000001-A00000002-+0000000000--Q00000002-A00000003-+0000000010--"
        );
        assert_eq!(codec().record_len(), Some(record.len()));
        assert_eq!(codec().decode(&record).unwrap(), ballot);
    }

    #[test]
    fn bounds_are_checked_per_question() {
        // 3 is fine for question 2 but not for question 1.
        let record = "Q00000001-A00000001-+0000000003--Q00000001-A00000002-+0000000000--Q00000002-A00000003-+0000000003--";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::ScoreOutOfRange {
                question_id: 1,
                option_id: 1,
                score: 3,
                min: -2,
                max: 2
            })
        );
        let ballot = DecodedBallot::new()
            .with_question(1, &[(1, 0), (2, 0)])
            .with_question(2, &[(3, 11)]);
        assert!(matches!(
            codec().encode(&ballot),
            Err(EncodeError::ScoreOutOfBounds { score: 11, .. })
        ));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let record = "Q00000009-A00000001-+0000000000--";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::UnknownQuestion {
                question_id: 9,
                offset: 0
            })
        );
        let record = "Q00000001-A00000001-+0000000000--Q00000001-A00000003-+0000000000--";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::UnknownOption {
                question_id: 1,
                option_id: 3,
                offset: 33
            })
        );
    }

    #[test]
    fn zero_has_a_single_spelling() {
        let record = "Q00000001-A00000001--0000000000--Q00000001-A00000002-+0000000000--Q00000002-A00000003-+0000000000--";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::MalformedGroup { offset: 0 })
        );
        let canonical = record.replacen("--0000000000", "-+0000000000", 1);
        assert!(codec().decode(&canonical).is_ok());
    }

    #[test]
    fn comments_follow_the_groups() {
        let ballot = DecodedBallot::new()
            .with_question(1, &[(1, 1), (2, -1)])
            .with_question(2, &[(3, 5)])
            .with_comment("très bien--/3/x", "fine");
        let record = comment_codec().encode(&ballot).unwrap();
        assert!(record.ends_with("--/16/très bien--/3/x--/4/fine"));
        assert_eq!(comment_codec().decode(&record).unwrap(), ballot);
        assert_eq!(comment_codec().record_len(), None);

        let empty = DecodedBallot::new()
            .with_question(1, &[(1, 1), (2, -1)])
            .with_question(2, &[(3, 5)])
            .with_comment("", "");
        let record = comment_codec().encode(&empty).unwrap();
        assert!(record.ends_with("--/0/--/0/"));
        assert_eq!(comment_codec().decode(&record).unwrap(), empty);
    }

    #[test]
    fn malformed_comments_are_rejected() {
        let groups = "Q00000001-A00000001-+0000000001--Q00000001-A00000002-+0000000001--Q00000002-A00000003-+0000000001--";
        let missing = groups.to_string();
        assert_eq!(
            comment_codec().decode(&missing),
            Err(DecodeError::MalformedComment { offset: 99 })
        );
        let too_short = format!("{}/10/abc--/0/", groups);
        assert!(comment_codec().decode(&too_short).is_err());
        let trailing = format!("{}/1/a--/1/bc", groups);
        assert_eq!(
            comment_codec().decode(&trailing),
            Err(DecodeError::TrailingData { offset: 109 })
        );
        // A plain range ballot does not accept a comment.
        let with_comment = format!("{}/1/a--/1/b", groups);
        assert_eq!(
            codec().decode(&with_comment),
            Err(DecodeError::MalformedGroup { offset: 99 })
        );
    }

    #[test]
    fn comment_presence_follows_the_ballot_type() {
        let ballot = DecodedBallot::new()
            .with_question(1, &[(1, 1), (2, -1)])
            .with_question(2, &[(3, 5)]);
        assert_eq!(
            comment_codec().encode(&ballot),
            Err(EncodeError::MissingComment)
        );
        assert_eq!(
            codec().encode(&ballot.with_comment("a", "b")),
            Err(EncodeError::UnexpectedComment)
        );
    }
}
