// STV ballots: Q{qid}-C{cid}-R{position}--, one group per ranked candidate, in order.
// Candidates left unranked are simply absent.

use snafu::{ensure, OptionExt};

use crate::ballot::record_common::*;
use crate::ballot::*;

pub(crate) fn encode_stv(
    codec: &BallotCodec,
    ballot: &DecodedBallot,
) -> Result<String, EncodeError> {
    check_no_comment(ballot)?;
    let mut record = String::new();
    for q in codec.questions() {
        let scores = question_scores(q, ballot)?;
        let mut ranking: Vec<(Score, OptionId)> =
            scores.iter().map(|(oid, pos)| (*pos, *oid)).collect();
        ranking.sort();
        for (idx, (position, option_id)) in ranking.iter().enumerate() {
            ensure!(
                *position == idx as Score,
                RankGapSnafu {
                    question_id: q.id,
                    option_id: *option_id,
                    position: *position
                }
            );
            record.push_str(&format!(
                "{}-{}-{}{}",
                format_id("Q", q.id),
                format_id("C", *option_id),
                format_id("R", idx as u32),
                GROUP_END
            ));
        }
    }
    Ok(record)
}

pub(crate) fn decode_stv(codec: &BallotCodec, record: &str) -> Result<DecodedBallot, DecodeError> {
    let mut reader = RecordReader::new(record);
    let mut ballot = DecodedBallot::new();
    // An empty ranking is a valid ballot: every question gets an entry.
    for q in codec.questions() {
        ballot.votes.insert(q.id, QuestionScores::new());
    }
    while !reader.at_end() {
        let offset = reader.offset();
        let (question_id, option_id, position) =
            read_group(&mut reader).context(MalformedGroupSnafu { offset })?;
        let expected = ballot.votes.get(&question_id).map_or(0, |s| s.len()) as Score;
        let found = Score::from(position);
        if found != expected {
            // A repeated candidate is reported as such rather than as a position error.
            let repeated = ballot
                .votes
                .get(&question_id)
                .map_or(false, |s| s.contains_key(&option_id));
            ensure!(
                !repeated,
                DuplicateGroupSnafu {
                    question_id,
                    option_id,
                    offset
                }
            );
            return PositionMismatchSnafu {
                question_id,
                option_id,
                expected,
                found,
            }
            .fail();
        }
        insert_score(&mut ballot, question_id, option_id, found, offset)?;
    }
    Ok(ballot)
}

fn read_group(reader: &mut RecordReader) -> Option<(QuestionId, OptionId, u32)> {
    reader.literal("Q")?;
    let question_id = reader.hex_id()?;
    reader.literal("-C")?;
    let candidate_id = reader.hex_id()?;
    reader.literal("-R")?;
    let position = reader.hex_id()?;
    reader.literal(GROUP_END)?;
    Some((question_id, candidate_id, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn codec() -> BallotCodec {
        BallotCodec::new(&election(
            BallotType::Stv,
            TallyType::Stv,
            vec![question(1, &[1, 2, 3, 4]).with_seats(2)],
        ))
        .unwrap()
    }

    #[test]
    fn groups_follow_the_ranking() {
        let ballot = DecodedBallot::new().with_question(1, &[(3, 0), (1, 1)]);
        let record = codec().encode(&ballot).unwrap();
        assert_eq!(
            record,
            "Q00000001-C00000003-R00000000--Q00000001-C00000001-R00000001--"
        );
        assert_eq!(codec().decode(&record).unwrap(), ballot);
    }

    #[test]
    fn empty_ranking() {
        let ballot = DecodedBallot::new().with_question(1, &[]);
        let record = codec().encode(&ballot).unwrap();
        assert_eq!(record, "");
        assert_eq!(codec().decode(&record).unwrap(), ballot);
    }

    #[test]
    fn positions_must_be_contiguous() {
        let ballot = DecodedBallot::new().with_question(1, &[(3, 0), (1, 2)]);
        assert_eq!(
            codec().encode(&ballot),
            Err(EncodeError::RankGap {
                question_id: 1,
                option_id: 1,
                position: 2
            })
        );
        let record = "Q00000001-C00000003-R00000000--Q00000001-C00000001-R00000002--";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::PositionMismatch {
                question_id: 1,
                option_id: 1,
                expected: 1,
                found: 2
            })
        );
        let repeated = "Q00000001-C00000003-R00000000--Q00000001-C00000003-R00000000--";
        assert_eq!(
            codec().decode(repeated),
            Err(DecodeError::DuplicateGroup {
                question_id: 1,
                option_id: 3,
                offset: 31
            })
        );
    }

    #[test]
    fn truncated_group_is_rejected() {
        let record = "Q00000001-C00000003-R00000000--Q00000001-C0000";
        assert_eq!(
            codec().decode(record),
            Err(DecodeError::MalformedGroup { offset: 31 })
        );
    }
}
