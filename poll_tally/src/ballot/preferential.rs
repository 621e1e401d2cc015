// Preferential ballots: Q{qid}-A{oid}-R{rank}--, the rank in hexadecimal.

use snafu::{ensure, OptionExt};

use crate::ballot::record_common::*;
use crate::ballot::*;

pub(crate) const GROUP_LEN: usize = 31;

/// The highest rank a voter can give.
pub const MAX_RANK: Score = 999;

/// The rank of an option the voter did not rank.
pub const UNRANKED: Score = 1000;

fn is_valid_rank(rank: Score) -> bool {
    (1..=MAX_RANK).contains(&rank) || rank == UNRANKED
}

pub(crate) fn encode_preferential(
    codec: &BallotCodec,
    ballot: &DecodedBallot,
) -> Result<String, EncodeError> {
    check_no_comment(ballot)?;
    let mut record = String::new();
    for q in codec.questions() {
        let scores = question_scores(q, ballot)?;
        for option_id in q.option_ids() {
            let rank = option_score(q, scores, option_id)?;
            ensure!(
                is_valid_rank(rank),
                InvalidRankSnafu {
                    question_id: q.id,
                    option_id,
                    rank
                }
            );
            record.push_str(&format!(
                "{}-{}-{}{}",
                format_id("Q", q.id),
                format_id("A", option_id),
                format_id("R", rank as u32),
                GROUP_END
            ));
        }
    }
    Ok(record)
}

pub(crate) fn decode_preferential(
    codec: &BallotCodec,
    record: &str,
) -> Result<DecodedBallot, DecodeError> {
    let mut reader = RecordReader::new(record);
    let mut ballot = DecodedBallot::new();
    while !reader.at_end() {
        let offset = reader.offset();
        let (question_id, option_id, rank) =
            read_group(&mut reader).context(MalformedGroupSnafu { offset })?;
        let rank = Score::from(rank);
        ensure!(
            is_valid_rank(rank),
            RankOutOfRangeSnafu {
                question_id,
                option_id,
                rank
            }
        );
        insert_score(&mut ballot, question_id, option_id, rank, offset)?;
    }
    check_group_counts(codec.questions(), &ballot, |q| q.options.len())?;
    Ok(ballot)
}

fn read_group(reader: &mut RecordReader) -> Option<(QuestionId, OptionId, u32)> {
    reader.literal("Q")?;
    let question_id = reader.hex_id()?;
    reader.literal("-A")?;
    let option_id = reader.hex_id()?;
    reader.literal("-R")?;
    let rank = reader.hex_id()?;
    reader.literal(GROUP_END)?;
    Some((question_id, option_id, rank))
}
