// Approval ballots: Q{qid}-A{oid}-{y|n}--

use snafu::{ensure, OptionExt};

use crate::ballot::record_common::*;
use crate::ballot::*;

pub(crate) const GROUP_LEN: usize = 23;

pub(crate) fn encode_approval(
    codec: &BallotCodec,
    ballot: &DecodedBallot,
) -> Result<String, EncodeError> {
    check_no_comment(ballot)?;
    let mut record = String::new();
    for q in codec.questions() {
        let scores = question_scores(q, ballot)?;
        for option_id in q.option_ids() {
            let score = option_score(q, scores, option_id)?;
            ensure!(
                score == 0 || score == 1,
                InvalidApprovalSnafu {
                    question_id: q.id,
                    option_id,
                    score
                }
            );
            record.push_str(&format!(
                "{}-{}-{}{}",
                format_id("Q", q.id),
                format_id("A", option_id),
                if score == 1 { "y" } else { "n" },
                GROUP_END
            ));
        }
    }
    Ok(record)
}

pub(crate) fn decode_approval(
    codec: &BallotCodec,
    record: &str,
) -> Result<DecodedBallot, DecodeError> {
    let mut reader = RecordReader::new(record);
    let mut ballot = DecodedBallot::new();
    while !reader.at_end() {
        let offset = reader.offset();
        let (question_id, option_id, approved) =
            read_group(&mut reader).context(MalformedGroupSnafu { offset })?;
        insert_score(
            &mut ballot,
            question_id,
            option_id,
            if approved { 1 } else { 0 },
            offset,
        )?;
    }
    check_group_counts(codec.questions(), &ballot, |q| q.options.len())?;
    Ok(ballot)
}

fn read_group(reader: &mut RecordReader) -> Option<(QuestionId, OptionId, bool)> {
    reader.literal("Q")?;
    let question_id = reader.hex_id()?;
    reader.literal("-A")?;
    let option_id = reader.hex_id()?;
    reader.literal("-")?;
    let approved = reader.flag()?;
    reader.literal(GROUP_END)?;
    Some((question_id, option_id, approved))
}
