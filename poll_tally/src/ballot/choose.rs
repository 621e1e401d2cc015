// Choose-one ballots: Q{qid}-A{oid}--, a single group per question.

use snafu::{ensure, OptionExt};

use crate::ballot::record_common::*;
use crate::ballot::*;

pub(crate) const GROUP_LEN: usize = 21;

pub(crate) fn encode_choose(
    codec: &BallotCodec,
    ballot: &DecodedBallot,
) -> Result<String, EncodeError> {
    check_no_comment(ballot)?;
    let mut record = String::new();
    for q in codec.questions() {
        let scores = question_scores(q, ballot)?;
        // Unselected options may be listed with a zero score.
        let selected: Vec<OptionId> = scores
            .iter()
            .filter(|(_, score)| **score != 0)
            .map(|(oid, _)| *oid)
            .collect();
        let option_id = match selected.as_slice() {
            [] => return NoSelectionSnafu { question_id: q.id }.fail(),
            [option_id] => *option_id,
            _ => return MultipleSelectionsSnafu { question_id: q.id }.fail(),
        };
        let score = scores.get(&option_id).cloned().unwrap_or(0);
        ensure!(
            score == 1,
            InvalidApprovalSnafu {
                question_id: q.id,
                option_id,
                score
            }
        );
        record.push_str(&format!(
            "{}-{}{}",
            format_id("Q", q.id),
            format_id("A", option_id),
            GROUP_END
        ));
    }
    Ok(record)
}

pub(crate) fn decode_choose(
    codec: &BallotCodec,
    record: &str,
) -> Result<DecodedBallot, DecodeError> {
    let mut reader = RecordReader::new(record);
    let mut ballot = DecodedBallot::new();
    while !reader.at_end() {
        let offset = reader.offset();
        let (question_id, option_id) =
            read_group(&mut reader).context(MalformedGroupSnafu { offset })?;
        insert_score(&mut ballot, question_id, option_id, 1, offset)?;
    }
    check_group_counts(codec.questions(), &ballot, |_| 1)?;
    Ok(ballot)
}

fn read_group(reader: &mut RecordReader) -> Option<(QuestionId, OptionId)> {
    reader.literal("Q")?;
    let question_id = reader.hex_id()?;
    reader.literal("-A")?;
    let option_id = reader.hex_id()?;
    reader.literal(GROUP_END)?;
    Some((question_id, option_id))
}
