// Fixtures shared by the unit tests.

use crate::config::*;

pub(crate) fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn question(id: QuestionId, option_ids: &[OptionId]) -> Question {
    Question::new(
        id,
        option_ids
            .iter()
            .map(|oid| PollOption {
                id: *oid,
                text: format!("Option {}", oid),
            })
            .collect(),
    )
}

pub(crate) fn election(
    ballot_type: BallotType,
    tally_type: TallyType,
    questions: Vec<Question>,
) -> Election {
    Election {
        id: 1,
        ballot_type,
        tally_type,
        questions,
    }
}
