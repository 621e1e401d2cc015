/*!
Ballot records and tallies for poll-style elections.

An election is a set of questions, each with options. Voters' choices are
stored as fixed-width text records (see [`BallotCodec`]) and tallied per
question with one of four methods: plurality, histogram range, Schulze or Meek
STV. The wire format and the counting rules are described in the [`manual`].

```
use poll_tally::*;

let election = Election {
    id: 1,
    ballot_type: BallotType::Approval,
    tally_type: TallyType::Plurality,
    questions: vec![Question::new(
        1,
        vec![
            PollOption { id: 1, text: "Tea".to_string() },
            PollOption { id: 2, text: "Coffee".to_string() },
        ],
    )],
};
let codec = BallotCodec::new(&election).unwrap();
let record = codec
    .encode(&DecodedBallot::new().with_question(1, &[(1, 1), (2, 0)]))
    .unwrap();
assert_eq!(record, "Q00000001-A00000001-y--Q00000001-A00000002-n--");

let result = tally_records(&election, vec![record]).unwrap();
assert_eq!(result.ballots, 1);
```
*/

mod ballot;
mod config;
mod election;
pub mod manual;
mod results;
mod tally;

#[cfg(test)]
mod testing;

pub use crate::ballot::{
    BallotCodec, Comment, DecodeError, DecodedBallot, EncodeError, QuestionScores, MAX_RANK,
    UNRANKED,
};
pub use crate::config::*;
pub use crate::election::{tally_records, ElectionTallier};
pub use crate::results::*;
pub use crate::tally::{
    droop_quota, reduced_keep_factor, QuestionTallier, TallyError, MAX_ROUNDS, QUOTA_EPSILON,
};
