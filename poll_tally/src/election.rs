//! Runs a whole election: decodes records and feeds every question's tallier.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use snafu::{OptionExt, ResultExt};

use crate::ballot::{BallotCodec, Comment, DecodedBallot};
use crate::config::*;
use crate::results::*;
use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum RunState {
    Accumulating,
    Finished,
    Aborted,
}

/// Owns the codec and one tallier per question of an election.
///
/// The first error aborts the run: every call after it fails with
/// [`TallyError::RunAborted`], so a partial result can never be produced.
#[derive(Debug, Clone)]
pub struct ElectionTallier {
    election: Election,
    codec: BallotCodec,
    talliers: BTreeMap<QuestionId, QuestionTallier>,
    state: RunState,
    records: u64,
    ballots: u64,
    comments: Vec<Comment>,
}

impl ElectionTallier {
    pub fn new(election: &Election) -> Result<ElectionTallier, ConfigError> {
        let codec = BallotCodec::new(election)?;
        let mut talliers = BTreeMap::new();
        for q in election.questions.iter() {
            talliers.insert(q.id, QuestionTallier::new(q, election.tally_type)?);
        }
        info!(
            "ElectionTallier::new: election {} with {} questions ({} ballots, {} tally)",
            election.id,
            talliers.len(),
            election.ballot_type,
            election.tally_type
        );
        Ok(ElectionTallier {
            election: election.clone(),
            codec,
            talliers,
            state: RunState::Accumulating,
            records: 0,
            ballots: 0,
            comments: Vec::new(),
        })
    }

    pub fn election(&self) -> &Election {
        &self.election
    }

    pub fn codec(&self) -> &BallotCodec {
        &self.codec
    }

    /// The number of ballots accepted so far.
    pub fn ballots(&self) -> u64 {
        self.ballots
    }

    pub fn is_aborted(&self) -> bool {
        self.state == RunState::Aborted
    }

    fn check_accumulating(&self) -> Result<(), TallyError> {
        match self.state {
            RunState::Accumulating => Ok(()),
            RunState::Finished => RunFinishedSnafu.fail(),
            RunState::Aborted => RunAbortedSnafu.fail(),
        }
    }

    fn abort_on_error<T>(&mut self, res: Result<T, TallyError>) -> Result<T, TallyError> {
        if let Err(e) = &res {
            warn!("Aborting the tally of election {}: {}", self.election.id, e);
            self.state = RunState::Aborted;
        }
        res
    }

    /// Decodes one record and counts it.
    pub fn add_record(&mut self, record: &str) -> Result<(), TallyError> {
        self.check_accumulating()?;
        let record_index = self.records;
        self.records += 1;
        let decoded = self
            .codec
            .decode(record)
            .context(MalformedRecordSnafu { record_index });
        let res = decoded.and_then(|ballot| self.distribute(&ballot));
        self.abort_on_error(res)
    }

    /// Counts a ballot that is already decoded.
    pub fn add_ballot(&mut self, ballot: &DecodedBallot) -> Result<(), TallyError> {
        self.check_accumulating()?;
        let res = self.distribute(ballot);
        self.abort_on_error(res)
    }

    fn distribute(&mut self, ballot: &DecodedBallot) -> Result<(), TallyError> {
        // Every answer is checked before the first vote is added.
        for (qid, scores) in ballot.votes.iter() {
            let tallier = self
                .talliers
                .get(qid)
                .context(UnknownQuestionSnafu { question_id: *qid })?;
            tallier.check_vote(scores)?;
        }
        for (qid, scores) in ballot.votes.iter() {
            let tallier = self
                .talliers
                .get_mut(qid)
                .context(UnknownQuestionSnafu { question_id: *qid })?;
            tallier.add_vote(scores)?;
        }
        if let Some(comment) = &ballot.comment {
            self.comments.push(comment.clone());
        }
        self.ballots += 1;
        Ok(())
    }

    /// Finishes every question. The run cannot accept votes afterwards.
    pub fn finish_tally(&mut self) -> Result<ElectionResult, TallyError> {
        self.check_accumulating()?;
        let mut questions: BTreeMap<QuestionId, QuestionResult> = BTreeMap::new();
        let mut outcome: Result<(), TallyError> = Ok(());
        for (qid, tallier) in self.talliers.iter_mut() {
            match tallier.finish_tally() {
                Ok(result) => {
                    debug!("finish_tally: question {} done", qid);
                    questions.insert(*qid, result.clone());
                }
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.abort_on_error(outcome)?;
        self.state = RunState::Finished;
        info!(
            "finish_tally: election {}: {} ballots from {} records, {} comments",
            self.election.id,
            self.ballots,
            self.records,
            self.comments.len()
        );
        Ok(ElectionResult {
            election_id: self.election.id,
            ballot_type: self.election.ballot_type,
            tally_type: self.election.tally_type,
            ballots: self.ballots,
            questions,
            comments: self.comments.clone(),
        })
    }
}

/// Tallies a whole sequence of records.
pub fn tally_records<I, S>(election: &Election, records: I) -> Result<ElectionResult, TallyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tallier = ElectionTallier::new(election).context(InvalidConfigurationSnafu)?;
    for record in records {
        tallier.add_record(record.as_ref())?;
    }
    tallier.finish_tally()
}
