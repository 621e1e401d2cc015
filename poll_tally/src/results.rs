//! The outcome of a tally run.
//!
//! Results serialize to JSON with stable field order. Two runs over the same
//! records produce byte-identical JSON, which is what [`ElectionResult::digest`]
//! fingerprints.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::ballot::Comment;
use crate::config::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PluralityRow {
    pub option_id: OptionId,
    pub total: Score,
    pub rank: u32,
}

/// Options sorted by total, highest first. Tied options keep question order.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PluralityResult {
    pub rows: Vec<PluralityRow>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub score: Score,
    pub votes: u64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HistogramRow {
    pub option_id: OptionId,
    /// One bin per score in `[min_score, max_score]`, ascending.
    pub bins: Vec<HistogramBin>,
    pub sum: Score,
    pub count: u64,
    /// Absent when nobody scored the option.
    pub average: Option<f64>,
    pub rank: u32,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HistogramRangeResult {
    pub min_score: Score,
    pub max_score: Score,
    pub rows: Vec<HistogramRow>,
}

/// The strength of a path in the Schulze graph: the votes for the weakest link,
/// and the votes against it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathStrength(pub u64, pub u64);

impl PathStrength {
    pub const NONE: PathStrength = PathStrength(0, 0);

    /// More support wins. With equal support, less opposition wins.
    pub fn beats(&self, other: &PathStrength) -> bool {
        self.0 > other.0 || (self.0 == other.0 && self.1 < other.1)
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedOption {
    pub option_id: OptionId,
    pub rank: u32,
}

/// The matrices are indexed by the position of the option in `options`.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SchulzeResult {
    pub options: Vec<OptionId>,
    /// `victories[i][j]`: ballots preferring option i over option j.
    pub victories: Vec<Vec<u64>>,
    /// `strengths[i][j]`: the strongest path from option i to option j.
    pub strengths: Vec<Vec<PathStrength>>,
    pub ranking: Vec<RankedOption>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTally {
    pub option_id: OptionId,
    pub votes: f64,
    /// The keep factor used to distribute this round's votes.
    pub keep_factor: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvRound {
    pub round: u32,
    pub total_votes: f64,
    pub quota: f64,
    pub surplus: f64,
    pub tally: Vec<CandidateTally>,
    pub elected: Vec<OptionId>,
    pub eliminated: Vec<OptionId>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvResult {
    pub seats: u32,
    pub ballots: u64,
    /// In order of election.
    pub elected: Vec<OptionId>,
    /// In order of elimination.
    pub eliminated: Vec<OptionId>,
    pub rounds: Vec<StvRound>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionResult {
    Plurality(PluralityResult),
    HistogramRange(HistogramRangeResult),
    Schulze(SchulzeResult),
    Stv(StvResult),
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionResult {
    pub election_id: u32,
    pub ballot_type: BallotType,
    pub tally_type: TallyType,
    pub ballots: u64,
    pub questions: BTreeMap<QuestionId, QuestionResult>,
    pub comments: Vec<Comment>,
}

impl ElectionResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// SHA-256 of the compact JSON form of the result.
    pub fn digest(&self) -> serde_json::Result<String> {
        Ok(sha256::digest(self.to_json()?))
    }

    /// A human-readable report. Option texts are taken from the election.
    pub fn render_text(&self, election: &Election) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Election {}: {} ballots ({} ballots, {} tally)",
            self.election_id, self.ballots, self.ballot_type, self.tally_type
        );
        for (qid, result) in self.questions.iter() {
            let question = election.question(*qid);
            let label = |oid: &OptionId| -> String {
                match question.and_then(|q| q.option_text(*oid)) {
                    Some(text) => format!("{} ({})", text, oid),
                    None => format!("option {}", oid),
                }
            };
            let _ = writeln!(out);
            let _ = writeln!(out, "Question {}", qid);
            match result {
                QuestionResult::Plurality(r) => {
                    for row in r.rows.iter() {
                        let _ = writeln!(
                            out,
                            "  {:>3}. {}: {}",
                            row.rank,
                            label(&row.option_id),
                            row.total
                        );
                    }
                }
                QuestionResult::HistogramRange(r) => {
                    for row in r.rows.iter() {
                        let average = match row.average {
                            Some(avg) => format!("{:.3}", avg),
                            None => "n/a".to_string(),
                        };
                        let _ = writeln!(
                            out,
                            "  {:>3}. {}: average {} over {} votes",
                            row.rank,
                            label(&row.option_id),
                            average,
                            row.count
                        );
                        let bins: Vec<String> = row
                            .bins
                            .iter()
                            .filter(|bin| bin.votes > 0)
                            .map(|bin| format!("{}:{}", bin.score, bin.votes))
                            .collect();
                        if !bins.is_empty() {
                            let _ = writeln!(out, "       {}", bins.join(" "));
                        }
                    }
                }
                QuestionResult::Schulze(r) => {
                    for ranked in r.ranking.iter() {
                        let _ = writeln!(out, "  {:>3}. {}", ranked.rank, label(&ranked.option_id));
                    }
                }
                QuestionResult::Stv(r) => {
                    let _ = writeln!(out, "  {} seats, {} ballots", r.seats, r.ballots);
                    for round in r.rounds.iter() {
                        let _ = writeln!(
                            out,
                            "  Round {}: quota {:.6}, total {:.6}, surplus {:.6}",
                            round.round, round.quota, round.total_votes, round.surplus
                        );
                        for c in round.tally.iter() {
                            let _ = writeln!(
                                out,
                                "    {}: {:.6} (keep {:.6})",
                                label(&c.option_id),
                                c.votes,
                                c.keep_factor
                            );
                        }
                        for oid in round.elected.iter() {
                            let _ = writeln!(out, "    elected: {}", label(oid));
                        }
                        for oid in round.eliminated.iter() {
                            let _ = writeln!(out, "    eliminated: {}", label(oid));
                        }
                    }
                    let elected: Vec<String> = r.elected.iter().map(label).collect();
                    let _ = writeln!(out, "  Elected: {}", elected.join(", "));
                }
            }
        }
        if !self.comments.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Comments ({})", self.comments.len());
            for c in self.comments.iter() {
                let _ = writeln!(out, "  - {} / {}", c.native, c.en);
            }
        }
        out
    }
}
