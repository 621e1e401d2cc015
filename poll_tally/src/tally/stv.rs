// Meek single transferable vote.
//
// Every candidate carries a keep factor: the share of the weight reaching it that
// it keeps. Hopeful candidates keep everything, eliminated candidates nothing, and
// elected candidates have their factor lowered each round so that they keep just
// about a quota. Rankings are grouped, so every round costs one pass over the
// distinct rankings rather than over the ballots.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::ballot::QuestionScores;
use crate::config::*;
use crate::results::*;
use crate::tally::*;

/// Added to the Droop quota so that exactly `seats` candidates can reach it.
pub const QUOTA_EPSILON: f64 = 0.000001;

/// A run that has not filled its seats after this many rounds fails.
pub const MAX_ROUNDS: u32 = 10000;

/// `total / (seats + 1)`, plus a small epsilon.
pub fn droop_quota(total_votes: f64, seats: u32) -> f64 {
    total_votes / (seats as f64 + 1.0) + QUOTA_EPSILON
}

/// The keep factor of an elected candidate for the next round: what it needs to
/// end up with a quota, if the rest of the round stayed the same.
pub fn reduced_keep_factor(keep_factor: f64, quota: f64, votes: f64) -> f64 {
    if votes <= 0.0 {
        return keep_factor;
    }
    (keep_factor * quota / votes).min(1.0)
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum CandidateStatus {
    Hopeful,
    Elected,
    Eliminated,
}

#[derive(Debug, Clone)]
pub(crate) struct StvTallier {
    options: OptionIndex,
    seats: u32,
    max_rounds: u32,
    ballots: u64,
    /// Distinct rankings (option positions, most preferred first) and their counts.
    rankings: BTreeMap<Vec<usize>, u64>,
}

impl StvTallier {
    pub(crate) fn new(question: &Question) -> Result<StvTallier, ConfigError> {
        Ok(StvTallier {
            options: OptionIndex::new(question),
            seats: question.seats()?,
            max_rounds: MAX_ROUNDS,
            ballots: 0,
            rankings: BTreeMap::new(),
        })
    }

    pub(crate) fn check_vote(
        &self,
        scores: &QuestionScores,
    ) -> Result<Vec<(usize, Score)>, TallyError> {
        self.options.resolve(scores)
    }

    /// The scores are rank positions, lowest first.
    pub(crate) fn add_vote(&mut self, scores: &QuestionScores) -> Result<(), TallyError> {
        let mut positions: Vec<(Score, usize)> = self
            .check_vote(scores)?
            .into_iter()
            .map(|(idx, position)| (position, idx))
            .collect();
        positions.sort();
        let ranking: Vec<usize> = positions.into_iter().map(|(_, idx)| idx).collect();
        self.ballots += 1;
        if !ranking.is_empty() {
            *self.rankings.entry(ranking).or_insert(0) += 1;
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> Result<StvResult, TallyError> {
        let question_id = self.options.question_id;
        let n = self.options.len();
        let seats = self.seats as usize;
        info!(
            "STV question {}: {} ballots, {} distinct rankings, {} candidates, {} seats",
            question_id,
            self.ballots,
            self.rankings.len(),
            n,
            seats
        );

        let mut status = vec![CandidateStatus::Hopeful; n];
        let mut keep_factors = vec![1.0_f64; n];
        let mut elected: Vec<usize> = Vec::new();
        let mut eliminated: Vec<usize> = Vec::new();
        let mut rounds: Vec<StvRound> = Vec::new();
        // The surplus of the last round that neither elected nor eliminated anyone.
        let mut idle_surplus: Option<f64> = None;

        while (rounds.len() as u32) < self.max_rounds {
            let round_id = rounds.len() as u32 + 1;
            let tally = distribute_votes(&self.rankings, &keep_factors);
            let total_votes: f64 = tally.iter().sum();
            let quota = droop_quota(total_votes, self.seats);
            debug!(
                "STV round {}: total {} quota {} tally {:?}",
                round_id, total_votes, quota, tally
            );

            let mut newly_elected: Vec<usize> = (0..n)
                .filter(|i| status[*i] == CandidateStatus::Hopeful && tally[*i] >= quota)
                .collect();
            newly_elected.sort_by(|a, b| {
                tally[*b]
                    .partial_cmp(&tally[*a])
                    .unwrap_or(Ordering::Equal)
            });
            newly_elected.truncate(seats - elected.len());
            for idx in newly_elected.iter() {
                status[*idx] = CandidateStatus::Elected;
                elected.push(*idx);
            }

            let surplus: f64 = elected.iter().map(|idx| tally[*idx] - quota).sum();
            let round_tally: Vec<CandidateTally> = (0..n)
                .map(|idx| CandidateTally {
                    option_id: self.options.id(idx),
                    votes: tally[idx],
                    keep_factor: keep_factors[idx],
                })
                .collect();
            for idx in elected.iter() {
                keep_factors[*idx] = reduced_keep_factor(keep_factors[*idx], quota, tally[*idx]);
            }

            let mut newly_eliminated: Vec<usize> = Vec::new();
            if newly_elected.is_empty() {
                let hopefuls: Vec<(usize, f64)> = (0..n)
                    .filter(|i| status[*i] == CandidateStatus::Hopeful)
                    .map(|i| (i, tally[i]))
                    .collect();
                newly_eliminated = round_eliminations(&hopefuls, surplus, &mut idle_surplus);
                for idx in newly_eliminated.iter() {
                    status[*idx] = CandidateStatus::Eliminated;
                    keep_factors[*idx] = 0.0;
                    eliminated.push(*idx);
                }
            } else {
                idle_surplus = None;
            }

            let round = StvRound {
                round: round_id,
                total_votes,
                quota,
                surplus,
                tally: round_tally,
                elected: newly_elected.iter().map(|idx| self.options.id(*idx)).collect(),
                eliminated: newly_eliminated
                    .iter()
                    .map(|idx| self.options.id(*idx))
                    .collect(),
            };
            info!(
                "STV round {}: elected {:?} eliminated {:?}",
                round_id, round.elected, round.eliminated
            );
            rounds.push(round);

            let any_hopeful = status.iter().any(|s| *s == CandidateStatus::Hopeful);
            if elected.len() == seats || !any_hopeful {
                return Ok(StvResult {
                    seats: self.seats,
                    ballots: self.ballots,
                    elected: elected.iter().map(|idx| self.options.id(*idx)).collect(),
                    eliminated: eliminated.iter().map(|idx| self.options.id(*idx)).collect(),
                    rounds,
                });
            }
        }
        NoConvergenceSnafu {
            question_id,
            rounds: self.max_rounds,
        }
        .fail()
    }
}

/// Walks every ranking with a weight of 1. Each candidate keeps its share of the
/// remaining weight, and what is left flows to the next preference.
fn distribute_votes(rankings: &BTreeMap<Vec<usize>, u64>, keep_factors: &[f64]) -> Vec<f64> {
    let mut tally = vec![0.0_f64; keep_factors.len()];
    for (ranking, count) in rankings.iter() {
        let mut weight = 1.0_f64;
        for idx in ranking.iter() {
            let share = weight * keep_factors[*idx];
            tally[*idx] += share * (*count as f64);
            weight -= share;
            if weight <= 0.0 {
                break;
            }
        }
    }
    tally
}

/// All the hopefuls tied at the lowest tally.
fn lowest_group(hopefuls: &[(usize, f64)]) -> Vec<usize> {
    let lowest = hopefuls
        .iter()
        .map(|(_, votes)| *votes)
        .fold(f64::INFINITY, f64::min);
    hopefuls
        .iter()
        .filter(|(_, votes)| *votes == lowest)
        .map(|(idx, _)| *idx)
        .collect()
}

/// The hopefuls to eliminate in a round that elected nobody. If they are all tied,
/// they all go. Otherwise the lowest group goes, but only when the surplus could
/// not lift it above the next tally.
pub(crate) fn find_eliminated(hopefuls: &[(usize, f64)], surplus: f64) -> Vec<usize> {
    let group = lowest_group(hopefuls);
    if group.len() == hopefuls.len() {
        debug!("find_eliminated: all {} hopefuls are tied", group.len());
        return group;
    }
    let lowest = hopefuls
        .iter()
        .map(|(_, votes)| *votes)
        .fold(f64::INFINITY, f64::min);
    let next = hopefuls
        .iter()
        .map(|(_, votes)| *votes)
        .filter(|votes| *votes > lowest)
        .fold(f64::INFINITY, f64::min);
    if lowest + surplus < next {
        debug!(
            "find_eliminated: eliminating {:?} ({} + {} < {})",
            group, lowest, surplus, next
        );
        group
    } else {
        debug!(
            "find_eliminated: surplus {} could still lift {} to {}",
            surplus, lowest, next
        );
        Vec::new()
    }
}

/// The hopefuls to eliminate in a round that elected nobody. `idle_surplus` holds
/// the surplus of the last round that changed nothing: when the surplus stops
/// decreasing, the lowest group is eliminated even if the surplus could lift it.
pub(crate) fn round_eliminations(
    hopefuls: &[(usize, f64)],
    surplus: f64,
    idle_surplus: &mut Option<f64>,
) -> Vec<usize> {
    let group = find_eliminated(hopefuls, surplus);
    if !group.is_empty() {
        *idle_surplus = None;
        return group;
    }
    match *idle_surplus {
        Some(previous) if surplus >= previous => {
            let group = lowest_group(hopefuls);
            warn!(
                "the surplus stopped decreasing ({} >= {}), eliminating {:?}",
                surplus, previous, group
            );
            *idle_surplus = None;
            group
        }
        _ => {
            *idle_surplus = Some(surplus);
            Vec::new()
        }
    }
}
