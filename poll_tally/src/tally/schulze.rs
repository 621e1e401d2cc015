// Schulze: pairwise victories, strongest paths, then ranking tiers.

use log::debug;

use crate::ballot::{QuestionScores, UNRANKED};
use crate::config::*;
use crate::results::*;
use crate::tally::*;

#[derive(Debug, Clone)]
pub(crate) struct SchulzeTallier {
    options: OptionIndex,
    victories: Vec<Vec<u64>>,
}

impl SchulzeTallier {
    pub(crate) fn new(question: &Question) -> SchulzeTallier {
        let options = OptionIndex::new(question);
        let n = options.len();
        SchulzeTallier {
            options,
            victories: vec![vec![0; n]; n],
        }
    }

    pub(crate) fn check_vote(
        &self,
        scores: &QuestionScores,
    ) -> Result<Vec<(usize, Score)>, TallyError> {
        self.options.resolve(scores)
    }

    /// Lower ranks are preferred. Options absent from the vote are unranked.
    pub(crate) fn add_vote(&mut self, scores: &QuestionScores) -> Result<(), TallyError> {
        let mut ranks = vec![UNRANKED; self.options.len()];
        for (idx, rank) in self.check_vote(scores)? {
            ranks[idx] = rank;
        }
        for (i, rank_i) in ranks.iter().enumerate() {
            for (j, rank_j) in ranks.iter().enumerate() {
                if rank_i < rank_j {
                    self.victories[i][j] += 1;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> SchulzeResult {
        let strengths = path_strengths(&self.victories);
        let ranks = rank_tiers(&strengths);
        let mut ranking: Vec<RankedOption> = ranks
            .iter()
            .enumerate()
            .map(|(idx, rank)| RankedOption {
                option_id: self.options.id(idx),
                rank: *rank,
            })
            .collect();
        ranking.sort_by_key(|r| r.rank);
        SchulzeResult {
            options: self.options.ids().to_vec(),
            victories: self.victories.clone(),
            strengths,
            ranking,
        }
    }
}

/// Widest paths between every pair of options.
pub(crate) fn path_strengths(victories: &[Vec<u64>]) -> Vec<Vec<PathStrength>> {
    let n = victories.len();
    let mut strengths = vec![vec![PathStrength::NONE; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && victories[i][j] > victories[j][i] {
                strengths[i][j] = PathStrength(victories[i][j], victories[j][i]);
            }
        }
    }
    for k in 0..n {
        for i in 0..n {
            if i == k {
                continue;
            }
            for j in 0..n {
                if j == i || j == k {
                    continue;
                }
                let (through_i, through_k) = (strengths[i][k], strengths[k][j]);
                // The weakest link of the path through k.
                let via_k = if through_k.beats(&through_i) {
                    through_i
                } else {
                    through_k
                };
                if via_k.beats(&strengths[i][j]) {
                    strengths[i][j] = via_k;
                }
            }
        }
    }
    strengths
}

/// Repeatedly places the options that no remaining option beats. When every
/// remaining option is beaten by another one, they all share the next rank.
pub(crate) fn rank_tiers(strengths: &[Vec<PathStrength>]) -> Vec<u32> {
    let n = strengths.len();
    let mut ranks: Vec<Option<u32>> = vec![None; n];
    let mut placed = 0;
    while placed < n {
        let remaining: Vec<usize> = (0..n).filter(|i| ranks[*i].is_none()).collect();
        let unbeaten: Vec<usize> = remaining
            .iter()
            .cloned()
            .filter(|i| {
                remaining
                    .iter()
                    .all(|j| j == i || !strengths[*j][*i].beats(&strengths[*i][*j]))
            })
            .collect();
        let tier = if unbeaten.is_empty() {
            debug!("rank_tiers: {} options beat each other", remaining.len());
            remaining
        } else {
            unbeaten
        };
        let rank = placed as u32 + 1;
        for idx in tier.iter() {
            ranks[*idx] = Some(rank);
        }
        placed += tier.len();
    }
    ranks.into_iter().map(|r| r.unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    /// Adds `count` ballots ranking the options in the given order (1 is best).
    fn add_ballots(t: &mut SchulzeTallier, count: usize, order: &[OptionId]) {
        let vote: QuestionScores = order
            .iter()
            .enumerate()
            .map(|(idx, oid)| (*oid, idx as Score + 1))
            .collect();
        for _ in 0..count {
            t.add_vote(&vote).unwrap();
        }
    }

    fn ranking(result: &SchulzeResult) -> Vec<(OptionId, u32)> {
        result
            .ranking
            .iter()
            .map(|r| (r.option_id, r.rank))
            .collect()
    }

    #[test]
    fn classic_five_candidates() {
        init_logs();
        // A=1, B=2, C=3, D=4, E=5, 45 voters.
        let (a, b, c, d, e) = (1, 2, 3, 4, 5);
        let mut t = SchulzeTallier::new(&question(1, &[a, b, c, d, e]));
        add_ballots(&mut t, 5, &[a, c, b, e, d]);
        add_ballots(&mut t, 5, &[a, d, e, c, b]);
        add_ballots(&mut t, 8, &[b, e, d, a, c]);
        add_ballots(&mut t, 3, &[c, a, b, e, d]);
        add_ballots(&mut t, 7, &[c, a, e, b, d]);
        add_ballots(&mut t, 2, &[c, b, a, d, e]);
        add_ballots(&mut t, 7, &[d, c, e, b, a]);
        add_ballots(&mut t, 8, &[e, b, a, d, c]);
        let r = t.finish();

        assert_eq!(r.victories[0], vec![0, 20, 26, 30, 22]);
        assert_eq!(r.victories[4], vec![23, 27, 21, 31, 0]);
        assert_eq!(r.strengths[0][1], PathStrength(28, 17));
        assert_eq!(r.strengths[4][3], PathStrength(31, 14));
        // D reaches E only through C.
        assert_eq!(r.strengths[3][4], PathStrength(24, 21));
        assert_eq!(
            ranking(&r),
            vec![(e, 1), (a, 2), (c, 3), (b, 4), (d, 5)]
        );
    }

    #[test]
    fn unranked_options_lose_to_ranked_ones() {
        let mut t = SchulzeTallier::new(&question(1, &[1, 2, 3]));
        t.add_vote(&[(2, 1)].into_iter().collect()).unwrap();
        let r = t.finish();
        assert_eq!(r.victories[1], vec![1, 0, 1]);
        assert_eq!(r.victories[0][2], 0);
        assert_eq!(ranking(&r), vec![(2, 1), (1, 2), (3, 2)]);
    }

    #[test]
    fn condorcet_cycle_is_a_tie() {
        let mut t = SchulzeTallier::new(&question(1, &[1, 2, 3]));
        add_ballots(&mut t, 1, &[1, 2, 3]);
        add_ballots(&mut t, 1, &[2, 3, 1]);
        add_ballots(&mut t, 1, &[3, 1, 2]);
        assert_eq!(ranking(&t.finish()), vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn no_votes() {
        let t = SchulzeTallier::new(&question(1, &[7, 8]));
        let r = t.finish();
        assert_eq!(r.options, vec![7, 8]);
        assert_eq!(ranking(&r), vec![(7, 1), (8, 1)]);
    }
}
