// Histogram range: one histogram per option, ranked by average score.

use std::cmp::Ordering;

use snafu::{ensure, OptionExt};

use crate::ballot::QuestionScores;
use crate::config::*;
use crate::results::*;
use crate::tally::*;

#[derive(Debug, Clone)]
pub(crate) struct HistogramRangeTallier {
    options: OptionIndex,
    min: Score,
    max: Score,
    /// `histograms[option][score - min]`
    histograms: Vec<Vec<u64>>,
    sums: Vec<Score>,
    counts: Vec<u64>,
}

impl HistogramRangeTallier {
    pub(crate) fn new(question: &Question) -> Result<HistogramRangeTallier, ConfigError> {
        let (min, max) = question.score_range()?;
        ensure!(
            max - min <= MAX_HISTOGRAM_SPAN,
            HistogramTooWideSnafu {
                question_id: question.id,
                min,
                max
            }
        );
        let options = OptionIndex::new(question);
        let bins = (max - min + 1) as usize;
        Ok(HistogramRangeTallier {
            histograms: vec![vec![0; bins]; options.len()],
            sums: vec![0; options.len()],
            counts: vec![0; options.len()],
            options,
            min,
            max,
        })
    }

    pub(crate) fn check_vote(
        &self,
        scores: &QuestionScores,
    ) -> Result<Vec<(usize, Score)>, TallyError> {
        let resolved = self.options.resolve(scores)?;
        for (idx, score) in resolved.iter() {
            let option_id = self.options.id(*idx);
            ensure!(
                *score >= self.min && *score <= self.max,
                ScoreOutOfRangeSnafu {
                    question_id: self.options.question_id,
                    option_id,
                    score: *score,
                    min: self.min,
                    max: self.max
                }
            );
            self.sums[*idx].checked_add(*score).context(ScoreOverflowSnafu {
                question_id: self.options.question_id,
                option_id,
            })?;
        }
        Ok(resolved)
    }

    pub(crate) fn add_vote(&mut self, scores: &QuestionScores) -> Result<(), TallyError> {
        for (idx, score) in self.check_vote(scores)? {
            self.histograms[idx][(score - self.min) as usize] += 1;
            self.sums[idx] += score;
            self.counts[idx] += 1;
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> HistogramRangeResult {
        let mut rows: Vec<HistogramRow> = (0..self.options.len())
            .map(|idx| HistogramRow {
                option_id: self.options.id(idx),
                bins: self.histograms[idx]
                    .iter()
                    .enumerate()
                    .map(|(offset, votes)| HistogramBin {
                        score: self.min + offset as Score,
                        votes: *votes,
                    })
                    .collect(),
                sum: self.sums[idx],
                count: self.counts[idx],
                average: match self.counts[idx] {
                    0 => None,
                    count => Some(self.sums[idx] as f64 / count as f64),
                },
                rank: 0,
            })
            .collect();
        rows.sort_by(|a, b| compare_averages(a.average, b.average));
        let averages: Vec<Option<f64>> = rows.iter().map(|r| r.average).collect();
        for (row, rank) in rows.iter_mut().zip(competition_ranks(&averages)) {
            row.rank = rank;
        }
        HistogramRangeResult {
            min_score: self.min,
            max_score: self.max,
            rows,
        }
    }
}

/// Highest average first. Options nobody scored come last.
fn compare_averages(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn vote(scores: &[(OptionId, Score)]) -> QuestionScores {
        scores.iter().cloned().collect()
    }

    #[test]
    fn averages_and_histograms() {
        init_logs();
        let mut t =
            HistogramRangeTallier::new(&question(1, &[1, 2, 3]).with_score_range(-1, 2)).unwrap();
        t.add_vote(&vote(&[(1, 2), (2, -1)])).unwrap();
        t.add_vote(&vote(&[(1, 1), (2, 2)])).unwrap();
        t.add_vote(&vote(&[(1, 2), (2, 2)])).unwrap();
        let r = t.finish();
        assert_eq!((r.min_score, r.max_score), (-1, 2));
        let ids: Vec<OptionId> = r.rows.iter().map(|row| row.option_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let first = &r.rows[0];
        assert_eq!((first.sum, first.count, first.rank), (5, 3, 1));
        assert_eq!(first.average, Some(5.0 / 3.0));
        let votes: Vec<(Score, u64)> = first.bins.iter().map(|b| (b.score, b.votes)).collect();
        assert_eq!(votes, vec![(-1, 0), (0, 0), (1, 1), (2, 2)]);

        assert_eq!(r.rows[1].average, Some(1.0));
        assert_eq!(r.rows[1].rank, 2);
        // Option 3 got no score at all.
        assert_eq!(r.rows[2].average, None);
        assert_eq!(r.rows[2].count, 0);
        assert_eq!(r.rows[2].rank, 3);
    }

    #[test]
    fn equal_averages_share_a_rank() {
        let mut t =
            HistogramRangeTallier::new(&question(1, &[1, 2, 3]).with_score_range(0, 4)).unwrap();
        t.add_vote(&vote(&[(1, 1), (2, 3), (3, 2)])).unwrap();
        t.add_vote(&vote(&[(1, 3), (2, 1), (3, 0)])).unwrap();
        let ranks: Vec<(OptionId, u32)> = t
            .finish()
            .rows
            .iter()
            .map(|row| (row.option_id, row.rank))
            .collect();
        assert_eq!(ranks, vec![(1, 1), (2, 1), (3, 3)]);
    }

    #[test]
    fn out_of_range_scores_are_rejected() {
        let mut t =
            HistogramRangeTallier::new(&question(4, &[1, 2]).with_score_range(0, 4)).unwrap();
        assert_eq!(
            t.add_vote(&vote(&[(1, 2), (2, 5)])),
            Err(TallyError::ScoreOutOfRange {
                question_id: 4,
                option_id: 2,
                score: 5,
                min: 0,
                max: 4
            })
        );
        assert_eq!(t.finish().rows[0].count, 0);
    }

    #[test]
    fn sum_overflow_is_an_error() {
        let q =
            question(2, &[1, 2]).with_score_range(MAX_SCORE_MAGNITUDE - 10, MAX_SCORE_MAGNITUDE);
        let mut t = HistogramRangeTallier::new(&q).unwrap();
        t.sums[1] = Score::MAX - 5;
        assert_eq!(
            t.add_vote(&vote(&[(1, MAX_SCORE_MAGNITUDE), (2, MAX_SCORE_MAGNITUDE)])),
            Err(TallyError::ScoreOverflow {
                question_id: 2,
                option_id: 2
            })
        );
        let r = t.finish();
        assert_eq!(r.rows.iter().map(|row| row.count).sum::<u64>(), 0);
        assert!(r.rows.iter().all(|row| row.bins.iter().all(|b| b.votes == 0)));
    }

    #[test]
    fn span_is_limited() {
        let q = question(1, &[1]).with_score_range(0, MAX_HISTOGRAM_SPAN + 1);
        assert!(matches!(
            HistogramRangeTallier::new(&q),
            Err(ConfigError::HistogramTooWide { .. })
        ));
    }
}
