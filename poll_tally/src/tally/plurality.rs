// Plurality: sums every score given to an option.

use snafu::OptionExt;

use crate::ballot::QuestionScores;
use crate::config::*;
use crate::results::*;
use crate::tally::*;

#[derive(Debug, Clone)]
pub(crate) struct PluralityTallier {
    options: OptionIndex,
    totals: Vec<Score>,
}

impl PluralityTallier {
    pub(crate) fn new(question: &Question) -> PluralityTallier {
        let options = OptionIndex::new(question);
        let totals = vec![0; options.len()];
        PluralityTallier { options, totals }
    }

    pub(crate) fn check_vote(
        &self,
        scores: &QuestionScores,
    ) -> Result<Vec<(usize, Score)>, TallyError> {
        let resolved = self.options.resolve(scores)?;
        for (idx, score) in resolved.iter() {
            self.totals[*idx]
                .checked_add(*score)
                .context(ScoreOverflowSnafu {
                    question_id: self.options.question_id,
                    option_id: self.options.id(*idx),
                })?;
        }
        Ok(resolved)
    }

    pub(crate) fn add_vote(&mut self, scores: &QuestionScores) -> Result<(), TallyError> {
        // Each option appears once in a vote, so the checked sums are the new totals.
        for (idx, score) in self.check_vote(scores)? {
            self.totals[idx] += score;
        }
        Ok(())
    }

    pub(crate) fn finish(&self) -> PluralityResult {
        let mut sorted: Vec<(OptionId, Score)> = self
            .options
            .ids()
            .iter()
            .cloned()
            .zip(self.totals.iter().cloned())
            .collect();
        // Stable sort: ties stay in question order.
        sorted.sort_by(|(_, a), (_, b)| b.cmp(a));
        let totals: Vec<Score> = sorted.iter().map(|(_, total)| *total).collect();
        let ranks = competition_ranks(&totals);
        PluralityResult {
            rows: sorted
                .into_iter()
                .zip(ranks)
                .map(|((option_id, total), rank)| PluralityRow {
                    option_id,
                    total,
                    rank,
                })
                .collect(),
        }
    }
}
