mod config;
use log::{debug, info};

pub use crate::config::*;

pub mod builder;
pub mod manual;

/// Maps a raw cell to the label of the scale it stands for.
///
/// The lookup is trimmed and case-insensitive. Missing, blank and
/// unrecognized values give `None`: they are dropped, never reported as errors.
pub fn normalize<'a>(raw: Option<&str>, scale: &'a ScaleConfig) -> Option<&'a ScaleLabel> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    scale.lookup(raw).map(|idx| &scale.labels()[idx])
}

/// Flattens the table into observations, respondent by respondent and then in
/// question order. Cells that do not normalize are skipped.
pub fn flatten(table: &RawTable, scale: &ScaleConfig) -> Vec<Observation> {
    let mut res: Vec<Observation> = Vec::new();
    for row in table.rows.iter() {
        for (question, cell) in table.questions.iter().zip(row.cells.iter()) {
            match normalize(cell.as_deref(), scale) {
                Some(label) => res.push(Observation {
                    question: question.clone(),
                    label: label.code.clone(),
                    ordinal: label.ordinal,
                    sentiment: label.sentiment,
                }),
                None => {
                    debug!(
                        "flatten: respondent {}: dropping {:?} for {}",
                        row.id, cell, question
                    );
                }
            }
        }
    }
    res
}

/// Rounds to the given number of decimals, half to even.
///
/// Ties are decided on the exact binary value of `x`: 2.675 is slightly below
/// 2.675 once stored and rounds to 2.67, while 6.25 is exact and rounds to 6.2.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = x * factor;
    if (scaled - scaled.trunc()).abs() != 0.5 {
        return scaled.round() / factor;
    }
    // The product itself may be inexact: its error tells on which side of the tie x lies.
    let err = x.mul_add(factor, -scaled);
    let lower = scaled.floor();
    let rounded = if err > 0.0 {
        lower + 1.0
    } else if err < 0.0 || lower % 2.0 == 0.0 {
        lower
    } else {
        lower + 1.0
    };
    rounded / factor
}

fn percent(count: u64, total: u64) -> f64 {
    round_to(count as f64 / total as f64 * 100.0, 1)
}

/// Descriptive statistics over one questionnaire, for one scale.
///
/// The table is flattened once at construction. Every statistic is an
/// independent query and returns `AggregateErrors::NoValidData` instead of
/// dividing by zero.
pub struct ResponseAggregator<'a> {
    table: &'a RawTable,
    scale: &'a ScaleConfig,
    observations: Vec<Observation>,
    // counts[question][label], labels in scale order
    counts: Vec<Vec<u64>>,
}

impl<'a> ResponseAggregator<'a> {
    pub fn new(table: &'a RawTable, scale: &'a ScaleConfig) -> ResponseAggregator<'a> {
        let observations = flatten(table, scale);
        let mut counts: Vec<Vec<u64>> = vec![vec![0; scale.labels().len()]; table.questions.len()];
        for row in table.rows.iter() {
            for (q_idx, cell) in row.cells.iter().take(counts.len()).enumerate() {
                if let Some(l_idx) = cell.as_deref().and_then(|c| scale.lookup(c)) {
                    counts[q_idx][l_idx] += 1;
                }
            }
        }
        info!(
            "Aggregating {} respondents, {} questions, scale {}: {} valid answers",
            table.num_rows(),
            table.questions.len(),
            scale.name(),
            observations.len()
        );
        ResponseAggregator {
            table,
            scale,
            observations,
            counts,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn scale(&self) -> &ScaleConfig {
        self.scale
    }

    pub fn questions(&self) -> &[String] {
        &self.table.questions
    }

    /// Checks that there is something to compute statistics on.
    pub fn validate(&self) -> Result<(), AggregateErrors> {
        self.total().map(|_| ())
    }

    fn total(&self) -> Result<u64, AggregateErrors> {
        match self.observations.len() as u64 {
            0 => Err(AggregateErrors::NoValidData),
            n => Ok(n),
        }
    }

    fn label_idx(&self, label: &str) -> Result<usize, AggregateErrors> {
        self.scale
            .label_index(label)
            .ok_or_else(|| AggregateErrors::UnknownLabel(label.to_string()))
    }

    fn question_idx(&self, question: &str) -> Result<usize, AggregateErrors> {
        self.table
            .question_index(question)
            .ok_or_else(|| AggregateErrors::UnknownQuestion(question.to_string()))
    }

    fn label_total(&self, l_idx: usize) -> u64 {
        self.counts.iter().map(|per_label| per_label[l_idx]).sum()
    }

    fn question_total(&self, q_idx: usize) -> u64 {
        self.counts[q_idx].iter().sum()
    }

    // The unrounded mean, used for rankings.
    fn raw_question_mean(&self, q_idx: usize) -> Option<f64> {
        let count = self.question_total(q_idx);
        if count == 0 {
            return None;
        }
        let sum: u64 = self.counts[q_idx]
            .iter()
            .zip(self.scale.labels())
            .map(|(c, l)| c * l.ordinal as u64)
            .sum();
        Some(sum as f64 / count as f64)
    }

    // Denominator of the per-question rates: all respondents, answered or not.
    fn rows(&self) -> Result<u64, AggregateErrors> {
        self.total()?;
        match self.table.num_rows() as u64 {
            0 => Err(AggregateErrors::NoValidData),
            n => Ok(n),
        }
    }

    /// Count and share of every label of the scale, in scale order.
    pub fn label_counts(&self) -> Result<Vec<LabelCount>, AggregateErrors> {
        let total = self.total()?;
        let res = self
            .scale
            .labels()
            .iter()
            .enumerate()
            .map(|(l_idx, label)| {
                let count = self.label_total(l_idx);
                LabelCount {
                    label: label.code.clone(),
                    count,
                    percent: percent(count, total),
                }
            })
            .collect();
        Ok(res)
    }

    /// The most frequent label. Ties go to the label declared first in the scale.
    pub fn most_common_label(&self) -> Result<LabelCount, AggregateErrors> {
        let mut best: Option<LabelCount> = None;
        for lc in self.label_counts()? {
            match &best {
                Some(b) if b.count >= lc.count => {}
                _ => best = Some(lc),
            }
        }
        best.ok_or(AggregateErrors::NoValidData)
    }

    /// The least frequent label among the labels that appear at least once.
    /// Ties go to the label declared first in the scale.
    pub fn least_common_label(&self) -> Result<LabelCount, AggregateErrors> {
        let mut worst: Option<LabelCount> = None;
        for lc in self.label_counts()?.into_iter().filter(|lc| lc.count > 0) {
            match &worst {
                Some(w) if w.count <= lc.count => {}
                _ => worst = Some(lc),
            }
        }
        worst.ok_or(AggregateErrors::NoValidData)
    }

    /// The question where `label` was chosen the most. Ties go to the first
    /// question in column order. The share is relative to the number of respondents.
    pub fn question_with_most(&self, label: &str) -> Result<QuestionCount, AggregateErrors> {
        let rows = self.rows()?;
        let l_idx = self.label_idx(label)?;
        let mut best: Option<(usize, u64)> = None;
        for (q_idx, per_label) in self.counts.iter().enumerate() {
            let count = per_label[l_idx];
            match best {
                Some((_, c)) if c >= count => {}
                _ => best = Some((q_idx, count)),
            }
        }
        let (q_idx, count) = best.ok_or(AggregateErrors::NoValidData)?;
        Ok(QuestionCount {
            question: self.table.questions[q_idx].clone(),
            label: label.to_string(),
            count,
            percent: percent(count, rows),
        })
    }

    /// Share of `label` among all the valid answers.
    pub fn answer_rate(&self, label: &str) -> Result<f64, AggregateErrors> {
        let total = self.total()?;
        let l_idx = self.label_idx(label)?;
        Ok(percent(self.label_total(l_idx), total))
    }

    /// Share of respondents that answered `label` to `question`.
    ///
    /// The denominator is the number of rows, including the respondents whose
    /// answer was missing or invalid.
    pub fn question_rate(&self, label: &str, question: &str) -> Result<f64, AggregateErrors> {
        let rows = self.rows()?;
        let l_idx = self.label_idx(label)?;
        let q_idx = self.question_idx(question)?;
        Ok(percent(self.counts[q_idx][l_idx], rows))
    }

    /// Mean ordinal score over all the valid answers, 2 decimals.
    pub fn mean_score(&self) -> Result<f64, AggregateErrors> {
        let total = self.total()?;
        let sum: u64 = self.observations.iter().map(|o| o.ordinal as u64).sum();
        Ok(round_to(sum as f64 / total as f64, 2))
    }

    pub fn question_mean(&self, question: &str) -> Result<f64, AggregateErrors> {
        self.total()?;
        let q_idx = self.question_idx(question)?;
        self.raw_question_mean(q_idx)
            .map(|m| round_to(m, 2))
            .ok_or(AggregateErrors::NoValidData)
    }

    /// The mean of every question, in column order.
    pub fn question_means(&self) -> Result<Vec<QuestionMean>, AggregateErrors> {
        self.total()?;
        let res = self
            .table
            .questions
            .iter()
            .enumerate()
            .map(|(q_idx, question)| QuestionMean {
                question: question.clone(),
                count: self.question_total(q_idx),
                mean: self.raw_question_mean(q_idx).map(|m| round_to(m, 2)),
            })
            .collect();
        Ok(res)
    }

    /// The question with the highest mean score.
    pub fn best_question(&self) -> Result<QuestionMean, AggregateErrors> {
        self.rank_question(|candidate, current| candidate > current)
    }

    /// The question with the lowest mean score.
    pub fn worst_question(&self) -> Result<QuestionMean, AggregateErrors> {
        self.rank_question(|candidate, current| candidate < current)
    }

    // Questions without any valid answer are not ranked. The first question
    // wins ties since `better` is strict.
    fn rank_question(
        &self,
        better: impl Fn(f64, f64) -> bool,
    ) -> Result<QuestionMean, AggregateErrors> {
        self.total()?;
        let mut selected: Option<(usize, f64)> = None;
        for q_idx in 0..self.table.questions.len() {
            if let Some(m) = self.raw_question_mean(q_idx) {
                match selected {
                    Some((_, current)) if !better(m, current) => {}
                    _ => selected = Some((q_idx, m)),
                }
            }
        }
        let (q_idx, m) = selected.ok_or(AggregateErrors::NoValidData)?;
        Ok(QuestionMean {
            question: self.table.questions[q_idx].clone(),
            count: self.question_total(q_idx),
            mean: Some(round_to(m, 2)),
        })
    }

    pub fn sentiment_split(&self) -> Result<SentimentSplit, AggregateErrors> {
        let total = self.total()?;
        let share = |sentiment: Sentiment| {
            let count = self
                .observations
                .iter()
                .filter(|o| o.sentiment == sentiment)
                .count() as u64;
            CategoryShare {
                count,
                percent: percent(count, total),
            }
        };
        Ok(SentimentSplit {
            positive: share(Sentiment::Positive),
            neutral: share(Sentiment::Neutral),
            negative: share(Sentiment::Negative),
        })
    }

    /// For a single label, the share of respondents choosing it in each
    /// question. Questions where it never appears are left out.
    pub fn label_rate_report(&self, label: &str) -> Result<Vec<QuestionRate>, AggregateErrors> {
        let rows = self.rows()?;
        let l_idx = self.label_idx(label)?;
        let res = self
            .table
            .questions
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, per_label)| per_label[l_idx] > 0)
            .map(|(question, per_label)| QuestionRate {
                question: question.clone(),
                percent: percent(per_label[l_idx], rows),
            })
            .collect();
        Ok(res)
    }

    /// The answers given to one question, most frequent first.
    /// Shares are relative to the valid answers of that question.
    pub fn question_distribution(&self, question: &str) -> Result<Vec<LabelCount>, AggregateErrors> {
        self.total()?;
        let q_idx = self.question_idx(question)?;
        let q_total = self.question_total(q_idx);
        if q_total == 0 {
            return Err(AggregateErrors::NoValidData);
        }
        let mut res: Vec<LabelCount> = self
            .scale
            .labels()
            .iter()
            .zip(self.counts[q_idx].iter())
            .filter(|(_, c)| **c > 0)
            .map(|(label, c)| LabelCount {
                label: label.code.clone(),
                count: *c,
                percent: percent(*c, q_total),
            })
            .collect();
        // Stable: equal counts keep the scale order.
        res.sort_by_key(|lc| std::cmp::Reverse(lc.count));
        Ok(res)
    }

    pub fn summary(&self) -> SurveySummary {
        let cells = (self.table.num_rows() * self.table.questions.len()) as u64;
        let observations = self.observations.len() as u64;
        SurveySummary {
            respondents: self.table.num_rows() as u64,
            questions: self.table.questions.len() as u64,
            observations,
            dropped_cells: cells - observations,
            scale_min: self.scale.min_ordinal(),
            scale_max: self.scale.max_ordinal(),
        }
    }
}
