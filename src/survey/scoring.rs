// The numbered queries of the scoring script, answered one line at a time.

use likert_aggregate::{AggregateErrors, ResponseAggregator};

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ScoringQuery {
    MostCommonLabel,
    LeastCommonLabel,
    TopQuestion(&'static str),
    RateReport(&'static str),
    MeanScore,
    BestQuestion,
    WorstQuestion,
    SentimentSplit,
}

impl ScoringQuery {
    pub fn parse(code: &str) -> Option<ScoringQuery> {
        let q = match code.trim().to_lowercase().as_str() {
            "q1" => ScoringQuery::MostCommonLabel,
            "q2" => ScoringQuery::LeastCommonLabel,
            "q3" => ScoringQuery::TopQuestion("SS"),
            "q4" => ScoringQuery::TopQuestion("S"),
            "q5" => ScoringQuery::TopQuestion("CS"),
            "q6" => ScoringQuery::TopQuestion("CTS"),
            "q7" => ScoringQuery::TopQuestion("TS"),
            "q8" => ScoringQuery::TopQuestion("STS"),
            "q9" => ScoringQuery::RateReport("STS"),
            "q10" => ScoringQuery::MeanScore,
            "q11" => ScoringQuery::BestQuestion,
            "q12" => ScoringQuery::WorstQuestion,
            "q13" => ScoringQuery::SentimentSplit,
            _ => return None,
        };
        Some(q)
    }
}

pub fn answer(agg: &ResponseAggregator, query: ScoringQuery) -> Result<String, AggregateErrors> {
    let line = match query {
        ScoringQuery::MostCommonLabel => {
            let lc = agg.most_common_label()?;
            format!("{}|{}|{:.1}", lc.label, lc.count, lc.percent)
        }
        ScoringQuery::LeastCommonLabel => {
            let lc = agg.least_common_label()?;
            format!("{}|{}|{:.1}", lc.label, lc.count, lc.percent)
        }
        ScoringQuery::TopQuestion(label) => {
            let qc = agg.question_with_most(label)?;
            format!("{}|{}|{:.1}", qc.question, qc.count, qc.percent)
        }
        ScoringQuery::RateReport(label) => agg
            .label_rate_report(label)?
            .iter()
            .map(|qr| format!("{}:{:.1}", qr.question, qr.percent))
            .collect::<Vec<String>>()
            .join("|"),
        ScoringQuery::MeanScore => format!("{:.2}", agg.mean_score()?),
        ScoringQuery::BestQuestion => question_mean_line(agg.best_question()?),
        ScoringQuery::WorstQuestion => question_mean_line(agg.worst_question()?),
        ScoringQuery::SentimentSplit => {
            let split = agg.sentiment_split()?;
            format!(
                "positif={}:{:.1}|netral={}:{:.1}|negatif={}:{:.1}",
                split.positive.count,
                split.positive.percent,
                split.neutral.count,
                split.neutral.percent,
                split.negative.count,
                split.negative.percent
            )
        }
    };
    Ok(line)
}

fn question_mean_line(qm: likert_aggregate::QuestionMean) -> String {
    // Ranked questions always have a mean.
    format!("{}:{:.2}", qm.question, qm.mean.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use likert_aggregate::builder::Builder;
    use likert_aggregate::{RawTable, ScaleConfig};

    fn six_point_table() -> RawTable {
        let qs: Vec<String> = ["q1", "q2", "q3"].iter().map(|s| s.to_string()).collect();
        let mut b = Builder::new("Responden", &qs).unwrap();
        b.add_row_simple("R1", &["SS", "CTS", "S"]);
        b.add_row_simple("R2", &["S", "TS", "SS"]);
        b.add_row_simple("R3", &["CTS", "STS", "SS"]);
        b.add_row_simple("R4", &["SS", "CS", ""]);
        b.build().unwrap()
    }

    fn run(code: &str) -> String {
        let table = six_point_table();
        let scale = ScaleConfig::six_point();
        let agg = ResponseAggregator::new(&table, &scale);
        answer(&agg, ScoringQuery::parse(code).unwrap()).unwrap()
    }

    #[test]
    fn all_queries() {
        assert_eq!(run("q1"), "SS|4|36.4");
        assert_eq!(run("q2"), "STS|1|9.1");
        assert_eq!(run("q3"), "q1|2|50.0");
        assert_eq!(run("q4"), "q1|1|25.0");
        assert_eq!(run("q5"), "q2|1|25.0");
        assert_eq!(run("q6"), "q1|1|25.0");
        assert_eq!(run("q7"), "q2|1|25.0");
        assert_eq!(run("q8"), "q2|1|25.0");
        assert_eq!(run("q9"), "q2:25.0");
        assert_eq!(run("q10"), "4.27");
        assert_eq!(run("q11"), "q3:5.67");
        assert_eq!(run("q12"), "q2:2.50");
        assert_eq!(run("Q13"), "positif=6:54.5|netral=1:9.1|negatif=4:36.4");
    }

    #[test]
    fn exact_halves_round_to_even() {
        let qs = vec!["q1".to_string()];
        let mut b = Builder::new("Responden", &qs).unwrap();
        b.add_row_simple("R1", &["SS"]);
        for idx in 2..=16 {
            b.add_row_simple(&format!("R{}", idx), &["S"]);
        }
        let table = b.build().unwrap();
        let scale = ScaleConfig::six_point();
        let agg = ResponseAggregator::new(&table, &scale);
        assert_eq!(
            answer(&agg, ScoringQuery::TopQuestion("SS")).unwrap(),
            "q1|1|6.2"
        );

        let qs: Vec<String> = (1..=8).map(|i| format!("q{}", i)).collect();
        let mut b = Builder::new("Responden", &qs).unwrap();
        b.add_row_simple("R1", &["SS", "SS", "SS", "SS", "STS", "STS", "STS", "TS"]);
        let table = b.build().unwrap();
        let scale = ScaleConfig::five_point();
        let agg = ResponseAggregator::new(&table, &scale);
        assert_eq!(answer(&agg, ScoringQuery::MeanScore).unwrap(), "3.12");
    }

    #[test]
    fn unknown_codes() {
        assert_eq!(ScoringQuery::parse("q14"), None);
        assert_eq!(ScoringQuery::parse(""), None);
    }

    #[test]
    fn label_outside_the_scale() {
        let table = six_point_table();
        let scale = ScaleConfig::five_point();
        let agg = ResponseAggregator::new(&table, &scale);
        assert_eq!(
            answer(&agg, ScoringQuery::TopQuestion("CTS")),
            Err(AggregateErrors::UnknownLabel("CTS".to_string()))
        );
        // The CTS answers are dropped under the five-point scale.
        assert_eq!(agg.observations().len(), 9);
    }

    #[test]
    fn empty_rate_report() {
        let qs = vec!["q1".to_string()];
        let mut b = Builder::new("Responden", &qs).unwrap();
        b.add_row_simple("R1", &["SS"]);
        let table = b.build().unwrap();
        let scale = ScaleConfig::six_point();
        let agg = ResponseAggregator::new(&table, &scale);
        assert_eq!(answer(&agg, ScoringQuery::RateReport("STS")).unwrap(), "");
    }
}
