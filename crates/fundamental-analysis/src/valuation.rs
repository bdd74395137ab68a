//! Composite undervaluation score from P/E, P/B, P/S and PEG.

use analysis_core::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Highest possible total (four ratios, 2 points each).
pub const MAX_SCORE: u8 = 8;

/// Benchmarks and cut-offs. Industry averages are fixed assumptions, not
/// derived data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationParams {
    pub avg_pe: f64,
    pub avg_pb: f64,
    pub avg_ps: f64,
    /// A ratio below `strong_discount × benchmark` earns full points.
    pub strong_discount: f64,
    pub peg_strong: f64,
    pub peg_fair: f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self {
            avg_pe: 25.0,
            avg_pb: 3.0,
            avg_ps: 2.5,
            strong_discount: 0.7,
            peg_strong: 1.0,
            peg_fair: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Significantly Undervalued")]
    SignificantlyUndervalued,
    #[serde(rename = "Moderately Undervalued")]
    ModeratelyUndervalued,
    #[serde(rename = "Fairly Valued")]
    FairlyValued,
    #[serde(rename = "Not Undervalued")]
    NotUndervalued,
}

impl Verdict {
    pub fn from_percentage(pct: f64) -> Self {
        if pct > 60.0 {
            Verdict::SignificantlyUndervalued
        } else if pct > 40.0 {
            Verdict::ModeratelyUndervalued
        } else if pct > 20.0 {
            Verdict::FairlyValued
        } else {
            Verdict::NotUndervalued
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::SignificantlyUndervalued => "Significantly Undervalued",
            Verdict::ModeratelyUndervalued => "Moderately Undervalued",
            Verdict::FairlyValued => "Fairly Valued",
            Verdict::NotUndervalued => "Not Undervalued",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ratios fed into the score. `None` means not reported or not meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationInputs {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub ps: Option<f64>,
    pub peg: Option<f64>,
}

impl ValuationInputs {
    /// Read P/E, P/B, P/S and revenue growth from a snapshot and derive PEG.
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let pe = snapshot.pe_ratio();
        Self {
            pe,
            pb: snapshot.pb_ratio(),
            ps: snapshot.ps_ratio(),
            peg: derive_peg(pe, snapshot.revenue_growth()),
        }
    }
}

/// P/E ÷ growth in percent. `None` unless both are positive.
pub fn derive_peg(pe: Option<f64>, revenue_growth: Option<f64>) -> Option<f64> {
    match (pe, revenue_growth) {
        (Some(pe), Some(growth)) if pe > 0.0 && growth > 0.0 => {
            let peg = pe / (growth * 100.0);
            peg.is_finite().then_some(peg)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub pe: u8,
    pub pb: u8,
    pub ps: u8,
    pub peg: u8,
}

impl SubScores {
    pub fn total(&self) -> u8 {
        self.pe + self.pb + self.ps + self.peg
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationScore {
    pub inputs: ValuationInputs,
    pub sub_scores: SubScores,
    pub total_score: u8,
    pub max_score: u8,
    pub percentage: f64,
    pub verdict: Verdict,
    /// Upside to the benchmark P/E; 0 when P/E is missing or already at or
    /// above the benchmark.
    pub upside_percent: f64,
}

impl ValuationScore {
    /// PEG with "not meaningful" collapsed to 0 for display.
    pub fn peg_or_zero(&self) -> f64 {
        self.inputs.peg.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValuationScorer {
    params: ValuationParams,
}

impl ValuationScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ValuationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ValuationParams {
        &self.params
    }

    pub fn score(&self, snapshot: &MetricsSnapshot) -> ValuationScore {
        self.score_inputs(ValuationInputs::from_snapshot(snapshot))
    }

    pub fn score_inputs(&self, inputs: ValuationInputs) -> ValuationScore {
        let p = &self.params;
        let sub_scores = SubScores {
            pe: self.ratio_points(inputs.pe, p.avg_pe),
            pb: self.ratio_points(inputs.pb, p.avg_pb),
            ps: self.ratio_points(inputs.ps, p.avg_ps),
            peg: self.peg_points(inputs.peg),
        };
        let total_score = sub_scores.total();
        let percentage = total_score as f64 / MAX_SCORE as f64 * 100.0;

        ValuationScore {
            inputs,
            sub_scores,
            total_score,
            max_score: MAX_SCORE,
            percentage,
            verdict: Verdict::from_percentage(percentage),
            upside_percent: self.upside(inputs.pe),
        }
    }

    /// 2 below the discounted benchmark, 1 below the benchmark, else 0.
    /// Non-positive ratios are not meaningful and score 0.
    fn ratio_points(&self, ratio: Option<f64>, benchmark: f64) -> u8 {
        match ratio {
            Some(r) if r > 0.0 && r < self.params.strong_discount * benchmark => 2,
            Some(r) if r > 0.0 && r < benchmark => 1,
            _ => 0,
        }
    }

    fn peg_points(&self, peg: Option<f64>) -> u8 {
        match peg {
            Some(v) if v > 0.0 && v < self.params.peg_strong => 2,
            Some(v) if v > 0.0 && v < self.params.peg_fair => 1,
            _ => 0,
        }
    }

    fn upside(&self, pe: Option<f64>) -> f64 {
        match pe {
            Some(pe) if pe > 0.0 && pe < self.params.avg_pe => (self.params.avg_pe / pe - 1.0) * 100.0,
            _ => 0.0,
        }
    }
}
