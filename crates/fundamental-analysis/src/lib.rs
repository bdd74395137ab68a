pub mod ip_valuation;
pub mod valuation;

pub use ip_valuation::{IndustryBucket, IpAsset, IpCategory, IpValuation, IpValuationEngine, IpValuationParams};
pub use valuation::{SubScores, ValuationInputs, ValuationParams, ValuationScore, ValuationScorer, Verdict, MAX_SCORE};
