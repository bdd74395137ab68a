//! Peer Resolver
//!
//! Maps a company's industry / sector classification to a short list of
//! comparable tickers. Pure lookup over static tables; never fails.

use serde::{Deserialize, Serialize};

/// Default number of peers returned.
pub const DEFAULT_PEER_LIMIT: usize = 5;

/// Industry → hand-picked peer list. Scanned in order; first match wins.
const INDUSTRY_PEERS: &[(&str, &[&str])] = &[
    ("Consumer Electronics", &["AAPL", "SONY", "DELL", "HPQ", "LOGI", "SONO"]),
    ("Software - Application", &["CRM", "NOW", "INTU", "SAP", "WDAY", "ADSK"]),
    ("Software - Infrastructure", &["MSFT", "ORCL", "ADBE", "PANW", "CRWD", "FTNT"]),
    ("Semiconductors", &["NVDA", "AMD", "AVGO", "QCOM", "TXN", "INTC"]),
    ("Semiconductor Equipment", &["ASML", "AMAT", "LRCX", "KLAC", "TER"]),
    ("Internet Content & Information", &["GOOGL", "META", "PINS", "SNAP", "RDDT"]),
    ("Internet Retail", &["AMZN", "BABA", "PDD", "EBAY", "ETSY", "CHWY"]),
    ("Auto Manufacturers", &["TSLA", "TM", "F", "GM", "RIVN", "STLA"]),
    ("Banks - Diversified", &["JPM", "BAC", "WFC", "C", "HSBC"]),
    ("Credit Services", &["V", "MA", "AXP", "PYPL", "COF"]),
    ("Drug Manufacturers", &["LLY", "JNJ", "MRK", "ABBV", "PFE", "NVO"]),
    ("Discount Stores", &["WMT", "COST", "TGT", "DG", "DLTR"]),
    ("Oil & Gas Integrated", &["XOM", "CVX", "SHEL", "BP", "TTE"]),
    ("Entertainment", &["NFLX", "DIS", "WBD", "ROKU", "SPOT"]),
    ("Aerospace & Defense", &["LMT", "RTX", "BA", "NOC", "GD"]),
    ("Beverages - Non-Alcoholic", &["KO", "PEP", "MNST", "KDP", "CELH"]),
    ("Restaurants", &["MCD", "SBUX", "CMG", "YUM", "DRI"]),
    ("Telecom Services", &["T", "VZ", "TMUS", "CMCSA", "CHTR"]),
];

/// Broad peer universes used when only a sector is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerUniverse {
    MegaCap,
    Financials,
    Healthcare,
    Consumer,
    Energy,
    Industrials,
    Communications,
    RealEstate,
    Materials,
    Utilities,
}

impl PeerUniverse {
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            PeerUniverse::MegaCap => &["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META"],
            PeerUniverse::Financials => &["JPM", "BAC", "WFC", "GS", "MS", "BRK.B"],
            PeerUniverse::Healthcare => &["UNH", "JNJ", "LLY", "MRK", "ABBV", "PFE"],
            PeerUniverse::Consumer => &["AMZN", "WMT", "COST", "HD", "PG", "KO"],
            PeerUniverse::Energy => &["XOM", "CVX", "COP", "EOG", "SLB", "PSX"],
            PeerUniverse::Industrials => &["GE", "CAT", "HON", "UNP", "RTX", "DE"],
            PeerUniverse::Communications => &["GOOGL", "META", "NFLX", "DIS", "TMUS", "VZ"],
            PeerUniverse::RealEstate => &["PLD", "AMT", "EQIX", "SPG", "O", "PSA"],
            PeerUniverse::Materials => &["LIN", "SHW", "APD", "FCX", "NEM", "ECL"],
            PeerUniverse::Utilities => &["NEE", "DUK", "SO", "D", "AEP", "EXC"],
        }
    }

    /// Sector name → universe. Matching is case-insensitive on the trimmed name.
    pub fn from_sector(sector: &str) -> Option<Self> {
        let s = sector.trim().to_lowercase();
        let universe = match s.as_str() {
            "technology" | "information technology" => PeerUniverse::MegaCap,
            "financial services" | "financials" | "financial" => PeerUniverse::Financials,
            "healthcare" | "health care" => PeerUniverse::Healthcare,
            "consumer cyclical" | "consumer defensive" | "consumer discretionary"
            | "consumer staples" => PeerUniverse::Consumer,
            "energy" => PeerUniverse::Energy,
            "industrials" => PeerUniverse::Industrials,
            "communication services" | "communications" => PeerUniverse::Communications,
            "real estate" => PeerUniverse::RealEstate,
            "basic materials" | "materials" => PeerUniverse::Materials,
            "utilities" => PeerUniverse::Utilities,
            _ => return None,
        };
        Some(universe)
    }
}

/// Which table produced a peer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PeerSource {
    Industry(String),
    Sector(PeerUniverse),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerResolution {
    pub peers: Vec<String>,
    pub source: PeerSource,
}

#[derive(Debug, Clone)]
pub struct PeerResolver {
    limit: usize,
}

impl Default for PeerResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_LIMIT)
    }
}

impl PeerResolver {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Up to `limit` peer tickers for `ticker`, never including `ticker` itself.
    pub fn resolve(&self, ticker: &str, industry: Option<&str>, sector: Option<&str>) -> Vec<String> {
        self.resolve_detailed(ticker, industry, sector).peers
    }

    pub fn resolve_detailed(
        &self,
        ticker: &str,
        industry: Option<&str>,
        sector: Option<&str>,
    ) -> PeerResolution {
        let industry = industry.map(str::trim).filter(|s| !s.is_empty());
        let sector = sector.map(str::trim).filter(|s| !s.is_empty());

        if let Some(industry) = industry {
            if let Some((key, peers)) = find_industry(industry) {
                return PeerResolution {
                    peers: self.take_peers(ticker, peers),
                    source: PeerSource::Industry(key.to_string()),
                };
            }
        }

        if let Some(universe) = sector.and_then(PeerUniverse::from_sector) {
            return PeerResolution {
                peers: self.take_peers(ticker, universe.members()),
                source: PeerSource::Sector(universe),
            };
        }

        PeerResolution {
            peers: self.take_peers(ticker, PeerUniverse::MegaCap.members()),
            source: PeerSource::Default,
        }
    }

    fn take_peers(&self, ticker: &str, candidates: &[&str]) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| !c.eq_ignore_ascii_case(ticker.trim()))
            .take(self.limit)
            .map(|c| c.to_string())
            .collect()
    }
}

/// First table entry whose key contains, or is contained in, `industry`.
fn find_industry(industry: &str) -> Option<(&'static str, &'static [&'static str])> {
    let needle = industry.to_lowercase();
    INDUSTRY_PEERS
        .iter()
        .find(|(key, _)| {
            let key = key.to_lowercase();
            key.contains(&needle) || needle.contains(&key)
        })
        .map(|(key, peers)| (*key, *peers))
}
