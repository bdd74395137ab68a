use std::sync::Arc;

use analysis_core::AnalysisError;
use analysis_orchestrator::{ComparativeAnalyticsEngine, EngineConfig};
use anyhow::Result;
use metrics_client::{MetricsClient, MetricsClientConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    All,
    Compare,
    Valuation,
    Ip,
}

impl Section {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "all" => Some(Section::All),
            "compare" | "peers" => Some(Section::Compare),
            "valuation" => Some(Section::Valuation),
            "ip" => Some(Section::Ip),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Args {
    ticker: String,
    section: Section,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let section = match args.iter().position(|a| a == "--section") {
        Some(i) => Section::parse(args.get(i + 1)?)?,
        None => Section::All,
    };

    let mut skip_next = false;
    let ticker = args.iter().skip(1).find(|a| {
        if skip_next {
            skip_next = false;
            return false;
        }
        if *a == "--section" {
            skip_next = true;
            return false;
        }
        !a.starts_with("--")
    })?;

    Some(Args {
        ticker: ticker.clone(),
        section,
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  comparables-report <TICKER>                      Peer comparison, valuation and IP value");
    eprintln!("  comparables-report <TICKER> --section compare    Peer comparison only");
    eprintln!("  comparables-report <TICKER> --section valuation  Valuation score only");
    eprintln!("  comparables-report <TICKER> --section ip         IP valuation only");
}

async fn render(engine: &ComparativeAnalyticsEngine, args: &Args) -> Result<String, AnalysisError> {
    let to_json = |value: serde_json::Result<String>| value.map_err(|e| AnalysisError::Unknown(e.to_string()));

    match args.section {
        Section::All => to_json(serde_json::to_string_pretty(&engine.full_report(&args.ticker).await?)),
        Section::Compare => to_json(serde_json::to_string_pretty(&engine.compare(&args.ticker).await?)),
        Section::Valuation => to_json(serde_json::to_string_pretty(&engine.valuation_score(&args.ticker).await?)),
        Section::Ip => to_json(serde_json::to_string_pretty(&engine.ip_valuation(&args.ticker).await?)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let raw_args: Vec<String> = std::env::args().collect();
    let Some(args) = parse_args(&raw_args) else {
        print_usage();
        std::process::exit(2);
    };

    let config = EngineConfig::from_env()?;
    tracing::info!(
        "Peer limit {}, fetch concurrency {}, fetch timeout {:?}",
        config.peer_limit,
        config.aggregator.max_concurrency,
        config.aggregator.fetch_timeout
    );

    let provider = Arc::new(MetricsClient::new(MetricsClientConfig::from_env()));
    let engine = ComparativeAnalyticsEngine::with_config(provider, config);

    match render(&engine, &args).await {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(AnalysisError::InvalidTicker(t)) => {
            eprintln!("Invalid ticker: {:?}", t);
            print_usage();
            std::process::exit(2);
        }
        Err(e) if e.is_no_data() => {
            eprintln!("No data available for {}", args.ticker.trim().to_uppercase());
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Analysis failed for {}: {}", args.ticker, e);
            eprintln!("Unable to analyze {}: {}", args.ticker, e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("comparables-report")
            .chain(items.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_ticker_only() {
        let args = parse_args(&argv(&["aapl"])).unwrap();
        assert_eq!(args.ticker, "aapl");
        assert_eq!(args.section, Section::All);
    }

    #[test]
    fn test_parse_section_before_or_after_ticker() {
        let after = parse_args(&argv(&["MSFT", "--section", "valuation"])).unwrap();
        assert_eq!(after.ticker, "MSFT");
        assert_eq!(after.section, Section::Valuation);

        let before = parse_args(&argv(&["--section", "ip", "NVDA"])).unwrap();
        assert_eq!(before.ticker, "NVDA");
        assert_eq!(before.section, Section::Ip);
    }

    #[test]
    fn test_parse_rejects_missing_or_bad_input() {
        assert_eq!(parse_args(&argv(&[])), None);
        assert_eq!(parse_args(&argv(&["AAPL", "--section"])), None);
        assert_eq!(parse_args(&argv(&["AAPL", "--section", "charts"])), None);
        assert_eq!(parse_args(&argv(&["--section", "compare"])), None);
    }
}
