//! Command-line interface for the walker binary.
//!
//! Flags override values from the configuration file. Most options can also
//! be supplied through environment variables.

use chrono::NaiveDateTime;
use clap::Parser;

use crate::config::WalkerConfig;
use crate::utils::parse_date_label;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Everything published since 1 August 2024, written to a JSON lines file
/// paypers_walker --from-date 2024-08-01 -o ./out/thepaypers.jsonl
///
/// # Start from a config file and stop at the last stored article
/// paypers_walker -c walker.yaml --last-link https://thepaypers.com/news/...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "PAYPERS_CONFIG")]
    pub config: Option<String>,

    /// Lower date bound (inclusive); older articles end the run
    #[arg(long, env = "PAYPERS_FROM_DATE", value_parser = parse_cli_date)]
    pub from_date: Option<NaiveDateTime>,

    /// Upper date bound (inclusive)
    #[arg(long, value_parser = parse_cli_date)]
    pub to_date: Option<NaiveDateTime>,

    /// Maximum number of documents to emit
    #[arg(long)]
    pub max_materials: Option<usize>,

    /// Link of the newest document already stored; reaching it stops the run
    #[arg(long)]
    pub last_link: Option<String>,

    /// Listing page to start from
    #[arg(long, env = "PAYPERS_LISTING_URL")]
    pub listing_url: Option<String>,

    /// Seconds to wait for the listing or an article to render
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// JSON lines output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut WalkerConfig) {
        if let Some(from_date) = self.from_date {
            config.restrictions.from_date = Some(from_date);
        }
        if let Some(to_date) = self.to_date {
            config.restrictions.to_date = Some(to_date);
        }
        if let Some(max) = self.max_materials {
            config.restrictions.maximum_materials = Some(max);
        }
        if let Some(last) = &self.last_link {
            config.restrictions.to_last_material = Some(last.clone());
        }
        if let Some(url) = &self.listing_url {
            config.listing_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.wait_timeout_secs = secs;
        }
    }
}

fn parse_cli_date(value: &str) -> Result<NaiveDateTime, String> {
    parse_date_label(value).ok_or_else(|| format!("unrecognised date `{value}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "paypers_walker",
            "--from-date",
            "2024-09-01",
            "--max-materials",
            "25",
            "-o",
            "/tmp/out.jsonl",
        ]);

        assert_eq!(
            cli.from_date,
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(cli.max_materials, Some(25));
        assert_eq!(cli.output.as_deref(), Some("/tmp/out.jsonl"));
        assert_eq!(cli.to_date, None);
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let result = Cli::try_parse_from(["paypers_walker", "--from-date", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let cli = Cli::parse_from([
            "paypers_walker",
            "--to-date",
            "2024-10-01T12:00:00",
            "--last-link",
            "https://thepaypers.com/news/last",
            "--timeout-secs",
            "7",
        ]);
        let mut config = WalkerConfig::default();
        let default_from = config.restrictions.from_date;
        cli.apply(&mut config);

        assert_eq!(config.restrictions.from_date, default_from);
        assert_eq!(
            config.restrictions.to_date,
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap().and_hms_opt(12, 0, 0)
        );
        assert_eq!(
            config.restrictions.to_last_material.as_deref(),
            Some("https://thepaypers.com/news/last")
        );
        assert_eq!(config.wait_timeout_secs, 7);
        assert_eq!(config.listing_url, WalkerConfig::default().listing_url);
    }
}
