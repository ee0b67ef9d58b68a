//! Daily report run
//!
//! Normalizes holdings, values every asset class, renders the report and
//! hands it to the optional downstream stages (charts, mail). Downstream
//! failures are logged and recorded on the run; they never replace the
//! report text.

use anyhow::Result;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::chart::write_chart;
use crate::config::Config;
use crate::error::ValuationError;
use crate::holdings::{AssetClass, Holdings};
use crate::mailer::{report_subject, Mailer, SmtpMailer};
use crate::pricing::{CustodianGoldPrices, NoPrices, PriceSource, YahooEquityPrices};
use crate::reports::{render_error_report, render_report};
use crate::valuation::{
    summarize, valuate, ClassValuation, PortfolioSummary, TracingObserver, ValuationObserver,
};

/// One price source per asset class
pub struct PriceSources {
    pub precious_metal: Box<dyn PriceSource>,
    pub equity: Box<dyn PriceSource>,
}

impl PriceSources {
    /// Sources that never answer, so every position is valued at cost
    pub fn offline() -> Self {
        Self {
            precious_metal: Box::new(NoPrices),
            equity: Box::new(NoPrices),
        }
    }

    /// Live sources built from the configured pages and endpoints
    pub fn live(config: &Config) -> Result<Self> {
        let gold = CustodianGoldPrices::new(
            config.gold.page_map(),
            config.gold.bounds(),
            config.gold.delay(),
            config.gold.timeout(),
        )?;
        let equity = YahooEquityPrices::new(
            &config.equity.exchange_suffix,
            config.equity.delay(),
            config.equity.timeout(),
        )?;

        Ok(Self {
            precious_metal: Box::new(gold),
            equity: Box::new(equity),
        })
    }

    pub fn for_class(&self, asset_class: AssetClass) -> &dyn PriceSource {
        match asset_class {
            AssetClass::PreciousMetal => self.precious_metal.as_ref(),
            AssetClass::Equity => self.equity.as_ref(),
        }
    }
}

/// What happened to the mail stage
#[derive(Debug, Clone, PartialEq)]
pub enum MailStatus {
    NotConfigured,
    Disabled,
    Sent,
    Failed(String),
}

/// Switches for a single run
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub offline: bool,
    pub charts: bool,
    pub mail: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            offline: false,
            charts: true,
            mail: true,
        }
    }
}

/// Outcome of a report run
#[derive(Debug)]
pub struct ReportRun {
    pub generated_at: NaiveDateTime,
    /// The rendered report, or the error report when valuation failed
    pub text: String,
    pub valuations: Vec<ClassValuation>,
    pub summary: Option<PortfolioSummary>,
    pub error: Option<ValuationError>,
    pub charts: Vec<PathBuf>,
    pub mail: MailStatus,
}

impl ReportRun {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn value_portfolio(
    holdings: &Holdings,
    sources: &PriceSources,
    observer: &dyn ValuationObserver,
) -> Result<(Vec<ClassValuation>, PortfolioSummary), ValuationError> {
    let mut valuations = Vec::new();
    for (asset_class, positions) in holdings.normalized()? {
        info!("Valuing {} {} positions", positions.len(), asset_class);
        valuations.push(valuate(
            asset_class,
            &positions,
            sources.for_class(asset_class),
            observer,
        )?);
    }
    let summary = summarize(&valuations)?;
    Ok((valuations, summary))
}

fn write_charts(output_dir: &Path, valuations: &[ClassValuation]) -> Vec<PathBuf> {
    valuations
        .iter()
        .filter(|v| !v.positions.is_empty())
        .filter_map(|v| match write_chart(output_dir, v) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Chart for {} could not be written: {:#}", v.asset_class, e);
                None
            }
        })
        .collect()
}

/// Run the report pipeline with explicit collaborators.
///
/// `chart_dir` and `mailer` are optional stages; pass `None` to skip them.
pub fn run_report(
    holdings: &Holdings,
    sources: &PriceSources,
    observer: &dyn ValuationObserver,
    chart_dir: Option<&Path>,
    mailer: Option<&dyn Mailer>,
    generated_at: NaiveDateTime,
) -> ReportRun {
    let (text, valuations, summary, error) = match value_portfolio(holdings, sources, observer) {
        Ok((valuations, summary)) => {
            let text = render_report(generated_at, &valuations, &summary);
            (text, valuations, Some(summary), None)
        }
        Err(e) => {
            error!("Valuation failed: {}", e);
            let text = render_error_report(generated_at, &e.to_string());
            (text, Vec::new(), None, Some(e))
        }
    };

    let charts = match chart_dir {
        Some(dir) => write_charts(dir, &valuations),
        None => Vec::new(),
    };

    let mail = match mailer {
        Some(mailer) => {
            let subject = report_subject(generated_at.date());
            match mailer.send_report(&subject, &text) {
                Ok(()) => MailStatus::Sent,
                Err(e) => {
                    error!("Report mail failed: {:#}", e);
                    MailStatus::Failed(format!("{:#}", e))
                }
            }
        }
        None => MailStatus::Disabled,
    };

    ReportRun {
        generated_at,
        text,
        valuations,
        summary,
        error,
        charts,
        mail,
    }
}

/// Run the report from configuration, building live sources and the mailer
pub fn run_from_config(
    config: &Config,
    options: ReportOptions,
    generated_at: NaiveDateTime,
) -> Result<ReportRun> {
    let sources = if options.offline {
        info!("Offline run: every position is valued at cost");
        PriceSources::offline()
    } else {
        PriceSources::live(config)?
    };

    let chart_dir = (options.charts && config.charts.enabled)
        .then(|| config.charts.output_dir.as_path());

    let mut setup_failure = None;
    let smtp = match (&config.mail, options.mail) {
        (Some(mail), true) => match SmtpMailer::from_env(mail) {
            Ok(mailer) => Some(mailer),
            Err(e) => {
                warn!("Mail delivery skipped: {:#}", e);
                setup_failure = Some(format!("{:#}", e));
                None
            }
        },
        _ => None,
    };

    let mut run = run_report(
        &config.holdings,
        &sources,
        &TracingObserver,
        chart_dir,
        smtp.as_ref().map(|m| m as &dyn Mailer),
        generated_at,
    );

    if let Some(reason) = setup_failure {
        run.mail = MailStatus::Failed(reason);
    } else if config.mail.is_none() {
        run.mail = MailStatus::NotConfigured;
    }

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::RawHolding;
    use crate::valuation::PriceOrigin;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn holdings() -> Holdings {
        Holdings {
            precious_metal: vec![RawHolding::new("Ziraat", dec!(2), dec!(300))],
            equity: vec![RawHolding::new("AKBNK", dec!(4), dec!(50))],
        }
    }

    fn gold_price(id: &str) -> Option<Decimal> {
        (id == "Ziraat").then_some(dec!(400))
    }

    fn stub_sources() -> PriceSources {
        PriceSources {
            precious_metal: Box::new(gold_price),
            equity: Box::new(NoPrices),
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: RefCell<Vec<(String, String)>>,
    }

    impl Mailer for RecordingMailer {
        fn send_report(&self, subject: &str, body: &str) -> Result<()> {
            self.sent
                .borrow_mut()
                .push((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send_report(&self, _subject: &str, _body: &str) -> Result<()> {
            Err(anyhow!("connection refused"))
        }
    }

    #[test]
    fn test_run_values_every_class() {
        let run = run_report(&holdings(), &stub_sources(), &TracingObserver, None, None, at());

        assert!(run.is_success());
        assert_eq!(run.valuations.len(), 2);
        assert_eq!(run.valuations[0].positions[0].price_origin, PriceOrigin::Live);
        assert_eq!(run.valuations[1].positions[0].price_origin, PriceOrigin::CostBasis);

        let summary = run.summary.as_ref().unwrap();
        assert_eq!(summary.total.total_value, dec!(1000));
        assert!(run.text.contains("TOTAL PORTFOLIO VALUE: 1,000 TL"));
        assert_eq!(run.mail, MailStatus::Disabled);
    }

    #[test]
    fn test_report_is_mailed_with_dated_subject() {
        let mailer = RecordingMailer::default();
        let run = run_report(
            &holdings(),
            &stub_sources(),
            &TracingObserver,
            None,
            Some(&mailer),
            at(),
        );

        assert_eq!(run.mail, MailStatus::Sent);
        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Daily Portfolio Report - 18.10.2026");
        assert_eq!(sent[0].1, run.text);
    }

    #[test]
    fn test_mail_failure_keeps_the_report() {
        let run = run_report(
            &holdings(),
            &stub_sources(),
            &TracingObserver,
            None,
            Some(&FailingMailer),
            at(),
        );

        assert!(run.is_success());
        assert!(run.text.contains("OVERALL SUMMARY"));
        match run.mail {
            MailStatus::Failed(reason) => assert!(reason.contains("connection refused")),
            other => panic!("unexpected mail status {:?}", other),
        }
    }

    #[test]
    fn test_empty_holdings_produce_error_report() {
        let mailer = RecordingMailer::default();
        let run = run_report(
            &Holdings::default(),
            &stub_sources(),
            &TracingObserver,
            None,
            Some(&mailer),
            at(),
        );

        assert_eq!(run.error, Some(ValuationError::EmptyPortfolio));
        assert!(run.summary.is_none());
        assert!(run.text.contains("ERROR: portfolio report could not be generated"));
        // the error report is what gets delivered
        assert_eq!(mailer.sent.borrow()[0].1, run.text);
    }

    #[test]
    fn test_invalid_position_produces_error_report() {
        let holdings = Holdings {
            precious_metal: Vec::new(),
            equity: vec![RawHolding::new("SASA", dec!(-5), dec!(5))],
        };
        let run = run_report(&holdings, &stub_sources(), &TracingObserver, None, None, at());

        assert!(!run.is_success());
        assert!(run.text.contains("SASA"));
        assert!(!run.text.contains("TOTAL PORTFOLIO VALUE"));
    }

    #[test]
    fn test_negative_lot_produces_error_report() {
        let holdings = Holdings {
            precious_metal: Vec::new(),
            equity: vec![
                RawHolding::new("X", dec!(10), dec!(10)),
                RawHolding::new("X", dec!(-5), dec!(10)),
            ],
        };
        let mailer = RecordingMailer::default();
        let run = run_report(
            &holdings,
            &stub_sources(),
            &TracingObserver,
            None,
            Some(&mailer),
            at(),
        );

        assert!(!run.is_success());
        assert!(run.text.contains("ERROR: portfolio report could not be generated"));
        assert!(run.text.contains("quantity must be positive, got -5"));
        assert_eq!(mailer.sent.borrow()[0].1, run.text);
    }

    #[test]
    fn test_out_of_range_amount_produces_error_report() {
        let holdings = Holdings {
            precious_metal: Vec::new(),
            equity: vec![RawHolding::new("T", dec!(1), dec!(0.0000000000000000000001))],
        };
        let sources = PriceSources {
            precious_metal: Box::new(NoPrices),
            equity: Box::new(|_: &str| Some(dec!(1000000000))),
        };
        let mailer = RecordingMailer::default();
        let run = run_report(&holdings, &sources, &TracingObserver, None, Some(&mailer), at());

        assert_eq!(
            run.error,
            Some(ValuationError::amount_out_of_range(AssetClass::Equity, "T"))
        );
        assert!(run.text.contains("amount out of range"));
        assert_eq!(run.mail, MailStatus::Sent);
    }

    #[test]
    fn test_charts_written_for_non_empty_classes() {
        let dir = tempfile::tempdir().unwrap();
        let holdings = Holdings {
            precious_metal: Vec::new(),
            equity: vec![RawHolding::new("MAVI", dec!(40), dec!(47.06))],
        };
        let run = run_report(
            &holdings,
            &stub_sources(),
            &TracingObserver,
            Some(dir.path()),
            None,
            at(),
        );

        assert_eq!(run.charts, vec![dir.path().join("equity-chart.svg")]);
        assert!(run.charts[0].exists());
        assert!(!dir.path().join("precious-metal-chart.svg").exists());
    }

    #[test]
    fn test_chart_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let run = run_report(
            &holdings(),
            &stub_sources(),
            &TracingObserver,
            Some(&blocker),
            None,
            at(),
        );

        assert!(run.is_success());
        assert!(run.charts.is_empty());
    }

    #[test]
    fn test_offline_run_from_config() {
        let mut config = Config::default();
        config.charts.enabled = false;
        let options = ReportOptions {
            offline: true,
            charts: true,
            mail: true,
        };

        let run = run_from_config(&config, options, at()).unwrap();
        assert!(run.is_success());
        assert_eq!(run.mail, MailStatus::NotConfigured);
        assert!(run.charts.is_empty());
        assert!(run
            .valuations
            .iter()
            .all(|v| v.fallback_count() == v.positions.len()));
    }
}
