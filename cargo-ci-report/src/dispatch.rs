// Copyright (c) The ci-test-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    output::{OutputOpts, clap_styles},
};
use camino::Utf8PathBuf;
use ci_test_reporter::{
    config::{ConfigOverrides, ReporterConfig},
    errors::DisplayErrorChain,
    libtest::LibtestEventParser,
    reporter::{CiReporter, CiReporterBuilder, DisplayReporter, TestEvent},
    transport::{ApiTransport, DryRunTransport, HttpTransport},
};
use clap::{Args, Parser, Subcommand};
use std::io::BufRead;
use tracing::{error, info, warn};

/// The API base URL used by `--dry-run` when none is configured.
const DRY_RUN_BASE_URL: &str = "http://localhost:1033";

/// Reports libtest results to a CI test-reporting service.
///
/// This binary should typically be invoked as `cargo ci-report` (in which case
/// this message will not be seen), not `cargo-ci-report`.
#[derive(Debug, Parser)]
#[command(version, bin_name = "cargo", styles = clap_styles::style(), max_term_width = 100)]
pub struct CargoCiReportApp {
    #[command(subcommand)]
    subcommand: CiReportSubcommand,
}

impl CargoCiReportApp {
    /// Executes the app.
    pub fn exec(self) -> Result<(), ExpectedError> {
        let CiReportSubcommand::CiReport(app) = self.subcommand;
        app.exec()
    }
}

#[derive(Debug, Subcommand)]
enum CiReportSubcommand {
    /// Reports libtest JSON test events read from standard input to a CI test-reporting API
    CiReport(AppImpl),
}

#[derive(Debug, Args)]
#[command(version)]
struct AppImpl {
    /// Path to the test binary that produced the events
    #[arg(long, value_name = "PATH")]
    assembly: Option<Utf8PathBuf>,

    /// Base URL of the reporting API [default: $APPVEYOR_API_URL]
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Reporter config file
    #[arg(long, value_name = "PATH", env = "CI_REPORT_CONFIG_FILE")]
    config_file: Option<Utf8PathBuf>,

    /// Log API requests instead of sending them
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    output: OutputOpts,
}

impl AppImpl {
    fn exec(self) -> Result<(), ExpectedError> {
        let output = self.output.init();

        let overrides = ConfigOverrides {
            base_url: self.api_url,
        };
        let config = ReporterConfig::from_env(self.config_file.as_deref(), &overrides)?;

        let (base_url, transport): (String, Box<dyn ApiTransport>) =
            match (config.base_url, self.dry_run) {
                (base_url, true) => (
                    base_url.unwrap_or_else(|| DRY_RUN_BASE_URL.to_owned()),
                    Box::new(DryRunTransport),
                ),
                (Some(base_url), false) => (
                    base_url,
                    Box::new(HttpTransport::new(config.request_timeout)),
                ),
                (None, false) => return Err(ExpectedError::MissingApiUrl),
            };

        let mut builder = CiReporterBuilder::new(base_url);
        if config.display_enabled {
            let mut display = DisplayReporter::stderr();
            display.set_colorize(output.color.should_colorize(supports_color::Stream::Stderr));
            builder.set_forward_to(display);
        }
        let reporter = builder.build(transport);

        if let Some(assembly_path) = self.assembly {
            report(&reporter, &TestEvent::AssemblyStarting { assembly_path });
        }

        let relay_result = relay_events(std::io::stdin().lock(), &reporter);

        // Queued requests are delivered even if reading input failed partway through.
        match reporter.finish() {
            Ok(stats) => info!(
                "sent {} reports to the reporting API ({} failed)",
                stats.sent, stats.failed,
            ),
            Err(err) => error!("{}", DisplayErrorChain::new(&err)),
        }

        let relay_stats = relay_result?;
        if relay_stats.malformed > 0 {
            warn!("skipped {} malformed input lines", relay_stats.malformed);
        }
        Ok(())
    }
}

/// Counts of input lines handled by [`relay_events`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct RelayStats {
    events: usize,
    malformed: usize,
}

/// Parses libtest JSON lines from `input` and reports each test event.
///
/// Malformed lines are logged and skipped.
fn relay_events(input: impl BufRead, reporter: &CiReporter) -> Result<RelayStats, ExpectedError> {
    let mut parser = LibtestEventParser::new();
    let mut stats = RelayStats::default();

    for line in input.lines() {
        let line = line.map_err(|err| ExpectedError::ReadInputError { err })?;
        match parser.parse_line(&line) {
            Ok(Some(event)) => {
                stats.events += 1;
                report(reporter, &event);
            }
            Ok(None) => {}
            Err(err) => {
                stats.malformed += 1;
                warn!("{}", DisplayErrorChain::new(&err));
            }
        }
    }

    Ok(stats)
}

fn report(reporter: &CiReporter, event: &TestEvent) {
    if let Err(err) = reporter.report_event(event) {
        warn!("failed to display test event: {}", DisplayErrorChain::new(&err));
    }
}
