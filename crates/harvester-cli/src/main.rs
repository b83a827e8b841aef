mod config;
mod render;

use std::env;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use harvester_core::{
    sort_records, stop_pair, BusinessRecord, CategoryFilter, Crawl, ExtractedSet, FixtureCrawler,
    FixtureStore, Harvester, Pacing, PostalCodeGroup, Progress, ProgressTx, ResultFilter,
    SearchQuery, SearchResults, SortDirection, SortField, Stop,
};
use harvester_export::export_records;
use harvester_http::HttpCrawler;
use tokio::runtime;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use crate::config::FileConfig;

/// Local Business Harvester
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "search")]
    Search(SearchArgs),
    #[command(name = "harvest")]
    Harvest(HarvestArgs),
    #[command(name = "check-key")]
    CheckKey(CheckKeyArgs),
    #[command(hide = true)]
    Completion,
}

/// Options shared by every command that runs the harvester
#[derive(Debug, clap::Args)]
pub struct CommonArgs {
    /// Optional yaml configuration file
    #[arg(env = "HARVESTER_CONFIG", long)]
    pub config: Option<PathBuf>,
    /// Override the minimum number of local results before supplementing
    #[arg(long)]
    pub min_results: Option<usize>,
    /// Override how many postal codes are looked up at once
    #[arg(long)]
    pub lookup_concurrency: Option<usize>,
    /// Seed the synthetic directory for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,
    /// Skip the simulated latencies
    #[arg(long)]
    pub no_latency: bool,
    /// Crawl API key, enables crawling through the API
    #[arg(env = "HARVESTER_API_KEY", long, hide_env_values = true)]
    pub api_key: Option<String>,
    /// Override the crawl API endpoint
    #[arg(long)]
    pub api_endpoint: Option<String>,
    /// No SIGINT handling, an interrupted run is not exported
    #[arg(long)]
    pub no_sigint: bool,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CommonArgs> for FileConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CommonArgs) -> Result<Self, Self::Error> {
        let mut conf = FileConfig::load(args.config.as_deref())?;
        if let Some(min_results) = args.min_results {
            conf.harvester.min_results = min_results;
        }
        if let Some(lookup_concurrency) = args.lookup_concurrency {
            conf.harvester.lookup_concurrency = lookup_concurrency;
        }
        if let Some(seed) = args.seed {
            conf.harvester.directory_seed = Some(seed);
        }
        if args.no_latency {
            conf.harvester.latency = harvester_core::Latency::none();
            conf.export.latency_ms = 0;
        }
        if let Some(api_key) = &args.api_key {
            conf.crawl_api.api_key = Some(api_key.to_string());
        }
        if let Some(endpoint) = &args.api_endpoint {
            conf.crawl_api.endpoint = endpoint.to_string();
        }
        if args.no_sigint {
            conf.harvester.handle_sigint = false;
        }
        Ok(conf)
    }
}

/// Which businesses to show and in what order
#[derive(Debug, clap::Args)]
pub struct ViewArgs {
    /// Only businesses with an email address
    #[arg(long)]
    pub has_email: bool,
    /// Only businesses with a phone number
    #[arg(long)]
    pub has_phone: bool,
    /// Sort by this field
    #[arg(value_enum, long)]
    pub sort: Option<SortField>,
    /// Sort in descending order
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl ViewArgs {
    fn filter(&self) -> ResultFilter {
        ResultFilter {
            has_email: self.has_email,
            has_phone: self.has_phone,
        }
    }

    fn direction(&self) -> SortDirection {
        if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    fn apply(&self, records: &[BusinessRecord]) -> Vec<BusinessRecord> {
        let mut view: Vec<_> = self.filter().apply(records).into_iter().cloned().collect();
        if let Some(field) = self.sort {
            sort_records(&mut view, field, self.direction());
        }
        view
    }

    /// Filters and sorts within each postal code, groups keep their order.
    fn apply_grouped(&self, results: &SearchResults) -> SearchResults {
        let groups = results
            .postal_code_breakdown
            .iter()
            .map(|group| PostalCodeGroup {
                postal_code: group.postal_code.clone(),
                businesses: self.apply(&group.businesses),
            })
            .collect();
        SearchResults::from_groups(groups)
    }
}

/// Search restaurants and hotels for a city or postal code
#[derive(Debug, clap::Args)]
pub struct SearchArgs {
    /// City name, postal code or postal code prefix
    pub location: String,
    /// Restrict the search to a category
    #[arg(value_enum, long, short, default_value_t = CategoryFilter::Both)]
    pub category: CategoryFilter,
    /// Group the results per postal code
    #[arg(long, conflicts_with = "json")]
    pub breakdown: bool,
    /// Print the results as json
    #[arg(long)]
    pub json: bool,
    #[command(flatten)]
    pub view: ViewArgs,
    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn search(args: SearchArgs) -> anyhow::Result<()> {
    let conf: FileConfig = (&args.common).try_into()?;
    let query = SearchQuery::new(&args.location, args.category)?;

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let results = rt.block_on(run_search(&conf, &query))?;

    let mut out = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &args.view.apply_grouped(&results))?;
        writeln!(out)?;
    } else if args.breakdown {
        render::breakdown(&mut out, &args.view.apply_grouped(&results))?;
    } else {
        let view = args.view.apply(&results.businesses);
        render::table(&mut out, &view)?;
        writeln!(
            out,
            "\n{} of {} businesses in {} postal codes",
            view.len(),
            results.total_count,
            results.postal_code_breakdown.len()
        )?;
    }
    Ok(())
}

async fn run_search(conf: &FileConfig, query: &SearchQuery) -> anyhow::Result<SearchResults> {
    let stop = stop_on_interrupt(conf.harvester.handle_sigint);
    let harvester = build_harvester(conf)?;
    harvester.search(query, &stop).await
}

/// Search, enrich every result and export them to a spreadsheet
#[derive(Debug, clap::Args)]
pub struct HarvestArgs {
    /// City name, postal code or postal code prefix
    pub location: String,
    /// Restrict the search to a category
    #[arg(value_enum, long, short, default_value_t = CategoryFilter::Both)]
    pub category: CategoryFilter,
    /// Override the export directory
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,
    /// Override the export file name prefix
    #[arg(long)]
    pub prefix: Option<String>,
    /// Enrichment pacing: `sequential[:DELAY_MS]`, `concurrent[:N]` or `per-second:N`
    #[arg(long, value_parser = parse_pacing)]
    pub pacing: Option<Pacing>,
    /// Also enrich businesses found through the directory search
    #[arg(long)]
    pub enrich_unlisted: bool,
    #[command(flatten)]
    pub view: ViewArgs,
    #[command(flatten)]
    pub common: CommonArgs,
}

impl TryFrom<&HarvestArgs> for FileConfig {
    type Error = anyhow::Error;

    fn try_from(args: &HarvestArgs) -> Result<Self, Self::Error> {
        let mut conf: FileConfig = (&args.common).try_into()?;
        if let Some(output_dir) = &args.output_dir {
            conf.export.output_dir = output_dir.clone();
        }
        if let Some(prefix) = &args.prefix {
            conf.export.file_prefix = prefix.to_string();
        }
        if let Some(pacing) = args.pacing {
            conf.harvester.pacing = pacing;
        }
        if args.enrich_unlisted {
            conf.harvester.enrich_unlisted = true;
        }
        Ok(conf)
    }
}

fn parse_pacing(s: &str) -> Result<Pacing, String> {
    let (kind, arg) = match s.split_once(':') {
        Some((kind, arg)) => (kind, Some(arg)),
        None => (s, None),
    };
    let count = |arg: &str| {
        arg.parse::<NonZeroUsize>()
            .map_err(|e| format!("Invalid count {arg:?}: {e}"))
    };
    match (kind, arg) {
        ("sequential", None) => Ok(Pacing::default()),
        ("sequential", Some(ms)) => ms
            .parse()
            .map(|delay_ms| Pacing::Sequential { delay_ms })
            .map_err(|e| format!("Invalid delay {ms:?}: {e}")),
        ("concurrent", None) => Ok(Pacing::concurrent_per_cpu()),
        ("concurrent", Some(n)) => count(n).map(Pacing::Concurrent),
        ("per-second", Some(n)) => count(n).map(Pacing::PerSecond),
        ("per-second", None) => Err("per-second pacing needs a rate, e.g. per-second:2".into()),
        _ => Err(format!("Unknown pacing {s:?}")),
    }
}

pub fn harvest(args: HarvestArgs) -> anyhow::Result<()> {
    let conf: FileConfig = (&args).try_into()?;
    let query = SearchQuery::new(&args.location, args.category)?;

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    if !rt.block_on(run_harvest(&conf, &query, &args.view))? {
        anyhow::bail!("Nothing was exported");
    }
    Ok(())
}

async fn run_harvest(
    conf: &FileConfig,
    query: &SearchQuery,
    view: &ViewArgs,
) -> anyhow::Result<bool> {
    let stop = stop_on_interrupt(conf.harvester.handle_sigint);
    let harvester = build_harvester(conf)?;

    let results = harvester.search(query, &stop).await?;
    let selected = view.apply(&results.businesses);
    log::info!(
        "Enriching {} of {} businesses found",
        selected.len(),
        results.total_count
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report_progress(rx));
    let report = harvester
        .enrich_all(&selected, &stop, &ProgressTx::new(tx))
        .await?;
    reporter.await?;

    if report.cancelled {
        log::warn!(
            "Interrupted, {} enriched businesses are not exported",
            report.enriched.len()
        );
        return Ok(false);
    }

    let mut extracted = ExtractedSet::new();
    extracted.extend(report.enriched);
    Ok(export_records(extracted.records(), &conf.export, &stop).await)
}

async fn report_progress(rx: mpsc::UnboundedReceiver<Progress>) {
    let mut events = UnboundedReceiverStream::new(rx);
    while let Some(event) = events.next().await {
        match event {
            Progress::Started { total } => log::info!("Extracting data from {total} businesses"),
            Progress::Enriched { id, .. } => {
                log::info!("Extracted {id} ({}%)", event.percent())
            }
            Progress::Skipped { id, .. } => {
                log::warn!("Nothing extracted for {id} ({}%)", event.percent())
            }
            Progress::Finished {
                done,
                total,
                cancelled,
            } => log::info!("Extraction finished: {done}/{total}, cancelled: {cancelled}"),
        }
    }
}

/// Check that the configured crawl API key is accepted
#[derive(Debug, clap::Args)]
pub struct CheckKeyArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn check_key(args: CheckKeyArgs) -> anyhow::Result<()> {
    let conf: FileConfig = (&args.common).try_into()?;
    let crawler = HttpCrawler::new(conf.crawl_api)?;

    let rt = runtime::Builder::new_current_thread().enable_all().build()?;
    if rt.block_on(crawler.test_api_key()) {
        println!("API key is valid");
        Ok(())
    } else {
        anyhow::bail!("API key was rejected by {}", crawler.scrape_url())
    }
}

/// Must be called from within the runtime.
fn stop_on_interrupt(handle_sigint: bool) -> Stop {
    let (handle, stop) = stop_pair();
    if handle_sigint {
        handle.stop_on_ctrl_c();
    }
    stop
}

fn build_harvester(conf: &FileConfig) -> anyhow::Result<Harvester> {
    let crawler: Arc<dyn Crawl> = if conf.crawl_api.is_configured() {
        log::info!("Crawling through {}", conf.crawl_api.endpoint);
        Arc::new(HttpCrawler::new(conf.crawl_api.clone())?)
    } else {
        Arc::new(FixtureCrawler::new(FixtureStore::shared()))
    };
    Ok(Harvester::with_crawler(conf.harvester.clone(), crawler))
}

fn init_logs(quiet: bool) {
    if quiet {
        return;
    }
    if env::var_os("RUST_LOG").is_none() {
        env::set_var(
            "RUST_LOG",
            "harvester=info,harvester_core=info,harvester_export=info,harvester_http=warn",
        );
    }
    env_logger::init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Search(args) => {
            init_logs(args.common.quiet || args.json);
            search(args)
        }
        SubCommand::Harvest(args) => {
            init_logs(args.common.quiet);
            harvest(args)
        }
        SubCommand::CheckKey(args) => {
            init_logs(args.common.quiet);
            check_key(args)
        }
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "harvester", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_parses_every_strategy() {
        assert_eq!(Ok(Pacing::default()), parse_pacing("sequential"));
        assert_eq!(
            Ok(Pacing::Sequential { delay_ms: 250 }),
            parse_pacing("sequential:250")
        );
        assert_eq!(
            Ok(Pacing::Concurrent(NonZeroUsize::new(4).unwrap())),
            parse_pacing("concurrent:4")
        );
        assert_eq!(
            Ok(Pacing::PerSecond(NonZeroUsize::new(2).unwrap())),
            parse_pacing("per-second:2")
        );
        assert!(parse_pacing("per-second").is_err());
        assert!(parse_pacing("concurrent:0").is_err());
        assert!(parse_pacing("turbo").is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.yaml");
        std::fs::write(
            &path,
            "harvester:\n  minResults: 5\n  lookupConcurrency: 2\nexport:\n  filePrefix: berlin\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "harvester",
            "harvest",
            "Berlin",
            "--config",
            path.to_str().unwrap(),
            "--min-results",
            "1",
            "--pacing",
            "concurrent:3",
            "--no-latency",
            "--no-sigint",
        ])
        .unwrap();
        let SubCommand::Harvest(args) = args.cmd else {
            panic!("expected the harvest command");
        };

        let conf: FileConfig = (&args).try_into().unwrap();
        assert_eq!(1, conf.harvester.min_results);
        assert_eq!(2, conf.harvester.lookup_concurrency);
        assert_eq!("berlin", conf.export.file_prefix);
        assert_eq!(0, conf.export.latency_ms);
        assert_eq!(0, conf.harvester.latency.resolve_ms);
        assert!(!conf.harvester.handle_sigint);
        assert_eq!(
            Pacing::Concurrent(NonZeroUsize::new(3).unwrap()),
            conf.harvester.pacing
        );
    }

    #[test]
    fn pacing_reads_camel_case_yaml() {
        let conf: FileConfig =
            serde_yaml::from_str("harvester:\n  pacing:\n    sequential:\n      delayMs: 250\n")
                .unwrap();
        assert_eq!(Pacing::Sequential { delay_ms: 250 }, conf.harvester.pacing);

        let conf: FileConfig =
            serde_yaml::from_str("harvester:\n  pacing:\n    perSecond: 2\n").unwrap();
        assert_eq!(
            Pacing::PerSecond(NonZeroUsize::new(2).unwrap()),
            conf.harvester.pacing
        );
    }

    fn grouped_sample() -> SearchResults {
        let store = FixtureStore::shared();
        let group = |code: &str| PostalCodeGroup {
            postal_code: code.to_string(),
            businesses: store
                .iter()
                .filter(|r| r.postal_code.as_deref() == Some(code))
                .cloned()
                .collect(),
        };
        let mut bare = BusinessRecord::new("Alpha Inn", harvester_core::Category::Hotel)
            .with_postal_code("10117");
        bare.phone = Some("+49 30 1".into());
        let mut groups = vec![group("10115"), group("10117"), group("10785")];
        groups[1].businesses.push(bare);
        SearchResults::from_groups(groups)
    }

    fn view_args(extra: &[&str]) -> ViewArgs {
        let args = Args::try_parse_from(
            ["harvester", "search", "Berlin", "--json"]
                .iter()
                .chain(extra),
        )
        .unwrap();
        let SubCommand::Search(args) = args.cmd else {
            panic!("expected the search command");
        };
        args.view
    }

    #[test]
    fn grouped_view_keeps_flat_list_and_groups_consistent() {
        let results = grouped_sample();
        let view = view_args(&["--sort", "name", "--desc", "--has-email"]);

        let shown = view.apply_grouped(&results);

        let flat: Vec<_> = shown
            .postal_code_breakdown
            .iter()
            .flat_map(|g| g.businesses.iter().cloned())
            .collect();
        assert_eq!(flat, shown.businesses);
        assert_eq!(shown.businesses.len(), shown.total_count);
        assert_eq!(
            vec!["10115", "10117", "10785"],
            shown.postal_codes().collect::<Vec<_>>()
        );
        let names: Vec<_> = shown.businesses.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            vec![
                "Ristorante Bella Italia",
                "Sushi Palace",
                "Grand Hotel Berlin",
                "City Park Hotel"
            ],
            names
        );

        let json = serde_json::to_value(&shown).unwrap();
        assert_eq!(4, json["totalCount"]);
        assert_eq!(2, json["postalCodeBreakdown"][1]["businesses"].as_array().unwrap().len());
    }

    #[test]
    fn command_line_is_well_formed() {
        Args::command().debug_assert();
    }
}
