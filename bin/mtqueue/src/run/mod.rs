use std::path::PathBuf;

use anyhow::Context;
use mtqueue_harness::{
    ConsumerContext, HarnessConfig, ProducerContext, TerminationStrategy, Transcript,
    WorkerHarness,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("run")
            .about("runs producers and consumers over one bounded queue and prints what moved")
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(PathBuf)),
            )
            .arg(
                clap::Arg::new("producers")
                    .long("producers")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("consumers")
                    .long("consumers")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("capacity")
                    .long("capacity")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("items")
                    .long("items")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("strategy")
                    .long("strategy")
                    .action(clap::ArgAction::Set)
                    .value_parser(["polling", "close"]),
            )
            .arg(
                clap::Arg::new("quiet")
                    .long("quiet")
                    .action(clap::ArgAction::SetTrue),
            ),
    )
}

/// Builds the harness configuration: defaults, then the TOML file when
/// given, then individual flags.
pub fn resolve_config(args: &clap::ArgMatches) -> anyhow::Result<HarnessConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => HarnessConfig::from_path(path.clone())
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => HarnessConfig::default(),
    };

    if let Some(count) = args.get_one::<usize>("producers") {
        config = config.producers(*count);
    }
    if let Some(count) = args.get_one::<usize>("consumers") {
        config = config.consumers(*count);
    }
    if let Some(capacity) = args.get_one::<usize>("capacity") {
        config = config.capacity(*capacity);
    }
    if let Some(count) = args.get_one::<usize>("items") {
        config = config.items_per_producer(*count);
    }
    if let Some(strategy) = args.get_one::<String>("strategy") {
        config = config.strategy(strategy.parse::<TerminationStrategy>()?);
    }

    config.validate()?;
    Ok(config)
}

pub fn run(args: &clap::ArgMatches) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = resolve_config(args)?;
    let transcript = if args.get_flag("quiet") {
        Transcript::silent()
    } else {
        Transcript::stdout()
    };

    mtqueue_logs::info!("Starting mtqueue run");

    let report = WorkerHarness::new(config)
        .with_transcript(transcript.clone())
        .run(produce, consume)?;

    transcript.line(report.to_string());

    if !report.is_balanced() {
        anyhow::bail!(
            "produced {} items but consumed {}",
            report.produced,
            report.consumed()
        );
    }

    Ok(())
}

fn produce(ctx: &mut ProducerContext<usize>) {
    for i in 0..ctx.items_per_producer() {
        let value = ctx.id() * 100 + i;
        if let Err(err) = ctx.enqueue(value) {
            mtqueue_logs::warn!(producer = ctx.id(), "stopping early: {}", err);
            return;
        }
        ctx.log(format!("[Producer {}] Enqueued: {}", ctx.id(), value));
    }
}

fn consume(ctx: &ConsumerContext, value: usize) {
    ctx.log(format!("[Consumer {}] Dequeued: {}", ctx.id(), value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_for(args: &[&str]) -> clap::ArgMatches {
        let command = register(clap::Command::new("mtqueue"));
        let matches = command
            .try_get_matches_from(args)
            .expect("arguments should parse");
        matches
            .subcommand_matches("run")
            .expect("run subcommand")
            .clone()
    }

    #[test]
    fn no_flags_gives_default_config() {
        let config = resolve_config(&matches_for(&["mtqueue", "run"])).expect("valid config");
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = resolve_config(&matches_for(&[
            "mtqueue",
            "run",
            "--producers",
            "5",
            "--consumers",
            "4",
            "--capacity",
            "1",
            "--items",
            "20",
            "--strategy",
            "polling",
        ]))
        .expect("valid config");

        assert_eq!(config.get_producers(), 5);
        assert_eq!(config.get_consumers(), 4);
        assert_eq!(config.get_capacity(), 1);
        assert_eq!(config.get_items_per_producer(), 20);
        assert_eq!(config.get_strategy(), TerminationStrategy::Polling);
    }

    #[test]
    fn zero_capacity_flag_is_rejected() {
        let result = resolve_config(&matches_for(&["mtqueue", "run", "--capacity", "0"]));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let command = register(clap::Command::new("mtqueue"));
        let result = command.try_get_matches_from(["mtqueue", "run", "--strategy", "sentinel"]);
        assert!(result.is_err());
    }

    #[test]
    fn demo_closures_log_in_the_expected_format() {
        let transcript = Transcript::in_memory();
        let report = WorkerHarness::new(HarnessConfig::new().producers(1).consumers(1))
            .with_transcript(transcript.clone())
            .run(produce, consume)
            .expect("harness run should succeed");

        assert!(report.is_balanced());
        let lines = transcript.lines();
        assert!(lines.contains(&String::from("[Producer 0] Enqueued: 4")));
        assert!(lines.contains(&String::from("[Consumer 0] Dequeued: 4")));
    }
}
