use std::time::Duration;

use ewe_practical::{run_all, Demo, PracticalConfig, Transcript};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn millis_arg(name: &'static str, default: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(name)
        .long(name)
        .value_name("MS")
        .help(help)
        .action(clap::ArgAction::Set)
        .value_parser(clap::value_parser!(u64))
        .default_value(default)
}

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("run")
            .about("runs the named demonstrations in order")
            .arg(
                clap::Arg::new("demos")
                    .value_name("DEMO")
                    .num_args(0..)
                    .action(clap::ArgAction::Append)
                    .value_parser(clap::value_parser!(Demo)),
            )
            .arg(
                clap::Arg::new("all")
                    .long("all")
                    .help("runs every demonstration except the ones that hang by design")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                clap::Arg::new("workers")
                    .long("workers")
                    .value_name("N")
                    .help("worker tasks for bulk jobs [default: available parallelism]")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("pool-jobs")
                    .long("pool-jobs")
                    .value_name("N")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("1048576"),
            )
            .arg(
                clap::Arg::new("select-iterations")
                    .long("select-iterations")
                    .value_name("N")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("1000"),
            )
            .arg(millis_arg(
                "starvation-budget-ms",
                "1000",
                "how long each starvation worker runs",
            ))
            .arg(millis_arg(
                "deadlock-hold-ms",
                "2000",
                "how long each deadlock task holds its first lock",
            ))
            .arg(millis_arg(
                "deadlock-budget-ms",
                "5000",
                "how long to wait before reporting the deadlock",
            ))
            .arg(millis_arg(
                "signal-delay-ms",
                "5000",
                "delay before the stop signal in the select demonstrations",
            ))
            .arg(
                clap::Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("-v for debug logs, -vv for trace logs")
                    .action(clap::ArgAction::Count),
            )
            .arg_required_else_help(true),
    )
}

fn millis(args: &clap::ArgMatches, name: &str) -> Option<Duration> {
    args.get_one::<u64>(name).copied().map(Duration::from_millis)
}

fn config_from(args: &clap::ArgMatches) -> PracticalConfig {
    let mut config = PracticalConfig::default();
    if let Some(workers) = args.get_one::<usize>("workers") {
        config = config.with_workers(*workers);
    }
    if let Some(jobs) = args.get_one::<usize>("pool-jobs") {
        config = config.with_pool_jobs(*jobs);
    }
    if let Some(iterations) = args.get_one::<usize>("select-iterations") {
        config = config.with_select_iterations(*iterations);
    }
    if let Some(budget) = millis(args, "starvation-budget-ms") {
        config = config.with_starvation_budget(budget);
    }
    if let Some(hold) = millis(args, "deadlock-hold-ms") {
        config = config.with_deadlock_hold(hold);
    }
    if let Some(budget) = millis(args, "deadlock-budget-ms") {
        config = config.with_deadlock_budget(budget);
    }
    if let Some(delay) = millis(args, "signal-delay-ms") {
        config = config.with_signal_delay(delay);
    }
    config
}

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn run(args: &clap::ArgMatches) -> std::result::Result<(), BoxedError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.get_count("verbose")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let named: Vec<Demo> = args
        .get_many::<Demo>("demos")
        .map(|demos| demos.copied().collect())
        .unwrap_or_default();

    let mut selected: Vec<Demo> = if args.get_flag("all") {
        Demo::safe().collect()
    } else {
        Vec::new()
    };
    for demo in named {
        if !selected.contains(&demo) {
            selected.push(demo);
        }
    }

    if selected.is_empty() {
        return Err("name at least one demonstration or pass --all".into());
    }

    let config = config_from(args);
    tracing::debug!(?config, demos = selected.len(), "starting demonstrations");

    let transcript = Transcript::stdout();
    for demo in selected {
        println!("== {demo}");
        run_all([demo], &config, &transcript)?;
        println!();
    }
    Ok(())
}
