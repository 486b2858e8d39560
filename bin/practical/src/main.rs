mod list;
mod run;

use foundation_sync::fault_of;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Makes every fault terminate the process, as an unrecoverable misuse
/// should, while plain panics keep the default behaviour.
fn install_fault_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(fault) = fault_of(info.payload()) {
            let task = std::thread::current()
                .name()
                .unwrap_or("<unnamed>")
                .to_owned();
            tracing::error!(%fault, task = %task, "fatal fault, aborting");
            eprintln!("fatal error: {fault} (in task {task})");
            std::process::abort();
        }
        default_hook(info);
    }));
}

fn main() -> std::result::Result<(), BoxedError> {
    install_fault_hook();

    let commander = run::register(list::register(
        clap::Command::new("practical")
            .about("Runs the practical concurrency demonstrations")
            .arg_required_else_help(true),
    ));

    let matches = commander.get_matches();
    match matches.subcommand() {
        Some(("list", arguments)) => list::run(arguments),
        Some(("run", arguments)) => run::run(arguments)?,
        _ => {}
    }

    Ok(())
}
