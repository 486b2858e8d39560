use ewe_practical::Demo;

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("list").about("lists every demonstration with a one-line summary"),
    )
}

pub fn run(_args: &clap::ArgMatches) {
    for demo in Demo::ALL {
        let marker = if demo.is_hazard() { " [named only]" } else { "" };
        println!("{:<20} {}{marker}", demo.name(), demo.summary());
    }
}
