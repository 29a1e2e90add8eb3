mod run;

fn main() -> anyhow::Result<()> {
    let commander = run::register(
        clap::Command::new("mtqueue")
            .about("Bounded multi-producer/multi-consumer queue demonstrations")
            .arg_required_else_help(true),
    );

    let matches = commander.get_matches();
    if let Some(("run", arguments)) = matches.subcommand() {
        run::run(arguments)?;
    }

    Ok(())
}
