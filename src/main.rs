use rewind::config::ShellConfig;
use rewind::flags::Flags;
use rewind::shell::Shell;
use std::env;

fn main() -> Result<(), rewind::error::ShellError> {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    flags.parse(&args)?;

    if flags.is_set("help") {
        flags.print_help();
        return Ok(());
    }

    if flags.is_set("version") {
        println!("rewind {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = ShellConfig::from_flags(&flags)?;
    rewind::logging::init(config.debug);

    let mut shell = Shell::new(config)?;
    shell.run()
}
