use simple_shell::{Args, Environment, Interpreter, ShellConfig, ShellError};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::process;

fn main() {
    env_logger::init();
    let args: Args = argh::from_env();
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());

    let config = ShellConfig::for_program(program.clone());
    let mut shell = Interpreter::new(config, Environment::from_process());

    let result = match args.script {
        Some(path) => match File::open(&path) {
            Ok(file) => {
                log::debug!("running script {}", path.display());
                shell.run_reader(BufReader::new(file))
            }
            Err(source) => {
                let err = ShellError::CantOpen { path, source };
                eprintln!("{program}: 0: {err}");
                process::exit(err.exit_code());
            }
        },
        None if io::stdin().is_terminal() => shell.run_interactive(),
        None => shell.run_reader(io::stdin().lock()),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{program}: {e:#}");
            process::exit(1);
        }
    }
}
