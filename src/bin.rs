use std::process;

use structopt::StructOpt;
use treelox::{run_file, run_prompt, LoxError, RunOptions};

/// Run a lox script, or start a prompt when no script is given.
#[derive(StructOpt)]
struct Cli {
    /// Path to a lox file.
    #[structopt(parse(from_os_str))]
    script: Option<std::path::PathBuf>,

    /// Print the scanned tokens before parsing.
    #[structopt(long)]
    dump_tokens: bool,

    /// Print the parsed syntax tree before running it.
    #[structopt(long)]
    dump_ast: bool,
}

fn main() {
    env_logger::init();

    let args = Cli::from_args();
    let options = RunOptions {
        dump_tokens: args.dump_tokens,
        dump_ast: args.dump_ast,
        capture_output: false,
    };

    let result = match args.script {
        Some(path) => run_file(path, options).map(|_| ()),
        None => run_prompt(options),
    };

    if let Err(err) = result {
        eprintln!("{:#}", err);
        let code = err.downcast_ref::<LoxError>().map_or(1, LoxError::exit_code);
        process::exit(code);
    }
}
