//! `todo`: a worked example of a cmdtree-based CLI.
//!
//! Outer process flags are parsed with clap; everything after them is
//! handed to the command tree.
//!
//! ```text
//! todo [-v...] [--output standard|buffer] <command words...>
//! ```

use clap::Parser;
use cmdtree::{Environment, ExecuteOptions, Outcome, OutputMode, Router};
use std::process::ExitCode;
use std::rc::Rc;

mod app;
mod help;
mod logging;
mod store;

#[derive(Parser, Debug)]
#[command(
    name = "todo",
    about = "A tiny todo list",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Capture command output and print it after the command finishes
    #[arg(long, env = "TODO_OUTPUT", default_value = "standard")]
    output: OutputMode,

    /// Command words, options and arguments for the command tree
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_stderr_logging(cli.verbose);

    let tree = match app::build(Rc::new(store::Store::new())) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("error: invalid command tree: {err}");
            return ExitCode::FAILURE;
        }
    };

    let options = ExecuteOptions::output(cli.output).with_environment(Environment::Cli);
    match Router::new(tree).execute(cli.command, options) {
        Outcome::Status(status) => status.into(),
        Outcome::Captured(captured) => {
            print!("{}", captured.stdout);
            eprint!("{}", captured.stderr);
            captured.status.into()
        }
    }
}
