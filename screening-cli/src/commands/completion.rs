//! `screening completion`: tab completion for the screening subcommands and
//! their flags (`--age`, `--answers`, `--latitude`, ...).

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, shells::Shell};

/// Name the script registers completions under; matches the clap command name.
const COMMAND_NAME: &str = "screening";

/// Prints the completion script for `shell`, ready to be sourced or saved
/// into the shell's completion directory.
pub fn print_script(shell: Shell) {
    let mut command = crate::Cli::command();
    generate(shell, &mut command, COMMAND_NAME, &mut io::stdout());
}
