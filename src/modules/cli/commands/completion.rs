//! Hidden command to generate shell completions.

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::Write;

/// Generate shell completion scripts.
///
/// Hidden from normal `--help` output; installers and packaging scripts call it.
#[derive(Args, Debug)]
pub struct CompletionCommand {
    /// Shell to generate completions for (e.g. bash, zsh)
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionCommand {
    pub fn execute(&self) {
        self.write_to(&mut std::io::stdout());
    }

    fn write_to(&self, out: &mut dyn Write) {
        let mut cmd = crate::Cli::command();
        generate(self.shell, &mut cmd, "neo4j-mcp", out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completion_lists_subcommands() {
        let mut out = Vec::new();
        CompletionCommand { shell: Shell::Bash }.write_to(&mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("neo4j-mcp"));
        assert!(script.contains("check"));
    }
}
