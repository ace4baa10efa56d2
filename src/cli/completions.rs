//! Shell completions module for Sitestack
//!
//! Provides shell completion scripts for bash, zsh, fish, powershell, and elvish.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};

use crate::cli::commands::CommandContext;
use crate::cli::Cli;

/// Arguments for the completions command
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Print installation instructions instead of the script
    #[arg(long)]
    pub instructions: bool,
}

impl CompletionsArgs {
    /// Execute the completions command
    pub async fn execute(&self, _ctx: &mut CommandContext) -> anyhow::Result<i32> {
        if self.instructions {
            print_installation_instructions(self.shell);
        } else {
            print!("{}", get_completions(self.shell));
        }
        Ok(0)
    }
}

/// Get completions as a string
pub fn get_completions(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, "sitestack", &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}

/// Print installation instructions for completions
pub fn print_installation_instructions(shell: Shell) {
    match shell {
        Shell::Bash => {
            println!("# Bash completion installation:");
            println!("# Add the following to your ~/.bashrc or ~/.bash_profile:");
            println!();
            println!("eval \"$(sitestack completions bash)\"");
            println!();
            println!("# Or save to file:");
            println!(
                "sitestack completions bash > ~/.local/share/bash-completion/completions/sitestack"
            );
        }
        Shell::Zsh => {
            println!("# Zsh completion installation:");
            println!("mkdir -p ~/.zsh/completions");
            println!("echo 'fpath=(~/.zsh/completions $fpath)' >> ~/.zshrc");
            println!("echo 'autoload -Uz compinit && compinit' >> ~/.zshrc");
            println!("sitestack completions zsh > ~/.zsh/completions/_sitestack");
        }
        Shell::Fish => {
            println!("# Fish completion installation:");
            println!("sitestack completions fish > ~/.config/fish/completions/sitestack.fish");
        }
        Shell::PowerShell => {
            println!("# PowerShell completion installation:");
            println!("# Add the following to your PowerShell profile:");
            println!();
            println!("Invoke-Expression (& sitestack completions powershell | Out-String)");
        }
        Shell::Elvish => {
            println!("# Elvish completion installation:");
            println!("# Add the following to ~/.elvish/rc.elv:");
            println!();
            println!("eval (sitestack completions elvish | slurp)");
        }
        _ => {
            println!("# Unknown shell. Please refer to your shell's documentation for completion installation.");
        }
    }
}
