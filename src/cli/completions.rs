use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    falcon-linux-install completions bash > /etc/bash_completion.d/falcon-linux-install\n\n\
                  Generate zsh completions:\n    falcon-linux-install completions zsh > ~/.zfunc/_falcon-linux-install")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
