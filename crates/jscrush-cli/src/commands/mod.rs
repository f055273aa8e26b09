use crate::commands::pack::PackArgs;

pub mod pack;

/// Subcommands for `jscrush`.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Compress an input program into a self-extracting artefact.
    Pack(PackArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Pack(cmd) => cmd.run(),
        }
    }
}
