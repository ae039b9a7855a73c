use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "doclabel",
    about = "Label documents on a 2D embedding projection"
)]
pub struct Cli {
    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show row count, columns and label distribution of an input file
    Status(StatusArgs),
    /// Print the documents matching label and keyword filters
    View(ViewArgs),
    /// Start an interactive labeling session on stdin
    Session(SessionArgs),
    /// Start MCP server for driving a labeling session
    Mcp(SessionArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Delimited input file with x, y, text and optional label columns
    pub input: PathBuf,

    /// Field delimiter of the input file
    #[arg(short, long, default_value = ";")]
    pub delimiter: char,
}

impl InputArgs {
    /// The delimiter as a single byte, as required by the CSV reader.
    pub fn delimiter_byte(&self) -> crate::error::Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                crate::error::Error::Config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- View --

#[derive(Debug, Parser)]
pub struct ViewArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Show only documents with this label (repeatable)
    #[arg(short = 'l', long = "label")]
    pub labels: Vec<String>,

    /// Show only documents whose text contains this keyword (repeatable)
    #[arg(short = 'k', long = "keyword")]
    pub keywords: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Session / MCP --

#[derive(Debug, Parser)]
pub struct SessionArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for exported files (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "doclabel",
            &mut std::io::stdout(),
        );
    }
}
