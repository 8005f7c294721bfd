use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipwrapped")]
#[command(version)]
#[command(about = "List ZIP archives and print their entries", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipwrapped -l assets.zip                 list entry paths\n  \
  zipwrapped -p assets.zip docs/README.md  print one entry\n  \
  zipwrapped -e png assets.zip > first.png print the first .png file")]
pub struct Cli {
    /// ZIP file path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to print (default: all files)
    #[arg(value_name = "NAMES")]
    pub names: Vec<String>,

    /// List entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print entry contents to stdout
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Print the first visible file with this extension
    #[arg(short = 'e', value_name = "EXT", conflicts_with = "names")]
    pub extension: Option<String>,

    /// Match entry names case-insensitively
    #[arg(short = 'C')]
    pub ignore_case: bool,

    /// Skip dot files and __MACOSX folders
    #[arg(short = 'H')]
    pub hide_hidden: bool,

    /// Load the archive into memory before opening it
    #[arg(short = 'm')]
    pub in_memory: bool,
}

impl Cli {
    pub fn is_listing(&self) -> bool {
        self.list || self.verbose
    }
}
