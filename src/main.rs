mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use xkpass::generator::DEFAULT_WORD_COUNT;
use xkpass::{Generator, GeneratorConfig, PassphraseRequest};

#[derive(Parser)]
#[command(
    name = "xkpass",
    version,
    about = "Memorable passphrases from randomly drawn words"
)]
struct Cli {
    /// Number of words to draw
    #[arg(short, long, default_value_t = DEFAULT_WORD_COUNT)]
    words: usize,

    /// Width of the random numeric suffix (0 for none)
    #[arg(short, long, default_value_t = 0)]
    digits: u32,

    /// Wordlist provider name or path to a file with one word per line
    #[arg(short = 'l', long)]
    wordlist: Option<String>,

    /// Number of passphrases to print
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Print passphrases only
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = GeneratorConfig::default();
    if let Some(spec) = cli.wordlist {
        config = config.with_wordlist(spec);
    }
    let generator = Generator::new(config).context("Failed to set up passphrase generator")?;

    let request = PassphraseRequest::new(cli.words).with_digits(cli.digits);
    let passphrases = (0..cli.count)
        .map(|_| generator.produce(&request))
        .collect::<xkpass::Result<Vec<_>>>()
        .context("Failed to generate passphrase")?;

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    ui::display_output(&passphrases, &request, generator.wordlist(), &options);

    Ok(())
}
