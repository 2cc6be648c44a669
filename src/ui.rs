use console::Style;
use xkpass::generator::MIN_SAFE_WORD_COUNT;
use xkpass::{PassphraseRequest, WordList};
use zeroize::Zeroizing;

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("\u{2713}", "!")
    } else {
        ("+", "!")
    }
}

pub fn get_branch_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("\u{251c}\u{2500}", "\u{2514}\u{2500}")
    } else {
        ("|-", "`-")
    }
}

pub fn display_output(
    passphrases: &[Zeroizing<String>],
    request: &PassphraseRequest,
    wordlist: &WordList,
    options: &DisplayOptions,
) {
    if options.quiet {
        for passphrase in passphrases {
            println!("{}", &**passphrase);
        }
        return;
    }

    for (i, passphrase) in passphrases.iter().enumerate() {
        println!("Out[{}]: {}", i, &**passphrase);
    }
    println!();

    for line in render_settings(request, wordlist, options) {
        println!("{}", line);
    }
}

fn render_settings(
    request: &PassphraseRequest,
    wordlist: &WordList,
    options: &DisplayOptions,
) -> Vec<String> {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last) = get_branch_symbols(options.unicode_support);

    let words_secure = request.words >= MIN_SAFE_WORD_COUNT;
    let words_style = if options.color_support {
        if words_secure {
            Style::new().green()
        } else {
            Style::new().yellow()
        }
    } else {
        Style::new()
    };
    let words_status = if words_secure { check_ok } else { check_warn };

    let mut lines = vec![
        "Settings:".to_string(),
        format!("  {} Keystream  ChaCha20 (256-bit, OS-seeded)", branch),
        format!("  {} Sampling   Unbiased rejection, no replacement", branch),
        format!(
            "  {} Wordlist   {} ({} {})",
            branch,
            wordlist.source(),
            wordlist.len(),
            if wordlist.len() == 1 { "word" } else { "words" }
        ),
        format!(
            "  {} Words      {} {} {}",
            branch,
            words_style.apply_to(format!("[{}]", words_status)),
            words_style.apply_to(request.words),
            if request.words == 1 { "word" } else { "words" }
        ),
    ];

    if request.digits > 0 {
        lines.push(format!(
            "  {} Digits     {} {}",
            last,
            request.digits,
            if request.digits == 1 { "digit" } else { "digits" }
        ));
    } else {
        lines.push(format!("  {} Digits     none", last));
    }

    if !words_secure {
        lines.push(String::new());
        lines.push(format!(
            "{} Fewer than {} words makes a weak passphrase",
            words_style.apply_to(format!("[{}]", check_warn)),
            MIN_SAFE_WORD_COUNT
        ));
    }

    lines
}
