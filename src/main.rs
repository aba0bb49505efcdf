//! rangestyle - style text with a rule file and print it to the terminal

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use log::info;

use rangestyle::{config, Result, StyleBuilder, TerminalSink};

struct Options {
    verbose: bool,
    ranges: bool,
    rules: PathBuf,
    input: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut verbose = false;
    let mut ranges = false;
    let mut positional = Vec::new();
    for arg in &args {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-V" => {
                print_version();
                return Ok(());
            }
            "--verbose" | "-v" => verbose = true,
            "--ranges" | "-r" => ranges = true,
            other if other.starts_with('-') && other != "-" => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(2);
            }
            other => positional.push(PathBuf::from(other)),
        }
    }

    let mut positional = positional.into_iter();
    let Some(rules) = positional.next() else {
        print_usage();
        process::exit(2);
    };
    let options = Options {
        verbose,
        ranges,
        rules,
        input: positional.next().filter(|p| p.as_os_str() != "-"),
    };

    init_logger(options.verbose);
    style_text(&options)
}

fn style_text(options: &Options) -> Result<()> {
    let composer = config::load(&options.rules)?;
    info!("loaded {} layers from {}", composer.len(), options.rules.display());

    let text = match &options.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut out = io::stdout().lock();
    if options.ranges {
        for range in composer.resolve(&text)? {
            let fields: Vec<String> = range
                .style
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            writeln!(out, "{}+{} {}", range.from, range.count, fields.join(" "))?;
        }
        return Ok(());
    }

    let mut sink = TerminalSink::new(&text);
    composer.apply(&text, &mut sink)?;
    sink.render(&text, &mut out)
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn print_usage() {
    println!("rangestyle {} - rule-based text styling", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: rangestyle [OPTIONS] RULES [FILE]");
    println!();
    println!("Styles FILE (or stdin) with the layers described in the TOML file RULES");
    println!("and prints it with terminal attributes.");
    println!();
    println!("Options:");
    println!("  -r, --ranges   Print resolved ranges (UTF-16 from+count and style) instead");
    println!("  -v, --verbose  Log resolution details to stderr");
    println!("  -h, --help     Show this help message");
    println!("  -V, --version  Show version information");
}

fn print_version() {
    println!("rangestyle {}", env!("CARGO_PKG_VERSION"));
}
