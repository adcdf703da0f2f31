//! sheetcalc - edit and inspect spreadsheet documents from the command line

mod config;

use anyhow::{Context, Result, bail};
use log::debug;
use sheetcalc_core::Spreadsheet;
use sheetcalc_engine::engine::format_value;
use std::env;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("Usage: sheetcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet document to open (.xml)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <NAME=CONTENT>  Set a cell (can be repeated)");
    eprintln!("  -g, --get <NAME>          Print a cell's value (can be repeated)");
    eprintln!("  -l, --list                Print every non-empty cell");
    eprintln!("  -o, --output <FILE>       Save the document");
    eprintln!("  --config <FILE>           Load settings from TOML file");
    eprintln!("  --version-tag <TAG>       Document version tag (overrides config)");
    eprintln!("  -h, --help                Print help");
}

/// Edits and reads, applied in command-line order.
enum Step {
    Set { name: String, content: String },
    Get(String),
}

struct Options {
    file_path: Option<PathBuf>,
    steps: Vec<Step>,
    list: bool,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    version_tag: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut opts = Options {
        file_path: None,
        steps: Vec::new(),
        list: false,
        output_file: None,
        config_file: None,
        version_tag: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-s" | "--set" => {
                i += 1;
                let Some(arg) = args.get(i) else {
                    bail!("--set requires NAME=CONTENT");
                };
                let Some((name, content)) = arg.split_once('=') else {
                    bail!("--set expects NAME=CONTENT, got {:?}", arg);
                };
                opts.steps.push(Step::Set {
                    name: name.trim().to_string(),
                    content: content.to_string(),
                });
            }
            "-g" | "--get" => {
                i += 1;
                let Some(name) = args.get(i) else {
                    bail!("--get requires a cell name");
                };
                opts.steps.push(Step::Get(name.trim().to_string()));
            }
            "-l" | "--list" => opts.list = true,
            "-o" | "--output" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--output requires a file path");
                };
                opts.output_file = Some(PathBuf::from(path));
            }
            "--config" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--config requires a file path");
                };
                opts.config_file = Some(PathBuf::from(path));
            }
            "--version-tag" => {
                i += 1;
                let Some(tag) = args.get(i) else {
                    bail!("--version-tag requires a value");
                };
                opts.version_tag = Some(tag.to_string());
            }
            arg if arg.starts_with('-') => bail!("Unknown option: {}", arg),
            _ => {
                if opts.file_path.is_none() {
                    opts.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    bail!("Unexpected argument: {}", args[i]);
                }
            }
        }
        i += 1;
    }

    Ok(Some(opts))
}

fn run(opts: Options) -> Result<()> {
    let (config, warnings) = config::load_config(opts.config_file.as_ref())?;
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let version = opts.version_tag.unwrap_or_else(|| config.version.clone());
    let policy = config.name_policy();
    debug!("document version tag {:?}", version);

    let mut sheet = match &opts.file_path {
        Some(path) => Spreadsheet::load(path, policy, &version)?,
        None => Spreadsheet::with_policy(policy, version),
    };

    for step in &opts.steps {
        match step {
            Step::Set { name, content } => {
                let affected = sheet
                    .edit_cell(name, content)
                    .with_context(|| format!("cannot set {}", name))?;
                let names: Vec<&str> = affected.iter().map(|n| n.as_str()).collect();
                println!("{}: affected {}", name, names.join(", "));
            }
            Step::Get(name) => {
                let value = sheet
                    .get_value(name)
                    .with_context(|| format!("cannot read {}", name))?;
                println!("{} = {}", name, format_value(&value));
            }
        }
    }

    let nothing_requested = opts.steps.is_empty() && opts.output_file.is_none();
    if opts.list || nothing_requested {
        for name in sheet.nonempty_cell_names() {
            let content = sheet.get_content(name.as_str())?;
            let value = sheet.get_value(name.as_str())?;
            println!(
                "{}: {} = {}",
                name,
                content.to_input_string(),
                format_value(&value)
            );
        }
    }

    if let Some(output_path) = &opts.output_file {
        sheet.save(output_path)?;
        println!("Saved to {}", output_path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let opts = match parse_args(&args) {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(opts) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sheetcalc")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_steps_in_order() {
        let opts = parse_args(&args(&["-s", "A1=5", "--get", "A1", "--set", "B1==A1*2"]))
            .unwrap()
            .unwrap();
        assert_eq!(opts.steps.len(), 3);
        match &opts.steps[2] {
            Step::Set { name, content } => {
                assert_eq!(name, "B1");
                assert_eq!(content, "=A1*2");
            }
            Step::Get(_) => panic!("expected a set"),
        }
        assert!(matches!(&opts.steps[1], Step::Get(n) if n == "A1"));
    }

    #[test]
    fn test_parse_file_and_flags() {
        let opts = parse_args(&args(&["doc.xml", "-l", "-o", "out.xml", "--version-tag", "v2"]))
            .unwrap()
            .unwrap();
        assert_eq!(opts.file_path, Some(PathBuf::from("doc.xml")));
        assert!(opts.list);
        assert_eq!(opts.output_file, Some(PathBuf::from("out.xml")));
        assert_eq!(opts.version_tag.as_deref(), Some("v2"));
    }

    #[test]
    fn test_parse_help() {
        assert!(parse_args(&args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&args(&["--set"])).is_err());
        assert!(parse_args(&args(&["--set", "A1"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(parse_args(&args(&["a.xml", "b.xml"])).is_err());
    }
}
