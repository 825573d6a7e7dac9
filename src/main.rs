//! HR Assistant: console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env/config)
//!   4. Init logger once
//!   5. Load the policy table (built-in or `knowledge_file`)
//!   6. Start the session (decides remote vs local once)
//!   7. Run the console until quit / Ctrl-C / EOF

use std::sync::Arc;

use tracing::info;

use hr_assistant::{config, console, error::AppError, logger, KnowledgeBase, Session};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config_path: Option<String>,
    log_level: Option<&'static str>,
    force_local: bool,
    help: bool,
}

const USAGE: &str = "Usage: hr-assistant [OPTIONS]

Options:
  -h, --help            Print help
  -f, --config <PATH>   Path to configuration file (default: config/default.toml)
  -l, --local           Never call the remote model
  -v, -vv, -vvv         Increase logging verbosity";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args(std::env::args().skip(1)).map_err(AppError::Config)?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = config::load(args.config_path.as_deref())?;
    if args.force_local {
        config.llm.enabled = false;
    }

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        assistant = %config.assistant_name,
        provider = %config.llm.provider,
        configured = config.is_configured(),
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let knowledge = match &config.knowledge_file {
        Some(path) => {
            let kb = KnowledgeBase::load(path)?;
            info!(path = %path.display(), topics = kb.topics().len(), "policy table loaded");
            kb
        }
        None => KnowledgeBase::builtin(),
    };

    let session = Session::start(&config, Arc::new(knowledge));
    console::run(session, &config.assistant_name).await
}

fn parse_cli_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs, String> {
    let mut out = CliArgs::default();
    let mut verbosity = 0usize;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--" => break,
            "-h" | "--help" => out.help = true,
            "-l" | "--local" => out.force_local = true,
            "-f" | "--config" => {
                let path = iter.next().ok_or("-f/--config requires a path argument")?;
                out.config_path = Some(path);
            }
            "--verbose" => verbosity += 1,
            a if a.len() > 1 && a.starts_with('-') && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity += a.len() - 1;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }

    // Each -v raises verbosity one tier above the quiet default:
    //   -v → info, -vv → debug, -vvv+ → trace (full payload dumps)
    out.log_level = match verbosity {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        parse_cli_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_is_default() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn verbosity_tiers() {
        assert_eq!(parse(&["-v"]).unwrap().log_level, Some("info"));
        assert_eq!(parse(&["-vv"]).unwrap().log_level, Some("debug"));
        assert_eq!(parse(&["-v", "--verbose", "-v"]).unwrap().log_level, Some("trace"));
    }

    #[test]
    fn config_path_and_local() {
        let args = parse(&["-f", "my.toml", "--local"]).unwrap();
        assert_eq!(args.config_path.as_deref(), Some("my.toml"));
        assert!(args.force_local);
    }

    #[test]
    fn missing_config_path_errors() {
        assert!(parse(&["--config"]).is_err());
    }

    #[test]
    fn unknown_argument_errors() {
        assert!(parse(&["--bogus"]).unwrap_err().contains("--bogus"));
    }
}
