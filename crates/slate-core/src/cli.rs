use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "slate",
    version,
    about = "Slate: a Linear-style task tracker",
    disable_help_subcommand = true,
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "slaterc")]
    pub slaterc: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// A resolved command line: one command name plus its arguments,
/// with the configured default command filled in when none is given.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let mut words = Vec::with_capacity(rest.len());
        for raw in rest {
            let word = raw
                .into_string()
                .map_err(|bad| anyhow!("argument is not valid UTF-8: {bad:?}"))?;
            words.push(word);
        }

        let mut iter = words.into_iter();
        let command = match iter.next() {
            Some(word) => word,
            None => cfg
                .get("default.command")
                .unwrap_or_else(|| "list".to_string()),
        };

        Ok(Self {
            command,
            args: iter.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::Invocation;
    use crate::config::Config;

    fn cfg() -> Config {
        // An empty rc file keeps the test independent of ~/.slaterc.
        let dir = tempfile::tempdir().expect("tempdir");
        let rc = dir.path().join("slaterc");
        std::fs::write(&rc, "").expect("write rc");
        Config::load(Some(rc.as_path())).expect("load config")
    }

    #[test]
    fn empty_invocation_uses_the_default_command() {
        let inv = Invocation::parse(&cfg(), vec![]).expect("parse");
        assert_eq!(inv.command, "list");
        assert!(inv.args.is_empty());
    }

    #[test]
    fn first_word_is_the_command() {
        let rest: Vec<OsString> = ["add", "Write", "spec"]
            .iter()
            .map(OsString::from)
            .collect();
        let inv = Invocation::parse(&cfg(), rest).expect("parse");
        assert_eq!(inv.command, "add");
        assert_eq!(inv.args, vec!["Write".to_string(), "spec".to_string()]);
    }
}
