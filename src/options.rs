//! Parsing Options.
//! `--checker-kind {kind}` or `-k`, currently only double-init

use clap::{Arg, ArgAction, Command};
use std::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheckerKind {
    All,
    DoubleInit,
    // More to be supported.
}

fn make_options_parser() -> clap::Command {
    Command::new("lockstate")
        .no_binary_name(true)
        .version("v0.1.0")
        .arg(
            Arg::new("kind")
                .short('k')
                .long("checker-kind")
                .help("The checker kind")
                .default_value("double-init")
                .value_parser(["double-init", "all"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Path to file where the check report will be stored")
                .default_value("report.txt"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the callee-pattern config")
                .default_value("lockstate.toml"),
        )
        .arg(
            Arg::new("no-expect")
                .long("no-expect")
                .action(ArgAction::SetTrue)
                .help("Skip verifying the fixture's expectation annotations"),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .action(ArgAction::SetTrue)
                .help("Watch the fixture's directory and re-check on change"),
        )
        .arg(
            Arg::new("suffixes")
                .long("suffixes")
                .value_name("LIST")
                .help("Comma-separated file suffixes that trigger a re-check")
                .default_value(".c,.h"),
        )
        .arg(
            Arg::new("fixture")
                .value_name("FIXTURE")
                .help("Fixture source file to check"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub checker_kind: CheckerKind,
    pub output: String,
    pub config: String,
    pub verify_expectations: bool,
    pub watch: bool,
    pub suffixes: Vec<String>,
    pub fixture: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            checker_kind: CheckerKind::DoubleInit,
            output: "report.txt".to_string(),
            config: "lockstate.toml".to_string(),
            verify_expectations: true,
            watch: false,
            suffixes: vec![".c".to_string(), ".h".to_string()],
            fixture: None,
        }
    }
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;
        let checker_kind = match matches.get_one::<String>("kind").map(String::as_str) {
            Some("double-init") => CheckerKind::DoubleInit,
            Some("all") => CheckerKind::All,
            _ => return Err("UnsupportedCheckerKind")?,
        };

        let output = matches.get_one::<String>("output").unwrap().to_string();
        let config = matches.get_one::<String>("config").unwrap().to_string();
        let verify_expectations = !matches.get_flag("no-expect");
        let watch = matches.get_flag("watch");
        let suffixes = matches
            .get_one::<String>("suffixes")
            .unwrap()
            .split(',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let fixture = matches.get_one::<String>("fixture").cloned();

        Ok(Options {
            checker_kind,
            output,
            config,
            verify_expectations,
            watch,
            suffixes,
            fixture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str() {
        let options = Options::parse_from_str("-k double-init -o out.txt test.c").unwrap();
        assert_eq!(options.checker_kind, CheckerKind::DoubleInit);
        assert_eq!(options.output, "out.txt");
        assert!(options.verify_expectations);
        assert_eq!(options.fixture.as_deref(), Some("test.c"));
    }

    #[test]
    fn test_parse_from_str_err() {
        let options = Options::parse_from_str("-k unknown test.c");
        assert!(options.is_err());
    }

    #[test]
    fn test_watch_and_suffixes() {
        let options = Options::parse_from_str("-w --suffixes .c,.cpp,.h test.c").unwrap();
        assert!(options.watch);
        assert_eq!(options.suffixes, vec![".c", ".cpp", ".h"]);

        let options = Options::parse_from_str("test.c").unwrap();
        assert!(!options.watch);
        assert_eq!(options.suffixes, vec![".c", ".h"]);
    }

    #[test]
    fn test_no_expect_flag() {
        let options = Options::parse_from_str("--no-expect test.c").unwrap();
        assert!(!options.verify_expectations);
    }

    #[test]
    fn test_parse_from_args_err() {
        let options = Options::parse_from_args(&[
            "-k".to_owned(),
            "unknown".to_owned(),
            "test.c".to_owned(),
        ]);
        assert!(options.is_err());
    }
}
