use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::debug;

use lockstate::config::{CalleeMatcher, CheckConfig};
use lockstate::detect::DoubleInitDetector;
use lockstate::fixture;
use lockstate::options::{CheckerKind, Options};
use lockstate::report::{CheckReport, TOOL_NAME};
use lockstate::watch;

fn main() {
    if std::env::var("LOCKSTATE_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("LOCKSTATE_LOG")
            .write_style("LOCKSTATE_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("lockstate: {err:#}");
            std::process::exit(2);
        }
    }
}

fn run() -> Result<bool> {
    // Flags from the environment come first so the command line wins.
    let mut flags = match std::env::var("LOCKSTATE_FLAGS") {
        Ok(s) => shellwords::split(&s).context("invalid LOCKSTATE_FLAGS")?,
        Err(_) => Vec::new(),
    };
    flags.extend(std::env::args().skip(1));

    let options = Options::parse_from_args(&flags).map_err(|e| anyhow!(e.to_string()))?;
    debug!("lockstate options: {:?}", options);

    let Some(fixture_path) = options.fixture.as_deref() else {
        bail!("no fixture file given");
    };

    let config = CheckConfig::load_from_file(&options.config)?;
    let matcher = config.matcher()?;

    if options.watch {
        let dir = Path::new(fixture_path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watch::watch(dir, &options.suffixes, || {
            check_once(&options, &matcher, fixture_path).map(|(output, _)| output)
        })?;
        return Ok(true);
    }

    let (output, passed) = check_once(&options, &matcher, fixture_path)?;
    print!("{output}");
    Ok(passed)
}

/// One parse→detect→verify pass. Returns the rendered run output and
/// whether the fixture's annotations held.
fn check_once(
    options: &Options,
    matcher: &CalleeMatcher,
    fixture_path: &str,
) -> Result<(String, bool)> {
    let fixture = match fixture::load(fixture_path, matcher) {
        Ok(fixture) => fixture,
        Err(err) => {
            // The saved report still says what went wrong.
            CheckReport::failed(TOOL_NAME.to_string(), err.to_string())
                .save_to_file(&options.output)
                .with_context(|| format!("Failed to write report to {}", options.output))?;
            return Err(err.into());
        }
    };

    let report = match options.checker_kind {
        CheckerKind::DoubleInit | CheckerKind::All => {
            DoubleInitDetector::new(&fixture.trace).detect()
        }
        kind => bail!("unsupported checker kind {kind:?}"),
    };

    let mut output = String::new();
    for diag in &report.diagnostics {
        output.push_str(&format!("{diag}\n"));
    }
    report
        .save_to_file(&options.output)
        .with_context(|| format!("Failed to write report to {}", options.output))?;

    let mut passed = true;
    if options.verify_expectations {
        let mismatches = fixture.expectations.verify(&report.diagnostics);
        for mismatch in &mismatches {
            output.push_str(&format!("{fixture_path}: {mismatch}\n"));
        }
        passed = mismatches.is_empty();
        output.push_str(&format!(
            "{}: {} defects, {} mismatches\n",
            fixture_path,
            report.defect_count,
            mismatches.len()
        ));
    } else {
        output.push_str(&format!(
            "{}: {} defects\n",
            fixture_path, report.defect_count
        ));
    }
    Ok((output, passed))
}
