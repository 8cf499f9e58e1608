use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Message text for the double-initialization rule. Fixtures match
/// against this string verbatim.
pub const DOUBLE_INIT_MSG: &str = "This lock has already been initialized";

pub const TOOL_NAME: &str = "Lock State Detector";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefectKind {
    DoubleInit,
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefectKind::DoubleInit => write!(f, "double-init"),
        }
    }
}

/// One finding, attributed to the offending call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DefectKind,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Handle the finding is about, as spelled in the fixture.
    pub handle: String,
    /// Where the handle entered the initialized state.
    pub first_init_span: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: warning: {} [{}] (lock `{}` first initialized at {})",
            self.file,
            self.line,
            self.column,
            self.message,
            self.kind,
            self.handle,
            self.first_init_span,
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckReport {
    pub tool_name: String,
    pub has_defect: bool,
    pub defect_count: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub analysis_time: Duration,
    pub error: Option<String>,
}

impl CheckReport {
    pub fn new(tool_name: String) -> Self {
        Self {
            tool_name,
            has_defect: false,
            defect_count: 0,
            diagnostics: Vec::new(),
            analysis_time: Duration::default(),
            error: None,
        }
    }

    /// Report for a run that died before the checker could look at the
    /// fixture; carries the failure instead of findings.
    pub fn failed(tool_name: String, error: String) -> Self {
        let mut report = Self::new(tool_name);
        report.error = Some(error);
        report
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let mut file = File::create(path)?;
        writeln!(file, "{}", self)?;

        let json_path = format!("{}.json", path);
        std::fs::write(
            json_path,
            serde_json::to_string_pretty(self).unwrap().as_bytes(),
        )?;

        Ok(())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lock state report")?;
        writeln!(f, "Tool: {}", self.tool_name)?;
        writeln!(f, "Analysis time: {:?}", self.analysis_time)?;
        writeln!(f, "Defects found: {}", self.defect_count)?;

        if self.has_defect {
            for (i, diag) in self.diagnostics.iter().enumerate() {
                writeln!(f, "\nDefect #{}", i + 1)?;
                writeln!(f, "{}", diag)?;
            }
        }

        if let Some(error) = &self.error {
            writeln!(f, "\nError: {}", error)?;
        }

        Ok(())
    }
}
