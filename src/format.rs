//! Rendering of summaries into textual reports.
//!
//! A report has the shape
//!
//! ```text
//! <symbolic result>
//! HEAP:
//! <heap dump>
//! ```
//!
//! where the heap dump is produced by the engine and then cleaned from anonymous
//! closure location annotations such as `@12+3[Microsoft.FSharp.Core.Unit]`. Those
//! are engine artifacts whose numbers change between builds, so they must not leak
//! into golden outputs.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{Explorer, SummaryOf};

/// Separator line between the result and the heap dump.
pub const HEAP_SEPARATOR: &str = "HEAP:";

/// Textual form of an absent report in logs.
pub const NULL_REPORT: &str = "null";

/// Default unit marker emitted by the engine's closure naming.
const DEFAULT_MARKER: &str = r"Microsoft\.FSharp\.Core\.Unit";

static DEFAULT_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| annotation_regex(DEFAULT_MARKER).expect("default annotation pattern is valid"));

fn annotation_regex(marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"@\d+(?:[+-]\d*)?\[{}\]", marker))
}

// Removing one annotation may join its neighbours into a new one, so repeat until
// nothing matches.
fn strip_with<'a>(annotation: &Regex, text: &'a str) -> Cow<'a, str> {
    let mut current = Cow::Borrowed(text);
    while annotation.is_match(&current) {
        current = Cow::Owned(annotation.replace_all(&current, "").into_owned());
    }
    current
}

/// Removes closure annotations from rendered text and assembles reports.
#[derive(Debug, Clone)]
pub struct ReportFormatter {
    annotation: Regex,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            annotation: DEFAULT_ANNOTATION.clone(),
        }
    }
}

impl ReportFormatter {
    /// Create a formatter stripping annotations that end with the literal `[marker]`.
    pub fn with_marker(marker: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            annotation: annotation_regex(&regex::escape(marker))?,
        })
    }

    /// Strip closure annotations from `text`.
    ///
    /// Stripping is idempotent: the result contains no annotation.
    pub fn strip<'a>(&self, text: &'a str) -> Cow<'a, str> {
        strip_with(&self.annotation, text)
    }

    /// Assemble a report from a rendered result and a raw heap dump.
    pub fn report(&self, result: &str, dump: &str) -> String {
        format!("{}\n{}\n{}", result, HEAP_SEPARATOR, self.strip(dump))
    }

    /// Render a summary using the engine's state renderer.
    pub fn format<E: Explorer + ?Sized>(&self, engine: &E, summary: &SummaryOf<E>) -> String {
        let dump = engine.dump(summary.state());
        self.report(&summary.result().to_string(), &dump)
    }

    /// Render an optional summary; an absent summary has no report.
    pub fn format_opt<E: Explorer + ?Sized>(&self, engine: &E, summary: Option<&SummaryOf<E>>) -> Option<String> {
        summary.map(|s| self.format(engine, s))
    }
}

/// Strip closure annotations using the default marker.
pub fn strip_closure_annotations(text: &str) -> Cow<'_, str> {
    strip_with(&DEFAULT_ANNOTATION, text)
}

/// Display helper for optional reports in log lines.
pub fn display_report(report: Option<&str>) -> &str {
    report.unwrap_or(NULL_REPORT)
}
