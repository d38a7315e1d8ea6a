//! JSON report output.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::Result;
use roofscan_core::{DamageAnalysis, SkippedPhoto};
use serde::Serialize;

/// Trailing line of JSON Lines output.
#[derive(Serialize)]
struct Summary<'a> {
    total_estimate: u64,
    findings: usize,
    pricing_source: &'a str,
    manual_review: bool,
    #[serde(skip_serializing_if = "none_skipped")]
    skipped: &'a [SkippedPhoto],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn none_skipped(skipped: &&[SkippedPhoto]) -> bool {
    skipped.is_empty()
}

/// Writes analysis reports as JSON.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Creates a new JSON output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a new JSON output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes the whole analysis as one JSON document.
    pub fn write_analysis(&self, analysis: &DamageAnalysis, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(analysis)?
        } else {
            serde_json::to_string(analysis)?
        };
        self.write_line(&json)
    }

    /// Writes one finding per line followed by a summary line.
    pub fn write_lines(&self, analysis: &DamageAnalysis) -> Result<()> {
        for finding in &analysis.findings {
            self.write_line(&serde_json::to_string(finding)?)?;
        }
        let summary = Summary {
            total_estimate: analysis.total_estimate,
            findings: analysis.findings.len(),
            pricing_source: &analysis.pricing_source,
            manual_review: analysis.manual_review,
            skipped: &analysis.skipped,
        };
        self.write_line(&serde_json::to_string(&summary)?)
    }

    /// Flushes the underlying writer.
    #[allow(clippy::significant_drop_tightening)]
    pub fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, PoisonError};

    use roofscan_core::{DamageFinding, Severity};

    use super::*;

    /// Writer that keeps everything in a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn analysis() -> DamageAnalysis {
        let finding = |id, cost| DamageFinding {
            id,
            category: "Asphalt Shingles".into(),
            severity: Severity::Moderate,
            description: "Granule loss".into(),
            estimated_cost: cost,
            location: "Roof surface".into(),
            cost_kind: None,
        };
        DamageAnalysis::new(vec![finding(1, 1200), finding(2, 900)], Vec::new(), "Test data")
    }

    #[test]
    fn test_write_analysis_single_document() {
        let buf = SharedBuf::default();
        let output = JsonOutput::new(Box::new(buf.clone()));
        output.write_analysis(&analysis(), false).unwrap();

        let text = buf.text();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total_estimate"], 2100);
        assert_eq!(value["findings"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_lines_ends_with_summary() {
        let buf = SharedBuf::default();
        let output = JsonOutput::new(Box::new(buf.clone()));
        output.write_lines(&analysis()).unwrap();

        let text = buf.text();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[2]["total_estimate"], 2100);
        assert_eq!(lines[2]["pricing_source"], "Test data");
        assert!(lines[2].get("skipped").is_none());
    }
}
