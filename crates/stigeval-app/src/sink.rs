//! Result sinks: where per-control results go as soon as they are known.

use anyhow::Context;
use std::io::Write;
use stigeval_types::ControlResult;

pub trait ResultSink {
    fn emit(&mut self, result: &ControlResult) -> anyhow::Result<()>;
}

/// One JSON object per line, flushed per result.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn emit(&mut self, result: &ControlResult) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, result).context("serialize control result")?;
        self.out.write_all(b"\n").context("write result line")?;
        self.out.flush().context("flush result line")
    }
}

/// `<control_id> <status>` per result, with the code for not-applicable and error results.
pub struct TextLinesSink<W: Write> {
    out: W,
}

impl<W: Write> TextLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for TextLinesSink<W> {
    fn emit(&mut self, result: &ControlResult) -> anyhow::Result<()> {
        match result.code.as_deref() {
            Some(code) => writeln!(
                self.out,
                "{:<10} {} ({code})",
                result.control_id,
                result.status.as_str()
            ),
            None => writeln!(self.out, "{:<10} {}", result.control_id, result.status.as_str()),
        }
        .context("write result line")
    }
}

/// Keeps results in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub results: Vec<ControlResult>,
}

impl ResultSink for CollectingSink {
    fn emit(&mut self, result: &ControlResult) -> anyhow::Result<()> {
        self.results.push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stigeval_types::{Impact, Status};

    fn result(id: &str) -> ControlResult {
        ControlResult {
            control_id: id.to_string(),
            status: Status::Passed,
            impact: Impact::MEDIUM,
            code: None,
            note: None,
            branch: Some("all".to_string()),
            evidence: Vec::new(),
        }
    }

    #[test]
    fn json_lines_writes_one_object_per_result() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(&result("V-1")).expect("emit");
        sink.emit(&result("V-2")).expect("emit");

        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: ControlResult = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first.control_id, "V-1");
    }

    #[test]
    fn text_lines_show_status_and_code() {
        let mut sink = TextLinesSink::new(Vec::new());
        sink.emit(&result("V-1")).expect("emit");
        let mut na = result("V-2");
        na.status = Status::NotApplicable;
        na.code = Some("role_out_of_scope".to_string());
        sink.emit(&na).expect("emit");

        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(
            text,
            "V-1        passed\nV-2        not_applicable (role_out_of_scope)\n"
        );
    }
}
