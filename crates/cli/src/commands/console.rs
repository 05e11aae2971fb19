use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;
use valprop_core::{StepResult, StepSink, Table};

/// Step sink that writes each result to the terminal the moment it arrives.
///
/// In JSON mode every record is one line of JSON; otherwise steps render as labeled blocks.
pub struct ConsoleSink {
    json: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

#[derive(Serialize)]
struct StepRecord<'a> {
    kind: &'static str,
    index: usize,
    name: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct TableRecord<'a> {
    kind: &'static str,
    company_name: &'a str,
    dataset: String,
    columns: &'a [String],
    rows: &'a [Vec<String>],
}

impl ConsoleSink {
    pub fn stdout(json: bool) -> Self {
        Self::new(json, io::stdout())
    }

    pub fn new(json: bool, writer: impl Write + Send + 'static) -> Self {
        Self { json, out: Mutex::new(Box::new(writer)) }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn write_intro(&self, text: &str) {
        self.write_block(text);
    }

    pub fn write_table(&self, company_name: &str, dataset: &Path, table: &Table) {
        if self.json {
            let record = TableRecord {
                kind: "document",
                company_name,
                dataset: dataset.display().to_string(),
                columns: &table.columns,
                rows: &table.rows,
            };
            self.write_json(&record);
            return;
        }

        let mut block = format!("Information from the attached document for {company_name}:\n");
        block.push_str(&table.columns.join(" | "));
        for row in &table.rows {
            block.push('\n');
            block.push_str(&row.join(" | "));
        }
        block.push('\n');
        self.write_block(&block);
    }

    fn write_json<T: Serialize>(&self, record: &T) {
        match serde_json::to_string(record) {
            Ok(line) => self.write_block(&line),
            Err(error) => {
                tracing::warn!(event_name = "cli.console.serialize_failed", error = %error);
            }
        }
    }

    fn write_block(&self, block: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = writeln!(out, "{block}").and_then(|()| out.flush()) {
            tracing::warn!(event_name = "cli.console.write_failed", error = %error);
        }
    }
}

impl StepSink for ConsoleSink {
    fn emit(&self, result: &StepResult) {
        if self.json {
            self.write_json(&StepRecord {
                kind: "step",
                index: result.index,
                name: result.name,
                text: &result.text,
            });
            return;
        }

        self.write_block(&format!("## Step {}: {}\n{}\n", result.index, result.name, result.text));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::{self, Write};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use valprop_core::{StepResult, StepSink, Table, STEPS};

    use super::ConsoleSink;

    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            let bytes = self.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn human_mode_labels_each_step() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::new(false, buffer.clone());

        sink.emit(&StepResult::new(&STEPS[2], "SMB retailers"));

        assert_eq!(buffer.contents(), "## Step 2: Identify Customer Segments\nSMB retailers\n\n");
    }

    #[test]
    fn json_mode_writes_one_line_per_step() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::new(true, buffer.clone());

        sink.emit(&StepResult::new(&STEPS[0], "first"));
        sink.emit(&StepResult::new(&STEPS[1], "second"));

        let lines: Vec<serde_json::Value> = buffer
            .contents()
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is JSON"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "step");
        assert_eq!(lines[1]["index"], 1);
        assert_eq!(lines[1]["name"], "Describe the Current Value Proposition");
    }

    #[test]
    fn tables_render_as_pipe_separated_rows() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::new(false, buffer.clone());
        let table = Table::new(
            vec!["Name".to_string(), "Country".to_string()],
            vec![vec!["Ada".to_string(), "UK".to_string()]],
        );

        sink.write_table("Cuitini", Path::new("angels.xlsx"), &table);

        assert_eq!(
            buffer.contents(),
            "Information from the attached document for Cuitini:\nName | Country\nAda | UK\n\n"
        );
    }
}
