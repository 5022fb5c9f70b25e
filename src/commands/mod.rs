pub mod catalog;
pub mod catalog_verify;
pub mod ingest;
pub mod status;
pub mod sync;
pub mod tags;
pub mod validate;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub warnings: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            warnings: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.warnings.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

#[cfg(test)]
mod tests {
    use super::CommandReport;

    #[test]
    fn issues_flip_ok_and_warnings_do_not() {
        let mut report = CommandReport::new("validate");
        report.warn("Missing parsed/2025-10-27/links.jsonl");
        assert!(report.ok);
        report.issue("parsed/2025-10-27/nodes.jsonl:3 missing fields: id");
        assert!(!report.ok);
    }
}
