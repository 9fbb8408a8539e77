use console::style;

use crate::ai::provider::{AttemptOutcome, FallbackAttemptLog};
use crate::types::GenError;

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    pub fn field(&self, label: &str, value: &str) {
        println!("  {:<10} {}", style(label).dim(), value);
    }

    /// One line per candidate considered by the fallback chain
    pub fn attempts(&self, log: &FallbackAttemptLog) {
        if log.is_empty() {
            return;
        }
        self.section("Attempts");
        for record in log.records() {
            let (mark, detail) = match &record.outcome {
                AttemptOutcome::Success => (style("ok").green(), String::new()),
                AttemptOutcome::Failure(reason) => (style("failed").red(), reason.clone()),
                AttemptOutcome::Skipped(reason) => (style("skipped").dim(), reason.clone()),
            };
            println!("  {:<10} {:<8} {}", record.provider_id, mark, detail);
        }
    }

    /// Human summary on stderr followed by the structured error body
    pub fn failure(&self, err: &GenError) {
        self.error(&err.to_string());
        if let Some(log) = err.attempts() {
            for record in log.records() {
                eprintln!("  {} {:?}", record.provider_id, record.outcome);
            }
        }
        match serde_json::to_string_pretty(&err.to_body()) {
            Ok(body) => eprintln!("{}", body),
            Err(e) => eprintln!("(error body unavailable: {})", e),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
