//! Output formatting module for Sitestack
//!
//! Provides colored human output and a line-delimited JSON mode.

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Outcome of one step of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Stack created or updated
    Deployed,
    /// Stack deleted
    Destroyed,
    /// Step skipped
    Skipped,
}

impl StepStatus {
    /// Get the colored string representation
    pub fn colored_string(&self) -> String {
        match self {
            StepStatus::Deployed => "deployed".green().to_string(),
            StepStatus::Destroyed => "destroyed".magenta().to_string(),
            StepStatus::Skipped => "skipping".cyan().to_string(),
        }
    }

    /// Get the plain string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Deployed => "deployed",
            StepStatus::Destroyed => "destroyed",
            StepStatus::Skipped => "skipping",
        }
    }
}

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// JSON output mode
    json_mode: bool,
    /// Verbosity level
    verbosity: u8,
    /// Start time for duration calculations
    start_time: Instant,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, json_mode: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            json_mode,
            verbosity,
            start_time: Instant::now(),
        }
    }

    /// Whether output is JSON
    pub fn is_json(&self) -> bool {
        self.json_mode
    }

    /// Whether human output is colored
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.json_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.json_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print a stack header
    pub fn stack_header(&self, stack: &str, region: &str) {
        if self.json_mode {
            return;
        }

        let header = format!("STACK [{}] ({})", stack, region);
        let stars = "*".repeat(80_usize.saturating_sub(header.len()));

        if self.use_color {
            println!(
                "\n{} {}",
                header.bright_white().bold(),
                stars.bright_black()
            );
        } else {
            println!("\n{} {}", header, stars);
        }
    }

    /// Print the result of one step
    pub fn step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        if self.json_mode {
            self.json(&serde_json::json!({
                "type": "step",
                "name": name,
                "status": status.as_str(),
                "message": message
            }));
            return;
        }

        if self.use_color {
            print!("{}: [{}]", status.colored_string(), name.bright_white().bold());
        } else {
            print!("{}: [{}]", status.as_str(), name);
        }

        if let Some(msg) = message {
            print!(" => {}", msg);
        }

        println!();
    }

    /// Print `key = value` pairs, aligned
    pub fn key_values(&self, pairs: &[(String, String)]) {
        if self.json_mode {
            let map: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            self.json(&map);
            return;
        }

        let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in pairs {
            if self.use_color {
                println!(
                    "  {} = {}",
                    format!("{:width$}", key, width = width).bright_black(),
                    value.bright_white()
                );
            } else {
                println!("  {:width$} = {}", key, value, width = width);
            }
        }
    }

    /// Print how long the command took and whether it succeeded
    pub fn summary(&self, action: &str, success: bool) {
        if self.json_mode {
            return;
        }

        let duration_str = format_duration(self.start_time.elapsed());

        if self.use_color {
            println!(
                "\n{} {}",
                format!("{} took", action).bright_black(),
                duration_str.bright_white()
            );
            if success {
                println!("{}", format!("{} completed successfully.", action).green().bold());
            } else {
                println!("{}", format!("{} failed.", action).red().bold());
            }
        } else {
            println!("\n{} took {}", action, duration_str);
            if success {
                println!("{} completed successfully.", action);
            } else {
                println!("{} failed.", action);
            }
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.json_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.json_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", serde_json::to_string(&warn).unwrap_or_default());
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print a hint message
    pub fn hint(&self, message: &str) {
        if self.json_mode {
            let hint = serde_json::json!({
                "type": "hint",
                "message": message
            });
            eprintln!("{}", serde_json::to_string(&hint).unwrap_or_default());
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "HINT:".cyan().bold(), message);
        } else {
            eprintln!("HINT: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.json_mode {
            self.json(&serde_json::json!({
                "type": "info",
                "message": message
            }));
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 {
            return;
        }

        if self.json_mode {
            self.json(&serde_json::json!({
                "type": "debug",
                "message": message
            }));
            return;
        }

        if self.use_color {
            println!("{} {}", "DEBUG:".magenta(), message);
        } else {
            println!("DEBUG: {}", message);
        }
    }

    /// Print raw text as-is in human mode
    pub fn raw(&self, text: &str) {
        if self.json_mode {
            return;
        }
        print!("{}", text);
        if !text.ends_with('\n') {
            println!();
        }
    }

    /// Print a value as one pretty JSON document
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => self.error(&format!("Failed to serialize output: {}", e)),
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.json_mode {
            self.json(&serde_json::json!({
                "type": "list",
                "title": title,
                "items": items
            }));
            return;
        }

        if self.use_color {
            println!("\n{}:", title.bright_white().bold());
        } else {
            println!("\n{}:", title);
        }

        for item in items {
            if self.use_color {
                println!("  {} {}", "-".bright_black(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Print a table
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.json_mode {
            self.json(&serde_json::json!({
                "type": "table",
                "headers": headers,
                "rows": rows
            }));
            return;
        }

        // Calculate column widths
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        let header_line = render_row(headers.iter().map(|h| h.to_string()), &widths);
        if self.use_color {
            println!("{}", header_line.bright_white().bold());
        } else {
            println!("{}", header_line);
        }

        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        if self.use_color {
            println!("{}", sep.join("-+-").bright_black());
        } else {
            println!("{}", sep.join("-+-"));
        }

        for row in rows {
            println!("{}", render_row(row.iter().cloned(), &widths));
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

fn render_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

/// Format a duration as a human-readable string
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}h {}m {}s", hours, mins, secs)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_display() {
        assert_eq!(StepStatus::Deployed.as_str(), "deployed");

        assert!(StepStatus::Destroyed.colored_string().contains("destroyed"));
        assert!(StepStatus::Skipped.colored_string().contains("skipping"));
    }

    #[test]
    fn test_render_row_pads_columns() {
        let row = render_row(
            vec!["Site".to_string(), "us-west-2".to_string()].into_iter(),
            &[10, 9],
        );
        assert_eq!(row, "Site       | us-west-2");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1h 1m 5s");
    }

    #[test]
    fn test_no_color_env_respected() {
        let formatter = OutputFormatter::new(false, true, 0);
        assert!(!formatter.use_color());
        assert!(formatter.is_json());
    }
}
