//! CLI output formatting module
//!
//! Every command result implements [`CommandOutput`] and is printed either
//! for humans or as JSON, depending on the global `--json` flag.

pub mod report;
pub mod table;

use serde::Serialize;

pub use report::{CommitSummary, DashboardReport, TaskSummary};
pub use table::TableFormatter;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}
