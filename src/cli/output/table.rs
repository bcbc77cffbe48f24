//! Table output formatting for CLI commands
//!
//! Renders one row per watched commit using comfy-table, with one
//! colour-coded column per task state.

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::domain::models::TaskState;

use super::{CommitSummary, TaskSummary};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format the per-commit summary rows
    pub fn format_commits(&self, commits: &[CommitSummary]) -> String {
        let mut table = self.create_base_table();

        let mut header = vec![
            Cell::new("Commit").add_attribute(Attribute::Bold),
            Cell::new("Date").add_attribute(Attribute::Bold),
            Cell::new("Message").add_attribute(Attribute::Bold),
        ];
        header.extend(
            TaskState::ALL
                .iter()
                .map(|state| Cell::new(state.as_str()).add_attribute(Attribute::Bold)),
        );
        header.push(Cell::new("Images").add_attribute(Attribute::Bold));
        table.set_header(header);

        for commit in commits {
            let date = commit
                .timestamp
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

            let mut sha_cell = Cell::new(&commit.short_sha);
            if self.use_colors && commit.stale > 0 {
                sha_cell = sha_cell.fg(Color::DarkYellow);
            }

            let mut row = vec![
                sha_cell,
                Cell::new(date),
                Cell::new(truncate_text(&commit.headline, 48)),
            ];
            row.extend(TaskState::ALL.iter().map(|state| {
                let count = commit.counts.get(state).copied().unwrap_or(0);
                self.count_cell(*state, count)
            }));
            row.push(Cell::new(format_images(commit)));
            table.add_row(row);
        }

        table.to_string()
    }

    /// Format one commit's tasks with a badge per run state
    pub fn format_tasks(&self, tasks: &[TaskSummary]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Task").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Runs").add_attribute(Attribute::Bold),
        ]);

        for task in tasks {
            let stage = task.stage.map_or_else(|| "-".to_string(), |s| format!("{s:02}"));
            let name = task.name.as_deref().unwrap_or(&task.id);
            let mut state = Cell::new(task.state.as_str());
            if self.use_colors {
                state = state.fg(state_color(task.state));
            }
            let runs = if task.runs.is_empty() {
                "-".to_string()
            } else {
                task.runs
                    .iter()
                    .map(|(state, count)| format!("{state} ×{count}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            table.add_row(vec![
                Cell::new(stage),
                Cell::new(truncate_text(name, 48)),
                state,
                Cell::new(runs),
            ]);
        }

        table.to_string()
    }

    fn count_cell(&self, state: TaskState, count: usize) -> Cell {
        if count == 0 {
            return Cell::new("-").set_alignment(CellAlignment::Right);
        }
        let cell = Cell::new(count).set_alignment(CellAlignment::Right);
        if self.use_colors {
            cell.fg(state_color(state))
        } else {
            cell
        }
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::colors_enabled()
}

/// Map task state to color
fn state_color(state: TaskState) -> Color {
    match state {
        TaskState::Completed => Color::Green,
        TaskState::Failed => Color::Red,
        TaskState::Exception => Color::Magenta,
        TaskState::Running => Color::Cyan,
        TaskState::Pending => Color::Yellow,
        TaskState::Unscheduled => Color::DarkGrey,
    }
}

fn format_images(commit: &CommitSummary) -> String {
    if commit.images.is_empty() {
        return "-".to_string();
    }
    commit
        .images
        .iter()
        .map(|(pool, count)| format!("{pool} ×{count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate text to max length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
