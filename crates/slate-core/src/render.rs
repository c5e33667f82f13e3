use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::format_timestamp;
use crate::tabs::Tab;
use crate::task::{Priority, Status, Task};
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Status".to_string(),
            "Priority".to_string(),
            "Updated".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for task in tasks {
            rows.push(vec![
                self.paint(&task.id, "33"),
                task.title.clone(),
                self.paint(task.status.label(), status_color(task.status)),
                self.paint(task.priority.label(), priority_color(task.priority)),
                format_timestamp(Some(task.updated_at)),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task, theme))]
    pub fn print_task_info(&mut self, task: &Task, theme: &Theme) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "id          {}", task.id)?;
        writeln!(out, "title       {}", task.title)?;
        writeln!(out, "description {}", task.description)?;
        writeln!(out, "status      {}", task.status.label())?;
        writeln!(out, "priority    {}", task.priority.label())?;
        writeln!(out, "theme       {} ({})", theme.name, theme.id)?;
        writeln!(
            out,
            "created     {}",
            format_timestamp(Some(task.created_at))
        )?;
        writeln!(
            out,
            "updated     {}",
            format_timestamp(Some(task.updated_at))
        )?;
        if task.completed_at.is_some() {
            writeln!(out, "completed   {}", format_timestamp(task.completed_at))?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, tabs, active_id))]
    pub fn print_tab_table<'a, I>(&mut self, tabs: I, active_id: &str) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = &'a Tab>,
    {
        let mut out = io::stdout().lock();

        let headers = vec![
            String::new(),
            "ID".to_string(),
            "Name".to_string(),
            "Statuses".to_string(),
            "Priorities".to_string(),
            "Sort".to_string(),
        ];

        let mut rows = Vec::new();
        for tab in tabs {
            let marker = if tab.id == active_id { "*" } else { "" };
            let statuses = tab
                .status_filter
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join(",");
            let priorities = tab
                .priority_filter
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(",");
            let sort = format!(
                "{:?} {:?}",
                tab.sort_by.unwrap_or_default(),
                tab.sort_order.unwrap_or_default()
            );
            let name = if tab.is_custom {
                tab.name.clone()
            } else {
                format!("{} (built-in)", tab.name)
            };
            rows.push(vec![
                marker.to_string(),
                self.paint(&tab.id, "33"),
                name,
                statuses,
                priorities,
                sort,
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, themes))]
    pub fn print_theme_table(&mut self, themes: &[Theme]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Dark".to_string(),
            "Background".to_string(),
            "Primary".to_string(),
            "Accent".to_string(),
        ];

        let mut rows = Vec::with_capacity(themes.len());
        for theme in themes {
            rows.push(vec![
                self.paint(&theme.id, "33"),
                theme.name.clone(),
                if theme.is_dark { "yes" } else { "no" }.to_string(),
                theme.colors.background.clone(),
                theme.colors.primary.clone(),
                theme.colors.accent.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "31",
        Priority::Medium => "33",
        Priority::Low => "34",
    }
}

fn status_color(status: Status) -> &'static str {
    match status {
        Status::Completed => "32",
        Status::InProgress => "35",
        Status::Pending => "33",
        Status::Backlog => "90",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}
