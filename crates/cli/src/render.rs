use std::io::{self, Write};

use chrono::NaiveDate;

use crate::core::board::{day_offset, Buckets};
use crate::core::filters::FilterState;
use crate::model::{List, ListKey, Task, TaskStatus};

pub fn write_board<W: Write>(
    mut writer: W,
    buckets: &Buckets<'_>,
    filters: &FilterState,
    today: NaiveDate,
) -> io::Result<()> {
    writeln!(writer, "{}", filter_summary(filters))?;
    for (status, tasks) in buckets.columns() {
        writeln!(writer)?;
        writeln!(writer, "{} ({})", status, tasks.len())?;
        if tasks.is_empty() {
            writeln!(writer, "  -")?;
        }
        for task in tasks {
            writeln!(writer, "  {}", task_line(task, today))?;
        }
    }
    Ok(())
}

pub fn write_tasks<W: Write>(mut writer: W, tasks: &[Task], today: NaiveDate) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(writer, "No tasks");
    }
    for task in tasks {
        writeln!(writer, "{} [{}]", task_line(task, today), task.status)?;
    }
    Ok(())
}

pub fn write_lists<W: Write>(mut writer: W, lists: &[List]) -> io::Result<()> {
    if lists.is_empty() {
        return writeln!(writer, "No lists yet");
    }
    for list in lists {
        writeln!(writer, "#{:<4} {} ({})", list.id, list.name, list.color)?;
    }
    Ok(())
}

pub fn task_line(task: &Task, today: NaiveDate) -> String {
    let mut line = format!("#{:<4} {}", task.id, task.title);
    if let Some(due) = task.due_date {
        line.push_str(&format!(
            "  due {} ({})",
            due.format("%Y-%m-%d %H:%M"),
            relative_day(day_offset(due.date(), today))
        ));
    }
    match (&task.list_name, task.list_id) {
        (Some(name), Some(_)) => line.push_str(&format!("  @{name}")),
        (None, Some(list_id)) => line.push_str(&format!("  @list {list_id}")),
        _ => {}
    }
    line
}

fn relative_day(offset: i64) -> String {
    match offset {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        days if days > 1 => format!("in {days} days"),
        days => format!("{} days ago", -days),
    }
}

/// One-line description of the active filter, e.g. `status: To Do, Done | due: 3 | lists: all`.
pub fn filter_summary(filters: &FilterState) -> String {
    let criteria = filters.criteria();
    let statuses = if filters.is_all_statuses_selected() {
        "all".to_string()
    } else if criteria.statuses.is_empty() {
        "none".to_string()
    } else {
        criteria
            .statuses
            .iter()
            .map(TaskStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let lists = if filters.is_all_lists_selected() {
        "all".to_string()
    } else if criteria.lists.is_empty() {
        "none".to_string()
    } else {
        criteria
            .lists
            .iter()
            .map(|key| match key {
                ListKey::Unlisted => "no list".to_string(),
                ListKey::List(id) => filters
                    .list(*id)
                    .map(|list| list.name.clone())
                    .unwrap_or_else(|| format!("list {id}")),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "status: {statuses} | due: {} | lists: {lists}",
        criteria.time
    )
}
