use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskcal_core::calendar::{Classification, DayCell, MonthGrid};
use taskcal_core::config::Palette;
use taskcal_core::model::{Group, Task, TaskStatus, format_date};
use taskcal_core::task_api::DayItem;
use time::Date;

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Completed => "completed",
    }
}

fn optional_date(date: Option<Date>) -> Option<String> {
    date.map(format_date)
}

fn date_or_dash(date: Option<Date>) -> String {
    optional_date(date).unwrap_or_else(|| "-".to_string())
}

pub fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "start_date": optional_date(task.start_date),
        "due_date": optional_date(task.due_date),
        "priority": task.priority,
        "status": task.status,
        "group_id": task.group_id,
        "created_at": task.created_at,
        "completed_at": task.completed_at,
    })
}

pub fn task_detail_json(task: &Task, classification: Option<Classification>) -> Value {
    let mut value = task_json(task);
    value["calendar"] = match classification {
        Some(classification) => json!({
            "display_date": format_date(classification.display_date),
            "is_overdue": classification.is_overdue,
            "urgency_level": classification.urgency_level,
            "is_urgent": classification.is_urgent,
        }),
        None => Value::Null,
    };
    value
}

pub fn day_item_json(item: &DayItem) -> Value {
    json!({
        "id": item.task.id,
        "title": item.task.title,
        "priority": item.task.priority,
        "display_priority": item.display_priority,
        "display_date": format_date(item.display_date),
        "urgency_level": item.urgency_level,
        "is_overdue": item.is_overdue,
        "is_urgent": item.is_urgent,
        "start_date": optional_date(item.task.start_date),
        "due_date": optional_date(item.task.due_date),
    })
}

pub fn group_json(group: &Group) -> Value {
    json!({
        "id": group.id,
        "name": group.name,
        "color": group.color,
        "is_default": group.is_default,
    })
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn task_table(tasks: &[Task], groups: &[Group]) -> String {
    let rows = tasks.iter().map(|task| TaskRow {
        id: task.id.clone(),
        title: task.title.clone(),
        priority: task.priority.to_string(),
        start: date_or_dash(task.start_date),
        due: date_or_dash(task.due_date),
        group: task
            .group_id
            .as_deref()
            .and_then(|id| groups.iter().find(|group| group.id == id))
            .map(|group| group.name.clone())
            .unwrap_or_else(|| "-".to_string()),
        status: status_label(task.status).to_string(),
    });

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Default")]
    default: String,
}

pub fn group_table(groups: &[Group]) -> String {
    let rows = groups.iter().map(|group| GroupRow {
        id: group.id.clone(),
        name: group.name.clone(),
        color: group.color.clone().unwrap_or_else(|| "-".to_string()),
        default: if group.is_default { "yes" } else { "" }.to_string(),
    });

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

/// `! [urgent] Pay rent (task-1) critical, overdue` style lines.
pub fn day_line(item: &DayItem, palette: &Palette) -> String {
    let glyph = if item.is_urgent { "!" } else { " " };
    let dot = palette.priority(
        item.display_priority,
        &format!("[{}]", item.display_priority),
    );
    let mut line = format!(
        "{} {} {} ({}) {}",
        glyph,
        dot,
        item.task.title,
        item.task.id,
        item.urgency_level.as_str()
    );
    if item.is_overdue {
        line.push_str(", overdue");
    }
    line
}

pub fn task_detail_lines(
    task: &Task,
    classification: Option<Classification>,
    group: Option<&Group>,
) -> Vec<String> {
    let mut lines = vec![
        format!("ID:          {}", task.id),
        format!("Title:       {}", task.title),
    ];
    if let Some(description) = task.description.as_deref() {
        lines.push(format!("Description: {description}"));
    }
    lines.push(format!("Priority:    {}", task.priority));
    lines.push(format!("Status:      {}", status_label(task.status)));
    lines.push(format!("Start:       {}", date_or_dash(task.start_date)));
    lines.push(format!("Due:         {}", date_or_dash(task.due_date)));
    lines.push(format!(
        "Group:       {}",
        group.map(|group| group.name.as_str()).unwrap_or("-")
    ));
    lines.push(format!("Created:     {}", task.created_at));
    if let Some(completed_at) = task.completed_at.as_deref() {
        lines.push(format!("Completed:   {completed_at}"));
    }
    match classification {
        Some(classification) => {
            let mut calendar = format!(
                "Calendar:    {} ({})",
                format_date(classification.display_date),
                classification.urgency_level.as_str()
            );
            if classification.is_overdue {
                calendar.push_str(", overdue");
            }
            lines.push(calendar);
        }
        None => lines.push("Calendar:    not shown".to_string()),
    }
    lines
}

fn cell_text(cell: &DayCell<'_>) -> String {
    let day = cell.date.day();
    let mut text = match (cell.is_today, cell.in_month) {
        (true, _) => format!("[{day:>2}]"),
        (false, true) => format!("{day:>2}"),
        (false, false) => format!("({day:>2})"),
    };
    if !cell.entries.is_empty() {
        let alert = if cell.entries.iter().any(|entry| entry.is_urgent) {
            "!"
        } else {
            ""
        };
        let count = cell.entries.len();
        text.push_str(&format!("\n{count} task{}{alert}", plural(count)));
    }
    text
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

pub fn month_table(grid: &MonthGrid<'_>) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        grid.week_start
            .weekdays()
            .iter()
            .map(|weekday| weekday.to_string()[..3].to_string()),
    );
    for week in &grid.weeks {
        builder.push_record(week.iter().map(cell_text));
    }

    let mut table = builder.build();
    table.with(Style::modern());
    format!("{} {}\n{}", grid.month, grid.year, table)
}

pub fn month_json(grid: &MonthGrid<'_>) -> Value {
    let weeks: Vec<Value> = grid
        .weeks
        .iter()
        .map(|week| {
            Value::Array(
                week.iter()
                    .map(|cell| {
                        json!({
                            "date": format_date(cell.date),
                            "in_month": cell.in_month,
                            "is_today": cell.is_today,
                            "tasks": cell.entries.iter().map(|entry| json!({
                                "id": entry.task.id,
                                "title": entry.task.title,
                                "display_priority": entry.display_priority(),
                                "urgency_level": entry.urgency_level,
                                "is_overdue": entry.is_overdue,
                                "is_urgent": entry.is_urgent,
                            })).collect::<Vec<_>>(),
                        })
                    })
                    .collect(),
            )
        })
        .collect();

    json!({
        "year": grid.year,
        "month": u8::from(grid.month),
        "week_start": grid.week_start,
        "weeks": weeks,
    })
}
