use clap::{Parser, Subcommand};
use std::collections::HashMap;
use taskcal_core::calendar::WeekStart;
use taskcal_core::config::{ConfigOverrides, canonicalize_name};
use taskcal_core::error::AppError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Personal tasks on a calendar", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskcal add "File taxes" --start 2024-03-01 --due 2024-04-15 -p high
    Add {
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
        /// Day work may begin (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// low, medium, high or urgent
        #[arg(short = 'p', long)]
        priority: Option<String>,
        #[arg(short = 'g', long)]
        group: Option<String>,
    },
    /// Edit fields of a task
    ///
    /// Example: taskcal edit task-1 --due 2024-04-20 --clear-start
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 'd', long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_start")]
        start: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<String>,
        #[arg(short = 'g', long, conflicts_with = "clear_group")]
        group: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        clear_start: bool,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        clear_group: bool,
    },
    /// Delete a task
    Delete { id: String },
    /// Show details of a task
    Show { id: String },
    /// Mark a task as completed
    Done { id: String },
    /// Mark a completed task as pending again
    Reopen { id: String },
    /// List tasks
    ///
    /// Example: taskcal list --status active --sort due
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(short = 'g', long)]
        group: Option<String>,
        #[arg(short = 'p', long)]
        priority: Option<String>,
        /// Case-insensitive match on title and description
        #[arg(short = 's', long)]
        search: Option<String>,
        /// created, due, priority or title
        #[arg(long, default_value = "created")]
        sort: String,
    },
    /// Show the tasks that land on one day, most urgent first
    ///
    /// Example: taskcal day 2024-01-10
    Day { date: Option<String> },
    /// Show a month grid
    ///
    /// Example: taskcal calendar 2024-01
    Calendar { month: Option<String> },
    /// Drag a task onto another day
    ///
    /// Example: taskcal move task-1 2024-01-12
    Move { id: String, date: String },
    /// Send notifications for overdue and urgent tasks
    Notify,
    /// Manage groups
    Group {
        #[command(subcommand)]
        group: GroupCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Add a group
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// List groups, default first
    List,
    /// Rename a group
    Rename { id: String, name: String },
    /// Delete a group, moving its tasks to the default group
    Delete { id: String },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    WeekStart,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonicalize_name(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    match canonical_field.as_str() {
        "theme" | "week_start" => {
            if remainder.is_some() {
                return Err(format!("{canonical_field} override cannot have subfields"));
            }
            let target = if canonical_field == "theme" {
                ConfigOverrideTarget::Theme
            } else {
                ConfigOverrideTarget::WeekStart
            };
            Ok(ParsedConfigOverride { target, value })
        }
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

pub fn build_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::WeekStart => {
                overrides.week_start = Some(parsed.value.parse::<WeekStart>()?);
            }
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
        }
    }
    Ok(overrides)
}

/// Pulls `--config-override` values out of raw arguments ahead of clap, so
/// that alias overrides can apply to the command being parsed.
pub fn collect_config_overrides(args: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            values.push(value.to_string());
        }
    }
    values
}

/// Replaces the first positional argument with its alias expansion.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &HashMap<String, String>,
) -> Result<Vec<String>, AppError> {
    let mut skip_next = false;
    let mut position = None;
    for (index, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == CONFIG_OVERRIDE_FLAG {
            skip_next = true;
            continue;
        }
        if !arg.starts_with('-') {
            position = Some(index);
            break;
        }
    }

    let Some(index) = position else {
        return Ok(args);
    };
    let Some(expansion) = aliases.get(&args[index]) else {
        return Ok(args);
    };

    let replacement = split_command_line(expansion)?;
    if replacement.is_empty() {
        return Err(AppError::invalid_data(format!(
            "alias '{}' expands to nothing",
            args[index]
        )));
    }

    let mut expanded = Vec::with_capacity(args.len() + replacement.len());
    expanded.extend_from_slice(&args[..index]);
    expanded.extend(replacement);
    expanded.extend_from_slice(&args[index + 1..]);
    Ok(expanded)
}

pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigOverrideTarget, build_overrides, collect_config_overrides, expand_alias,
        parse_config_override, split_command_line,
    };
    use std::collections::HashMap;
    use taskcal_core::calendar::WeekStart;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Midnight ").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Midnight");

        let parsed = parse_config_override("Week-Start=sunday").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::WeekStart);
    }

    #[test]
    fn parse_config_override_rejects_bad_input() {
        let err = parse_config_override("aliases. = foo").unwrap_err();
        assert!(err.contains("aliases override requires an alias name"));

        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));

        let err = parse_config_override("aliasesls").unwrap_err();
        assert!(err.contains("KEY=VALUE"));

        let err = parse_config_override("theme.dark=noir").unwrap_err();
        assert!(err.contains("subfields"));
    }

    #[test]
    fn build_overrides_collects_every_target() {
        let overrides = build_overrides(&strings(&[
            "theme=noir",
            "week_start=sunday",
            "aliases.td=day",
        ]))
        .unwrap();

        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.week_start, Some(WeekStart::Sunday));
        assert_eq!(overrides.aliases.get("td").map(String::as_str), Some("day"));

        let err = build_overrides(&strings(&["week_start=friday"])).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn collect_config_overrides_handles_both_spellings() {
        let args = strings(&[
            "--config-override",
            "theme=noir",
            "list",
            "--config-override=aliases.x=day",
        ]);
        assert_eq!(
            collect_config_overrides(&args),
            strings(&["theme=noir", "aliases.x=day"])
        );
    }

    #[test]
    fn expand_alias_replaces_first_positional() {
        let aliases: HashMap<String, String> =
            [("urgent".to_string(), "list --priority urgent".to_string())]
                .into_iter()
                .collect();
        let args = strings(&["--config-override", "theme=noir", "urgent", "--json"]);

        let expanded = expand_alias(args, &aliases).unwrap();

        assert_eq!(
            expanded,
            strings(&[
                "--config-override",
                "theme=noir",
                "list",
                "--priority",
                "urgent",
                "--json"
            ])
        );
    }

    #[test]
    fn expand_alias_leaves_unknown_commands() {
        let args = strings(&["list", "--json"]);
        let expanded = expand_alias(args.clone(), &HashMap::new()).unwrap();
        assert_eq!(expanded, args);
    }

    #[test]
    fn split_command_line_respects_quotes() {
        let args = split_command_line(r#"add "Buy \"good\" milk" --due 2024-01-10"#).unwrap();
        assert_eq!(
            args,
            strings(&["add", "Buy \"good\" milk", "--due", "2024-01-10"])
        );

        let err = split_command_line("add \"unterminated").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
