use anyhow::{anyhow, bail};
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::render::Renderer;
use crate::store::Store;
use crate::tabs::{NewTab, SortBy, SortOrder};
use crate::task::{NewTask, Priority, Status, TaskPatch};
use crate::theme::{DEFAULT_THEME_ID, NewTheme, ThemeColors};
use crate::view::{filter_tasks, sort_tasks};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add", "list", "show", "modify", "done", "reopen", "delete", "tabs", "tab-add", "tab-rm",
        "tab-use", "themes", "theme-add", "theme-rm", "version", "help",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &mut Store,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let known = known_command_names();
    let command = expand_command_abbrev(inv.command.as_str(), &known)
        .ok_or_else(|| anyhow!("unknown or ambiguous command: {} (try help)", inv.command))?;

    debug!(command, args = ?inv.args, "dispatching");

    match command {
        "add" => cmd_add(store, &inv.args),
        "list" => cmd_list(store, renderer, &inv.args),
        "show" => cmd_show(store, renderer, &inv.args),
        "modify" => cmd_modify(store, &inv.args),
        "done" => cmd_set_status(store, &inv.args, Status::Completed),
        "reopen" => cmd_set_status(store, &inv.args, Status::Pending),
        "delete" => cmd_delete(store, &inv.args),
        "tabs" => cmd_tabs(store, renderer),
        "tab-add" => cmd_tab_add(store, &inv.args),
        "tab-rm" => cmd_tab_rm(store, &inv.args),
        "tab-use" => cmd_tab_use(store, &inv.args),
        "themes" => cmd_themes(store, renderer),
        "theme-add" => cmd_theme_add(store, &inv.args),
        "theme-rm" => cmd_theme_rm(store, &inv.args),
        "version" => {
            println!("slate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" => cmd_help(cfg),
        other => bail!("command not implemented: {other}"),
    }
}

/// Splits `key:value` modifier tokens out of a word list; everything
/// else joins into the free-text remainder.
fn split_mods(args: &[String]) -> (String, Vec<(String, String)>) {
    let mut words = Vec::new();
    let mut mods = Vec::new();
    for arg in args {
        match arg.split_once(':') {
            Some((key, value)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
                mods.push((key.to_ascii_lowercase(), value.to_string()));
            }
            _ => words.push(arg.clone()),
        }
    }
    (words.join(" "), mods)
}

fn parse_status(value: &str) -> anyhow::Result<Status> {
    match value.to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
        "pending" => Ok(Status::Pending),
        "in progress" | "inprogress" => Ok(Status::InProgress),
        "completed" | "done" => Ok(Status::Completed),
        "backlog" => Ok(Status::Backlog),
        other => Err(anyhow!("unknown status: {other}")),
    }
}

fn parse_priority(value: &str) -> anyhow::Result<Priority> {
    match value.to_ascii_lowercase().as_str() {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(anyhow!("unknown priority: {other}")),
    }
}

fn parse_status_list(value: &str) -> anyhow::Result<Vec<Status>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(Status::ALL.to_vec());
    }
    value.split(',').map(|part| parse_status(part.trim())).collect()
}

fn parse_priority_list(value: &str) -> anyhow::Result<Vec<Priority>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(Priority::ALL.to_vec());
    }
    value
        .split(',')
        .map(|part| parse_priority(part.trim()))
        .collect()
}

fn parse_sort_by(value: &str) -> anyhow::Result<SortBy> {
    match value.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "priority" => Ok(SortBy::Priority),
        "status" => Ok(SortBy::Status),
        "created" | "createdat" => Ok(SortBy::CreatedAt),
        "updated" | "updatedat" => Ok(SortBy::UpdatedAt),
        "completed" | "completedat" => Ok(SortBy::CompletedAt),
        other => Err(anyhow!("unknown sort key: {other}")),
    }
}

fn parse_sort_order(value: &str) -> anyhow::Result<SortOrder> {
    match value.to_ascii_lowercase().as_str() {
        "asc" | "ascending" => Ok(SortOrder::Asc),
        "desc" | "descending" => Ok(SortOrder::Desc),
        other => Err(anyhow!("unknown sort order: {other}")),
    }
}

#[instrument(skip(store, args))]
fn cmd_add(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let (title, mods) = split_mods(args);
    // Required-field validation lives here at the frontend boundary;
    // the store accepts whatever it is handed.
    if title.is_empty() {
        bail!("a task needs a non-empty title");
    }

    let mut data = NewTask {
        title,
        description: String::new(),
        priority: Priority::Medium,
        status: Status::Pending,
        theme_id: Some(DEFAULT_THEME_ID.to_string()),
    };
    for (key, value) in &mods {
        match key.as_str() {
            "priority" => data.priority = parse_priority(value)?,
            "status" => data.status = parse_status(value)?,
            "desc" | "description" => data.description = value.clone(),
            "theme" => data.theme_id = Some(value.clone()),
            other => bail!("unknown modifier: {other}:"),
        }
    }

    let task = store.add_task(data);
    info!(id = %task.id, "created task");
    println!("Created task {}.", task.id);
    Ok(())
}

fn resolve_tab_id(store: &Store, needle: &str) -> Option<String> {
    store
        .tabs()
        .find(|tab| tab.id == needle || tab.name.eq_ignore_ascii_case(needle))
        .map(|tab| tab.id.clone())
}

#[instrument(skip(store, renderer, args))]
fn cmd_list(store: &Store, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    let tasks = if args.is_empty() {
        store.active_tab_tasks()
    } else {
        let needle = args.join(" ");
        let id = resolve_tab_id(store, &needle)
            .ok_or_else(|| anyhow!("no tab matching: {needle}"))?;
        let tab = store
            .tabs()
            .find(|tab| tab.id == id)
            .ok_or_else(|| anyhow!("no tab matching: {needle}"))?;
        sort_tasks(&filter_tasks(store.tasks(), tab), tab.sort_by, tab.sort_order)
    };

    renderer.print_task_table(&tasks)?;
    println!("{} tasks", tasks.len());
    Ok(())
}

#[instrument(skip(store, renderer, args))]
fn cmd_show(store: &Store, renderer: &mut Renderer, args: &[String]) -> anyhow::Result<()> {
    let [id] = args else {
        bail!("show requires exactly one task id");
    };
    let task = store
        .task(id)
        .ok_or_else(|| anyhow!("no task with id {id}"))?;
    renderer.print_task_info(task, store.theme_for(task))
}

#[instrument(skip(store, args))]
fn cmd_modify(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let Some((id, rest)) = args.split_first() else {
        bail!("modify requires a task id");
    };
    let (title, mods) = split_mods(rest);

    let mut patch = TaskPatch::default();
    if !title.is_empty() {
        patch.title = Some(title);
    }
    for (key, value) in &mods {
        match key.as_str() {
            "priority" => patch.priority = Some(parse_priority(value)?),
            "status" => patch.status = Some(parse_status(value)?),
            "desc" | "description" => patch.description = Some(value.clone()),
            "theme" if value == "none" => patch.theme_id = Some(None),
            "theme" => patch.theme_id = Some(Some(value.clone())),
            other => bail!("unknown modifier: {other}:"),
        }
    }
    if patch.is_empty() {
        bail!("modify requires at least one change");
    }

    if store.update_task(id, patch) {
        println!("Modified task {id}.");
    } else {
        println!("No task with id {id}.");
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_set_status(store: &mut Store, args: &[String], status: Status) -> anyhow::Result<()> {
    let [id] = args else {
        bail!("expected exactly one task id");
    };
    let patch = TaskPatch {
        status: Some(status),
        ..TaskPatch::default()
    };
    if store.update_task(id, patch) {
        println!("Task {id} is now {}.", status.label());
    } else {
        println!("No task with id {id}.");
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_delete(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let [id] = args else {
        bail!("delete requires exactly one task id");
    };
    if store.delete_task(id) {
        println!("Deleted task {id}.");
    } else {
        println!("No task with id {id}.");
    }
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_tabs(store: &Store, renderer: &mut Renderer) -> anyhow::Result<()> {
    let active_id = store.active_tab().id.clone();
    renderer.print_tab_table(store.tabs(), &active_id)
}

#[instrument(skip(store, args))]
fn cmd_tab_add(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let (name, mods) = split_mods(args);
    if name.is_empty() {
        bail!("a tab needs a non-empty name");
    }

    let mut data = NewTab {
        name,
        status_filter: Status::ALL.to_vec(),
        priority_filter: Priority::ALL.to_vec(),
        sort_by: None,
        sort_order: None,
    };
    for (key, value) in &mods {
        match key.as_str() {
            "statuses" => data.status_filter = parse_status_list(value)?,
            "priorities" => data.priority_filter = parse_priority_list(value)?,
            "sort" => data.sort_by = Some(parse_sort_by(value)?),
            "order" => data.sort_order = Some(parse_sort_order(value)?),
            other => bail!("unknown modifier: {other}:"),
        }
    }

    let tab = store.add_tab(data);
    println!("Created tab {} ({}).", tab.name, tab.id);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_tab_rm(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        bail!("tab-rm requires a tab id or name");
    }
    let needle = args.join(" ");
    let Some(id) = resolve_tab_id(store, &needle) else {
        println!("No tab matching {needle}.");
        return Ok(());
    };

    if store.delete_tab(&id) {
        println!("Deleted tab {id}.");
    } else {
        println!("Tab {id} cannot be deleted.");
    }
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_tab_use(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    if args.is_empty() {
        bail!("tab-use requires a tab id or name");
    }
    let needle = args.join(" ");
    let id = resolve_tab_id(store, &needle)
        .ok_or_else(|| anyhow!("no tab matching: {needle}"))?;
    store.set_active_tab(&id);
    println!("Active tab is now {}.", store.active_tab().name);
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_themes(store: &Store, renderer: &mut Renderer) -> anyhow::Result<()> {
    renderer.print_theme_table(store.themes())
}

#[instrument(skip(store, args))]
fn cmd_theme_add(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let (name, mods) = split_mods(args);
    if name.is_empty() {
        bail!("a theme needs a non-empty name");
    }

    let mut data = NewTheme {
        name,
        is_dark: false,
        colors: ThemeColors::default(),
    };
    for (key, value) in &mods {
        match key.as_str() {
            "dark" => data.is_dark = matches!(value.as_str(), "1" | "yes" | "true" | "on"),
            "bg" | "background" => data.colors.background = value.clone(),
            "text" => data.colors.text = value.clone(),
            "primary" => data.colors.primary = value.clone(),
            "secondary" => data.colors.secondary = value.clone(),
            "accent" => data.colors.accent = value.clone(),
            other => bail!("unknown modifier: {other}:"),
        }
    }

    let theme = store.add_theme(data);
    println!("Created theme {} ({}).", theme.name, theme.id);
    Ok(())
}

#[instrument(skip(store, args))]
fn cmd_theme_rm(store: &mut Store, args: &[String]) -> anyhow::Result<()> {
    let [id] = args else {
        bail!("theme-rm requires exactly one theme id");
    };
    if store.delete_theme(id) {
        println!("Deleted theme {id}.");
    } else {
        println!("Theme {id} cannot be deleted.");
    }
    Ok(())
}

fn cmd_help(cfg: &Config) -> anyhow::Result<()> {
    let default_command = cfg
        .get("default.command")
        .unwrap_or_else(|| "list".to_string());
    println!(
        "\
slate <command> [args]

  add <title> [priority:high] [status:backlog] [desc:...] [theme:<id>]
  list [tab]                 show the active tab's tasks (default: {default_command})
  show <id>                  full detail for one task
  modify <id> [title] [priority:|status:|desc:|theme:]
  done <id> / reopen <id>    complete or reopen a task
  delete <id>                remove a task
  tabs / tab-use <tab>       list views, switch the active view
  tab-add <name> [statuses:pending,backlog] [priorities:high] [sort:priority] [order:asc]
  tab-rm <tab>               delete a custom view
  themes / theme-add <name> [dark:yes] [bg:|text:|primary:|secondary:|accent:]
  theme-rm <id>              delete a theme (the default is protected)
  version / help"
    );
    Ok(())
}
