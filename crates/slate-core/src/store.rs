use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::statefile::{Snapshot, StateFile};
use crate::tabs::{NewTab, Tab, TabPatch, built_in_tabs};
use crate::task::{NewTask, Task, TaskPatch};
use crate::theme::{DEFAULT_THEME_ID, NewTheme, Theme, ThemePatch};
use crate::view::{filter_tasks, sort_tasks};

/// The central state container: owns the task, tab, and theme
/// collections plus the transient UI selections, and writes through
/// to its [`StateFile`] after every mutation that touches persisted
/// state.
///
/// Mutations addressed by id report their outcome: `false` means the
/// id did not resolve (or the operation was refused) and state is
/// untouched.
#[derive(Debug)]
pub struct Store {
    file: StateFile,
    prefix: String,

    tasks: Vec<Task>,
    built_in_tabs: Vec<Tab>,
    custom_tabs: Vec<Tab>,
    themes: Vec<Theme>,

    active_tab_id: String,
    active_task_id: Option<String>,
    task_modal_open: bool,
    tab_modal_open: bool,
}

impl Store {
    /// Loads the persisted snapshot (defaults on any failure) and
    /// seeds the built-in tabs.
    #[tracing::instrument(skip(file, prefix))]
    pub fn open(file: StateFile, prefix: impl Into<String>) -> Self {
        let snapshot = file.load(Utc::now());
        let store = Self {
            file,
            prefix: prefix.into(),
            tasks: snapshot.tasks,
            built_in_tabs: built_in_tabs(),
            custom_tabs: snapshot.custom_tabs,
            themes: snapshot.themes,
            active_tab_id: snapshot.active_tab_id,
            active_task_id: None,
            task_modal_open: false,
            tab_modal_open: false,
        };
        info!(
            tasks = store.tasks.len(),
            custom_tabs = store.custom_tabs.len(),
            themes = store.themes.len(),
            "opened store"
        );
        store
    }

    // --- reads ---------------------------------------------------

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Built-in tabs first, then custom tabs, in insertion order.
    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.built_in_tabs.iter().chain(self.custom_tabs.iter())
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|theme| theme.id == id)
    }

    /// Resolves the active tab id against the combined collection; a
    /// stale id resolves to the first built-in tab.
    pub fn active_tab(&self) -> &Tab {
        self.tabs()
            .find(|tab| tab.id == self.active_tab_id)
            .unwrap_or(&self.built_in_tabs[0])
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active_task_id.as_deref().and_then(|id| self.task(id))
    }

    /// The active tab's projection: filtered, then sorted by the
    /// tab's sort settings.
    pub fn active_tab_tasks(&self) -> Vec<Task> {
        let tab = self.active_tab();
        sort_tasks(&filter_tasks(&self.tasks, tab), tab.sort_by, tab.sort_order)
    }

    /// Follows a task's weak theme reference: a dangling or absent
    /// id resolves to the default theme.
    pub fn theme_for(&self, task: &Task) -> &Theme {
        task.theme_id
            .as_deref()
            .and_then(|id| self.theme(id))
            .or_else(|| self.theme(DEFAULT_THEME_ID))
            .unwrap_or(&self.themes[0])
    }

    pub fn is_task_modal_open(&self) -> bool {
        self.task_modal_open
    }

    pub fn is_tab_modal_open(&self) -> bool {
        self.tab_modal_open
    }

    // --- selection and UI flags ---------------------------------

    /// Unresolvable ids fall back to the first built-in tab.
    #[tracing::instrument(skip(self))]
    pub fn set_active_tab(&mut self, id: &str) {
        self.active_tab_id = if self.tabs().any(|tab| tab.id == id) {
            id.to_string()
        } else {
            debug!(id, "unknown tab id; falling back to first built-in");
            self.built_in_tabs[0].id.clone()
        };
        self.persist();
    }

    /// Selecting a task opens the task modal; clearing the selection
    /// leaves the modal alone (closing it is the reverse path).
    pub fn set_active_task(&mut self, id: Option<String>) {
        let opened = id.is_some();
        self.active_task_id = id;
        if opened {
            self.task_modal_open = true;
        }
    }

    /// Closing the task modal also drops the task selection.
    pub fn set_task_modal_open(&mut self, open: bool) {
        self.task_modal_open = open;
        if !open {
            self.active_task_id = None;
        }
    }

    pub fn set_tab_modal_open(&mut self, open: bool) {
        self.tab_modal_open = open;
    }

    // --- task CRUD ----------------------------------------------

    #[tracing::instrument(skip(self, data), fields(title = %data.title))]
    pub fn add_task(&mut self, data: NewTask) -> &Task {
        let id = self.next_task_id();
        let task = Task::new(id.clone(), data, Utc::now());
        self.tasks.push(task);
        self.persist();
        info!(id = %id, "task added");
        &self.tasks[self.tasks.len() - 1]
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!(id, "update_task: no such task");
            return false;
        };
        task.apply(patch, Utc::now());
        self.persist();
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_task(&mut self, id: &str) -> bool {
        let Some(idx) = self.tasks.iter().position(|task| task.id == id) else {
            debug!(id, "delete_task: no such task");
            return false;
        };
        self.tasks.remove(idx);
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
            self.task_modal_open = false;
        }
        self.persist();
        info!(id, "task deleted");
        true
    }

    /// One past the highest numeric suffix among live task ids, so
    /// ids stay unique even after deletions.
    fn next_task_id(&self) -> String {
        let max = self
            .tasks
            .iter()
            .filter_map(|task| {
                task.id
                    .strip_prefix(self.prefix.as_str())
                    .and_then(|rest| rest.strip_prefix('-'))
                    .and_then(|n| n.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0);
        format!("{}-{}", self.prefix, max + 1)
    }

    // --- theme CRUD ---------------------------------------------

    #[tracing::instrument(skip(self, data), fields(name = %data.name))]
    pub fn add_theme(&mut self, data: NewTheme) -> &Theme {
        let theme = Theme {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            is_dark: data.is_dark,
            colors: data.colors,
        };
        self.themes.push(theme);
        self.persist();
        &self.themes[self.themes.len() - 1]
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn update_theme(&mut self, id: &str, patch: ThemePatch) -> bool {
        let Some(theme) = self.themes.iter_mut().find(|theme| theme.id == id) else {
            debug!(id, "update_theme: no such theme");
            return false;
        };
        theme.apply(patch);
        self.persist();
        true
    }

    /// Tasks referencing a deleted theme keep their dangling id;
    /// reads through [`Store::theme_for`] fall back to the default.
    #[tracing::instrument(skip(self))]
    pub fn delete_theme(&mut self, id: &str) -> bool {
        if id == DEFAULT_THEME_ID {
            warn!("refusing to delete the default theme");
            return false;
        }
        let Some(idx) = self.themes.iter().position(|theme| theme.id == id) else {
            debug!(id, "delete_theme: no such theme");
            return false;
        };
        self.themes.remove(idx);
        self.persist();
        true
    }

    // --- tab CRUD (custom tabs only) ----------------------------

    /// New tabs are always custom and become the active tab.
    #[tracing::instrument(skip(self, data), fields(name = %data.name))]
    pub fn add_tab(&mut self, data: NewTab) -> &Tab {
        let tab = Tab {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            status_filter: data.status_filter,
            priority_filter: data.priority_filter,
            is_custom: true,
            sort_by: data.sort_by,
            sort_order: data.sort_order,
        };
        self.active_tab_id = tab.id.clone();
        self.custom_tabs.push(tab);
        self.persist();
        &self.custom_tabs[self.custom_tabs.len() - 1]
    }

    /// Built-in tabs are immutable; ids that resolve to one are
    /// reported as not found.
    #[tracing::instrument(skip(self, patch))]
    pub fn update_tab(&mut self, id: &str, patch: TabPatch) -> bool {
        let Some(tab) = self.custom_tabs.iter_mut().find(|tab| tab.id == id) else {
            debug!(id, "update_tab: no such custom tab");
            return false;
        };
        tab.apply(patch);
        self.persist();
        true
    }

    /// Deleting the active tab re-points the selection at the first
    /// built-in tab. Deleting the last tab of all is refused; the
    /// tab set must never become empty.
    #[tracing::instrument(skip(self))]
    pub fn delete_tab(&mut self, id: &str) -> bool {
        let Some(idx) = self.custom_tabs.iter().position(|tab| tab.id == id) else {
            debug!(id, "delete_tab: no such custom tab");
            return false;
        };
        if self.built_in_tabs.is_empty() && self.custom_tabs.len() == 1 {
            warn!(id, "refusing to delete the last remaining tab");
            return false;
        }

        self.custom_tabs.remove(idx);
        if self.active_tab_id == id {
            let fallback = self
                .built_in_tabs
                .first()
                .or_else(|| self.custom_tabs.first());
            if let Some(tab) = fallback {
                self.active_tab_id = tab.id.clone();
            }
        }
        self.persist();
        info!(id, "tab deleted");
        true
    }

    // --- persistence --------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            custom_tabs: self.custom_tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
            themes: self.themes.clone(),
        }
    }

    /// Write-through after a successful mutation. Best-effort: a
    /// failed save is logged and the in-memory state stands.
    fn persist(&self) {
        if let Err(err) = self.file.save(&self.snapshot()) {
            warn!(error = %err, "failed to save state; continuing with in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::{TempDir, tempdir};

    use super::Store;
    use crate::statefile::StateFile;
    use crate::tabs::{NewTab, SortBy, SortOrder, TabPatch};
    use crate::task::{NewTask, Priority, Status, TaskPatch};
    use crate::theme::{NewTheme, ThemeColors, ThemePatch};

    fn open_store(dir: &TempDir) -> Store {
        Store::open(StateFile::open(dir.path().join("state.json")), "SLT")
    }

    fn new_task(title: &str, priority: Priority, status: Status) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            priority,
            status,
            theme_id: None,
        }
    }

    fn new_tab(name: &str) -> NewTab {
        NewTab {
            name: name.to_string(),
            status_filter: Status::ALL.to_vec(),
            priority_filter: Priority::ALL.to_vec(),
            sort_by: Some(SortBy::CreatedAt),
            sort_order: Some(SortOrder::Asc),
        }
    }

    #[test]
    fn fresh_store_starts_from_seed_state() {
        let dir = tempdir().expect("tempdir");
        let store = open_store(&dir);
        assert_eq!(store.tasks().len(), 5);
        assert_eq!(store.active_tab().id, "all-issues");
        assert_eq!(store.tabs().count(), 3);
        assert!(store.active_task().is_none());
    }

    #[test]
    fn add_task_assigns_fresh_ids_after_deletes() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);

        let id = store
            .add_task(new_task("a", Priority::Low, Status::Pending))
            .id
            .clone();
        assert_eq!(id, "SLT-6");

        // Deleting a middle task must not make the next id collide
        // with a surviving one (a count-based scheme would hand out
        // SLT-6 again here).
        assert!(store.delete_task("SLT-3"));
        let next = store
            .add_task(new_task("b", Priority::Low, Status::Pending))
            .id
            .clone();
        assert_eq!(next, "SLT-7");
        assert_eq!(store.tasks().iter().filter(|t| t.id == next).count(), 1);
    }

    #[test]
    fn update_task_reports_unknown_ids() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        assert!(!store.update_task("SLT-999", TaskPatch::default()));
        assert!(!store.delete_task("SLT-999"));
    }

    #[test]
    fn completing_and_reopening_follows_the_transition_rule() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let id = store
            .add_task(new_task("Write spec", Priority::High, Status::Pending))
            .id
            .clone();

        assert!(store.update_task(
            &id,
            TaskPatch {
                status: Some(Status::Completed),
                ..TaskPatch::default()
            },
        ));
        let task = store.task(&id).expect("task exists");
        assert!(task.completed_at.is_some());
        assert!(task.updated_at >= task.created_at);

        assert!(store.update_task(
            &id,
            TaskPatch {
                status: Some(Status::Pending),
                ..TaskPatch::default()
            },
        ));
        assert_eq!(store.task(&id).expect("task exists").completed_at, None);
    }

    #[test]
    fn deleting_the_active_task_clears_selection_and_modal() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        let id = store
            .add_task(new_task("t", Priority::Low, Status::Pending))
            .id
            .clone();

        store.set_active_task(Some(id.clone()));
        assert!(store.is_task_modal_open());
        assert_eq!(store.active_task().map(|t| t.id.clone()), Some(id.clone()));

        assert!(store.delete_task(&id));
        assert!(store.active_task().is_none());
        assert!(!store.is_task_modal_open());
    }

    #[test]
    fn closing_the_task_modal_clears_the_selection() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        store.set_active_task(Some("SLT-1".to_string()));
        store.set_task_modal_open(false);
        assert!(store.active_task().is_none());
    }

    #[test]
    fn new_tab_becomes_active_and_deleting_it_falls_back() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);

        let id = store.add_tab(new_tab("Hot")).id.clone();
        assert_eq!(store.active_tab().id, id);

        assert!(store.delete_tab(&id));
        assert_eq!(store.active_tab().id, "all-issues");
    }

    #[test]
    fn custom_tabs_and_themes_accept_partial_updates() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);

        let tab_id = store.add_tab(new_tab("Hot")).id.clone();
        assert!(store.update_tab(
            &tab_id,
            TabPatch {
                name: Some("Hotter".to_string()),
                sort_by: Some(Some(SortBy::Priority)),
                ..TabPatch::default()
            },
        ));
        let tab = store.tabs().find(|t| t.id == tab_id).expect("tab exists");
        assert_eq!(tab.name, "Hotter");
        assert_eq!(tab.sort_by, Some(SortBy::Priority));
        // Untouched fields survive the merge.
        assert_eq!(tab.status_filter, Status::ALL.to_vec());

        let theme_id = store
            .add_theme(NewTheme {
                name: "Night".to_string(),
                is_dark: false,
                colors: ThemeColors::default(),
            })
            .id
            .clone();
        assert!(store.update_theme(
            &theme_id,
            ThemePatch {
                is_dark: Some(true),
                ..ThemePatch::default()
            },
        ));
        assert!(store.theme(&theme_id).expect("theme exists").is_dark);
    }

    #[test]
    fn built_in_tabs_are_immutable_through_tab_ops() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        assert!(!store.update_tab("all-issues", TabPatch::default()));
        assert!(!store.delete_tab("backlog"));
        assert_eq!(store.tabs().count(), 3);
    }

    #[test]
    fn stale_active_tab_id_resolves_to_first_built_in() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        store.set_active_tab("no-such-tab");
        assert_eq!(store.active_tab().id, "all-issues");
    }

    #[test]
    fn theme_lookup_falls_back_to_default_after_delete() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);

        let theme_id = store
            .add_theme(NewTheme {
                name: "Night".to_string(),
                is_dark: true,
                colors: ThemeColors::default(),
            })
            .id
            .clone();

        let task_id = store
            .add_task(NewTask {
                theme_id: Some(theme_id.clone()),
                ..new_task("t", Priority::Low, Status::Pending)
            })
            .id
            .clone();

        let task = store.task(&task_id).expect("task exists").clone();
        assert_eq!(store.theme_for(&task).id, theme_id);

        assert!(store.delete_theme(&theme_id));
        // The weak reference dangles; reads fall back to default.
        let task = store.task(&task_id).expect("task exists").clone();
        assert_eq!(store.theme_for(&task).id, "default");
    }

    #[test]
    fn default_theme_cannot_be_deleted() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);
        assert!(!store.delete_theme("default"));
        assert_eq!(store.themes().len(), 1);
    }

    #[test]
    fn active_tab_projection_filters_and_sorts() {
        let dir = tempdir().expect("tempdir");
        let mut store = open_store(&dir);

        store.add_task(new_task("backlogged", Priority::High, Status::Backlog));
        store.set_active_tab("backlog");

        let projected = store.active_tab_tasks();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].title, "backlogged");
    }

    #[test]
    fn mutations_write_through_to_the_state_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        {
            let mut store = Store::open(StateFile::open(path.clone()), "SLT");
            store.add_task(new_task("persisted", Priority::Medium, Status::Pending));
        }
        let reopened = Store::open(StateFile::open(path), "SLT");
        assert!(reopened.tasks().iter().any(|t| t.title == "persisted"));
    }
}
