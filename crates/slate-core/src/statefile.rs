use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::tabs::{Tab, built_in_tabs};
use crate::task::{Priority, Status, Task};
use crate::theme::{DEFAULT_THEME_ID, Theme, default_themes};

/// Everything that survives a restart. UI-only state (modal flags,
/// the selected task) is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub custom_tabs: Vec<Tab>,
    pub active_tab_id: String,
    pub themes: Vec<Theme>,
}

/// The stored blob with every top-level key optional, so missing or
/// null keys fall back to defaults individually rather than failing
/// the whole decode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    tasks: Option<Vec<Task>>,
    #[serde(default)]
    custom_tabs: Option<Vec<Tab>>,
    #[serde(default)]
    active_tab_id: Option<String>,
    #[serde(default)]
    themes: Option<Vec<Theme>>,
}

impl Snapshot {
    /// Compiled-in default state: the welcome tasks, no custom tabs,
    /// the first built-in tab active, the default theme set.
    pub fn default_with_seed(now: DateTime<Utc>) -> Self {
        Self {
            tasks: seed_tasks(now),
            custom_tabs: vec![],
            active_tab_id: built_in_tabs()[0].id.clone(),
            themes: default_themes(),
        }
    }
}

fn seed_task(
    id: &str,
    title: &str,
    description: &str,
    priority: Priority,
    days_ago: i64,
    now: DateTime<Utc>,
) -> Task {
    let stamp = now - Duration::days(days_ago);
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        status: Status::Pending,
        created_at: stamp,
        updated_at: stamp,
        completed_at: None,
        theme_id: Some(DEFAULT_THEME_ID.to_string()),
    }
}

/// The onboarding tasks a fresh installation starts with.
pub fn seed_tasks(now: DateTime<Utc>) -> Vec<Task> {
    vec![
        seed_task(
            "SLT-1",
            "Welcome to Slate 👋",
            "Get started by exploring the interface and creating your first task.",
            Priority::Medium,
            5,
            now,
        ),
        seed_task(
            "SLT-2",
            "Connect to Slack",
            "Integrate with Slack to receive notifications and updates.",
            Priority::Low,
            4,
            now,
        ),
        seed_task(
            "SLT-3",
            "Connect GitHub or GitLab",
            "Link your repositories to track issues and pull requests.",
            Priority::Medium,
            3,
            now,
        ),
        seed_task(
            "SLT-4",
            "Customize settings",
            "Adjust your workspace settings to match your workflow.",
            Priority::Low,
            2,
            now,
        ),
        seed_task(
            "SLT-5",
            "Slice work with custom tabs",
            "Save a filter and sort as a tab to focus on what matters.",
            Priority::High,
            1,
            now,
        ),
    ]
}

/// Single-file persistence for the whole app snapshot. Loading is
/// infallible (defaults on any failure); saving is atomic and
/// best-effort from the store's point of view.
#[derive(Debug)]
pub struct StateFile {
    pub path: PathBuf,
}

impl StateFile {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(path = %path.display(), "using state file");
        Self { path }
    }

    /// Reads the snapshot, substituting defaults key by key for
    /// anything missing and the full default snapshot when the file
    /// is absent, unreadable, or malformed. Never errors.
    #[tracing::instrument(skip(self, now))]
    pub fn load(&self, now: DateTime<Utc>) -> Snapshot {
        let raw = match self.read_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(path = %self.path.display(), "no state file; starting from defaults");
                return Snapshot::default_with_seed(now);
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to load state; starting from defaults"
                );
                return Snapshot::default_with_seed(now);
            }
        };

        let defaults = Snapshot::default_with_seed(now);
        let mut snapshot = Snapshot {
            tasks: raw.tasks.unwrap_or(defaults.tasks),
            custom_tabs: raw.custom_tabs.unwrap_or(defaults.custom_tabs),
            active_tab_id: raw.active_tab_id.unwrap_or(defaults.active_tab_id),
            themes: raw.themes.unwrap_or(defaults.themes),
        };

        // The default theme must always exist for weak theme
        // references to resolve against.
        if snapshot.themes.is_empty() {
            warn!("stored theme set is empty; restoring defaults");
            snapshot.themes = default_themes();
        }

        debug!(
            tasks = snapshot.tasks.len(),
            custom_tabs = snapshot.custom_tabs.len(),
            themes = snapshot.themes.len(),
            active_tab = %snapshot.active_tab_id,
            "loaded snapshot"
        );
        snapshot
    }

    fn read_raw(&self) -> anyhow::Result<Option<RawSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let raw = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(raw))
    }

    /// Writes the snapshot via a temp file rename so a crash mid-save
    /// can never leave a half-written blob behind.
    #[tracing::instrument(skip(self, snapshot))]
    pub fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let mut temp = NamedTempFile::new_in(dir)?;
        let serialized = serde_json::to_string_pretty(snapshot)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path)
            .map_err(|err| anyhow!("failed to persist {}: {}", self.path.display(), err))?;

        debug!(
            path = %self.path.display(),
            tasks = snapshot.tasks.len(),
            "saved snapshot"
        );
        Ok(())
    }
}
