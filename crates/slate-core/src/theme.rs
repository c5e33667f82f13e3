use serde::{Deserialize, Serialize};

/// The theme every installation ships with; task theme references
/// that no longer resolve fall back to it, and it cannot be deleted.
pub const DEFAULT_THEME_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeColors {
    pub background: String,
    pub text: String,
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub is_dark: bool,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone)]
pub struct NewTheme {
    pub name: String,
    pub is_dark: bool,
    pub colors: ThemeColors,
}

#[derive(Debug, Clone, Default)]
pub struct ThemePatch {
    pub name: Option<String>,
    pub is_dark: Option<bool>,
    pub colors: Option<ThemeColors>,
}

impl Theme {
    pub fn apply(&mut self, patch: ThemePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(is_dark) = patch.is_dark {
            self.is_dark = is_dark;
        }
        if let Some(colors) = patch.colors {
            self.colors = colors;
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1a1a".to_string(),
            primary: "#3b82f6".to_string(),
            secondary: "#6b7280".to_string(),
            accent: "#f97316".to_string(),
        }
    }
}

pub fn default_themes() -> Vec<Theme> {
    vec![Theme {
        id: DEFAULT_THEME_ID.to_string(),
        name: "Default".to_string(),
        is_dark: false,
        colors: ThemeColors::default(),
    }]
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_THEME_ID, default_themes};

    #[test]
    fn default_set_contains_the_default_theme() {
        let themes = default_themes();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].id, DEFAULT_THEME_ID);
        assert!(!themes[0].is_dark);
    }

    #[test]
    fn theme_wire_format_uses_camel_case() {
        let value = serde_json::to_value(&default_themes()[0]).expect("serialize theme");
        assert_eq!(value["isDark"], false);
        assert_eq!(value["colors"]["background"], "#ffffff");
    }
}
