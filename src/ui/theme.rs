use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub accent: Style,
    pub label: Style,
}

impl Theme {
    /// Colored when stdout is a terminal and `NO_COLOR` is unset
    fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self {
                heading: Style::new(),
                success: Style::new(),
                error: Style::new(),
                warn: Style::new(),
                accent: Style::new(),
                label: Style::new(),
            };
        }
        Self {
            heading: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            accent: Style::new().magenta(),
            label: Style::new().white().dimmed(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
