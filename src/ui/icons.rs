/// Glyphs used by the CLI
pub struct Icons;

impl Icons {
    pub const SERVE: &str = "🚀";
    pub const SEARCH: &str = "🔍";
    pub const OK: &str = "✅";
    pub const FAIL: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const NOTE: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const REMOTE: &str = "🌍";
    pub const DUMP: &str = "📄";
    pub const DATABASE: &str = "🗄️";
    pub const WRITTEN: &str = "📦";
    pub const SKIPPED: &str = "⏭️";
    pub const ELAPSED: &str = "⏱️";
}
