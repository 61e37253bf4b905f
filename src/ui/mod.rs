pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{company_detail, error, header, info, status, success, timing, warn};
pub use progress::{LoadProgress, Spinner};
pub use table::{companies_table, stats_table};
pub use theme::theme;
