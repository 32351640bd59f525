mod header;
mod utils;

pub use header::draw_header;
pub use utils::{format_progress, progress_color, truncate};
