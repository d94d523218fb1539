pub mod logging;
pub mod output;
pub mod progress;
pub mod utils;

pub use logging::*;
pub use output::{read_jsonl, write_csv, write_jsonl};
pub use progress::{create_count_progress_bar, create_spinner};
pub use utils::format_elapsed;
