mod clear;
mod download;
mod index;
mod info;
mod place;
mod progress;
mod status;

pub use clear::run_clear;
pub use download::run_download;
pub use index::run_index;
pub use info::run_info;
pub use place::run_place;
pub use progress::run_progress;
pub use status::run_status;
