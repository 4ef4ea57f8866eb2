pub mod config;
pub mod list;
pub mod run;

pub use list::list_songs;
pub use run::run_pipeline;
