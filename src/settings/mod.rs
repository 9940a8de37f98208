//! Settings come from `settings/dev.toml` in debug builds and
//! `settings/release.toml` otherwise, unless `--settings` names a file.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
