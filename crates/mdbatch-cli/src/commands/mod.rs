//! Command implementations

pub mod check;
pub mod prepare;
pub mod store;

use crate::error::Result;
use crate::input::{parse_delimiter, read_csv, CsvInput};
use crate::InputArgs;
use mdbatch_core::Config;
use std::path::Path;
use tracing::debug;

/// Load the batch configuration and apply environment overrides
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?.merge_env()?;
    debug!(
        config = %path.display(),
        store = %config.store_path().display(),
        "loaded configuration"
    );
    Ok(config)
}

/// Load configuration and input for `check` and `prepare`
pub(crate) fn load_batch(args: &InputArgs) -> Result<(Config, CsvInput)> {
    let config = load_config(&args.config)?;
    let input = read_csv(&args.input, parse_delimiter(&args.delimiter)?)?;
    input.require_column(&args.input, &config.id_field)?;
    Ok((config, input))
}
