use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_DATA_DIR: &str = "data";
pub(crate) const STORE_FILE_NAME: &str = "watched";

pub fn default_config_file_path() -> Option<PathBuf> {
    let base = dirs::config_dir()?;
    Some(base.join("serialtrack").join("config.yaml"))
}

pub(crate) fn store_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

pub(crate) fn store_temp_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{STORE_FILE_NAME}.tmp"))
}
