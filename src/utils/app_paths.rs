use std::error::Error;
use std::fs;
use std::path::PathBuf;

pub struct AppPaths;

impl AppPaths {
    pub fn data_dir() -> Result<PathBuf, Box<dyn Error>> {
        let data_dir = dirs::data_dir()
            .ok_or("Cannot determine data directory")?
            .join("data-sweeper");

        fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn log_file() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::data_dir()?.join("data-sweeper.log"))
    }
}
