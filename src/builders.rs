use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::ConfigError;

mod optics;
mod wavefront;

pub use optics::OpticsBuilder;
pub use wavefront::WavefrontSpecBuilder;

fn load_toml<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    let mut file =
        File::open(&path).map_err(|e| ConfigError::Open(e, path.as_ref().to_path_buf()))?;
    let mut toml = String::new();
    file.read_to_string(&mut toml)
        .map_err(|e| ConfigError::Read(e, path.as_ref().to_path_buf()))?;
    let builder: T = toml::from_str(&toml)?;
    log::debug!("builder loaded from {}", path.as_ref().display());
    Ok(builder)
}

fn save_toml<T: Serialize, P: AsRef<Path>>(
    builder: &T,
    name: &str,
    path: P,
) -> Result<(), ConfigError> {
    let toml = toml::to_string_pretty(builder)?;
    let mut file =
        File::create(&path).map_err(|e| ConfigError::Create(e, path.as_ref().to_path_buf()))?;
    write!(file, "# ::oiwvf::{}\n\n{}", name, toml)
        .map_err(|e| ConfigError::Write(e, path.as_ref().to_path_buf()))?;
    Ok(())
}
