use std::fs;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::utils::constants::{CONFIG_FILE, CONFIG_PATH};

pub fn file_reader<R>(r: R) -> BufReader<R>
where
    R: Read,
{
    BufReader::with_capacity(131_072, r)
}

pub fn get_exe_path() -> PathBuf {
    let default_path = std::path::PathBuf::from("./");
    let current_exe = std::env::current_exe();
    match current_exe {
        Ok(exe) => {
            match fs::read_link(&exe) {
                Ok(f) => f.parent().map_or(default_path, std::path::Path::to_path_buf),
                Err(_) => exe.parent().map_or(default_path, std::path::Path::to_path_buf)
            }
        }
        Err(_) => default_path
    }
}

fn get_default_path(file: &str) -> String {
    let path: PathBuf = get_exe_path();
    let default_path = path.join(file);
    String::from(if default_path.exists() {
        default_path.to_str().unwrap_or(file)
    } else {
        file
    })
}

#[inline]
pub fn get_default_config_file_path() -> String {
    let config_path = get_default_path(CONFIG_PATH);
    PathBuf::from(config_path).join(CONFIG_FILE).to_string_lossy().to_string()
}

pub fn open_file(file_name: &Path) -> Result<File, std::io::Error> {
    File::open(file_name)
}
