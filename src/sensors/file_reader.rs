//! Reader for the files the radio-to-host bridge writes.
//!
//! The bridge keeps one small file per channel holding the latest reading as
//! an ASCII decimal integer. Only the start of the file is looked at.

use super::{Channel, ReadError, SensorChannelReader};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Bytes of a sensor file considered when parsing.
const MAX_READING_LEN: u64 = 32;

/// Reads each channel from `<bridge_dir>/<channel file>`.
pub struct FileChannelReader {
    bridge_dir: PathBuf,
}

impl FileChannelReader {
    pub fn new(bridge_dir: impl Into<PathBuf>) -> Self {
        Self {
            bridge_dir: bridge_dir.into(),
        }
    }

    pub fn path_for(&self, channel: Channel) -> PathBuf {
        self.bridge_dir.join(channel.file_name())
    }
}

impl SensorChannelReader for FileChannelReader {
    fn read(&mut self, channel: Channel) -> Result<i32, ReadError> {
        read_reading(&self.path_for(channel))
    }
}

fn read_reading(path: &Path) -> Result<i32, ReadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ReadError::Missing {
            path: path.to_path_buf(),
        },
        _ => ReadError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let mut raw = Vec::with_capacity(MAX_READING_LEN as usize);
    file.take(MAX_READING_LEN)
        .read_to_end(&mut raw)
        .map_err(|source| ReadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let content = String::from_utf8_lossy(&raw);
    content
        .trim_start_matches('\u{feff}')
        .trim()
        .parse::<i32>()
        .map_err(|_| ReadError::Malformed {
            path: path.to_path_buf(),
            content: content.into_owned(),
        })
}
