use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// External collaborator for best-score persistence. The engine tracks the
/// in-game high score itself; adapters seed it from a store at startup and
/// write improvements back.
pub trait HighScoreStore {
    fn get(&self) -> u32;
    fn set(&mut self, value: u32);
}

/// Store for tests and headless runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryHighScoreStore {
    value: u32,
}

impl MemoryHighScoreStore {
    pub fn new(value: u32) -> Self {
        Self { value }
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn get(&self) -> u32 {
        self.value
    }

    fn set(&mut self, value: u32) {
        self.value = self.value.max(value);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    #[serde(rename = "highScore", alias = "high_score")]
    high_score: u32,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    updated_at: String,
}

/// JSON-file-backed store. I/O failures are logged and degrade to the last
/// known value; they never reach the engine.
pub struct FileHighScoreStore {
    file_path: PathBuf,
    value: u32,
}

impl FileHighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let value = load_value(&file_path);
        Self { file_path, value }
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!(
                    "[high-score] failed to create parent dir {}: {error}",
                    parent.display()
                );
                return;
            }
        }

        let payload = HighScoreFile {
            version: 1,
            high_score: self.value,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    eprintln!(
                        "[high-score] failed to write {}: {error}",
                        self.file_path.display()
                    );
                }
            }
            Err(error) => {
                eprintln!(
                    "[high-score] failed to serialize payload for {}: {error}",
                    self.file_path.display()
                );
            }
        }
    }
}

impl HighScoreStore for FileHighScoreStore {
    fn get(&self) -> u32 {
        self.value
    }

    fn set(&mut self, value: u32) {
        if value <= self.value {
            return;
        }
        self.value = value;
        self.save();
    }
}

fn load_value(path: &Path) -> u32 {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                eprintln!("[high-score] failed to read {}: {error}", path.display());
            }
            return 0;
        }
    };
    match serde_json::from_str::<HighScoreFile>(&text) {
        Ok(parsed) if parsed.version == 1 => parsed.high_score,
        Ok(parsed) => {
            eprintln!(
                "[high-score] unsupported version {} at {}",
                parsed.version,
                path.display()
            );
            0
        }
        Err(error) => {
            eprintln!("[high-score] failed to parse {}: {error}", path.display());
            0
        }
    }
}
