//! Persisted key-value state.
//!
//! Every piece of tutor state lives under one of the [`StateKey`]s in a single
//! JSON document. Reads take a default that is returned when the key is
//! absent or holds a value of the wrong shape; writes replace the key and
//! rewrite the document atomically.

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::core::config::data::path_display;

const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Language,
    Mode,
    Messages,
    Feedback,
    Goals,
    Progress,
    ProgressHistory,
    Journal,
    Proficiency,
    CommonErrors,
    ApiProvider,
    TtsVoice,
    TtsEnabled,
    OpenaiModel,
    GroqModel,
    AnthropicModel,
    SystemPrompt,
    Theme,
    IsDark,
}

impl StateKey {
    pub const ALL: [StateKey; 19] = [
        StateKey::Language,
        StateKey::Mode,
        StateKey::Messages,
        StateKey::Feedback,
        StateKey::Goals,
        StateKey::Progress,
        StateKey::ProgressHistory,
        StateKey::Journal,
        StateKey::Proficiency,
        StateKey::CommonErrors,
        StateKey::ApiProvider,
        StateKey::TtsVoice,
        StateKey::TtsEnabled,
        StateKey::OpenaiModel,
        StateKey::GroqModel,
        StateKey::AnthropicModel,
        StateKey::SystemPrompt,
        StateKey::Theme,
        StateKey::IsDark,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StateKey::Language => "language",
            StateKey::Mode => "mode",
            StateKey::Messages => "messages",
            StateKey::Feedback => "feedback",
            StateKey::Goals => "goals",
            StateKey::Progress => "progress",
            StateKey::ProgressHistory => "progressHistory",
            StateKey::Journal => "journal",
            StateKey::Proficiency => "proficiency",
            StateKey::CommonErrors => "commonErrors",
            StateKey::ApiProvider => "apiProvider",
            StateKey::TtsVoice => "ttsVoice",
            StateKey::TtsEnabled => "ttsEnabled",
            StateKey::OpenaiModel => "openaiModel",
            StateKey::GroqModel => "groqModel",
            StateKey::AnthropicModel => "anthropicModel",
            StateKey::SystemPrompt => "systemPrompt",
            StateKey::Theme => "theme",
            StateKey::IsDark => "isDark",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(name))
    }
}

/// Errors raised while reading or writing the state document.
#[derive(Debug)]
pub enum StoreError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Read { path, source } => {
                write!(f, "Failed to read state at {}: {}", path_display(path), source)
            }
            StoreError::Parse { path, source } => {
                write!(f, "Failed to parse state at {}: {}", path_display(path), source)
            }
            StoreError::Encode { key, source } => {
                write!(f, "Failed to encode state key '{key}': {source}")
            }
            StoreError::Write { path, source } => {
                write!(f, "Failed to write state at {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Read { source, .. } | StoreError::Write { source, .. } => Some(source),
            StoreError::Parse { source, .. } | StoreError::Encode { source, .. } => Some(source),
        }
    }
}

pub struct StateStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl StateStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str::<Map<String, Value>>(&contents).map_err(|source| {
                    StoreError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?
            }
        } else {
            Map::new()
        };

        Ok(Self { path, values })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_path())
    }

    /// `$LINGO_DATA_DIR/state.json`, else the platform data directory.
    pub fn default_path() -> PathBuf {
        if let Some(dir) = std::env::var_os("LINGO_DATA_DIR") {
            return PathBuf::from(dir).join(STATE_FILE_NAME);
        }
        match ProjectDirs::from("org", "lingo", "lingo") {
            Some(dirs) => dirs.data_dir().join(STATE_FILE_NAME),
            None => PathBuf::from(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, key: StateKey) -> bool {
        self.values.contains_key(key.as_str())
    }

    pub fn get<T: DeserializeOwned>(&self, key: StateKey, default: T) -> T {
        match self.values.get(key.as_str()) {
            Some(value) => match T::deserialize(value) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(key = key.as_str(), error = %err, "stored value has unexpected shape, using default");
                    default
                }
            },
            None => default,
        }
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: StateKey, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.as_str(),
            source,
        })?;
        self.values.insert(key.as_str().to_string(), encoded);
        self.flush()
    }

    pub fn remove(&mut self, key: StateKey) -> Result<(), StoreError> {
        if self.values.remove(key.as_str()).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.values.clear();
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let parent = self.path.parent().filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Encode {
                key: "*",
                source,
            }
        })?;

        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(write_err)?;

        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }
}
