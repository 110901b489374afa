use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::cipher;
use crate::error::LicenseError;
use crate::secrets::KeyProvider;

/// File name of the trial record, kept next to the running binary.
pub const TRIAL_FILE_NAME: &str = "trial.dat";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The persisted trial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub first_run: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub activated: bool,
}

impl TrialRecord {
    /// A fresh trial beginning at `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { first_run: now, expires: now + Duration::days(crate::TRIAL_PERIOD_DAYS), activated: false }
    }

    fn to_plaintext(&self) -> String {
        format!(
            "FirstRunTime:{}\nExpireTime:{}\nIsActivated:{}\n",
            self.first_run.format(TIME_FORMAT),
            self.expires.format(TIME_FORMAT),
            if self.activated { "True" } else { "False" },
        )
    }

    fn from_plaintext(text: &str) -> Option<Self> {
        let mut first_run = None;
        let mut expires = None;
        let mut activated = None;

        for line in text.lines() {
            let (field, value) = line.split_once(':')?;

            match field {
                "FirstRunTime" => first_run = Some(parse_time(value)?),
                "ExpireTime" => expires = Some(parse_time(value)?),
                "IsActivated" => {
                    activated = Some(match value {
                        "True" => true,
                        "False" => false,
                        _ => return None,
                    });
                }
                _ => return None,
            }
        }

        Some(Self { first_run: first_run?, expires: expires?, activated: activated? })
    }
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).ok().map(|t| t.and_utc())
}

/// What a load attempt found. Corruption is reported, not resolved; the
/// gate decides what a corrupt file means.
#[derive(Debug, PartialEq, Eq)]
pub enum LoadState {
    Missing,
    Loaded(TrialRecord),
    Corrupt,
}

/// Policy for a trial file that exists but cannot be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptPolicy {
    /// Treat corruption as a first run and grant a fresh trial.
    ResetTrial,
    /// Treat corruption as an expired trial and demand an activation key.
    RequireActivation,
}

/// Encrypted on-disk store for the [`TrialRecord`].
pub struct TrialStore {
    path: PathBuf,
    keys: Arc<dyn KeyProvider>,
}

impl TrialStore {
    #[must_use]
    pub fn new(path: PathBuf, keys: Arc<dyn KeyProvider>) -> Self {
        Self { path, keys }
    }

    /// Store at the fixed location under the program's install directory.
    #[must_use]
    pub fn at_install_dir(keys: Arc<dyn KeyProvider>) -> Self {
        let dir = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(dir.join(TRIAL_FILE_NAME), keys)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted record. Never fails: an absent file is
    /// [`LoadState::Missing`], anything unreadable, undecryptable or
    /// unparsable is [`LoadState::Corrupt`].
    #[must_use]
    pub fn load(&self) -> LoadState {
        let ciphertext = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadState::Missing,
            Err(e) => {
                trace!("Trial File Read Failed: {e}");
                return LoadState::Corrupt;
            }
        };

        let Ok(plaintext) = cipher::decrypt(&self.keys.trial_file_cipher(), &ciphertext) else {
            trace!("Trial File Decrypt Failed");
            return LoadState::Corrupt;
        };

        let Ok(text) = String::from_utf8(plaintext) else {
            trace!("Trial File Not UTF-8");
            return LoadState::Corrupt;
        };

        match TrialRecord::from_plaintext(&text) {
            Some(record) => LoadState::Loaded(record),
            None => {
                trace!("Trial File Parse Failed");
                LoadState::Corrupt
            }
        }
    }

    /// Persist the record, creating parent directories as needed. The
    /// ciphertext goes out in a single write call.
    ///
    /// # Errors
    /// Will return `Err` if the directory or file cannot be written.
    pub fn save(&self, record: &TrialRecord) -> Result<(), LicenseError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let ciphertext = cipher::encrypt(&self.keys.trial_file_cipher(), record.to_plaintext().as_bytes());
        fs::write(&self.path, ciphertext)?;

        Ok(())
    }
}
