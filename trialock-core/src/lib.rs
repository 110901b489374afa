//! Trial-period gating with offline, hardware-bound activation keys.
//!
//! Everything works from local state: a fingerprint derived from the
//! running machine, and an encrypted record of when the trial began and
//! when it expires. [`TrialGate::check`] is the single startup entry point
//! for a host program.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chrono::Utc;
use log::{info, trace, warn};
use serde::Serialize;

use crate::fingerprint::Fingerprint;
use crate::key::KeyCodec;
use crate::secrets::{EmbeddedKeys, KeyProvider};
use crate::store::{CorruptPolicy, LoadState, TrialRecord, TrialStore};

pub mod cipher;
pub mod error;
pub mod fingerprint;
pub mod key;
pub mod secrets;
pub mod store;

pub use crate::error::LicenseError;

/// Length of the free trial granted on first run.
pub const TRIAL_PERIOD_DAYS: i64 = 30;

/// Console attempts allowed once the trial has expired.
pub const MAX_ACTIVATION_ATTEMPTS: u32 = 3;

/// How a gate run resolved. Everything except [`GateOutcome::Denied`]
/// lets the host program continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GateOutcome {
    FirstRun,
    Trial { days_left: i64 },
    Activated,
    Denied,
}

impl GateOutcome {
    #[must_use]
    pub fn allows_continue(&self) -> bool {
        !matches!(self, GateOutcome::Denied)
    }
}

/// Orchestrates the trial check at startup: loads or initializes the
/// persisted record, enforces expiry, and when expired collects an
/// activation key over the console with a bounded retry budget.
pub struct TrialGate {
    fingerprint: Fingerprint,
    store: TrialStore,
    codec: KeyCodec,
    corrupt_policy: CorruptPolicy,
}

impl TrialGate {
    /// Gate over the compiled-in key material and the install-dir store.
    #[must_use]
    pub fn new() -> Self {
        let keys: Arc<dyn KeyProvider> = Arc::new(EmbeddedKeys);

        Self::with_parts(TrialStore::at_install_dir(Arc::clone(&keys)), KeyCodec::new(keys))
    }

    /// Gate over caller-supplied store and codec. The machine fingerprint
    /// is snapshotted here, once.
    #[must_use]
    pub fn with_parts(store: TrialStore, codec: KeyCodec) -> Self {
        Self { fingerprint: Fingerprint::current(), store, codec, corrupt_policy: CorruptPolicy::ResetTrial }
    }

    /// What an unreadable trial file means. Defaults to
    /// [`CorruptPolicy::ResetTrial`].
    #[must_use]
    pub fn corrupt_policy(mut self, policy: CorruptPolicy) -> Self {
        self.corrupt_policy = policy;
        self
    }

    /// Run the gate against stdin/stdout and reduce the outcome to
    /// continue (`true`) or exit (`false`).
    #[must_use]
    pub fn check(&self) -> bool {
        let stdin = io::stdin();
        let stdout = io::stdout();

        self.run(&mut stdin.lock(), &mut stdout.lock()).allows_continue()
    }

    /// Run the gate state machine against arbitrary console streams.
    pub fn run<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> GateOutcome {
        let now = Utc::now();

        let record = match self.store.load() {
            LoadState::Loaded(record) => Some(record),
            LoadState::Missing => None,
            LoadState::Corrupt => match self.corrupt_policy {
                CorruptPolicy::ResetTrial => {
                    warn!("Trial state unreadable, starting a fresh trial");
                    None
                }
                CorruptPolicy::RequireActivation => {
                    warn!("Trial state unreadable, demanding activation");
                    Some(TrialRecord { first_run: now, expires: now, activated: false })
                }
            },
        };

        let Some(mut record) = record else {
            let record = TrialRecord::starting_at(now);

            if let Err(e) = self.store.save(&record) {
                warn!("Failed to persist trial state: {e}");
            }

            info!("First run, trial expires {}", record.expires);
            let _ = writeln!(
                output,
                "Starting your {TRIAL_PERIOD_DAYS}-day trial. It expires on {}.",
                record.expires.format("%Y-%m-%d"),
            );

            return GateOutcome::FirstRun;
        };

        if record.activated {
            trace!("Installation already activated");
            return GateOutcome::Activated;
        }

        if now <= record.expires {
            let days_left = (record.expires - now).num_days();
            let _ = writeln!(output, "Trial period: {days_left} day(s) remaining.");

            return GateOutcome::Trial { days_left };
        }

        let _ = writeln!(output, "Your trial period has expired.");

        let mut remaining = MAX_ACTIVATION_ATTEMPTS;
        while remaining > 0 {
            let _ = write!(output, "Enter activation key (or 'exit' to quit): ");
            let _ = output.flush();

            let mut line = String::new();
            if input.read_line(&mut line).unwrap_or(0) == 0 {
                return GateOutcome::Denied;
            }

            let candidate = line.trim();
            if candidate.is_empty() || candidate.eq_ignore_ascii_case("exit") {
                return GateOutcome::Denied;
            }

            match self.codec.verify(candidate, &self.fingerprint) {
                Ok(expires_at) => {
                    record.expires = expires_at;
                    record.activated = true;

                    if let Err(e) = self.store.save(&record) {
                        warn!("Failed to persist activation: {e}");
                    }

                    info!("Activation accepted, licensed until {expires_at}");
                    let _ = writeln!(output, "Activation successful. Licensed until {}.", expires_at.format("%Y-%m-%d"));

                    return GateOutcome::Activated;
                }
                Err(e) => {
                    // Only the count reaches the user; the kind is for logs.
                    trace!("Activation Key Rejected: {e}");
                    remaining -= 1;
                    let _ = writeln!(output, "Invalid or expired activation key. {remaining} attempt(s) remaining.");
                }
            }
        }

        GateOutcome::Denied
    }
}

impl Default for TrialGate {
    fn default() -> Self {
        Self::new()
    }
}
