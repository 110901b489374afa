use std::fmt;

use ::sysinfo::{MacAddr, Networks, System};
use log::trace;
use machineid_rs::{Encryption, HWIDComponent, IdBuilder};
use sha2::{Digest, Sha256};

use crate::error::LicenseError;

/// Length of the rendered fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 32;

const MARKER_SEPARATOR: &str = "|";

/// Salt mixed into the machine-id derived markers.
const MACHINE_ID_SALT: &str = "trialock-hwid-v1";

/// Vendor strings that mean "unset" and carry no identity.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "unknown",
    "none",
    "default string",
    "to be filled by o.e.m.",
    "system serial number",
    "00:00:00:00:00:00",
    "0",
];

/// One probe in the ordered marker chain. A source that cannot produce a
/// marker returns `None` and the chain moves on.
pub trait MarkerSource {
    fn name(&self) -> &'static str;
    fn marker(&self) -> Option<String>;
}

/// Platform system identifier (machine GUID / machine-id).
pub struct SystemIdSource;

impl MarkerSource for SystemIdSource {
    fn name(&self) -> &'static str {
        "system-id"
    }

    fn marker(&self) -> Option<String> {
        IdBuilder::new(Encryption::SHA256).add_component(HWIDComponent::SystemID).build(MACHINE_ID_SALT).ok()
    }
}

/// Serial number of the system drive.
pub struct DriveSerialSource;

impl MarkerSource for DriveSerialSource {
    fn name(&self) -> &'static str {
        "drive-serial"
    }

    fn marker(&self) -> Option<String> {
        IdBuilder::new(Encryption::SHA256).add_component(HWIDComponent::DriveSerial).build(MACHINE_ID_SALT).ok()
    }
}

/// Processor identifier.
pub struct CpuIdSource;

impl MarkerSource for CpuIdSource {
    fn name(&self) -> &'static str {
        "cpu-id"
    }

    fn marker(&self) -> Option<String> {
        IdBuilder::new(Encryption::SHA256).add_component(HWIDComponent::CPUID).build(MACHINE_ID_SALT).ok()
    }
}

/// Host name, available everywhere.
pub struct HostNameSource;

impl MarkerSource for HostNameSource {
    fn name(&self) -> &'static str {
        "host-name"
    }

    fn marker(&self) -> Option<String> {
        System::host_name()
    }
}

/// Path of the OS system directory.
pub struct SystemDirSource;

impl MarkerSource for SystemDirSource {
    fn name(&self) -> &'static str {
        "system-dir"
    }

    #[cfg(windows)]
    fn marker(&self) -> Option<String> {
        std::env::var("SystemRoot").ok()
    }

    #[cfg(not(windows))]
    fn marker(&self) -> Option<String> {
        Some("/usr".to_string())
    }
}

/// Logical processor count.
pub struct CpuCountSource;

impl MarkerSource for CpuCountSource {
    fn name(&self) -> &'static str {
        "cpu-count"
    }

    fn marker(&self) -> Option<String> {
        let mut sys = System::new_all();
        sys.refresh_all();

        let count = sys.cpus().len();
        if count == 0 { None } else { Some(count.to_string()) }
    }
}

/// Physical address of the first active non-loopback adapter. Candidates
/// are sorted before picking: the network map has no stable iteration
/// order, and the marker must not change between two probes on the same
/// machine.
pub struct MacAddressSource;

impl MarkerSource for MacAddressSource {
    fn name(&self) -> &'static str {
        "mac-address"
    }

    fn marker(&self) -> Option<String> {
        let networks = Networks::new_with_refreshed_list();

        let mut candidates: Vec<String> = networks
            .iter()
            .filter(|(interface_name, _)| interface_name.as_str() != "lo")
            .map(|(_, data)| data.mac_address())
            .filter(|mac| *mac != MacAddr::UNSPECIFIED)
            .map(|mac| format!("{mac}"))
            .collect();

        candidates.sort();
        candidates.into_iter().next()
    }
}

/// The ordered privileged probes: hardware identities that may be missing
/// in containers, VMs or unprivileged environments.
#[must_use]
pub fn privileged_sources() -> Vec<Box<dyn MarkerSource>> {
    vec![Box::new(SystemIdSource), Box::new(DriveSerialSource), Box::new(CpuIdSource)]
}

/// The ordered fallback probes, expected to succeed everywhere.
#[must_use]
pub fn fallback_sources() -> Vec<Box<dyn MarkerSource>> {
    vec![Box::new(HostNameSource), Box::new(SystemDirSource), Box::new(CpuCountSource), Box::new(MacAddressSource)]
}

fn is_placeholder(marker: &str) -> bool {
    let trimmed = marker.trim();
    trimmed.is_empty() || PLACEHOLDER_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str())
}

fn collect_markers(sources: &[Box<dyn MarkerSource>]) -> Vec<String> {
    let mut markers = Vec::new();

    for source in sources {
        match source.marker() {
            Some(marker) if !is_placeholder(&marker) => markers.push(marker),
            Some(_) => trace!("Marker Source {} Returned Placeholder", source.name()),
            None => trace!("Marker Source {} Unavailable", source.name()),
        }
    }

    markers
}

/// A fixed-length, one-way identifier for the running machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of the machine this process runs on. Total: degrades
    /// through the fallback chain down to the bare host name rather than
    /// failing.
    #[must_use]
    pub fn current() -> Self {
        Self::from_sources(&privileged_sources(), &fallback_sources())
    }

    /// Reduce whatever the given probe chains yield to a fingerprint.
    #[must_use]
    pub fn from_sources(privileged: &[Box<dyn MarkerSource>], fallback: &[Box<dyn MarkerSource>]) -> Self {
        let mut markers = collect_markers(privileged);

        if markers.is_empty() {
            trace!("No Privileged Hardware Markers, Using Fallback Set");
            markers = collect_markers(fallback);
        }

        if markers.is_empty() {
            markers.push(System::host_name().unwrap_or_else(|| "unknown".to_string()));
        }

        let digest = Sha256::digest(markers.join(MARKER_SEPARATOR).as_bytes());

        Self(hex::encode_upper(&digest[..FINGERPRINT_LEN / 2]))
    }

    /// Parse a fingerprint received out-of-band (issuer side).
    ///
    /// # Errors
    /// Will return `Err` unless the input is exactly 32 hex characters.
    pub fn parse(input: &str) -> Result<Self, LicenseError> {
        let trimmed = input.trim();

        if trimmed.len() != FINGERPRINT_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LicenseError::InvalidFingerprint);
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
