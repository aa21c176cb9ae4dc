use std::fmt;

use serde::{Deserialize, Serialize};

/// Build metadata baked in by `build.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub build_profile: String,
    pub build_timestamp: String,
    pub pkg_version: String,
    pub version: String,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        pkg_version: env!("CARGO_PKG_VERSION").to_string(),
        version: env!("REPO_VERSION").to_string(),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fshare {} ({}, {} build, built {})",
            self.pkg_version, self.version, self.build_profile, self.build_timestamp
        )
    }
}
