use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::fmt;

/// scratch directory used when nothing else is configured, resolved by the shell on the node
pub const DEFAULT_SCRATCH_DIR: &str = "$TMPDIR";

/// Compression formats that are streamed into the scratch directory instead of copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Bzip2,
    Dsrc,
}

impl Codec {
    /// suffix table, checked in order
    const TABLE: [(&'static str, Codec); 3] = [
        (".gz", Codec::Gzip),
        (".bz2", Codec::Bzip2),
        (".dsrc", Codec::Dsrc),
    ];

    /// find the codec for a file name by its (case-sensitive) suffix
    pub fn detect(name: &str) -> Option<(Self, &'static str)> {
        Self::TABLE
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(suffix, codec)| (*codec, *suffix))
    }

    /// command that writes the decompressed content of its argument to stdout
    pub fn decompressor(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip -dc",
            Self::Bzip2 => "bzip2 -dc",
            Self::Dsrc => "dsrc d -s",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Dsrc => "dsrc",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingMode {
    /// query is used as-is
    None,
    /// verbatim copy into the scratch directory
    Copy,
    /// streamed decompression into the scratch directory
    Decompress(Codec),
}

/// Node-local scratch directory as it should appear in the job script.
///
/// The value is kept as text, so shell variables like `$TMPDIR` or `$SNIC_TMP`
/// are only expanded once the job runs on its node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScratchDir(String);

impl ScratchDir {
    pub fn new(dir: impl Into<String>) -> Self {
        let mut dir = dir.into();

        // keep a lone "/" intact, otherwise drop trailing separators to join with a single one
        while dir.len() > 1 && dir.ends_with('/') {
            dir.pop();
        }

        Self(dir)
    }

    pub fn join(&self, file_name: &str) -> String {
        if self.0.ends_with('/') {
            format!("{}{file_name}", self.0)
        } else {
            format!("{}/{file_name}", self.0)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ScratchDir {
    fn from(dir: String) -> Self {
        Self::new(dir)
    }
}

impl From<ScratchDir> for String {
    fn from(dir: ScratchDir) -> Self {
        dir.0
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new(DEFAULT_SCRATCH_DIR)
    }
}

/// How a single query is made available on the node before its command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPlan {
    /// path the expanded command should reference
    pub resolved_path: String,
    /// shell line producing `resolved_path`, empty if nothing needs to be staged
    pub staging_command: String,
    pub mode: StagingMode,
}

impl StagingPlan {
    pub fn needs_staging(&self) -> bool {
        !self.staging_command.is_empty()
    }
}

/// Decide how `query` is staged on the node.
///
/// This is pure text manipulation, a missing or unreadable source only shows up when the
/// staging command runs inside the job.
pub fn plan(query: &Query, copy_decompress: bool, scratch: &ScratchDir) -> StagingPlan {
    let source = query.as_str();

    if !copy_decompress {
        return StagingPlan {
            resolved_path: source.to_owned(),
            staging_command: String::new(),
            mode: StagingMode::None,
        };
    }

    let name = query.file_name();

    match Codec::detect(name) {
        Some((codec, suffix)) => {
            let stripped = &name[..name.len() - suffix.len()];
            // a bare ".gz" would otherwise resolve to the scratch directory itself
            let target = scratch.join(if stripped.is_empty() { name } else { stripped });

            StagingPlan {
                staging_command: format!("{} {source} > {target}", codec.decompressor()),
                resolved_path: target,
                mode: StagingMode::Decompress(codec),
            }
        }
        None => {
            let target = scratch.join(name);

            StagingPlan {
                staging_command: format!("cp {source} {target}"),
                resolved_path: target,
                mode: StagingMode::Copy,
            }
        }
    }
}
