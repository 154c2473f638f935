use crate::staging::StagingPlan;
use std::{fmt, path::Path};

/// placeholder replaced with the (possibly staged) query path
pub const QUERY_PLACEHOLDER: &str = "{query}";
/// placeholder replaced with the directory the runner was invoked from
pub const CWD_PLACEHOLDER: &str = "{cwd}";

/// Directory the runner was started from, always ending with a separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationDir(String);

impl InvocationDir {
    pub fn new(dir: impl Into<String>) -> Self {
        let mut dir = dir.into();

        if !dir.ends_with('/') {
            dir.push('/');
        }

        Self(dir)
    }

    /// `None` for paths that are not valid UTF-8, they can't be written into a script verbatim
    pub fn from_path(path: &Path) -> Option<Self> {
        path.to_str().map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvocationDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expand the command template for a single query.
///
/// Substitution is purely textual, nothing is quoted or escaped. The template is scanned
/// once, so placeholders appearing inside a substituted value stay as they are.
pub fn expand(template: &str, plan: &StagingPlan, cwd: &InvocationDir) -> String {
    let mut expanded = String::with_capacity(template.len() + plan.resolved_path.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        expanded.push_str(&rest[..start]);
        let tail = &rest[start..];

        if let Some(after) = tail.strip_prefix(QUERY_PLACEHOLDER) {
            expanded.push_str(&plan.resolved_path);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(CWD_PLACEHOLDER) {
            expanded.push_str(cwd.as_str());
            rest = after;
        } else {
            expanded.push('{');
            rest = &tail[1..];
        }
    }
    expanded.push_str(rest);

    expanded
}
