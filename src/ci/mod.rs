pub mod profile;
pub mod summary;

pub use profile::EnvProfile;
pub use summary::build_ci_summary;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::config::resolve_var;

pub const COMMIT_HASH_DISPLAY_LEN: usize = 7;
pub const COMMIT_MESSAGE_DISPLAY_LEN: usize = 50;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One piece of CI metadata, resolved from a list of candidate variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CiField {
    Project,
    Status,
    CommitHash,
    CommitMessage,
    Author,
    Branch,
    RunId,
    Event,
    Workflow,
    RepoUrl,
}

impl CiField {
    pub const ALL: [CiField; 10] = [
        CiField::Project,
        CiField::Status,
        CiField::CommitHash,
        CiField::CommitMessage,
        CiField::Author,
        CiField::Branch,
        CiField::RunId,
        CiField::Event,
        CiField::Workflow,
        CiField::RepoUrl,
    ];

    /// Name used in profile files.
    pub fn key(self) -> &'static str {
        match self {
            CiField::Project => "project",
            CiField::Status => "status",
            CiField::CommitHash => "commit_hash",
            CiField::CommitMessage => "commit_message",
            CiField::Author => "author",
            CiField::Branch => "branch",
            CiField::RunId => "run_id",
            CiField::Event => "event",
            CiField::Workflow => "workflow",
            CiField::RepoUrl => "repo_url",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Raw CI values as found in the environment. Absent fields stay absent;
/// defaults are only applied when a [`CiEvent`] is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiVars {
    values: BTreeMap<CiField, String>,
}

impl CiVars {
    pub fn resolve<F>(profile: &EnvProfile, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = BTreeMap::new();
        for field in CiField::ALL {
            let candidates = profile.candidates(field);
            match resolve_var(candidates, lookup) {
                Some(value) => {
                    values.insert(field, value);
                }
                None => warn!("No environment variable found for {}: {:?}", field.key(), candidates),
            }
        }
        Self { values }
    }

    pub fn get(&self, field: CiField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn with(mut self, field: CiField, value: impl Into<String>) -> Self {
        self.values.insert(field, value.into());
        self
    }
}

/// Display-ready CI metadata for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiEvent {
    pub project: String,
    pub status: String,
    pub commit_hash: String,
    pub commit_message: String,
    pub author: String,
    pub branch: String,
    pub event: String,
    pub workflow: String,
    pub repo_url: String,
    pub commit_url: String,
    pub run_url: String,
    pub timestamp: String,
}

impl CiEvent {
    pub fn assemble(vars: &CiVars, at: NaiveDateTime) -> Self {
        let project_path = vars.get(CiField::Project);
        let repo_url = match (vars.get(CiField::RepoUrl), project_path) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(project)) => {
                format!("https://github.com/{}", project.trim_matches('/'))
            }
            (None, None) => "https://github.com".to_string(),
        };
        let commit_url = match vars.get(CiField::CommitHash) {
            Some(hash) => format!("{repo_url}/commit/{hash}"),
            None => repo_url.clone(),
        };
        let run_url = match vars.get(CiField::RunId) {
            Some(run_id) => format!("{repo_url}/actions/runs/{run_id}"),
            None => repo_url.clone(),
        };

        let or = |field: CiField, default: &str| vars.get(field).unwrap_or(default).to_string();

        Self {
            project: project_name(project_path.unwrap_or(UNKNOWN_PROJECT)),
            status: vars.get(CiField::Status).unwrap_or("unknown").to_lowercase(),
            commit_hash: short_hash(vars.get(CiField::CommitHash).unwrap_or("0000000")),
            commit_message: commit_subject(vars.get(CiField::CommitMessage).unwrap_or("N/A")),
            author: or(CiField::Author, "Unknown"),
            branch: or(CiField::Branch, "Unknown"),
            event: or(CiField::Event, "push"),
            workflow: or(CiField::Workflow, "Unknown Workflow"),
            repo_url,
            commit_url,
            run_url,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn now(vars: &CiVars) -> Self {
        Self::assemble(vars, chrono::Local::now().naive_local())
    }

    pub fn is_success(&self) -> bool {
        is_success(&self.status)
    }
}

pub fn is_success(status: &str) -> bool {
    status.eq_ignore_ascii_case("success")
}

pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Last non-empty path segment of an `owner/repo` style name.
pub fn project_name(path: &str) -> String {
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNKNOWN_PROJECT.to_string(),
    }
}

pub fn short_hash(hash: &str) -> String {
    hash.chars().take(COMMIT_HASH_DISPLAY_LEN).collect()
}

/// First line of a commit message, cut to the display length.
pub fn commit_subject(message: &str) -> String {
    message
        .split(['\n', '\r'])
        .next()
        .unwrap_or_default()
        .chars()
        .take(COMMIT_MESSAGE_DISPLAY_LEN)
        .collect()
}
