use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::CiField;
use crate::config::{resolve_var, ConfigError};

const GITHUB_VARS: [(CiField, &str); 10] = [
    (CiField::Project, "GITHUB_REPOSITORY"),
    (CiField::Status, "GITHUB_WORKFLOW_STATUS"),
    (CiField::CommitHash, "GITHUB_SHA"),
    (CiField::CommitMessage, "GITHUB_COMMIT_MESSAGE"),
    (CiField::Author, "GITHUB_ACTOR"),
    (CiField::Branch, "GITHUB_REF_NAME"),
    (CiField::RunId, "GITHUB_RUN_ID"),
    (CiField::Event, "GITHUB_EVENT_NAME"),
    (CiField::Workflow, "GITHUB_WORKFLOW"),
    (CiField::RepoUrl, "GITHUB_REPOSITORY_URL"),
];

const GITLAB_VARS: [(CiField, &str); 10] = [
    (CiField::Project, "CI_PROJECT_NAME"),
    (CiField::Status, "CI_JOB_STATUS"),
    (CiField::CommitHash, "CI_COMMIT_SHA"),
    (CiField::CommitMessage, "CI_COMMIT_MESSAGE"),
    (CiField::Author, "CI_COMMIT_AUTHOR"),
    (CiField::Branch, "CI_COMMIT_REF_NAME"),
    (CiField::RunId, "CI_PIPELINE_ID"),
    (CiField::Event, "CI_PIPELINE_SOURCE"),
    (CiField::Workflow, "CI_JOB_NAME"),
    (CiField::RepoUrl, "CI_PROJECT_URL"),
];

/// Ordered candidate variables for every [`CiField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvProfile {
    name: String,
    candidates: BTreeMap<CiField, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    profile: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Vec<String>>,
}

impl EnvProfile {
    fn from_table(name: &str, table: &[(CiField, &str)]) -> Self {
        let mut candidates: BTreeMap<CiField, Vec<String>> = BTreeMap::new();
        for (field, var) in table {
            candidates.entry(*field).or_default().push(var.to_string());
        }
        Self {
            name: name.to_string(),
            candidates,
        }
    }

    /// GitHub Actions names first, GitLab CI names as fallback. Status is
    /// the exception: the GitLab job status is tried first.
    pub fn multi() -> Self {
        let mut table = Vec::with_capacity(GITHUB_VARS.len() * 2);
        for (github, gitlab) in GITHUB_VARS.iter().zip(GITLAB_VARS.iter()) {
            if github.0 == CiField::Status {
                table.extend([*gitlab, *github]);
            } else {
                table.extend([*github, *gitlab]);
            }
        }
        Self::from_table("multi", &table)
    }

    pub fn github() -> Self {
        Self::from_table("github", &GITHUB_VARS)
    }

    pub fn gitlab() -> Self {
        Self::from_table("gitlab", &GITLAB_VARS)
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "multi" => Some(Self::multi()),
            "github" => Some(Self::github()),
            "gitlab" => Some(Self::gitlab()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn candidates(&self, field: CiField) -> &[String] {
        self.candidates
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn set_candidates(&mut self, field: CiField, candidates: Vec<String>) {
        self.candidates.insert(field, candidates);
    }

    /// Parse a profile file. `profile` picks the base (falling back to
    /// `default_base`), `[fields]` replaces candidate lists per field.
    pub fn from_toml(content: &str, path: &Path, default_base: &str) -> Result<Self, ConfigError> {
        let file: ProfileFile = toml::from_str(content).map_err(|source| ConfigError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = file.profile.as_deref().unwrap_or(default_base);
        let mut profile =
            Self::builtin(base).ok_or_else(|| ConfigError::UnknownProfile(base.to_string()))?;

        for (key, candidates) in file.fields {
            let field = CiField::from_key(&key).ok_or(ConfigError::UnknownField(key))?;
            profile.set_candidates(field, candidates);
        }
        profile.name = format!("{}+{}", profile.name, path.display());
        Ok(profile)
    }

    pub fn load(path: &Path, default_base: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path, default_base)
    }

    /// `CI_NOTIFY_PROFILE` names the base profile, `CI_NOTIFY_CONFIG` points
    /// at an optional override file.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = resolve_var(&["CI_NOTIFY_PROFILE"], lookup).unwrap_or_else(|| "multi".to_string());
        let profile = match resolve_var(&["CI_NOTIFY_CONFIG"], lookup) {
            Some(path) => Self::load(Path::new(&path), &base)?,
            None => Self::builtin(&base).ok_or(ConfigError::UnknownProfile(base))?,
        };
        info!("Using CI environment profile: {}", profile.name());
        Ok(profile)
    }
}

impl Default for EnvProfile {
    fn default() -> Self {
        Self::multi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env_from;

    fn names(profile: &EnvProfile, field: CiField) -> Vec<&str> {
        profile.candidates(field).iter().map(String::as_str).collect()
    }

    #[test]
    fn test_multi_profile_order() {
        let profile = EnvProfile::multi();
        assert_eq!(
            names(&profile, CiField::Project),
            ["GITHUB_REPOSITORY", "CI_PROJECT_NAME"]
        );
        assert_eq!(
            names(&profile, CiField::Status),
            ["CI_JOB_STATUS", "GITHUB_WORKFLOW_STATUS"]
        );
        assert_eq!(
            names(&profile, CiField::RepoUrl),
            ["GITHUB_REPOSITORY_URL", "CI_PROJECT_URL"]
        );
        for field in CiField::ALL {
            assert_eq!(profile.candidates(field).len(), 2);
        }
    }

    #[test]
    fn test_single_variable_profiles() {
        for profile in [EnvProfile::github(), EnvProfile::gitlab()] {
            for field in CiField::ALL {
                assert_eq!(profile.candidates(field).len(), 1);
            }
        }
        assert_eq!(names(&EnvProfile::gitlab(), CiField::Branch), ["CI_COMMIT_REF_NAME"]);
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(EnvProfile::builtin("GitHub"), Some(EnvProfile::github()));
        assert_eq!(EnvProfile::builtin("jenkins"), None);
        assert_eq!(EnvProfile::default(), EnvProfile::multi());
    }

    #[test]
    fn test_toml_overrides_fields() {
        let content = r#"
profile = "github"

[fields]
project = ["MY_PROJECT", "GITHUB_REPOSITORY"]
author = []
"#;
        let profile = EnvProfile::from_toml(content, Path::new("ci.toml"), "multi").unwrap();
        assert_eq!(names(&profile, CiField::Project), ["MY_PROJECT", "GITHUB_REPOSITORY"]);
        assert!(profile.candidates(CiField::Author).is_empty());
        assert_eq!(names(&profile, CiField::Branch), ["GITHUB_REF_NAME"]);
        assert_eq!(profile.name(), "github+ci.toml");
    }

    #[test]
    fn test_toml_base_defaults_to_caller() {
        let profile = EnvProfile::from_toml("", Path::new("ci.toml"), "gitlab").unwrap();
        assert_eq!(names(&profile, CiField::Project), ["CI_PROJECT_NAME"]);
    }

    #[test]
    fn test_toml_rejects_unknown_field() {
        let content = "[fields]\npipeline = [\"X\"]\n";
        assert!(matches!(
            EnvProfile::from_toml(content, Path::new("ci.toml"), "multi"),
            Err(ConfigError::UnknownField(key)) if key == "pipeline"
        ));
    }

    #[test]
    fn test_toml_rejects_unknown_profile_and_bad_syntax() {
        assert!(matches!(
            EnvProfile::from_toml("profile = \"travis\"", Path::new("ci.toml"), "multi"),
            Err(ConfigError::UnknownProfile(_))
        ));
        assert!(matches!(
            EnvProfile::from_toml("fields = 3", Path::new("ci.toml"), "multi"),
            Err(ConfigError::ProfileParse { .. })
        ));
        assert!(matches!(
            EnvProfile::from_toml("extra = true", Path::new("ci.toml"), "multi"),
            Err(ConfigError::ProfileParse { .. })
        ));
    }

    #[test]
    fn test_from_lookup() {
        let profile = EnvProfile::from_lookup(&env_from(&[])).unwrap();
        assert_eq!(profile, EnvProfile::multi());

        let profile = EnvProfile::from_lookup(&env_from(&[("CI_NOTIFY_PROFILE", "gitlab")])).unwrap();
        assert_eq!(profile, EnvProfile::gitlab());

        let missing = env_from(&[("CI_NOTIFY_CONFIG", "/nonexistent/cibot-profile.toml")]);
        assert!(matches!(
            EnvProfile::from_lookup(&missing),
            Err(ConfigError::ProfileRead { .. })
        ));
    }

    #[test]
    fn test_from_lookup_reads_file() {
        let path = std::env::temp_dir().join(format!("cibot-profile-{}.toml", std::process::id()));
        std::fs::write(&path, "[fields]\nbranch = [\"BRANCH\"]\n").unwrap();

        let env = env_from(&[
            ("CI_NOTIFY_PROFILE", "github"),
            ("CI_NOTIFY_CONFIG", path.to_str().unwrap()),
        ]);
        let profile = EnvProfile::from_lookup(&env).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(names(&profile, CiField::Branch), ["BRANCH"]);
        assert_eq!(names(&profile, CiField::Project), ["GITHUB_REPOSITORY"]);
    }
}
