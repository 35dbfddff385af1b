// src/ci/results.rs

//! Per-channel test results
//!
//! The test workflow runs one job per ebuild, named
//! `Test ebuild (<ebuild path>) [<channel>]`. Collecting results means
//! listing the jobs of a workflow run and decoding those names.

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::upstream::{HttpClient, JsonPage};
use crate::version::{extract_version, Version};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static JOB_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Test ebuild \((.+?)\) \[(.+?)\]$").unwrap());

/// Outcome of a finished job, as reported by GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobConclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    Neutral,
    ActionRequired,
    Stale,
    #[serde(other)]
    Unknown,
}

/// One job of a workflow run
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub name: String,
    /// `None` while the job is still running
    pub conclusion: Option<JobConclusion>,
}

#[derive(Debug, Deserialize)]
struct JobsPage {
    jobs: Vec<JobRecord>,
}

/// Test outcome of one channel's ebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub conclusion: Option<JobConclusion>,
    pub ebuild_path: PathBuf,
    pub version: Version,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.conclusion == Some(JobConclusion::Success)
    }
}

/// Test results keyed by channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestResults(pub BTreeMap<Channel, TestResult>);

impl TestResults {
    /// Decode results from the jobs of a run
    ///
    /// Jobs with other names are ignored. If a channel was tested more than
    /// once, the last job listed wins.
    pub fn from_jobs(jobs: &[JobRecord]) -> Result<Self> {
        let mut results = BTreeMap::new();
        for job in jobs {
            let Some(caps) = JOB_NAME.captures(&job.name) else {
                continue;
            };
            let (path, channel) = (&caps[1], &caps[2]);
            let channel = match channel.parse::<Channel>() {
                Ok(channel) => channel,
                Err(e) => {
                    warn!("Ignoring job '{}': {}", job.name, e);
                    continue;
                }
            };
            debug!("Job '{}' concluded {:?}", job.name, job.conclusion);
            results.insert(
                channel,
                TestResult {
                    conclusion: job.conclusion,
                    ebuild_path: PathBuf::from(path),
                    version: extract_version(path)?,
                },
            );
        }
        Ok(Self(results))
    }

    /// Load results written by [`TestResults::to_json`]
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
            .map_err(|e| Error::ParseError(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::ParseError(format!("Failed to encode test results: {e}")))
    }

    pub fn get(&self, channel: Channel) -> Option<&TestResult> {
        self.0.get(&channel)
    }

    /// Versions that passed, per channel
    pub fn passed_versions(&self) -> BTreeMap<Channel, Version> {
        self.0
            .iter()
            .filter(|(_, r)| r.passed())
            .map(|(&c, r)| (c, r.version.clone()))
            .collect()
    }
}

/// List every job of a workflow run through the GitHub REST API
///
/// Reads at most `max_pages` pages; a run listing more fails with `Ci`.
pub fn fetch_run_jobs(
    client: &HttpClient,
    api_url: &str,
    repository: &str,
    run_id: u64,
    max_pages: u32,
) -> Result<Vec<JobRecord>> {
    let mut url = Some(format!(
        "{}/repos/{repository}/actions/runs/{run_id}/jobs?per_page=100",
        api_url.trim_end_matches('/')
    ));
    let mut jobs = Vec::new();
    let mut pages = 0;
    while let Some(current) = url {
        if pages == max_pages {
            return Err(Error::Ci(format!(
                "Run {run_id} lists more than {max_pages} pages of jobs"
            )));
        }
        let JsonPage { body, next } = client.get_json_page::<JobsPage>(&current)?;
        pages += 1;
        jobs.extend(body.jobs);
        url = next;
    }
    debug!("Run {} has {} jobs", run_id, jobs.len());
    Ok(jobs)
}

/// Run id of the `workflow_run` that triggered the current workflow
pub fn run_id_from_event(event_path: &Path) -> Result<u64> {
    #[derive(Deserialize)]
    struct Event {
        workflow_run: WorkflowRun,
    }
    #[derive(Deserialize)]
    struct WorkflowRun {
        id: u64,
    }

    let text = fs::read_to_string(event_path).map_err(|e| Error::io(event_path, e))?;
    let event: Event = serde_json::from_str(&text).map_err(|e| {
        Error::ParseError(format!("{}: not a workflow_run event: {e}", event_path.display()))
    })?;
    Ok(event.workflow_run.id)
}
