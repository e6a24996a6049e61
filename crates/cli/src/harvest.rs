//! `labelcat harvest`: dump historical issues to CSV for model training.
//!
//! Each issue becomes one row per label it carries; an unlabeled issue becomes
//! a single row with an empty label. Columns are
//! `repositoryUrl,title,body,labels`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use futures::TryStreamExt;
use github::{GithubClient, GithubError, HarvestedIssue};
use pipeline::RepositoryRef;
use serde::Serialize;
use tracing::{info, warn};

/// Totals reported when a harvest finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub repositories: usize,
    pub failed_repositories: usize,
    pub issues: usize,
    pub rows: usize,
}

/// Reads one `owner/repo` per line. Blank lines and `#` comments are ignored;
/// malformed lines are logged and skipped.
pub fn read_repo_list(text: &str) -> Vec<RepositoryRef> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|(n, line)| match line.parse::<RepositoryRef>() {
            Ok(repo) => Some(repo),
            Err(err) => {
                warn!(line = n, entry = line, error = %err, "skipping invalid repository entry");
                None
            }
        })
        .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    repository_url: &'a str,
    title: &'a str,
    body: &'a str,
    labels: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(issue: &'a HarvestedIssue, label: &'a str) -> Self {
        Self {
            repository_url: &issue.repository_url,
            title: &issue.title,
            body: &issue.body,
            labels: label,
        }
    }
}

/// Writes harvested issues as unwound CSV rows.
pub struct IssueCsvWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> IssueCsvWriter<W> {
    /// The header row is emitted before the first record when `write_header`
    /// is set.
    pub fn new(writer: W, write_header: bool) -> Self {
        let inner = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(writer);
        Self { inner }
    }

    /// Writes the rows for `issue` and returns how many were written.
    pub fn write_issue(&mut self, issue: &HarvestedIssue) -> csv::Result<usize> {
        if issue.labels.is_empty() {
            self.inner.serialize(CsvRow::new(issue, ""))?;
            return Ok(1);
        }
        for label in &issue.labels {
            self.inner.serialize(CsvRow::new(issue, label))?;
        }
        Ok(issue.labels.len())
    }

    pub fn into_inner(self) -> anyhow::Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV output: {}", e.error()))
    }
}

/// Drains every issue page of `repo` into `out`.
async fn harvest_repository<W: Write>(
    github: &GithubClient,
    repo: &RepositoryRef,
    max_pages: u32,
    out: &mut IssueCsvWriter<W>,
    summary: &mut HarvestSummary,
) -> Result<(), HarvestError> {
    let mut pages = github.issue_pages(repo.clone(), max_pages);
    while let Some(page) = pages.try_next().await? {
        for issue in &page.issues {
            summary.rows += out.write_issue(issue)?;
        }
        summary.issues += page.issues.len();
        info!(repository = %repo, page = page.page, issues = page.issues.len(), "harvested page");
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum HarvestError {
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Harvests every repository in turn. A repository whose listing fails is
/// logged and skipped; rows already written for it are kept.
pub async fn harvest<W: Write>(
    github: &GithubClient,
    repos: &[RepositoryRef],
    max_pages: u32,
    out: &mut IssueCsvWriter<W>,
) -> anyhow::Result<HarvestSummary> {
    let mut summary = HarvestSummary::default();

    for repo in repos {
        summary.repositories += 1;
        match harvest_repository(github, repo, max_pages, out, &mut summary).await {
            Ok(()) => {}
            Err(HarvestError::Github(err)) => {
                warn!(repository = %repo, error = %err, "skipping repository");
                summary.failed_repositories += 1;
            }
            Err(HarvestError::Csv(err)) => {
                return Err(err).context("failed to write CSV output");
            }
        }
    }

    Ok(summary)
}

/// Entry point for the subcommand.
pub async fn run(
    github: &GithubClient,
    repos_file: &Path,
    output: &Path,
    max_pages: u32,
    append: bool,
) -> anyhow::Result<HarvestSummary> {
    let text = std::fs::read_to_string(repos_file)
        .with_context(|| format!("failed to read {}", repos_file.display()))?;
    let repos = read_repo_list(&text);

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(output)
        .with_context(|| format!("failed to open {}", output.display()))?;
    let empty = file.metadata().map(|m| m.len() == 0).unwrap_or(true);

    let mut out = IssueCsvWriter::new(file, !append || empty);
    let summary = harvest(github, &repos, max_pages, &mut out).await?;
    out.into_inner()?;

    info!(
        repositories = summary.repositories,
        failed = summary.failed_repositories,
        issues = summary.issues,
        rows = summary.rows,
        output = %output.display(),
        "harvest complete"
    );
    Ok(summary)
}
