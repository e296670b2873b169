//! CSV sink for the issue stream.
//!
//! Records are flattened and encoded as they arrive; the encoded text is
//! appended to the output file once the stream completes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::{pin_mut, Stream, TryStreamExt};
use jiradump_core::{CompactIssue, CustomFieldSpec, Error, Result};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::flatten::{flatten, DescriptionPolicy};

/// Suffix of every export file name.
const FILE_SUFFIX: &str = "jira-issues.csv";

/// Output path for an export of `project_ids`:
/// `{outdir}/{projectIds joined by "-"}-jira-issues.csv`.
pub fn output_file_path(outdir: &Path, project_ids: &[String]) -> PathBuf {
    outdir.join(format!("{}-{}", project_ids.join("-"), FILE_SUFFIX))
}

/// Delete `path`, treating a missing file as success.
async fn remove_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = ?path, "Removed previous export");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Write `records` to `output_path` as CSV and return the path.
///
/// Any existing file is removed before the stream is polled. The header is
/// taken from the first record. An empty stream leaves no file behind. The
/// first error from the stream aborts the export without writing.
pub async fn export_to_csv<S>(
    records: S,
    spec: &CustomFieldSpec,
    policy: DescriptionPolicy,
    output_path: &Path,
) -> Result<PathBuf>
where
    S: Stream<Item = Result<CompactIssue>>,
{
    remove_if_exists(output_path).await?;

    pin_mut!(records);
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut rows = 0usize;

    while let Some(issue) = records.try_next().await? {
        let record = flatten(&issue, spec, policy)?;
        if rows == 0 {
            writer.write_record(record.names()).map_err(csv_error)?;
        }
        writer.write_record(record.values()).map_err(csv_error)?;
        rows += 1;
    }

    if rows == 0 {
        info!(path = ?output_path, "No issues to export");
        return Ok(output_path.to_path_buf());
    }

    let encoded = writer
        .into_inner()
        .map_err(|e| Error::Csv(e.to_string()))?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)
        .await?;
    file.write_all(&encoded).await?;
    file.flush().await?;

    info!(path = ?output_path, rows = rows, "CSV export written");
    Ok(output_path.to_path_buf())
}

fn csv_error(e: csv::Error) -> Error {
    Error::Csv(e.to_string())
}
