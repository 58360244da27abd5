use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

use super::DemographicRecord;

/// Reads the demographic cache verbatim.
///
/// The file must carry `Town`, `Year`, `Population` and
/// `Median Household Income` columns. A row that does not fit that shape
/// fails the whole read, as does a file with no rows.
pub fn read_cache(path: &Path) -> Result<Vec<DemographicRecord>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open census cache {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let record: DemographicRecord = result.with_context(|| {
            format!(
                "census cache {} does not match the expected schema (row {})",
                path.display(),
                idx + 1
            )
        })?;
        records.push(record);
    }

    if records.is_empty() {
        bail!("census cache {} contains no records", path.display());
    }

    debug!(path = %path.display(), rows = records.len(), "Census cache read");
    Ok(records)
}

/// Writes `records` to `path`, replacing any existing file.
///
/// The rows go to a sibling temp file first and are renamed into place, so
/// an interrupted write never leaves a truncated cache behind.
pub fn write_cache(path: &Path, records: &[DemographicRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    {
        let file = File::create(&tmp_path)
            .with_context(|| format!("cannot create {}", tmp_path.display()))?;
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)
        .with_context(|| format!("cannot move census cache into {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "Census cache written");
    Ok(())
}
