//! Destination file names for remote sources
//!
//! Remote downloads land under the job's temporary directory. The file name is
//! a pure function of the source URL so a job can always recompute where its
//! partial file lives.

use reqwest::Url;
use std::fmt::Debug;

/// Strategy turning a source URL into a file name (no directory components)
pub trait DestinationNaming: Send + Sync + Debug {
    fn file_name(&self, source: &Url) -> String;
}

/// Flattens host and path into one lowercase, underscore-separated name
///
/// `http://samplecsvs.s3.amazonaws.com/Sacramentorealestatetransactions.csv`
/// becomes `samplecsvs_s3_amazonaws_com_sacramentorealestatetransactions.csv`.
/// Query and fragment are dropped; a non-default port is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizedUrlName;

impl DestinationNaming for SanitizedUrlName {
    fn file_name(&self, source: &Url) -> String {
        let (stem, extension) = split_extension(source.path());

        let mut raw = source.host_str().unwrap_or_default().to_string();
        if let Some(port) = source.port() {
            raw.push_str(&format!("_{}", port));
        }
        raw.push_str(stem);

        let mut name = sanitize(&raw);
        if name.is_empty() {
            name.push_str("download");
        }
        match extension {
            Some(ext) => format!("{}.{}", name, ext.to_ascii_lowercase()),
            None => name,
        }
    }
}

/// Keeps the last path segment of the URL as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalFileName;

impl DestinationNaming for OriginalFileName {
    fn file_name(&self, source: &Url) -> String {
        source
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .filter(|segment| *segment != "." && *segment != "..")
            .map(str::to_string)
            .unwrap_or_else(|| SanitizedUrlName.file_name(source))
    }
}

/// Split `.ext` off the last path segment, if it has an alphanumeric one
fn split_extension(path: &str) -> (&str, Option<&str>) {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < last.len() => {
            let ext = &last[dot + 1..];
            if ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                (&path[..path.len() - ext.len() - 1], Some(ext))
            } else {
                (path, None)
            }
        }
        _ => (path, None),
    }
}

/// Lowercase, collapse every non-alphanumeric run into one `_`, trim the ends
fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
