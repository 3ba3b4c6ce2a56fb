//! Folder template and path rules
//!
//! Every tender (or tender/partner) base folder carries the same fixed
//! subfolder tree. Entries are listed parents first; provisioning walks the
//! list front to back.

use tenderdocs_domain::constants::{STORAGE_KEY_PREFIX, UPLOADS_FOLDER};
use tenderdocs_domain::{DocSyncError, Result};

/// Subfolders created under each base folder, in creation order.
pub const FOLDER_TEMPLATE: [&str; 18] = [
    "EPC Uploads",
    "EPC Uploads/01. Design",
    "EPC Uploads/02. Grid",
    "EPC Uploads/02. Grid/G99 Application",
    "EPC Uploads/02. Grid/G99 Offer",
    "EPC Uploads/03. Planning",
    "EPC Uploads/03. Planning/Application",
    "EPC Uploads/03. Planning/Decision",
    "EPC Uploads/04. Delivery",
    "EPC Uploads/04. Delivery/Contract",
    "EPC Uploads/04. Delivery/O&M",
    "EPC Uploads/04. Delivery/Final Design",
    "EPC Uploads/04. Delivery/Precon Pack",
    "EPC Uploads/04. Delivery/Invoices",
    "EPC Uploads/04. Delivery/Handover",
    "EPC Uploads/05. Survey",
    "EPC Uploads/05. Survey/Site",
    "EPC Uploads/05. Survey/Media",
];

/// Last template entry. Creation is sequential, so its presence means the
/// whole tree was provisioned.
#[must_use]
pub fn completion_marker() -> &'static str {
    FOLDER_TEMPLATE[FOLDER_TEMPLATE.len() - 1]
}

const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', '"', '*', ':', '<', '>', '?', '|'];

/// Validate a single path segment (tender id, partner name, file name).
///
/// # Errors
/// Returns `DocSyncError::InvalidInput` when the segment is empty, has
/// surrounding whitespace, is a relative marker, or holds characters the
/// library rejects.
pub fn validate_segment(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DocSyncError::InvalidInput(format!("{kind} must not be empty")));
    }
    if value.trim() != value {
        return Err(DocSyncError::InvalidInput(format!(
            "{kind} must not start or end with whitespace: {value:?}"
        )));
    }
    if value == "." || value == ".." {
        return Err(DocSyncError::InvalidInput(format!("{kind} must not be {value:?}")));
    }
    if let Some(c) = value.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return Err(DocSyncError::InvalidInput(format!(
            "{kind} contains forbidden character {c:?}: {value:?}"
        )));
    }
    Ok(())
}

/// Library-relative base folder for a tender and optional partner.
///
/// # Errors
/// Returns `DocSyncError::InvalidInput` for unsafe identifiers.
pub fn base_path(library: &str, tender_id: &str, partner_name: Option<&str>) -> Result<String> {
    validate_segment("tender id", tender_id)?;
    match partner_name {
        Some(partner) => {
            validate_segment("partner name", partner)?;
            Ok(format!("{library}/{tender_id}/{partner}"))
        }
        None => Ok(format!("{library}/{tender_id}")),
    }
}

/// Folders from the library root down to the base, parents first.
///
/// `EPC_Tender_Docs/T-1/Acme` yields `EPC_Tender_Docs/T-1` then
/// `EPC_Tender_Docs/T-1/Acme`; the library root itself is never created.
#[must_use]
pub fn base_chain(library: &str, base: &str) -> Vec<String> {
    let relative = base.strip_prefix(library).unwrap_or(base).trim_matches('/');
    let mut current = library.to_string();
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            current = format!("{current}/{segment}");
            current.clone()
        })
        .collect()
}

/// Resolved destination of an upload, relative to the base folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFolder {
    /// Matching template entry, e.g. `EPC Uploads/01. Design`.
    pub template_entry: &'static str,
    /// Caller-supplied segments below the template entry.
    pub extra_segments: Vec<String>,
}

impl UploadFolder {
    /// Full path relative to the base folder.
    #[must_use]
    pub fn relative_path(&self) -> String {
        std::iter::once(self.template_entry.to_string())
            .chain(self.extra_segments.iter().cloned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Folders below the template entry that must exist, parents first.
    #[must_use]
    pub fn extra_folders(&self) -> Vec<String> {
        let mut current = self.template_entry.to_string();
        self.extra_segments
            .iter()
            .map(|segment| {
                current = format!("{current}/{segment}");
                current.clone()
            })
            .collect()
    }
}

/// Match an upload folder (relative to `EPC Uploads`) against the template.
///
/// The longest template entry that prefixes the path by whole segments wins;
/// anything below it is kept as caller-supplied segments.
///
/// # Errors
/// Returns `DocSyncError::InvalidInput` for unsafe segments or paths outside
/// the template.
pub fn resolve_upload_folder(folder_path: &str) -> Result<UploadFolder> {
    let segments: Vec<&str> =
        folder_path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(DocSyncError::InvalidInput("folder path must not be empty".into()));
    }
    for segment in &segments {
        validate_segment("folder path segment", segment)?;
    }

    let uploads_prefix = format!("{UPLOADS_FOLDER}/");
    let best = FOLDER_TEMPLATE
        .iter()
        .filter_map(|entry| {
            let relative = entry.strip_prefix(&uploads_prefix)?;
            let entry_segments: Vec<&str> = relative.split('/').collect();
            let matches = entry_segments.len() <= segments.len()
                && entry_segments.iter().zip(&segments).all(|(a, b)| a == b);
            matches.then_some((entry, entry_segments.len()))
        })
        .max_by_key(|(_, depth)| *depth);

    match best {
        Some((entry, depth)) => Ok(UploadFolder {
            template_entry: entry,
            extra_segments: segments[depth..].iter().map(|s| (*s).to_string()).collect(),
        }),
        None => Err(DocSyncError::InvalidInput(format!(
            "folder path {folder_path:?} is not part of the upload template"
        ))),
    }
}

/// Object storage key for a pulled file.
#[must_use]
pub fn storage_key(tender_id: &str, partner_name: Option<&str>, relative_path: &str) -> String {
    match partner_name {
        Some(partner) => format!("{STORAGE_KEY_PREFIX}/{tender_id}/{partner}/{relative_path}"),
        None => format!("{STORAGE_KEY_PREFIX}/{tender_id}/{relative_path}"),
    }
}
