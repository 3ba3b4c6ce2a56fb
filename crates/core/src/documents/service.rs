//! Document sync gateway - orchestration over the library and storage ports

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tenderdocs_domain::constants::{
    META_REMOTE_ID, META_SOURCE, META_SOURCE_VALUE, META_SYNCED_AT,
};
use tenderdocs_domain::{
    DocSyncError, DocumentMetadata, DocumentMetadataMap, DocumentRecord, FolderCreation,
    FolderTreeResult, RemoteFile, RemoteListing, Result, StoredObject, SyncFileResult, SyncReport,
    UploadedDocument, VersionEntry,
};
use tracing::{debug, info, warn};

use super::paths::{self, FOLDER_TEMPLATE};
use super::ports::{DocumentLibrary, ObjectStorage};

/// Document sync gateway
///
/// Stateless façade over a remote document library. Callers never see token
/// handling or folder provisioning; both happen on demand inside the calls.
pub struct DocumentSyncGateway {
    library: Arc<dyn DocumentLibrary>,
    storage: Option<Arc<dyn ObjectStorage>>,
    library_name: String,
}

impl DocumentSyncGateway {
    /// Create a gateway rooted at `library_name` (e.g. `EPC_Tender_Docs`).
    pub fn new(library: Arc<dyn DocumentLibrary>, library_name: impl Into<String>) -> Self {
        Self { library, storage: None, library_name: library_name.into() }
    }

    /// Attach the object storage used by `pull_sync`.
    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// Make sure the tender (or tender/partner) folder and all 18 template
    /// subfolders exist.
    ///
    /// Folders are created one at a time, parents first. "Already exists" is
    /// success, so repeated and concurrent calls converge on the same tree.
    /// A base folder whose last template entry is missing (an earlier run
    /// stopped part way) is completed rather than reported as provisioned.
    ///
    /// # Errors
    /// `InvalidInput` for unsafe identifiers, `FolderProvisioning` when the
    /// library rejects a check or a creation, `Authentication` when no token
    /// can be obtained.
    pub async fn ensure_folder_tree(
        &self,
        tender_id: &str,
        partner_name: Option<&str>,
    ) -> Result<FolderTreeResult> {
        let base = paths::base_path(&self.library_name, tender_id, partner_name)?;

        if self.library.folder_exists(&base).await? {
            let marker = format!("{base}/{}", paths::completion_marker());
            if self.library.folder_exists(&marker).await? {
                debug!(tender_id, base = %base, "folder tree already provisioned");
                return Ok(FolderTreeResult { success: true, base_path: base, created: Vec::new() });
            }
            warn!(tender_id, base = %base, "folder tree incomplete, resuming provisioning");
        }

        let mut created = Vec::new();
        let chain = paths::base_chain(&self.library_name, &base);
        let template = FOLDER_TEMPLATE.iter().map(|entry| format!("{base}/{entry}"));
        for folder in chain.into_iter().chain(template) {
            self.create_folder(&folder, &mut created).await?;
        }

        info!(tender_id, base = %base, created = created.len(), "folder tree provisioned");
        Ok(FolderTreeResult { success: true, base_path: base, created })
    }

    async fn create_folder(&self, folder: &str, created: &mut Vec<String>) -> Result<()> {
        match self.library.create_folder(folder).await? {
            FolderCreation::Created => {
                debug!(folder, "folder created");
                created.push(folder.to_string());
            }
            FolderCreation::AlreadyExists => debug!(folder, "folder already exists"),
        }
        Ok(())
    }

    /// Upload a document into the tender's template folder, provisioning the
    /// tree first when needed.
    ///
    /// Existing files with the same name are overwritten. When metadata is
    /// supplied a follow-up patch is issued against the uploaded file. Folders
    /// created here are left in place if the upload fails.
    ///
    /// # Errors
    /// `InvalidInput` for bad names or folders outside the template,
    /// `FolderProvisioning` from tree creation, `Upload` when the library
    /// rejects the upload or the metadata patch.
    pub async fn upload_document(
        &self,
        tender_id: &str,
        partner_name: Option<&str>,
        record: DocumentRecord,
    ) -> Result<UploadedDocument> {
        paths::validate_segment("file name", &record.file_name)?;
        let destination = paths::resolve_upload_folder(&record.folder_path)?;

        let tree = self.ensure_folder_tree(tender_id, partner_name).await?;
        let mut created = tree.created;
        for extra in destination.extra_folders() {
            self.create_folder(&format!("{}/{extra}", tree.base_path), &mut created).await?;
        }

        let folder = format!("{}/{}", tree.base_path, destination.relative_path());
        let size = record.content.len();
        let uploaded = self.library.upload_file(&folder, &record.file_name, record.content).await?;

        if let Some(metadata) = record.metadata.as_ref().filter(|m| !m.is_empty()) {
            self.library.update_metadata(&uploaded.server_relative_url, metadata).await?;
        }

        info!(
            tender_id,
            folder = %folder,
            file_name = %record.file_name,
            size_bytes = size,
            version = %uploaded.version_label,
            "document uploaded"
        );
        Ok(uploaded)
    }

    /// Patch list item fields on an existing document.
    ///
    /// # Errors
    /// `Upload` when the library rejects the patch.
    pub async fn update_document_metadata(
        &self,
        server_relative_url: &str,
        metadata: &DocumentMetadataMap,
    ) -> Result<()> {
        if metadata.is_empty() {
            return Ok(());
        }
        self.library.update_metadata(server_relative_url, metadata).await
    }

    /// Fetch the raw bytes of one document.
    ///
    /// # Errors
    /// `Download` on any non-success response.
    pub async fn download_document(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        self.library.download_file(server_relative_url).await
    }

    /// Version history, best effort: any failure yields an empty list.
    pub async fn list_versions(&self, server_relative_url: &str) -> Vec<VersionEntry> {
        match self.library.list_versions(server_relative_url).await {
            Ok(versions) => versions,
            Err(err) => {
                warn!(path = server_relative_url, error = %err, "version history unavailable");
                Vec::new()
            }
        }
    }

    /// Delete one document regardless of concurrent remote edits.
    ///
    /// # Errors
    /// `Delete` on any non-success response, including a missing file.
    pub async fn delete_document(&self, server_relative_url: &str) -> Result<()> {
        self.library.delete_file(server_relative_url).await?;
        info!(path = server_relative_url, "document deleted");
        Ok(())
    }

    /// Descriptive fields, best effort: any failure yields `None`.
    pub async fn get_document_metadata(&self, server_relative_url: &str) -> Option<DocumentMetadata> {
        match self.library.file_metadata(server_relative_url).await {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                warn!(path = server_relative_url, error = %err, "document metadata unavailable");
                None
            }
        }
    }

    /// Every file below the tender/partner folder, plus the subfolders that
    /// could not be read.
    ///
    /// # Errors
    /// `Sync` when the top-level listing cannot be retrieved.
    pub async fn list_documents(
        &self,
        tender_id: &str,
        partner_name: Option<&str>,
    ) -> Result<RemoteListing> {
        let base = paths::base_path(&self.library_name, tender_id, partner_name)?;
        let listing = self.library.list_files(&base).await.map_err(into_sync_error)?;
        if !listing.is_complete() {
            warn!(tender_id, base = %base, skipped = listing.skipped.len(), "listing incomplete");
        }
        Ok(listing)
    }

    /// Copy every remote file of a tender/partner into object storage.
    ///
    /// Files are processed one at a time. A failing file is recorded in the
    /// report and the loop moves on; only a failed top-level listing aborts.
    /// Each unreadable subfolder adds one failed entry named by its path.
    ///
    /// # Errors
    /// `Config` when no storage is attached, `Sync` when the listing fails.
    pub async fn pull_sync(&self, tender_id: &str, partner_name: Option<&str>) -> Result<SyncReport> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            DocSyncError::Config("pull sync requires an object storage backend".into())
        })?;

        let listing = self.list_documents(tender_id, partner_name).await?;
        let synced_at = Utc::now();
        let mut results = Vec::with_capacity(listing.files.len() + listing.skipped.len());

        for file in listing.files {
            let key = paths::storage_key(tender_id, partner_name, &file.relative_path);
            match self.copy_to_storage(storage.as_ref(), &file, &key, synced_at).await {
                Ok(()) => {
                    debug!(tender_id, key = %key, "file synced");
                    results.push(SyncFileResult::synced(&file.name, key));
                }
                Err(err) => {
                    warn!(tender_id, file = %file.server_relative_url, error = %err, "file sync failed");
                    results.push(SyncFileResult::failed(&file.name, err.to_string()));
                }
            }
        }

        for folder in listing.skipped {
            warn!(tender_id, folder = %folder.relative_path, error = %folder.error, "folder not synced");
            results.push(SyncFileResult::failed(
                format!("{}/", folder.relative_path),
                format!("folder listing failed: {}", folder.error),
            ));
        }

        let report = SyncReport {
            tender_id: tender_id.to_string(),
            partner_name: partner_name.map(str::to_string),
            synced_at,
            files: results,
        };
        info!(
            tender_id,
            synced = report.synced_count(),
            failed = report.failed_count(),
            "pull sync finished"
        );
        Ok(report)
    }

    async fn copy_to_storage(
        &self,
        storage: &dyn ObjectStorage,
        file: &RemoteFile,
        key: &str,
        synced_at: chrono::DateTime<Utc>,
    ) -> Result<()> {
        let content = self.library.download_file(&file.server_relative_url).await?;

        let metadata = BTreeMap::from([
            (META_SOURCE.to_string(), META_SOURCE_VALUE.to_string()),
            (META_REMOTE_ID.to_string(), file.unique_id.clone()),
            (META_SYNCED_AT.to_string(), synced_at.to_rfc3339()),
        ]);

        storage
            .put(StoredObject {
                key: key.to_string(),
                content_type: content_type_for(&file.name),
                metadata,
                content,
            })
            .await
    }
}

fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(file_name).first_or_octet_stream().essence_str().to_string()
}

fn into_sync_error(err: DocSyncError) -> DocSyncError {
    match err {
        DocSyncError::Sync(_)
        | DocSyncError::Authentication(_)
        | DocSyncError::InvalidInput(_)
        | DocSyncError::Config(_) => err,
        other => DocSyncError::Sync(other.message().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tenderdocs_domain::{CheckoutState, SkippedFolder, SyncFileStatus};

    use super::*;

    const LIBRARY: &str = "EPC_Tender_Docs";
    const SITE: &str = "/sites/Tenders";

    /// In-memory library that enforces parent-before-child creation.
    #[derive(Default)]
    struct FakeLibrary {
        folders: Mutex<BTreeSet<String>>,
        files: Mutex<HashMap<String, Vec<u8>>>,
        create_calls: Mutex<Vec<String>>,
        metadata_patches: Mutex<Vec<(String, DocumentMetadataMap)>>,
        download_calls: Mutex<Vec<String>>,
        failing_downloads: BTreeSet<String>,
        unreadable_folders: BTreeSet<String>,
        fail_listing: bool,
        fail_reads: bool,
    }

    impl FakeLibrary {
        fn server_url(folder: &str, name: &str) -> String {
            format!("{SITE}/{folder}/{name}")
        }

        fn folder_set(&self) -> BTreeSet<String> {
            self.folders.lock().unwrap().clone()
        }

        fn seed_file(&self, folder: &str, name: &str, content: &[u8]) {
            self.files.lock().unwrap().insert(Self::server_url(folder, name), content.to_vec());
        }
    }

    #[async_trait]
    impl DocumentLibrary for FakeLibrary {
        async fn folder_exists(&self, folder: &str) -> Result<bool> {
            Ok(folder == LIBRARY || self.folders.lock().unwrap().contains(folder))
        }

        async fn create_folder(&self, folder: &str) -> Result<FolderCreation> {
            tokio::task::yield_now().await;
            self.create_calls.lock().unwrap().push(folder.to_string());
            let parent = folder.rsplit_once('/').map_or(LIBRARY, |(p, _)| p);
            let mut folders = self.folders.lock().unwrap();
            if parent != LIBRARY && !folders.contains(parent) {
                return Err(DocSyncError::FolderProvisioning(format!(
                    "HTTP 404 Not Found: parent of {folder} missing"
                )));
            }
            if folders.insert(folder.to_string()) {
                Ok(FolderCreation::Created)
            } else {
                Ok(FolderCreation::AlreadyExists)
            }
        }

        async fn upload_file(
            &self,
            folder: &str,
            file_name: &str,
            content: Vec<u8>,
        ) -> Result<UploadedDocument> {
            if !self.folders.lock().unwrap().contains(folder) {
                return Err(DocSyncError::Upload(format!("HTTP 404 Not Found: {folder}")));
            }
            let url = Self::server_url(folder, file_name);
            self.files.lock().unwrap().insert(url.clone(), content);
            Ok(UploadedDocument {
                success: true,
                unique_id: format!("id-{file_name}"),
                server_relative_url: url,
                version_label: "1.0".into(),
            })
        }

        async fn update_metadata(&self, url: &str, metadata: &DocumentMetadataMap) -> Result<()> {
            self.metadata_patches.lock().unwrap().push((url.to_string(), metadata.clone()));
            Ok(())
        }

        async fn download_file(&self, url: &str) -> Result<Vec<u8>> {
            self.download_calls.lock().unwrap().push(url.to_string());
            if self.failing_downloads.contains(url) {
                return Err(DocSyncError::Download("HTTP 500 Internal Server Error".into()));
            }
            self.files
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| DocSyncError::Download("HTTP 404 Not Found".into()))
        }

        async fn list_versions(&self, url: &str) -> Result<Vec<VersionEntry>> {
            if self.fail_reads {
                return Err(DocSyncError::Network("HTTP connection failure".into()));
            }
            Ok(vec![
                VersionEntry { label: "1.0".into(), created: None, author: Some("A".into()), size: 10 },
                VersionEntry { label: format!("2.0 of {url}"), created: None, author: None, size: 12 },
            ])
        }

        async fn delete_file(&self, url: &str) -> Result<()> {
            match self.files.lock().unwrap().remove(url) {
                Some(_) => Ok(()),
                None => Err(DocSyncError::Delete("HTTP 404 Not Found".into())),
            }
        }

        async fn file_metadata(&self, url: &str) -> Result<DocumentMetadata> {
            if self.fail_reads {
                return Err(DocSyncError::Download("HTTP 503 Service Unavailable".into()));
            }
            Ok(DocumentMetadata {
                id: "abc".into(),
                title: None,
                name: url.rsplit('/').next().unwrap_or_default().to_string(),
                server_relative_url: url.to_string(),
                created: None,
                modified: None,
                author: None,
                editor: None,
                size: 0,
                version_label: Some("1.0".into()),
                checkout_state: CheckoutState::None,
                approval_status: None,
            })
        }

        async fn list_files(&self, folder: &str) -> Result<RemoteListing> {
            if self.fail_listing {
                return Err(DocSyncError::Download("HTTP 403 Forbidden".into()));
            }
            let prefix = format!("{SITE}/{folder}/");
            let hidden = |relative: &str| {
                self.unreadable_folders.iter().any(|dir| relative.starts_with(&format!("{dir}/")))
            };
            let mut files: Vec<RemoteFile> = self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter_map(|url| {
                    let relative = url.strip_prefix(&prefix)?;
                    if hidden(relative) {
                        return None;
                    }
                    let name = relative.rsplit('/').next()?.to_string();
                    Some(RemoteFile {
                        unique_id: format!("id-{name}"),
                        name,
                        server_relative_url: url.clone(),
                        size: 0,
                        relative_path: relative.to_string(),
                    })
                })
                .collect();
            files.sort_by(|a, b| a.server_relative_url.cmp(&b.server_relative_url));
            let skipped = self
                .unreadable_folders
                .iter()
                .map(|dir| SkippedFolder { relative_path: dir.clone(), error: "Download error: HTTP 403 Forbidden".into() })
                .collect();
            Ok(RemoteListing { files, skipped })
        }
    }

    #[derive(Default)]
    struct FakeStorage {
        objects: Mutex<HashMap<String, StoredObject>>,
    }

    #[async_trait]
    impl ObjectStorage for FakeStorage {
        async fn put(&self, object: StoredObject) -> Result<()> {
            self.objects.lock().unwrap().insert(object.key.clone(), object);
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self.objects.lock().unwrap().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
        }
    }

    fn gateway(library: Arc<FakeLibrary>) -> DocumentSyncGateway {
        DocumentSyncGateway::new(library, LIBRARY)
    }

    fn expected_tree(base: &str) -> BTreeSet<String> {
        FOLDER_TEMPLATE.iter().map(|entry| format!("{base}/{entry}")).collect()
    }

    #[tokio::test]
    async fn provisions_all_template_folders() {
        let library = Arc::new(FakeLibrary::default());
        let result = gateway(library.clone()).ensure_folder_tree("SABER-2024-001", None).await.unwrap();

        assert!(result.success);
        assert_eq!(result.base_path, "EPC_Tender_Docs/SABER-2024-001");
        assert_eq!(result.created.len(), 19);

        let folders = library.folder_set();
        assert!(folders.contains("EPC_Tender_Docs/SABER-2024-001"));
        assert!(expected_tree(&result.base_path).is_subset(&folders));
    }

    #[tokio::test]
    async fn second_provisioning_is_a_no_op() {
        let library = Arc::new(FakeLibrary::default());
        let gateway = gateway(library.clone());

        gateway.ensure_folder_tree("T-1", Some("Acme")).await.unwrap();
        let after_first = library.folder_set();
        let calls_after_first = library.create_calls.lock().unwrap().len();

        let second = gateway.ensure_folder_tree("T-1", Some("Acme")).await.unwrap();

        assert!(second.created.is_empty());
        assert_eq!(library.folder_set(), after_first);
        assert_eq!(library.create_calls.lock().unwrap().len(), calls_after_first);
    }

    #[tokio::test]
    async fn partner_base_creates_tender_folder_first() {
        let library = Arc::new(FakeLibrary::default());
        let result = gateway(library.clone()).ensure_folder_tree("T-1", Some("Acme")).await.unwrap();

        let calls = library.create_calls.lock().unwrap().clone();
        assert_eq!(calls[0], "EPC_Tender_Docs/T-1");
        assert_eq!(calls[1], "EPC_Tender_Docs/T-1/Acme");
        assert_eq!(calls[2], "EPC_Tender_Docs/T-1/Acme/EPC Uploads");
        assert_eq!(result.base_path, "EPC_Tender_Docs/T-1/Acme");
    }

    #[tokio::test]
    async fn incomplete_tree_is_completed() {
        let library = Arc::new(FakeLibrary::default());
        {
            let mut folders = library.folders.lock().unwrap();
            folders.insert("EPC_Tender_Docs/T-2".into());
            folders.insert("EPC_Tender_Docs/T-2/EPC Uploads".into());
            folders.insert("EPC_Tender_Docs/T-2/EPC Uploads/01. Design".into());
        }

        let result = gateway(library.clone()).ensure_folder_tree("T-2", None).await.unwrap();

        assert_eq!(result.created.len(), 16);
        assert!(expected_tree("EPC_Tender_Docs/T-2").is_subset(&library.folder_set()));
    }

    #[tokio::test]
    async fn concurrent_first_provisioning_succeeds_for_both_callers() {
        let library = Arc::new(FakeLibrary::default());
        let gateway = gateway(library.clone());

        let (a, b) = tokio::join!(
            gateway.ensure_folder_tree("T-3", None),
            gateway.ensure_folder_tree("T-3", None)
        );

        assert!(a.unwrap().success);
        assert!(b.unwrap().success);
        assert_eq!(library.folder_set().len(), 19);
    }

    #[tokio::test]
    async fn provisioning_failure_surfaces_folder_error() {
        struct DenyingLibrary(FakeLibrary);

        #[async_trait]
        impl DocumentLibrary for DenyingLibrary {
            async fn folder_exists(&self, folder: &str) -> Result<bool> {
                self.0.folder_exists(folder).await
            }
            async fn create_folder(&self, folder: &str) -> Result<FolderCreation> {
                if folder.ends_with("02. Grid") {
                    return Err(DocSyncError::FolderProvisioning("HTTP 403 Forbidden".into()));
                }
                self.0.create_folder(folder).await
            }
            async fn upload_file(&self, f: &str, n: &str, c: Vec<u8>) -> Result<UploadedDocument> {
                self.0.upload_file(f, n, c).await
            }
            async fn update_metadata(&self, u: &str, m: &DocumentMetadataMap) -> Result<()> {
                self.0.update_metadata(u, m).await
            }
            async fn download_file(&self, u: &str) -> Result<Vec<u8>> {
                self.0.download_file(u).await
            }
            async fn list_versions(&self, u: &str) -> Result<Vec<VersionEntry>> {
                self.0.list_versions(u).await
            }
            async fn delete_file(&self, u: &str) -> Result<()> {
                self.0.delete_file(u).await
            }
            async fn file_metadata(&self, u: &str) -> Result<DocumentMetadata> {
                self.0.file_metadata(u).await
            }
            async fn list_files(&self, f: &str) -> Result<RemoteListing> {
                self.0.list_files(f).await
            }
        }

        let gateway = DocumentSyncGateway::new(Arc::new(DenyingLibrary(FakeLibrary::default())), LIBRARY);
        let err = gateway.ensure_folder_tree("T-4", None).await.unwrap_err();

        assert!(matches!(err, DocSyncError::FolderProvisioning(ref msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn upload_provisions_tree_and_places_file() {
        let library = Arc::new(FakeLibrary::default());
        let gateway = gateway(library.clone());

        let uploaded = gateway
            .upload_document("SABER-2024-001", None, DocumentRecord::new("01. Design", "spec.pdf", b"%PDF".to_vec()))
            .await
            .unwrap();

        assert!(uploaded.success);
        assert_eq!(
            uploaded.server_relative_url,
            "/sites/Tenders/EPC_Tender_Docs/SABER-2024-001/EPC Uploads/01. Design/spec.pdf"
        );
        assert_eq!(uploaded.version_label, "1.0");
        assert!(!uploaded.unique_id.is_empty());
        assert!(library.metadata_patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_uploads_do_not_duplicate_folders() {
        let library = Arc::new(FakeLibrary::default());
        let gateway = gateway(library.clone());

        for _ in 0..2 {
            gateway
                .upload_document("T-5", Some("Acme"), DocumentRecord::new("02. Grid/G99 Offer", "offer.pdf", vec![1]))
                .await
                .unwrap();
        }

        let created_calls = library.create_calls.lock().unwrap().len();
        assert_eq!(created_calls, 20);
        assert_eq!(library.folder_set().len(), 20);
    }

    #[tokio::test]
    async fn upload_creates_caller_subfolders_below_template() {
        let library = Arc::new(FakeLibrary::default());
        let uploaded = gateway(library.clone())
            .upload_document("T-6", None, DocumentRecord::new("05. Survey/Site/Drone", "pic.jpg", vec![0xFF]))
            .await
            .unwrap();

        assert!(library.folder_set().contains("EPC_Tender_Docs/T-6/EPC Uploads/05. Survey/Site/Drone"));
        assert!(uploaded.server_relative_url.ends_with("05. Survey/Site/Drone/pic.jpg"));
    }

    #[tokio::test]
    async fn upload_patches_metadata_when_supplied() {
        let library = Arc::new(FakeLibrary::default());
        let metadata = DocumentMetadataMap::from([
            ("Stage".to_string(), "Planning".into()),
            ("Approved".to_string(), true.into()),
        ]);

        let uploaded = gateway(library.clone())
            .upload_document(
                "T-7",
                None,
                DocumentRecord::new("03. Planning/Decision", "decision.pdf", vec![1]).with_metadata(metadata.clone()),
            )
            .await
            .unwrap();

        let patches = library.metadata_patches.lock().unwrap().clone();
        assert_eq!(patches, vec![(uploaded.server_relative_url, metadata)]);
    }

    #[tokio::test]
    async fn upload_rejects_bad_input_before_remote_calls() {
        let library = Arc::new(FakeLibrary::default());
        let gateway = gateway(library.clone());

        let err = gateway
            .upload_document("T-8", None, DocumentRecord::new("99. Unknown", "a.pdf", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DocSyncError::InvalidInput(_)));

        let err = gateway
            .upload_document("T-8", None, DocumentRecord::new("01. Design", "", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DocSyncError::InvalidInput(_)));

        assert!(library.create_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_operations_fail_open() {
        let library = Arc::new(FakeLibrary { fail_reads: true, ..FakeLibrary::default() });
        let gateway = gateway(library);

        assert!(gateway.list_versions("/sites/Tenders/x.pdf").await.is_empty());
        assert!(gateway.get_document_metadata("/sites/Tenders/x.pdf").await.is_none());
    }

    #[tokio::test]
    async fn read_operations_return_remote_data() {
        let gateway = gateway(Arc::new(FakeLibrary::default()));

        let versions = gateway.list_versions("/sites/Tenders/x.pdf").await;
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].label, "1.0");

        let metadata = gateway.get_document_metadata("/sites/Tenders/x.pdf").await.unwrap();
        assert_eq!(metadata.name, "x.pdf");
    }

    #[tokio::test]
    async fn delete_of_missing_document_is_an_error() {
        let err = gateway(Arc::new(FakeLibrary::default()))
            .delete_document("/sites/Tenders/EPC_Tender_Docs/none.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, DocSyncError::Delete(_)));
    }

    #[tokio::test]
    async fn pull_sync_records_partial_failures_and_continues() {
        let base = "EPC_Tender_Docs/T-9/Acme";
        let mut library = FakeLibrary::default();
        library.failing_downloads.insert(FakeLibrary::server_url(base, "b.pdf"));
        library.seed_file(base, "a.pdf", b"a");
        library.seed_file(base, "b.pdf", b"b");
        library.seed_file(base, "c.pdf", b"c");
        let library = Arc::new(library);
        let storage = Arc::new(FakeStorage::default());

        let report = gateway(library.clone())
            .with_storage(storage.clone())
            .pull_sync("T-9", Some("Acme"))
            .await
            .unwrap();

        assert_eq!(report.synced_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.files[1].status, SyncFileStatus::Failed);
        assert_eq!(report.files[2].status, SyncFileStatus::Synced);
        assert_eq!(library.download_calls.lock().unwrap().len(), 3);

        let stored = storage.get("documents/T-9/Acme/c.pdf").await.unwrap().unwrap();
        assert_eq!(stored.content, b"c");
        assert_eq!(stored.content_type, "application/pdf");
        assert_eq!(stored.metadata.get("source").map(String::as_str), Some("sharepoint"));
        assert_eq!(stored.metadata.get("sharepoint-id").map(String::as_str), Some("id-c.pdf"));
        assert!(stored.metadata.contains_key("synced-at"));
        assert!(storage.get("documents/T-9/Acme/b.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pull_sync_keeps_subfolder_paths_in_keys() {
        let library = FakeLibrary::default();
        library.seed_file("EPC_Tender_Docs/T-10/EPC Uploads/01. Design", "layout.dwg", b"x");
        let storage = Arc::new(FakeStorage::default());

        let report = gateway(Arc::new(library)).with_storage(storage.clone()).pull_sync("T-10", None).await.unwrap();

        assert_eq!(
            report.files[0].storage_key.as_deref(),
            Some("documents/T-10/EPC Uploads/01. Design/layout.dwg")
        );
    }

    #[tokio::test]
    async fn pull_sync_reports_unreadable_subfolders_as_failed() {
        let base = "EPC_Tender_Docs/T-13/Acme";
        let mut library = FakeLibrary::default();
        library.unreadable_folders.insert("02. Grid".into());
        library.seed_file(&format!("{base}/01. Design"), "a.pdf", b"a");
        library.seed_file(&format!("{base}/02. Grid"), "b.pdf", b"b");
        let storage = Arc::new(FakeStorage::default());

        let report = gateway(Arc::new(library))
            .with_storage(storage.clone())
            .pull_sync("T-13", Some("Acme"))
            .await
            .unwrap();

        assert_eq!(report.synced_count(), 1);
        assert_eq!(report.failed_count(), 1);
        let failed = &report.files[1];
        assert_eq!(failed.status, SyncFileStatus::Failed);
        assert_eq!(failed.file_name, "02. Grid/");
        assert!(failed.error.as_deref().unwrap().contains("403"));
        assert!(storage.get("documents/T-13/Acme/02. Grid/b.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pull_sync_aborts_when_listing_fails() {
        let library = Arc::new(FakeLibrary { fail_listing: true, ..FakeLibrary::default() });
        let err = gateway(library)
            .with_storage(Arc::new(FakeStorage::default()))
            .pull_sync("T-11", Some("Acme"))
            .await
            .unwrap_err();

        assert!(matches!(err, DocSyncError::Sync(ref msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn pull_sync_requires_storage() {
        let err = gateway(Arc::new(FakeLibrary::default())).pull_sync("T-12", None).await.unwrap_err();
        assert!(matches!(err, DocSyncError::Config(_)));
    }
}
