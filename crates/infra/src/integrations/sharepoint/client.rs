//! SharePoint REST client implementing the document library port

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tenderdocs_core::{AccessTokenProvider, DocumentLibrary};
use tenderdocs_domain::{
    DocSyncError, DocumentMetadata, DocumentMetadataMap, FolderCreation, RemoteFile, RemoteListing,
    Result, SkippedFolder, UploadedDocument, VersionEntry,
};
use tracing::{debug, info, warn};

use super::errors::{SharePointError, SharePointOperation};
use super::types::{
    error_detail, ContextInfo, FolderExists, FolderListing, SpFile, SpFileInfo, SpFileVersion,
    ValueList,
};
use crate::http::HttpClient;

const ACCEPT_NOMETADATA: &str = "application/json;odata=nometadata";
const CONTENT_VERBOSE: &str = "application/json;odata=verbose";

/// Document library client for one SharePoint site.
///
/// Folder arguments are library-relative and are prefixed with the site's
/// server-relative path; file arguments are already server-relative.
pub struct SharePointClient {
    http_client: HttpClient,
    token_provider: Arc<dyn AccessTokenProvider>,
    site_url: String,
    site_path: String,
}

impl SharePointClient {
    /// # Errors
    /// `DocSyncError::Config` when `site_url` is not an absolute URL.
    pub fn new(
        site_url: &str,
        http_client: HttpClient,
        token_provider: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self> {
        let parsed = url::Url::parse(site_url)
            .map_err(|e| DocSyncError::Config(format!("invalid site url {site_url:?}: {e}")))?;
        let site_path = parsed.path().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            token_provider,
            site_url: site_url.trim_end_matches('/').to_string(),
            site_path,
        })
    }

    /// Server-relative URL of a library-relative folder.
    pub fn server_relative(&self, folder: &str) -> String {
        format!("{}/{}", self.site_path, folder.trim_matches('/'))
    }

    fn api(&self, tail: &str) -> String {
        format!("{}/_api/{tail}", self.site_url)
    }

    fn folder_api(&self, server_relative: &str, tail: &str) -> String {
        self.api(&format!("web/GetFolderByServerRelativeUrl('{}'){tail}", quote(server_relative)))
    }

    fn file_api(&self, server_relative: &str, tail: &str) -> String {
        self.api(&format!("web/GetFileByServerRelativeUrl('{}'){tail}", quote(server_relative)))
    }

    async fn bearer(&self) -> Result<String> {
        self.token_provider.access_token().await
    }

    fn authorized(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        self.http_client.request(method, url).bearer_auth(token).header(ACCEPT, ACCEPT_NOMETADATA)
    }

    /// Fresh request digest for a mutating call. A digest failure is
    /// reported as a failure of `operation`.
    async fn form_digest(&self, token: &str, operation: SharePointOperation) -> Result<String> {
        let context = SharePointOperation::ContextInfo;
        let request = self.authorized(Method::POST, &self.api("contextinfo"), token);
        let digest = async {
            let response = self.send_ok(context, request).await?;
            let info: ContextInfo = parse_json(context, response).await?;
            Ok::<_, DocSyncError>(info.form_digest_value)
        };
        digest.await.map_err(|e| operation.recast(e))
    }

    async fn send(&self, operation: SharePointOperation, request: RequestBuilder) -> Result<Response> {
        self.http_client.send(request).await.map_err(|e| operation.recast(e))
    }

    /// Send and require a success status.
    async fn send_ok(&self, operation: SharePointOperation, request: RequestBuilder) -> Result<Response> {
        let response = self.send(operation, request).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(failure(operation, response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: SharePointOperation, url: &str) -> Result<T> {
        let token = self.bearer().await?;
        let response = self.send_ok(operation, self.authorized(Method::GET, url, &token)).await?;
        parse_json(operation, response).await
    }

    async fn list_folder(&self, server_relative: &str) -> Result<FolderListing> {
        let url = self.folder_api(server_relative, "?$expand=Files,Folders");
        self.get_json(SharePointOperation::ListFolder, &url).await
    }
}

#[async_trait]
impl DocumentLibrary for SharePointClient {
    async fn folder_exists(&self, folder: &str) -> Result<bool> {
        let operation = SharePointOperation::FolderExists;
        let token = self.bearer().await?;
        let url = self.folder_api(&self.server_relative(folder), "?$select=Exists");

        let response = self.send(operation, self.authorized(Method::GET, &url, &token)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let body: FolderExists = parse_json(operation, response).await?;
                Ok(body.exists)
            }
            _ => Err(failure(operation, response).await),
        }
    }

    async fn create_folder(&self, folder: &str) -> Result<FolderCreation> {
        let operation = SharePointOperation::CreateFolder;
        let token = self.bearer().await?;
        let digest = self.form_digest(&token, operation).await?;
        let server_relative = self.server_relative(folder);

        let body = serde_json::json!({
            "__metadata": { "type": "SP.Folder" },
            "ServerRelativeUrl": server_relative,
        });
        let request = self
            .authorized(Method::POST, &self.api("web/folders"), &token)
            .header("X-RequestDigest", digest)
            .header(CONTENT_TYPE, CONTENT_VERBOSE)
            .body(body.to_string());

        let response = self.send(operation, request).await?;
        match response.status() {
            StatusCode::CONFLICT => {
                debug!(path = %server_relative, "folder already exists");
                Ok(FolderCreation::AlreadyExists)
            }
            status if status.is_success() => Ok(FolderCreation::Created),
            _ => Err(failure(operation, response).await),
        }
    }

    async fn upload_file(
        &self,
        folder: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<UploadedDocument> {
        let operation = SharePointOperation::Upload;
        let token = self.bearer().await?;
        let digest = self.form_digest(&token, operation).await?;
        let server_relative = self.server_relative(folder);
        let size = content.len();

        let url = self.folder_api(
            &server_relative,
            &format!("/Files/add(url='{}',overwrite=true)", quote(file_name)),
        );
        let request = self
            .authorized(Method::POST, &url, &token)
            .header("X-RequestDigest", digest)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content);

        let response = self.send_ok(operation, request).await?;
        let file: SpFile = parse_json(operation, response).await?;
        debug!(path = %file.server_relative_url, size_bytes = size, "file uploaded");
        Ok(file.into_uploaded())
    }

    async fn update_metadata(
        &self,
        server_relative_url: &str,
        metadata: &DocumentMetadataMap,
    ) -> Result<()> {
        let operation = SharePointOperation::UpdateMetadata;
        let token = self.bearer().await?;
        let digest = self.form_digest(&token, operation).await?;

        let fields: serde_json::Map<String, serde_json::Value> =
            metadata.iter().map(|(name, value)| (name.clone(), value.to_json())).collect();
        let request = self
            .authorized(Method::POST, &self.file_api(server_relative_url, "/ListItemAllFields"), &token)
            .header("X-RequestDigest", digest)
            .header("X-HTTP-Method", "MERGE")
            .header("IF-MATCH", "*")
            .header(CONTENT_TYPE, ACCEPT_NOMETADATA)
            .body(serde_json::Value::Object(fields).to_string());

        self.send_ok(operation, request).await?;
        debug!(path = server_relative_url, fields = metadata.len(), "metadata updated");
        Ok(())
    }

    async fn download_file(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        let operation = SharePointOperation::Download;
        let token = self.bearer().await?;
        let url = self.file_api(server_relative_url, "/$value");

        let response = self.send_ok(operation, self.authorized(Method::GET, &url, &token)).await?;
        let bytes = response.bytes().await.map_err(|e| operation.error(e.to_string()))?;
        debug!(path = server_relative_url, size_bytes = bytes.len(), "file downloaded");
        Ok(bytes.to_vec())
    }

    async fn list_versions(&self, server_relative_url: &str) -> Result<Vec<VersionEntry>> {
        let url = self.file_api(server_relative_url, "/Versions?$expand=CreatedBy");
        let versions: ValueList<SpFileVersion> =
            self.get_json(SharePointOperation::ListVersions, &url).await?;
        Ok(versions.value.into_iter().map(VersionEntry::from).collect())
    }

    async fn delete_file(&self, server_relative_url: &str) -> Result<()> {
        let operation = SharePointOperation::Delete;
        let token = self.bearer().await?;
        let digest = self.form_digest(&token, operation).await?;

        let request = self
            .authorized(Method::DELETE, &self.file_api(server_relative_url, ""), &token)
            .header("X-RequestDigest", digest)
            .header("IF-MATCH", "*");

        self.send_ok(operation, request).await?;
        Ok(())
    }

    async fn file_metadata(&self, server_relative_url: &str) -> Result<DocumentMetadata> {
        let url = self.file_api(server_relative_url, "?$expand=Author,ModifiedBy,ListItemAllFields");
        let info: SpFileInfo = self.get_json(SharePointOperation::FileInfo, &url).await?;
        Ok(info.into())
    }

    async fn list_files(&self, folder: &str) -> Result<RemoteListing> {
        let root = self.server_relative(folder);
        let listing = self.list_folder(&root).await?;

        let mut result = RemoteListing::default();
        let mut pending = vec![(String::new(), listing)];

        while let Some((prefix, listing)) = pending.pop() {
            result.files.extend(listing.files.into_iter().map(|file| RemoteFile {
                relative_path: format!("{prefix}{}", file.name),
                name: file.name,
                server_relative_url: file.server_relative_url,
                unique_id: file.unique_id,
                size: file.length,
            }));

            for subfolder in listing.folders {
                let relative_path = format!("{prefix}{}", subfolder.name);
                match self.list_folder(&subfolder.server_relative_url).await {
                    Ok(child) => pending.push((format!("{relative_path}/"), child)),
                    Err(err) => {
                        warn!(path = %subfolder.server_relative_url, error = %err, "subfolder unreadable");
                        result.skipped.push(SkippedFolder { relative_path, error: err.to_string() });
                    }
                }
            }
        }

        result.files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        result.skipped.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        info!(
            path = %root,
            files = result.files.len(),
            skipped = result.skipped.len(),
            "folder listed"
        );
        Ok(result)
    }
}

/// Quote a path for use inside a `'...'` REST argument.
fn quote(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

async fn parse_json<T: DeserializeOwned>(operation: SharePointOperation, response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| operation.error(format!("unexpected response body: {e}")))
}

async fn failure(operation: SharePointOperation, response: Response) -> DocSyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let err = SharePointError::from_status_code(status).with_context(error_detail(&body));
    warn!(?operation, status = status.as_u16(), category = %err.category(), "SharePoint request failed");
    err.into_operation_error(operation)
}
