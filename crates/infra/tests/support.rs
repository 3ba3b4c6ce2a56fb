//! Stateful WireMock stand-in for the identity provider and a SharePoint site.
//!
//! Folders and files live in shared maps so that folder creation, uploads and
//! listings observe each other the way the real service does.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tenderdocs_core::DocumentSyncGateway;
use tenderdocs_domain::{DocSyncConfig, HttpConfig, SharePointConfig};
use tenderdocs_infra::{CertificateTokenProvider, HttpClient, ObjectStoreStorage, SharePointClient};
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const BUNDLE: &str = include_str!("fixtures/bundle.pem");
pub const TENANT: &str = "tenant-1";
pub const SITE_PATH: &str = "/sites/Tenders";
pub const LIBRARY: &str = "EPC_Tender_Docs";
pub const DIGEST: &str = "digest-0x1234";
pub const TOKEN: &str = "bearer-token-1";

#[derive(Default)]
pub struct SiteState {
    pub folders: Mutex<BTreeSet<String>>,
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub failing_downloads: Mutex<BTreeSet<String>>,
    pub failing_listings: Mutex<BTreeSet<String>>,
}

impl SiteState {
    fn library_root() -> String {
        format!("{SITE_PATH}/{LIBRARY}")
    }

    fn folder_exists(&self, folder: &str) -> bool {
        folder == Self::library_root() || self.folders.lock().unwrap().contains(folder)
    }

    pub fn seed_folder(&self, folder: &str) {
        self.folders.lock().unwrap().insert(folder.to_string());
    }

    pub fn seed_file(&self, server_relative_url: &str, content: &[u8]) {
        self.files.lock().unwrap().insert(server_relative_url.to_string(), content.to_vec());
    }
}

pub struct FakeSharePoint {
    pub server: MockServer,
    pub state: Arc<SiteState>,
}

impl FakeSharePoint {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(SiteState::default());

        Mock::given(method("POST"))
            .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": TOKEN
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{SITE_PATH}/_api/contextinfo")))
            .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "FormDigestValue": DIGEST,
                "FormDigestTimeoutSeconds": 1800
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex("GetFolderByServerRelativeUrl"))
            .and(query_param("$select", "Exists"))
            .respond_with(FolderExistsResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex("GetFolderByServerRelativeUrl"))
            .and(query_param("$expand", "Files,Folders"))
            .respond_with(ListingResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("{SITE_PATH}/_api/web/folders")))
            .and(header("X-RequestDigest", DIGEST))
            .respond_with(CreateFolderResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex(r"/Files/add\(url="))
            .and(header("X-RequestDigest", DIGEST))
            .respond_with(UploadResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_regex("/ListItemAllFields$"))
            .and(header("X-HTTP-Method", "MERGE"))
            .and(header("X-RequestDigest", DIGEST))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"/\$value$"))
            .respond_with(DownloadResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex("/Versions$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    { "VersionLabel": "1.0", "Created": "2024-05-01T10:00:00Z", "Size": 10, "CreatedBy": { "Title": "Ada" } },
                    { "VersionLabel": "2.0", "Created": "2024-05-02T10:00:00Z", "Size": "12", "CreatedBy": { "Title": "Bo" } }
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"GetFileByServerRelativeUrl\('[^']*'\)$"))
            .and(query_param("$expand", "Author,ModifiedBy,ListItemAllFields"))
            .respond_with(FileInfoResponder(state.clone()))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path_regex("GetFileByServerRelativeUrl"))
            .and(header("IF-MATCH", "*"))
            .and(header("X-RequestDigest", DIGEST))
            .respond_with(DeleteResponder(state.clone()))
            .mount(&server)
            .await;

        Self { server, state }
    }

    pub fn site_url(&self) -> String {
        format!("{}{SITE_PATH}", self.server.uri())
    }

    pub fn config(&self) -> DocSyncConfig {
        DocSyncConfig {
            sharepoint: SharePointConfig {
                tenant_id: TENANT.into(),
                client_id: "client-1".into(),
                certificate: Some(BUNDLE.into()),
                site_url: self.site_url(),
                authority_host: self.server.uri(),
                ..SharePointConfig::default()
            },
            http: HttpConfig { timeout_secs: 5, max_attempts: 1 },
            ..DocSyncConfig::default()
        }
    }

    /// Gateway wired to the fake site and an in-memory object store.
    pub fn gateway_with_storage(&self) -> (DocumentSyncGateway, Arc<ObjectStoreStorage>) {
        let config = self.config();
        let http = HttpClient::from_config(&config.http).unwrap();
        let tokens = Arc::new(CertificateTokenProvider::from_config(config.sharepoint.clone(), &config.http).unwrap());
        let client = SharePointClient::new(&config.sharepoint.site_url, http, tokens).unwrap();
        let storage = Arc::new(ObjectStoreStorage::in_memory());
        let gateway = DocumentSyncGateway::new(Arc::new(client), LIBRARY).with_storage(storage.clone());
        (gateway, storage)
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    pub async fn count(&self, http_method: &str, path_fragment: &str) -> usize {
        self.requests()
            .await
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path().contains(path_fragment))
            .count()
    }
}

/// Decoded `'...'` argument following `marker` in a request path.
pub fn quoted_arg(request_path: &str, marker: &str) -> Option<String> {
    let start = request_path.find(marker)? + marker.len();
    let rest = request_path[start..].strip_prefix('\'')?;
    let end = rest.find('\'')?;
    let decoded = urlencoding::decode(&rest[..end]).ok()?;
    Some(decoded.replace("''", "'"))
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(serde_json::json!({
        "odata.error": { "code": "-2147024894", "message": { "lang": "en-US", "value": "File Not Found." } }
    }))
}

struct FolderExistsResponder(Arc<SiteState>);

impl Respond for FolderExistsResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match quoted_arg(request.url.path(), "GetFolderByServerRelativeUrl(") {
            Some(folder) if self.0.folder_exists(&folder) => {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Exists": true }))
            }
            _ => not_found(),
        }
    }
}

struct CreateFolderResponder(Arc<SiteState>);

impl Respond for CreateFolderResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let Some(folder) = body["ServerRelativeUrl"].as_str() else {
            return ResponseTemplate::new(400);
        };
        if !self.0.folder_exists(parent(folder)) {
            return not_found();
        }
        if !self.0.folders.lock().unwrap().insert(folder.to_string()) {
            return ResponseTemplate::new(409);
        }
        ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "Name": folder.rsplit('/').next(),
            "ServerRelativeUrl": folder
        }))
    }
}

struct UploadResponder(Arc<SiteState>);

impl Respond for UploadResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let request_path = request.url.path();
        let (Some(folder), Some(name)) = (
            quoted_arg(request_path, "GetFolderByServerRelativeUrl("),
            quoted_arg(request_path, "add(url="),
        ) else {
            return ResponseTemplate::new(400);
        };
        if !self.0.folder_exists(&folder) {
            return not_found();
        }
        let url = format!("{folder}/{name}");
        self.0.seed_file(&url, &request.body);
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Name": name,
            "ServerRelativeUrl": url,
            "UniqueId": format!("uid-{name}"),
            "Length": request.body.len().to_string(),
            "UIVersionLabel": "1.0"
        }))
    }
}

struct DownloadResponder(Arc<SiteState>);

impl Respond for DownloadResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(file) = quoted_arg(request.url.path(), "GetFileByServerRelativeUrl(") else {
            return ResponseTemplate::new(400);
        };
        if self.0.failing_downloads.lock().unwrap().contains(&file) {
            return ResponseTemplate::new(500);
        }
        match self.0.files.lock().unwrap().get(&file) {
            Some(content) => ResponseTemplate::new(200).set_body_bytes(content.clone()),
            None => not_found(),
        }
    }
}

struct FileInfoResponder(Arc<SiteState>);

impl Respond for FileInfoResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(file) = quoted_arg(request.url.path(), "GetFileByServerRelativeUrl(") else {
            return ResponseTemplate::new(400);
        };
        let Some(size) = self.0.files.lock().unwrap().get(&file).map(Vec::len) else {
            return not_found();
        };
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Name": file.rsplit('/').next(),
            "ServerRelativeUrl": file,
            "UniqueId": "uid-info",
            "Title": "",
            "TimeCreated": "2024-05-01T10:00:00Z",
            "TimeLastModified": "2024-05-03T09:30:00Z",
            "Length": size.to_string(),
            "UIVersionLabel": "3.0",
            "CheckOutType": 0,
            "Author": { "Title": "Ada" },
            "ModifiedBy": { "Title": "Bo" },
            "ListItemAllFields": { "OData__ModerationStatus": 2 }
        }))
    }
}

struct DeleteResponder(Arc<SiteState>);

impl Respond for DeleteResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let removed = quoted_arg(request.url.path(), "GetFileByServerRelativeUrl(")
            .and_then(|file| self.0.files.lock().unwrap().remove(&file));
        match removed {
            Some(_) => ResponseTemplate::new(200),
            None => not_found(),
        }
    }
}

struct ListingResponder(Arc<SiteState>);

impl Respond for ListingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Some(folder) = quoted_arg(request.url.path(), "GetFolderByServerRelativeUrl(") else {
            return ResponseTemplate::new(400);
        };
        if !self.0.folder_exists(&folder) {
            return not_found();
        }
        if self.0.failing_listings.lock().unwrap().contains(&folder) {
            return ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "odata.error": { "code": "-2147024891", "message": { "lang": "en-US", "value": "Access denied." } }
            }));
        }

        let files: Vec<serde_json::Value> = self
            .0
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| parent(url) == folder)
            .map(|(url, content)| {
                let name = url.rsplit('/').next().unwrap_or_default();
                serde_json::json!({
                    "Name": name,
                    "ServerRelativeUrl": url,
                    "UniqueId": format!("uid-{name}"),
                    "Length": content.len().to_string()
                })
            })
            .collect();
        let folders: Vec<serde_json::Value> = self
            .0
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| parent(f) == folder)
            .map(|f| serde_json::json!({ "Name": f.rsplit('/').next(), "ServerRelativeUrl": f }))
            .collect();

        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Files": files, "Folders": folders }))
    }
}
