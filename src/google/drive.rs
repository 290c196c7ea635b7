//! Google Drive v3 file copying and sharing.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::backend::FileStore;
use crate::backend::error::BackendError;
use crate::google::GoogleClient;
use crate::google::get_str;

pub struct DriveClient {
    base: Arc<GoogleClient>,
    pub api_url: String,
}

impl DriveClient {
    pub fn new(base: Arc<GoogleClient>, api_url: &str) -> Self {
        Self {
            base,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn file_url_for(&self, file_id: &str) -> String {
        format!(
            "{}/drive/v3/files/{}",
            self.api_url,
            urlencoding::encode(file_id)
        )
    }
}

#[async_trait]
impl FileStore for DriveClient {
    async fn copy_template(&self, template_id: &str, name: &str) -> Result<String, BackendError> {
        let request = self
            .base
            .http()
            .post(format!("{}/copy", self.file_url_for(template_id)))
            .query(&[("fields", "id")]);
        let resp = self
            .base
            .send_json(request, Some(&json!({ "name": name })))
            .await?;

        let id = get_str(&resp, "id")?.to_string();
        debug!("Copied template {template_id} to {id} ({name})");
        Ok(id)
    }

    async fn set_permissions(&self, file_id: &str, editors: &[String]) -> Result<(), BackendError> {
        let request = self.base.http().patch(self.file_url_for(file_id));
        self.base
            .send_json(request, Some(&json!({ "writersCanShare": false })))
            .await?;

        for editor in editors {
            let request = self
                .base
                .http()
                .post(format!("{}/permissions", self.file_url_for(file_id)));
            let body = json!({
                "role": "writer",
                "type": "user",
                "emailAddress": editor,
            });
            self.base.send_json(request, Some(&body)).await?;
            debug!("Granted {editor} edit access to {file_id}");
        }
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String, BackendError> {
        let request = self
            .base
            .http()
            .get(self.file_url_for(file_id))
            .query(&[("fields", "webViewLink")]);
        let resp = self.base.send_json(request, None).await?;
        Ok(get_str(&resp, "webViewLink")?.to_string())
    }
}
