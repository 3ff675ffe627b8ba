use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePageParams {
    /// Path relative to the project namespace; the server anchors it under
    /// `/<project-slug>/`.
    pub path: String,
    pub html_content: String,
    pub project_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl UpdatePageParams {
    /// True when the body carries no recognized field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.html_content.is_none() && self.project_id.is_none()
    }
}
