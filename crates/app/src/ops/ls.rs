use clap::Args;

use common::prelude::{human_size, EntryKind, ListItem};
use fshare::http_server::api::client::ApiError;
use fshare::http_server::api::v0::files::{FilesRequest, FilesResponse};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Path to list, e.g. `photos/2024` (default: every share)
    #[arg(default_value = "")]
    pub path: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: FilesResponse = ctx
            .client
            .call(FilesRequest {
                path: self.path.clone(),
            })
            .await?;

        if response.files.is_empty() {
            return Ok("nothing shared here".to_string());
        }

        Ok(response
            .files
            .iter()
            .map(format_item)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn format_item(item: &ListItem) -> String {
    match item.kind {
        EntryKind::Directory => format!("{:<10} {:>10}  {}/", "directory", "-", item.name),
        EntryKind::File => format!(
            "{:<10} {:>10}  {}",
            "file",
            item.size.map(human_size).unwrap_or_else(|| "-".to_string()),
            item.name
        ),
        EntryKind::Text => format!(
            "{:<10} {:>10}  {}  {:?}",
            "text",
            "-",
            item.name,
            item.summary.as_deref().unwrap_or_default()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_item() {
        let item = ListItem {
            kind: EntryKind::File,
            name: "a.txt".into(),
            path: None,
            owner: None,
            summary: None,
            size: Some(2048),
        };
        assert!(format_item(&item).ends_with("2.0 KB  a.txt"));

        let dir = ListItem {
            kind: EntryKind::Directory,
            size: None,
            name: "photos".into(),
            ..item
        };
        assert!(format_item(&dir).ends_with("photos/"));
    }
}
