use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::{StreamExt, TryStreamExt};
use tracing::{info, warn};

use joinme_types::models::Attachment;

use crate::storage::BlobStore;
use crate::{BlobError, RelayError};

/// Copies attachments from the platform's expiring urls into durable storage.
/// Failed transfers are not retried.
#[derive(Clone)]
pub struct AttachmentRelay {
    client: reqwest::Client,
    blobs: Arc<dyn BlobStore>,
}

impl AttachmentRelay {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self::with_client(reqwest::Client::new(), blobs)
    }

    pub fn with_client(client: reqwest::Client, blobs: Arc<dyn BlobStore>) -> Self {
        Self { client, blobs }
    }

    /// Streams `source_url` into the blob store under `key` and returns the
    /// durable url. An existing blob with the same key is replaced.
    pub async fn relay(&self, source_url: &str, key: &str) -> Result<String, RelayError> {
        let source_err = |reason: String| RelayError::SourceUnavailable {
            url: source_url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| source_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(source_err(format!("HTTP {status}")));
        }
        if response.content_length() == Some(0) {
            return Err(source_err("response has no body".to_string()));
        }

        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        match self.blobs.put(key, body).await {
            Ok(url) => Ok(url),
            Err(BlobError::Body(e)) => Err(source_err(e.to_string())),
            Err(e) => Err(RelayError::DestinationUnavailable {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Relays every attachment concurrently and waits for all of them. Each
    /// attachment gets its own key, so equal names never share a blob.
    ///
    /// Any failure fails the whole batch. Blobs that were already stored for
    /// the other attachments stay in the blob store unreferenced.
    pub async fn relay_all(
        &self,
        group: &str,
        attachments: &[Attachment],
    ) -> Result<Vec<Attachment>, RelayError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }

        info!("Relaying {} attachment(s) for {}", attachments.len(), group);

        let results = join_all(attachments.iter().enumerate().map(|(index, attachment)| async move {
            let key = blob_key(group, index, &attachment.name);
            let url = self.relay(&attachment.url, &key).await?;
            Ok::<_, RelayError>(Attachment {
                name: attachment.name.clone(),
                url,
            })
        }))
        .await;

        let relayed = results.iter().filter(|r| r.is_ok()).count();
        if relayed < results.len() {
            warn!(
                "{} of {} attachment(s) for {} failed; {} stored blob(s) left unreferenced",
                results.len() - relayed,
                results.len(),
                group,
                relayed
            );
        }

        results.into_iter().collect()
    }
}

/// Blob key for the attachment at `index` of message group `group`. The name
/// is reduced to characters safe in both file names and urls, so the index is
/// what keeps keys unique.
pub fn blob_key(group: &str, index: usize, name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_start_matches('.');
    let safe = if safe.is_empty() { "attachment" } else { safe };
    format!("{group}-{index}-{safe}")
}
