use std::future::Future;
use std::pin::Pin;

use taskpilot_protocol::types::StoredFile;
use taskpilot_transfer::{FilePayload, ProgressFn};

use crate::client::{ClientError, FileClient};

/// Boxed future returned by [`FileTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The four remote operations the upload orchestrator and file registry
/// need. Implemented by [`FileClient`]; tests substitute in-memory doubles.
pub trait FileTransport: Send + Sync {
    /// Uploads one file, reporting progress through `on_progress`.
    fn upload<'a>(
        &'a self,
        payload: &'a FilePayload,
        on_progress: ProgressFn,
    ) -> TransportFuture<'a, Result<StoredFile, ClientError>>;

    /// Lists stored files.
    fn list(&self) -> TransportFuture<'_, Result<Vec<StoredFile>, ClientError>>;

    /// Deletes a stored file.
    fn remove<'a>(&'a self, id: &'a str) -> TransportFuture<'a, Result<(), ClientError>>;

    /// Fetches a stored file's content.
    fn fetch_bytes<'a>(&'a self, id: &'a str)
    -> TransportFuture<'a, Result<Vec<u8>, ClientError>>;
}

impl FileTransport for FileClient {
    fn upload<'a>(
        &'a self,
        payload: &'a FilePayload,
        on_progress: ProgressFn,
    ) -> TransportFuture<'a, Result<StoredFile, ClientError>> {
        Box::pin(FileClient::upload(self, payload, on_progress))
    }

    fn list(&self) -> TransportFuture<'_, Result<Vec<StoredFile>, ClientError>> {
        Box::pin(async move {
            if self.fail_open_list() {
                Ok(FileClient::list(self).await)
            } else {
                self.try_list().await
            }
        })
    }

    fn remove<'a>(&'a self, id: &'a str) -> TransportFuture<'a, Result<(), ClientError>> {
        Box::pin(FileClient::remove(self, id))
    }

    fn fetch_bytes<'a>(
        &'a self,
        id: &'a str,
    ) -> TransportFuture<'a, Result<Vec<u8>, ClientError>> {
        Box::pin(FileClient::fetch_bytes(self, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn failing_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;
                let body = r#"{"message":"db down"}"#;
                let resp = format!(
                    "HTTP/1.1 500 Error\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        (format!("http://127.0.0.1:{port}"), handle)
    }

    fn transport(url: String, fail_open_list: bool) -> Box<dyn FileTransport> {
        Box::new(
            FileClient::new(ClientConfig {
                base_url: url,
                fail_open_list,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn trait_list_fails_open_by_default() {
        let (url, handle) = failing_server().await;
        let files = transport(url, true).list().await.unwrap();
        assert!(files.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn trait_list_can_surface_errors() {
        let (url, handle) = failing_server().await;
        let err = transport(url, false).list().await.unwrap_err();
        assert_eq!(err.remote_message(), Some("db down"));
        handle.abort();
    }
}
