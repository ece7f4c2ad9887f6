//! Saving a resolved stream to disk.

use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, info};

use crate::extractor::{ExtractorError, utils::file_name_of};
use crate::media::StreamDescriptor;

const FALLBACK_FILE_NAME: &str = "stream.mp4";

/// Last path segment of the stream URL, without query.
pub fn default_file_name(descriptor: &StreamDescriptor) -> String {
    file_name_of(&descriptor.url)
        .map(|name| match urlencoding::decode(&name) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => name.clone(),
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Target path for a download: `output` as given, or the default file name
/// inside `output` when it is a directory.
pub fn target_path(descriptor: &StreamDescriptor, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_file_name(descriptor)),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_file_name(descriptor)),
    }
}

/// Streams the body of `descriptor` into `path`, replaying its headers.
///
/// `progress` receives the bytes written so far and the total size when the
/// server announced one. Returns the number of bytes written.
pub async fn download<P>(
    client: &Client,
    descriptor: &StreamDescriptor,
    path: &Path,
    mut progress: P,
) -> Result<u64, ExtractorError>
where
    P: FnMut(u64, Option<u64>),
{
    let request = descriptor
        .headers
        .iter()
        .fold(client.get(&descriptor.url), |req, (k, v)| req.header(k.as_str(), v.as_str()));
    let response = request.send().await?.error_for_status()?;
    let total = response.content_length();
    debug!(url = %descriptor.url, total = ?total, path = %path.display(), "Download started");

    let mut file = File::create(path).await?;
    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress(written, total);
    }
    file.flush().await?;

    info!(url = %descriptor.url, bytes = written, path = %path.display(), "Download finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_url() {
        let descriptor = StreamDescriptor::builder("https://cdn.example/v/Ep%2001.mp4?token=x", "Direct MP4").build();
        assert_eq!(default_file_name(&descriptor), "Ep 01.mp4");

        let descriptor = StreamDescriptor::builder("https://cdn.example/", "Direct MP4").build();
        assert_eq!(default_file_name(&descriptor), FALLBACK_FILE_NAME);
    }

    #[test]
    fn target_inside_directory() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = StreamDescriptor::builder("https://cdn.example/a.mp4", "Direct MP4").build();
        assert_eq!(target_path(&descriptor, Some(dir.path())), dir.path().join("a.mp4"));
        assert_eq!(
            target_path(&descriptor, Some(Path::new("out.mp4"))),
            PathBuf::from("out.mp4")
        );
        assert_eq!(target_path(&descriptor, None), PathBuf::from("a.mp4"));
    }
}
