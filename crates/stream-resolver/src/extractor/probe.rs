use reqwest::{Client, StatusCode, header};
use tracing::debug;

use crate::media::StreamDescriptor;

fn request(client: &Client, method: reqwest::Method, descriptor: &StreamDescriptor) -> reqwest::RequestBuilder {
    descriptor
        .headers
        .iter()
        .fold(client.request(method, &descriptor.url), |req, (k, v)| {
            req.header(k.as_str(), v.as_str())
        })
}

/// Checks that a stream answers with a success status.
///
/// Sends a `HEAD` with the replay headers and falls back to a one byte ranged
/// `GET` for servers that reject `HEAD`. Says nothing about playability.
pub async fn probe(client: &Client, descriptor: &StreamDescriptor) -> bool {
    match request(client, reqwest::Method::HEAD, descriptor).send().await {
        Ok(resp) if resp.status().is_success() => return true,
        Ok(resp) => debug!(url = %descriptor.url, status = %resp.status(), "HEAD rejected"),
        Err(e) => debug!(url = %descriptor.url, error = %e, "HEAD failed"),
    }

    match request(client, reqwest::Method::GET, descriptor)
        .header(header::RANGE, "bytes=0-0")
        .send()
        .await
    {
        Ok(resp) => {
            let status = resp.status();
            debug!(url = %descriptor.url, status = %status, "Ranged GET");
            status.is_success() || status == StatusCode::PARTIAL_CONTENT
        }
        Err(e) => {
            debug!(url = %descriptor.url, error = %e, "Stream unreachable");
            false
        }
    }
}

/// Keeps only the descriptors whose probe succeeds, preserving order.
pub async fn retain_reachable(client: &Client, descriptors: Vec<StreamDescriptor>) -> Vec<StreamDescriptor> {
    let mut reachable = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if probe(client, &descriptor).await {
            reachable.push(descriptor);
        }
    }
    reachable
}
