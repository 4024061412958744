//! HTTP client for the Geoportal Server metadata REST API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::DeliveryErrorKind;
use crate::model::{Content, DataReference};
use crate::traits::PublishingStatus;

use super::adaptor::Credentials;

/// Longest response body kept in a rejection.
const MAX_ERROR_BODY: usize = 512;

/// Body of an item publish request.
#[derive(Debug, Serialize)]
pub struct PublishRequest<'a> {
    pub src_source_type_s: &'a str,
    pub src_source_uri_s: &'a str,
    pub src_source_name_s: &'a str,
    pub src_uri_s: &'a str,
    pub src_lastupdate_dt: String,
    pub src_task_ref_s: &'a str,
    pub src_run_ref_s: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'a str>,

    /// Content when it is valid UTF-8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<&'a str>,

    /// Content otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_base64: Option<String>,
}

impl<'a> PublishRequest<'a> {
    pub fn new(reference: &'a DataReference, content: &'a Content) -> Self {
        let (xml, content_base64) = match std::str::from_utf8(&content.bytes) {
            Ok(text) => (Some(text), None),
            Err(_) => (None, Some(STANDARD.encode(&content.bytes))),
        };
        Self {
            src_source_type_s: reference.broker_uri.connector_type(),
            src_source_uri_s: reference.broker_uri.as_str(),
            src_source_name_s: &reference.label,
            src_uri_s: reference.origin.as_str(),
            src_lastupdate_dt: reference.last_modified.to_rfc3339(),
            src_task_ref_s: &reference.task_id,
            src_run_ref_s: reference.run_id.to_string(),
            content_type: content.media_type.as_ref().map(|m| m.as_str()),
            xml,
            content_base64,
        }
    }
}

/// Client bound to one catalog.
///
/// Holds a connection pool; built once per broker.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base: Url,
    credentials: Option<Credentials>,
    index: Option<String>,
}

impl CatalogClient {
    pub fn new(
        base: Url,
        credentials: Option<Credentials>,
        index: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("harvest-connectors/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base,
            credentials,
            index,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of the catalog item `id`.
    pub fn item_url(&self, id: &str) -> Result<Url, DeliveryErrorKind> {
        let mut url = self
            .base
            .join("rest/metadata/item/")
            .map_err(|e| DeliveryErrorKind::Unsupported(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DeliveryErrorKind::Unsupported(format!("'{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Stores one item. A single request; no retries.
    pub async fn publish(
        &self,
        id: &str,
        request: &PublishRequest<'_>,
    ) -> Result<PublishingStatus, DeliveryErrorKind> {
        let mut builder = self.http.put(self.item_url(id)?).json(request);
        if let Some(index) = &self.index {
            builder = builder.query(&[("index", index)]);
        }
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(PublishingStatus::Created);
        }
        if status.is_success() {
            return Ok(PublishingStatus::Updated);
        }

        Err(DeliveryErrorKind::Rejected {
            status: status.as_u16(),
            body: rejection_body(response.text().await),
        })
    }
}

/// Response body kept in a rejection, cut to [`MAX_ERROR_BODY`] bytes.
///
/// A body that cannot be read is replaced by the read failure.
fn rejection_body<E: fmt::Display>(body: Result<String, E>) -> String {
    let mut body = match body {
        Ok(body) => body,
        Err(err) => format!("<response body unavailable: {}>", err),
    };
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
