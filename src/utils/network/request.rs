use std::io::Error;
use std::sync::atomic::Ordering;
use std::time::Instant;

use log::error;
use reqwest::header::CONTENT_ENCODING;
use serde::de::DeserializeOwned;
use url::Url;

use crate::resolver_error::{create_resolver_error_result, str_to_io_error, ResolverError, ResolverErrorKind};
use crate::utils::compression::compression_utils::{decode_text, detect_encoding};
use crate::utils::constants::CONSTANTS;
use crate::utils::debug_if_enabled;

pub fn set_sanitize_sensitive_info(value: bool) {
    CONSTANTS.sanitize.store(value, Ordering::Relaxed);
}

pub fn sanitize_sensitive_info(query: &str) -> String {
    if CONSTANTS.sanitize.load(Ordering::Relaxed) {
        let masked_query = CONSTANTS.re_username.replace_all(query, "$1***");
        let masked_query = CONSTANTS.re_password.replace_all(&masked_query, "$1***");
        let masked_query = CONSTANTS.re_token.replace_all(&masked_query, "$1***");
        let masked_query = CONSTANTS.re_stream_url.replace_all(&masked_query, "$1***/$2/***");
        let masked_query = CONSTANTS.re_url.replace_all(&masked_query, "$1***/$2");
        masked_query.to_string()
    } else {
        query.to_string()
    }
}

async fn get_remote_content(client: &reqwest::Client, url: &Url) -> Result<String, Error> {
    let start_time = Instant::now();
    match client.get(url.clone()).send().await {
        Ok(response) => {
            if response.status().is_success() {
                let declared = response.headers().get(CONTENT_ENCODING)
                    .and_then(|value| value.to_str().ok())
                    .map(ToString::to_string);
                match response.bytes().await {
                    Ok(bytes) => {
                        let encoding = detect_encoding(&bytes, declared.as_deref());
                        let content = decode_text(&bytes, encoding.as_deref())?;
                        debug_if_enabled!("Request took:{}ms {}", start_time.elapsed().as_millis(), sanitize_sensitive_info(url.as_str()));
                        Ok(content)
                    }
                    Err(err) => Err(str_to_io_error(&format!("failed to read response {} {err}", sanitize_sensitive_info(url.as_str()))))
                }
            } else {
                Err(str_to_io_error(&format!("Request failed with status {} {}", response.status(), sanitize_sensitive_info(url.as_str()))))
            }
        }
        Err(err) => Err(str_to_io_error(&format!("Request failed {} {err}", sanitize_sensitive_info(url.as_str()))))
    }
}

pub async fn download_text_content(client: &reqwest::Client, url_str: &str) -> Result<String, Error> {
    match url_str.parse::<Url>() {
        Ok(url) => get_remote_content(client, &url).await,
        Err(_) => Err(str_to_io_error(&format!("Malformed URL {}", sanitize_sensitive_info(url_str)))),
    }
}

/// Fetches a text body, failures are logged with the masked url and mapped to `kind`.
pub async fn get_text_content(client: &reqwest::Client, url: &str, kind: ResolverErrorKind) -> Result<String, ResolverError> {
    debug_if_enabled!("downloading text content from {}", sanitize_sensitive_info(url));
    match download_text_content(client, url).await {
        Ok(content) => Ok(content),
        Err(err) => {
            let msg = sanitize_sensitive_info(err.to_string().as_str());
            error!("cant download url: {}  => {msg}", sanitize_sensitive_info(url));
            create_resolver_error_result!(kind, "{msg}")
        }
    }
}

pub async fn get_json_content<T>(client: &reqwest::Client, url: &str, kind: ResolverErrorKind) -> Result<T, ResolverError>
where
    T: DeserializeOwned,
{
    let content = get_text_content(client, url, kind).await?;
    match serde_json::from_str::<T>(&content) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("cant parse json from url: {}  => {err}", sanitize_sensitive_info(url));
            create_resolver_error_result!(kind, "Failed to parse json {err}")
        }
    }
}
