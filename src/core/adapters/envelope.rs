use crate::core::adapters::error::AdapterError;
use crate::core::adapters::shaper::ShapedRequest;
use crate::core::adapters::{Adapter, DeviceSignals, HeaderProfile};
use crate::core::openrtb::BidRequest;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, DNT, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use tracing::warn;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_OPENRTB_VERSION: HeaderName = HeaderName::from_static("x-openrtb-version");

/// A fully formed outbound partner call, the unit handed to the transport
#[derive(Debug, Clone)]
pub struct Envelope {
    pub method: Method,
    pub uri: String,
    pub body: Bytes,
    pub headers: HeaderMap,
    /// Ids of the canonical impressions carried in the body
    pub imp_ids: Vec<String>,
}

/// Inserts a forwarded value if non empty and a legal header value,
/// device signals are best effort and never fail the envelope
fn forward(headers: &mut HeaderMap, key: HeaderName, value: Option<&str>) {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return,
    };

    match HeaderValue::from_str(value) {
        Ok(header_value) => {
            headers.insert(key, header_value);
        }
        Err(_) => warn!("Skipping invalid {} header value", key),
    }
}

fn build_headers(profile: &HeaderProfile, req: &BidRequest) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(profile.content_type));

    if profile.accept_json {
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    }

    if let Some(version) = profile.openrtb_version {
        headers.insert(X_OPENRTB_VERSION, HeaderValue::from_static(version));
    }

    if let Some(device) = &req.device {
        match profile.device_signals {
            DeviceSignals::None => {}
            DeviceSignals::UserAgent => {
                forward(&mut headers, USER_AGENT, device.ua.as_deref());
            }
            DeviceSignals::Full => {
                forward(&mut headers, USER_AGENT, device.ua.as_deref());
                forward(
                    &mut headers,
                    X_FORWARDED_FOR,
                    device.ip.as_deref().or(device.ipv6.as_deref()),
                );
                forward(&mut headers, ACCEPT_LANGUAGE, device.language.as_deref());
                if let Some(dnt) = device.dnt {
                    headers.insert(DNT, HeaderValue::from(u16::from(dnt)));
                }
            }
        }
    }

    if let Some(cookie) = profile.buyer_cookie {
        let buyer_uid = req.user.as_ref().and_then(|u| u.buyeruid.as_deref());

        if let Some(uid) = buyer_uid.map(str::trim).filter(|uid| !uid.is_empty()) {
            forward(&mut headers, COOKIE, Some(format!("{}={}", cookie, uid).as_str()));
        }
    }

    headers
}

/// Serializes the shaped request and attaches the adapter's header set.
/// A serialization failure is request scoped and only loses this envelope
pub fn build(adapter: &Adapter, shaped: ShapedRequest) -> Result<Envelope, AdapterError> {
    let req = shaped.request;

    if tracing::event_enabled!(tracing::Level::TRACE) {
        tracing::trace!(
            "{} request: {}",
            adapter.name(),
            serde_json::to_string(&req).unwrap_or_default()
        );
    }

    let body = serde_json::to_vec(&req).map_err(|e| {
        AdapterError::internal(format!("failed to serialize request {}: {}", req.id, e))
    })?;

    let headers = build_headers(&adapter.profile().headers, &req);
    let imp_ids = req.imp.into_iter().map(|imp| imp.id).collect();

    Ok(Envelope {
        method: Method::POST,
        uri: adapter.endpoint().to_string(),
        body: Bytes::from(body),
        headers,
        imp_ids,
    })
}
