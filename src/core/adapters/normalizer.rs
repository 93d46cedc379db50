use crate::core::adapters::envelope::Envelope;
use crate::core::adapters::error::AdapterError;
use crate::core::adapters::mediatype;
use crate::core::adapters::{Adapter, BidResultShape, MediaTypeSignal};
use crate::core::openrtb::{Bid, BidRequest, BidResponse, Imp};
use crate::core::spec::MediaType;
use bytes::Bytes;
use tracing::{debug, warn};

const DEFAULT_CURRENCY: &str = "USD";

/// What the transport collaborator got back for one envelope
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: u16,
    pub body: Bytes,
}

impl ResponseData {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A partner bid with the media type it was resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBid {
    pub bid: Bid,
    pub media_type: MediaType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidderResponse {
    pub currency: String,
    pub bids: Vec<TypedBid>,
}

/// Normalized bids in the shape the adapter's profile asks for
#[derive(Debug, Clone, PartialEq)]
pub enum BidResult {
    Legacy(Vec<TypedBid>),
    Typed(BidderResponse),
}

impl BidResult {
    pub fn bids(&self) -> &[TypedBid] {
        match self {
            BidResult::Legacy(bids) => bids,
            BidResult::Typed(response) => &response.bids,
        }
    }

    pub fn into_bids(self) -> Vec<TypedBid> {
        match self {
            BidResult::Legacy(bids) => bids,
            BidResult::Typed(response) => response.bids,
        }
    }

    /// Response currency, legacy results carry none
    pub fn currency(&self) -> Option<&str> {
        match self {
            BidResult::Legacy(_) => None,
            BidResult::Typed(response) => Some(&response.currency),
        }
    }
}

/// Bids and failures from one partner response. Either, both
/// or neither may be present
#[derive(Debug, Default)]
pub struct BidsOutcome {
    pub response: Option<BidResult>,
    pub errors: Vec<AdapterError>,
}

impl BidsOutcome {
    fn failed(error: AdapterError) -> Self {
        Self {
            response: None,
            errors: vec![error],
        }
    }

    /// Typed bids, empty when the partner did not bid
    pub fn bids(&self) -> &[TypedBid] {
        self.response
            .as_ref()
            .map(BidResult::bids)
            .unwrap_or_default()
    }
}

/// Query unescapes markup, `+` decodes to a space
fn unescape_adm(adm: &str) -> Option<String> {
    urlencoding::decode(&adm.replace('+', " "))
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn into_legacy(adapter: &Adapter, mut bids: Vec<TypedBid>) -> BidResult {
    for typed in bids.iter_mut() {
        if let Some(adm) = typed.bid.adm.as_deref() {
            match unescape_adm(adm) {
                Some(decoded) => typed.bid.adm = Some(decoded),
                None => debug!(
                    "{}: keeping undecodable adm on bid {}",
                    adapter.name(),
                    typed.bid.id
                ),
            }
        }
    }

    bids.sort_by(|a, b| b.bid.price.total_cmp(&a.bid.price));
    BidResult::Legacy(bids)
}

fn status_failure(adapter: &Adapter, req: &BidRequest, response: &ResponseData) -> AdapterError {
    let status = response.status;

    if adapter.debug() || req.test == Some(1) {
        AdapterError::bad_status(
            status,
            format!(
                "Unexpected status code: {}. Body: {}",
                status,
                String::from_utf8_lossy(&response.body)
            ),
        )
    } else {
        AdapterError::bad_status(
            status,
            format!(
                "Unexpected status code: {}. Run with request.test = 1 for more info",
                status
            ),
        )
    }
}

/// Normalizes the response to `envelope` into typed bids.
///
/// # Behavior
/// - 204 is a no bid, never a failure, whatever the body
/// - any status other than 200 is a `BadServerResponse` carrying it
/// - a bid for an imp the envelope did not carry fails the whole response
/// - an unknown creative type drops that bid only
pub fn normalize(
    adapter: &Adapter,
    req: &BidRequest,
    envelope: &Envelope,
    response: &ResponseData,
) -> BidsOutcome {
    match response.status {
        204 => {
            debug!("{}: no bid", adapter.name());
            return BidsOutcome::default();
        }
        200 => {}
        _ => return BidsOutcome::failed(status_failure(adapter, req, response)),
    }

    let bid_response: BidResponse = match serde_json::from_slice(&response.body) {
        Ok(res) => res,
        Err(e) => {
            return BidsOutcome::failed(AdapterError::bad_status(
                response.status,
                format!("Bad server response: {}", e),
            ));
        }
    };

    let profile = adapter.profile();

    if profile.require_seatbid && bid_response.seatbid.is_empty() {
        return BidsOutcome::failed(AdapterError::bad_response("Invalid SeatBids count: 0"));
    }

    let imps: Vec<&Imp> = req
        .imp
        .iter()
        .filter(|imp| envelope.imp_ids.contains(&imp.id))
        .collect();

    let mut errors = Vec::new();
    let mut bids = Vec::with_capacity(imps.len());

    for seat in bid_response.seatbid {
        for mut bid in seat.bid {
            let imp = match mediatype::find_imp(&bid.impid, &imps) {
                Ok(imp) => imp,
                Err(e) => {
                    warn!("{}: {}", adapter.name(), e);
                    return BidsOutcome::failed(e);
                }
            };

            let explicit = match profile.media_signal {
                MediaTypeSignal::Declared => None,
                MediaTypeSignal::CreativeTypeExt => {
                    let signal = mediatype::creative_type(&bid);
                    bid.ext = None;

                    match signal {
                        Ok(media_type) => media_type,
                        Err(e) => {
                            debug!("{}: dropping bid {}: {}", adapter.name(), bid.id, e);
                            errors.push(e);
                            continue;
                        }
                    }
                }
            };

            bids.push(TypedBid {
                media_type: mediatype::resolve(imp, explicit),
                bid,
            });
        }
    }

    let result = match profile.result_shape {
        BidResultShape::Legacy => into_legacy(adapter, bids),
        BidResultShape::Typed => BidResult::Typed(BidderResponse {
            currency: bid_response
                .cur
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            bids,
        }),
    };

    BidsOutcome {
        response: Some(result),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::AdapterKind;
    use crate::core::openrtb::{
        AppBuilder, BannerBuilder, BidRequestBuilder, ImpBuilder, NativeBuilder, SiteBuilder,
        VideoBuilder,
    };
    use serde_json::json;

    fn request() -> BidRequest {
        BidRequestBuilder::default()
            .id("req")
            .site(SiteBuilder::default().build().unwrap())
            .app(AppBuilder::default().build().unwrap())
            .imp(vec![
                ImpBuilder::default()
                    .id("banner-imp")
                    .banner(BannerBuilder::default().build().unwrap())
                    .build()
                    .unwrap(),
                ImpBuilder::default()
                    .id("video-imp")
                    .video(VideoBuilder::default().build().unwrap())
                    .build()
                    .unwrap(),
                ImpBuilder::default()
                    .id("native-imp")
                    .native(NativeBuilder::default().build().unwrap())
                    .build()
                    .unwrap(),
            ])
            .build()
            .unwrap()
    }

    fn envelope(imp_ids: &[&str]) -> Envelope {
        Envelope {
            method: reqwest::Method::POST,
            uri: "http://partner.test".to_string(),
            body: Bytes::new(),
            headers: Default::default(),
            imp_ids: imp_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ok(body: serde_json::Value) -> ResponseData {
        ResponseData::new(200, body.to_string())
    }

    fn sovrn() -> Adapter {
        Adapter::new("sovrn", AdapterKind::Sovrn, "http://partner.test")
    }

    #[test]
    fn test_no_content_ignores_body() {
        let res = ResponseData::new(204, "not json at all");

        let outcome = normalize(&sovrn(), &request(), &envelope(&["banner-imp"]), &res);

        assert!(outcome.response.is_none());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_bad_gateway() {
        let res = ResponseData::new(502, "upstream down");

        let outcome = normalize(&sovrn(), &request(), &envelope(&["banner-imp"]), &res);

        assert!(outcome.bids().is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].is_bad_server_response());
        assert_eq!(outcome.errors[0].status(), Some(502));
        assert!(!outcome.errors[0].to_string().contains("upstream down"));
    }

    #[test]
    fn test_debug_includes_body() {
        let adapter = sovrn().with_debug(true);
        let res = ResponseData::new(400, "bad tag");

        let outcome = normalize(&adapter, &request(), &envelope(&["banner-imp"]), &res);

        assert!(outcome.errors[0].to_string().contains("bad tag"));
    }

    #[test]
    fn test_undecodable_body() {
        let res = ResponseData::new(200, "{");

        let outcome = normalize(&sovrn(), &request(), &envelope(&["banner-imp"]), &res);

        assert!(outcome.response.is_none());
        assert!(outcome.errors[0].is_bad_server_response());
    }

    #[test]
    fn test_typed_shape_keeps_currency_and_fields() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://partner.test");
        let res = ok(json!({
            "id": "req",
            "cur": "EUR",
            "seatbid": [{"bid": [
                {"id": "1", "impid": "banner-imp", "price": 1.0, "dealid": "d1", "nurl": "http://win", "w": 300, "h": 250, "cid": "c-9", "lurl": "http://loss", "adm": "%3Cdiv%3E"},
                {"id": "2", "impid": "video-imp", "price": 2.0}
            ]}]
        }));

        let outcome = normalize(
            &adapter,
            &request(),
            &envelope(&["banner-imp", "video-imp"]),
            &res,
        );

        assert!(outcome.errors.is_empty());
        let response = match outcome.response.unwrap() {
            BidResult::Typed(response) => response,
            other => panic!("expected typed result, got {:?}", other),
        };
        assert_eq!(response.currency, "EUR");
        assert_eq!(response.bids[0].media_type, MediaType::Banner);
        assert_eq!(response.bids[0].bid.dealid.as_deref(), Some("d1"));
        assert_eq!(response.bids[0].bid.nurl.as_deref(), Some("http://win"));
        assert_eq!(response.bids[0].bid.w, Some(300));
        assert_eq!(response.bids[0].bid.adm.as_deref(), Some("%3Cdiv%3E"));
        assert_eq!(response.bids[0].bid.extra["cid"], "c-9");
        assert_eq!(response.bids[0].bid.extra["lurl"], "http://loss");
        assert_eq!(response.bids[1].media_type, MediaType::Video);
    }

    #[test]
    fn test_typed_shape_defaults_currency() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://partner.test");
        let res = ok(json!({
            "id": "req",
            "seatbid": [{"bid": [{"id": "1", "impid": "banner-imp", "price": 1.0}]}]
        }));

        let outcome = normalize(&adapter, &request(), &envelope(&["banner-imp"]), &res);

        assert_eq!(outcome.response.unwrap().currency(), Some("USD"));
    }

    #[test]
    fn test_legacy_shape_unescapes_and_ranks() {
        let res = ok(json!({
            "id": "req",
            "cur": "EUR",
            "seatbid": [{"bid": [
                {"id": "low", "impid": "banner-imp", "price": 0.5, "adm": "%3Cdiv%3Elow+bid%3C%2Fdiv%3E"},
                {"id": "high", "impid": "video-imp", "price": 2.5, "adm": "<VAST/>"}
            ]}]
        }));

        let outcome = normalize(
            &sovrn(),
            &request(),
            &envelope(&["banner-imp", "video-imp"]),
            &res,
        );

        assert!(outcome.errors.is_empty());
        let result = outcome.response.unwrap();
        assert_eq!(result.currency(), None);

        let bids = match result {
            BidResult::Legacy(bids) => bids,
            other => panic!("expected legacy result, got {:?}", other),
        };
        assert_eq!(bids[0].bid.id, "high");
        assert_eq!(bids[0].media_type, MediaType::Video);
        assert_eq!(bids[0].bid.adm.as_deref(), Some("<VAST/>"));
        assert_eq!(bids[1].bid.id, "low");
        assert_eq!(bids[1].media_type, MediaType::Banner);
        assert_eq!(bids[1].bid.adm.as_deref(), Some("<div>low bid</div>"));
    }

    #[test]
    fn test_imp_outside_envelope_fails_whole_call() {
        let res = ok(json!({
            "id": "req",
            "seatbid": [{"bid": [
                {"id": "1", "impid": "banner-imp", "price": 1.0},
                {"id": "2", "impid": "video-imp", "price": 2.0}
            ]}]
        }));

        let outcome = normalize(&sovrn(), &request(), &envelope(&["banner-imp"]), &res);

        assert!(outcome.response.is_none());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors[0].to_string(),
            "Unknown ad unit code 'video-imp'"
        );
    }

    #[test]
    fn test_creative_type_signal() {
        let adapter = Adapter::new("xsp", AdapterKind::SovrnXsp, "http://partner.test");
        let res = ok(json!({
            "id": "req",
            "seatbid": [{"bid": [
                {"id": "1", "impid": "banner-imp", "price": 1.0, "ext": {"creative_type": 1}},
                {"id": "2", "impid": "native-imp", "price": 1.0, "ext": {"creative_type": 99}},
                {"id": "3", "impid": "native-imp", "price": 1.0}
            ]}]
        }));

        let outcome = normalize(
            &adapter,
            &request(),
            &envelope(&["banner-imp", "native-imp"]),
            &res,
        );

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            outcome.errors[0].to_string(),
            "Unsupported creative type: 99"
        );

        let bids = outcome.bids();
        assert_eq!(bids.len(), 2);
        assert_eq!(bids[0].bid.id, "1");
        assert_eq!(bids[0].media_type, MediaType::Video);
        assert_eq!(bids[0].bid.ext, None);
        assert_eq!(bids[1].bid.id, "3");
        assert_eq!(bids[1].media_type, MediaType::Native);
    }

    #[test]
    fn test_empty_seatbid_rejected_when_required() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://partner.test");
        let res = ok(json!({"id": "req", "seatbid": []}));

        let outcome = normalize(&adapter, &request(), &envelope(&["banner-imp"]), &res);

        assert_eq!(
            outcome.errors,
            vec![AdapterError::bad_response("Invalid SeatBids count: 0")]
        );

        let outcome = normalize(&sovrn(), &request(), &envelope(&["banner-imp"]), &res);
        assert!(outcome.errors.is_empty());
        assert!(outcome.response.unwrap().bids().is_empty());
    }
}
