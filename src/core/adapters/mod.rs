//! Per partner request shaping and response normalization.
//!
//! Every partner runs the same pipeline, parse the bidder params of
//! each imp, shape one or more partner requests, wrap them in transport
//! envelopes and later normalize the partner response back into typed
//! bids. Partners differ only by their [`AdapterProfile`] and their
//! param schema, both selected by [`AdapterKind`] at construction.

pub mod bidders;
pub mod envelope;
pub mod error;
pub mod mediatype;
pub mod normalizer;
pub mod params;
pub mod shaper;

use crate::child_span_info;
use crate::core::openrtb::BidRequest;
use crate::core::spec::SupportedFormats;
use envelope::Envelope;
use error::AdapterError;
use normalizer::{BidsOutcome, ResponseData};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, warn};

/// Partners this crate can talk to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AdapterKind {
    Sovrn,
    SovrnXsp,
    VerizonMedia,
}

impl AdapterKind {
    pub fn profile(&self) -> &'static AdapterProfile {
        match self {
            AdapterKind::Sovrn => &bidders::sovrn::PROFILE,
            AdapterKind::SovrnXsp => &bidders::sovrn_xsp::PROFILE,
            AdapterKind::VerizonMedia => &bidders::verizon_media::PROFILE,
        }
    }
}

/// How surviving impressions are distributed across partner requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPolicy {
    /// Impressions share a request, split only where their
    /// request level overrides disagree
    Batched,
    /// Every impression gets its own single imp request
    Split,
}

/// Distribution channel a partner requires on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRequirement {
    Any,
    App,
    SiteOrApp,
}

/// Where the media type of a returned bid comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTypeSignal {
    /// Media objects declared on the canonical imp
    Declared,
    /// `bid.ext.creative_type`, falling back to the declared media
    CreativeTypeExt,
}

/// Shape of the normalized bid result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidResultShape {
    /// Bare bids without a currency. Markup arrives url encoded
    /// and bids are ranked by price, highest first
    Legacy,
    /// Bids wrapped with the response currency
    Typed,
}

/// Device signals forwarded as http headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSignals {
    None,
    UserAgent,
    /// User agent, forwarded ip, accept language and dnt
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderProfile {
    pub content_type: &'static str,
    pub accept_json: bool,
    /// Value of the `x-openrtb-version` header, if sent
    pub openrtb_version: Option<&'static str>,
    pub device_signals: DeviceSignals,
    /// Cookie name carrying `user.buyeruid`, if sent
    pub buyer_cookie: Option<&'static str>,
}

/// Static partner behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdapterProfile {
    pub policy: RequestPolicy,
    pub formats: SupportedFormats,
    pub channel: ChannelRequirement,
    pub media_signal: MediaTypeSignal,
    pub result_shape: BidResultShape,
    pub headers: HeaderProfile,
    /// Banner `w`/`h` must be set, taken from the first format if absent
    pub explicit_banner_size: bool,
    /// A 200 response without seat bids is treated as a bad response
    pub require_seatbid: bool,
}

/// Envelopes ready for the transport plus any failures
/// collected while shaping them
#[derive(Debug, Default)]
pub struct RequestsOutcome {
    pub envelopes: Vec<Envelope>,
    pub errors: Vec<AdapterError>,
}

#[derive(Debug, Clone)]
pub struct Adapter {
    name: String,
    kind: AdapterKind,
    endpoint: String,
    debug: bool,
    profile: &'static AdapterProfile,
}

impl Adapter {
    pub fn new(name: impl Into<String>, kind: AdapterKind, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            endpoint: endpoint.into(),
            debug: false,
            profile: kind.profile(),
        }
    }

    /// Debug adapters include partner response bodies in status failures
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn profile(&self) -> &'static AdapterProfile {
        self.profile
    }

    /// Shapes the canonical request into partner envelopes. The request
    /// is never modified, every envelope is built from its own copy.
    ///
    /// # Behavior
    /// Impressions with bad params or unsupported media are dropped with
    /// a `BadInput` failure while their siblings continue. If nothing
    /// survives no envelopes are returned. A serialization failure only
    /// drops the envelope it occurred on
    pub fn make_requests(&self, req: &BidRequest) -> RequestsOutcome {
        let span = child_span_info!(
            "adapter_make_requests",
            adapter = %self.name,
            imps = req.imp.len(),
            envelopes = tracing::field::Empty,
        )
        .entered();

        let (shaped, mut errors) = shaper::shape(self, req);
        let mut envelopes = Vec::with_capacity(shaped.len());

        for shaped_request in shaped {
            match envelope::build(self, shaped_request) {
                Ok(env) => envelopes.push(env),
                Err(e) => {
                    warn!("{}: failed to build envelope for {}: {}", self.name, req.id, e);
                    errors.push(e);
                }
            }
        }

        span.record("envelopes", envelopes.len());
        debug!(
            "{} shaped {} imps into {} envelopes with {} errors",
            self.name,
            req.imp.len(),
            envelopes.len(),
            errors.len()
        );

        RequestsOutcome { envelopes, errors }
    }

    /// Normalizes the partner response to one envelope into typed bids
    pub fn make_bids(
        &self,
        req: &BidRequest,
        envelope: &Envelope,
        response: &ResponseData,
    ) -> BidsOutcome {
        let _span = child_span_info!(
            "adapter_make_bids",
            adapter = %self.name,
            status = response.status,
        )
        .entered();

        normalizer::normalize(self, req, envelope, response)
    }
}
