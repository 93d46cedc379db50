use crate::core::adapters::params::{BidderParams, RequestOverrides};
use crate::core::adapters::{
    AdapterProfile, BidResultShape, ChannelRequirement, DeviceSignals, HeaderProfile,
    MediaTypeSignal, RequestPolicy,
};
use crate::core::openrtb::Imp;
use crate::core::spec::SupportedFormats;
use serde::Deserialize;

/// In-app partner. Bids carry their creative type in `bid.ext`
pub const PROFILE: AdapterProfile = AdapterProfile {
    policy: RequestPolicy::Batched,
    formats: SupportedFormats {
        banner: true,
        video: true,
        native: true,
        audio: false,
    },
    channel: ChannelRequirement::App,
    media_signal: MediaTypeSignal::CreativeTypeExt,
    result_shape: BidResultShape::Typed,
    headers: HeaderProfile {
        content_type: "application/json;charset=utf-8",
        accept_json: true,
        openrtb_version: Some("2.5"),
        device_signals: DeviceSignals::None,
        buyer_cookie: None,
    },
    explicit_banner_size: false,
    require_seatbid: false,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SovrnXspParams {
    pub pub_id: String,
    /// Media id, replaces `app.id`
    pub med_id: String,
    /// Replaces `imp.tagid`
    pub zone_id: String,
    /// Read by the partner from the forwarded imp ext
    pub force_bid: bool,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl BidderParams for SovrnXspParams {
    fn validate(&self) -> Result<(), String> {
        if self.pub_id.trim().is_empty() {
            return Err("missing param pub_id".to_string());
        }

        Ok(())
    }

    fn apply(&self, imp: &mut Imp) -> Result<(), String> {
        if let Some(zone) = non_empty(&self.zone_id) {
            imp.tagid = Some(zone);
        }

        Ok(())
    }

    fn overrides(&self) -> RequestOverrides {
        RequestOverrides {
            inventory_id: non_empty(&self.med_id),
            publisher_id: non_empty(&self.pub_id),
        }
    }
}
