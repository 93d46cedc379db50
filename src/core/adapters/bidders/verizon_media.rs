use crate::core::adapters::params::{BidderParams, RequestOverrides};
use crate::core::adapters::{
    AdapterProfile, BidResultShape, ChannelRequirement, DeviceSignals, HeaderProfile,
    MediaTypeSignal, RequestPolicy,
};
use crate::core::openrtb::Imp;
use crate::core::spec::SupportedFormats;
use serde::Deserialize;

/// Single imp partner expecting explicit banner sizes, the
/// dcn of each imp becomes the site (or app) id of its request
pub const PROFILE: AdapterProfile = AdapterProfile {
    policy: RequestPolicy::Split,
    formats: SupportedFormats {
        banner: true,
        video: false,
        native: false,
        audio: false,
    },
    channel: ChannelRequirement::SiteOrApp,
    media_signal: MediaTypeSignal::Declared,
    result_shape: BidResultShape::Typed,
    headers: HeaderProfile {
        content_type: "application/json;charset=utf-8",
        accept_json: true,
        openrtb_version: Some("2.5"),
        device_signals: DeviceSignals::UserAgent,
        buyer_cookie: None,
    },
    explicit_banner_size: true,
    require_seatbid: true,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerizonMediaParams {
    pub dcn: String,
    pub pos: String,
}

impl BidderParams for VerizonMediaParams {
    fn validate(&self) -> Result<(), String> {
        if self.dcn.is_empty() {
            return Err("missing param dcn".to_string());
        }
        if self.pos.is_empty() {
            return Err("missing param pos".to_string());
        }

        Ok(())
    }

    fn apply(&self, imp: &mut Imp) -> Result<(), String> {
        imp.tagid = Some(self.pos.clone());
        Ok(())
    }

    fn overrides(&self) -> RequestOverrides {
        RequestOverrides {
            inventory_id: Some(self.dcn.clone()),
            publisher_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::params::parse_bidder_ext;
    use crate::core::openrtb::ImpBuilder;
    use serde_json::json;

    fn parse(bidder: serde_json::Value) -> Result<VerizonMediaParams, String> {
        let imp = ImpBuilder::default()
            .id("1")
            .ext(json!({ "bidder": bidder }))
            .build()
            .unwrap();

        parse_bidder_ext::<VerizonMediaParams>(0, &imp).map_err(|e| e.to_string())
    }

    #[test]
    fn test_required_params() {
        assert_eq!(
            parse(json!({"pos": "header"})).unwrap_err(),
            "imp #0: missing param dcn"
        );
        assert_eq!(
            parse(json!({"dcn": "site-1"})).unwrap_err(),
            "imp #0: missing param pos"
        );
    }

    #[test]
    fn test_pos_becomes_tag_and_dcn_inventory() {
        let params = parse(json!({"dcn": "site-1", "pos": "header"})).unwrap();
        let mut imp = ImpBuilder::default().id("1").build().unwrap();

        params.apply(&mut imp).unwrap();

        assert_eq!(imp.tagid.as_deref(), Some("header"));
        assert_eq!(params.overrides().inventory_id.as_deref(), Some("site-1"));
    }
}
