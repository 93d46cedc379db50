use crate::core::adapters::params::BidderParams;
use crate::core::adapters::{
    AdapterProfile, BidResultShape, ChannelRequirement, DeviceSignals, HeaderProfile,
    MediaTypeSignal, RequestPolicy,
};
use crate::core::openrtb::{Imp, Video};
use crate::core::spec::SupportedFormats;
use serde::Deserialize;

/// Name of the cookie carrying the user's sovrn buyer id
pub const BUYER_COOKIE: &str = "ljt_reader";

/// Multi imp partner taking banner and video, tag ids rewritten in place
pub const PROFILE: AdapterProfile = AdapterProfile {
    policy: RequestPolicy::Batched,
    formats: SupportedFormats {
        banner: true,
        video: true,
        native: false,
        audio: false,
    },
    channel: ChannelRequirement::Any,
    media_signal: MediaTypeSignal::Declared,
    result_shape: BidResultShape::Legacy,
    headers: HeaderProfile {
        content_type: "application/json",
        accept_json: false,
        openrtb_version: None,
        device_signals: DeviceSignals::Full,
        buyer_cookie: Some(BUYER_COOKIE),
    },
    explicit_banner_size: false,
    require_seatbid: false,
};

/// Publishers send tag ids both as strings and numbers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagId {
    Text(String),
    Number(i64),
}

impl TagId {
    /// Numeric tags, or text parsing as an integer, must be positive
    fn is_positive(&self) -> bool {
        match self {
            TagId::Number(n) => *n > 0,
            TagId::Text(s) => s.trim().parse::<i64>().map_or(true, |n| n > 0),
        }
    }

    fn resolve(&self) -> String {
        match self {
            TagId::Text(s) => s.trim().to_string(),
            TagId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SovrnParams {
    #[serde(rename = "tagId")]
    pub tag_id: Option<TagId>,
    /// Legacy lowercase spelling, used only when `tagId` is absent or empty
    pub tagid: Option<TagId>,
    pub bidfloor: Option<f64>,
    pub minduration: Option<u32>,
    pub maxduration: Option<u32>,
    pub protocols: Vec<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub startdelay: Option<i32>,
    pub placement: Option<u32>,
    pub linearity: Option<u32>,
    pub skip: Option<u8>,
    pub pos: Option<u32>,
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

impl SovrnParams {
    fn effective(&self) -> Option<&TagId> {
        [&self.tag_id, &self.tagid]
            .into_iter()
            .flatten()
            .find(|t| !t.resolve().is_empty())
    }

    /// The effective tag id, empty if neither spelling carries one
    pub fn tag(&self) -> String {
        self.effective().map(TagId::resolve).unwrap_or_default()
    }

    fn fill_video(&self, video: &mut Video) {
        fill(&mut video.minduration, &self.minduration);
        fill(&mut video.maxduration, &self.maxduration);
        fill(&mut video.w, &self.w);
        fill(&mut video.h, &self.h);
        fill(&mut video.startdelay, &self.startdelay);
        fill(&mut video.placement, &self.placement);
        fill(&mut video.linearity, &self.linearity);
        fill(&mut video.skip, &self.skip);
        fill(&mut video.pos, &self.pos);

        if video.protocols.is_empty() {
            video.protocols.clone_from(&self.protocols);
        }
    }
}

impl BidderParams for SovrnParams {
    fn validate(&self) -> Result<(), String> {
        match self.effective() {
            None => return Err("missing param tagid".to_string()),
            Some(tag) if !tag.is_positive() => {
                return Err("tagid must be a positive identifier".to_string());
            }
            Some(_) => {}
        }

        match self.bidfloor {
            Some(floor) if floor < 0.0 || !floor.is_finite() => {
                Err(format!("invalid bidfloor {}", floor))
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, imp: &mut Imp) -> Result<(), String> {
        imp.tagid = Some(self.tag());

        if let Some(floor) = self.bidfloor.filter(|f| *f > 0.0) {
            imp.bidfloor = Some(floor);
        }

        if let Some(video) = imp.video.as_mut() {
            self.fill_video(video);
        }

        Ok(())
    }
}
