use crate::core::openrtb::BidRequest;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Distribution channel of a request. Site takes precedence
/// when a malformed request carries both objects
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Channel {
    Site,
    App,
    #[default]
    Unknown,
}

impl Channel {
    pub fn of(req: &BidRequest) -> Self {
        match (&req.site, &req.app) {
            (Some(_), _) => Channel::Site,
            (None, Some(_)) => Channel::App,
            (None, None) => Channel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::openrtb::{AppBuilder, BidRequestBuilder, SiteBuilder};

    #[test]
    fn test_channel_of_request() {
        let site_req = BidRequestBuilder::default()
            .site(SiteBuilder::default().build().unwrap())
            .build()
            .unwrap();
        let app_req = BidRequestBuilder::default()
            .app(AppBuilder::default().build().unwrap())
            .build()
            .unwrap();

        assert_eq!(Channel::of(&site_req), Channel::Site);
        assert_eq!(Channel::of(&app_req), Channel::App);
        assert_eq!(Channel::of(&BidRequest::default()), Channel::Unknown);
    }
}
