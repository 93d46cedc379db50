//! Minimal OpenRTB 2.x object model shared by every adapter.
//! Only the fields adapters read or rewrite are typed, anything
//! else lands in each object's `extra` map and is written back as is

pub mod request;
pub mod response;

pub use request::{
    App, AppBuilder, Audio, AudioBuilder, Banner, BannerBuilder, BidRequest, BidRequestBuilder,
    Device, DeviceBuilder, Format, Imp, ImpBuilder, Native, NativeBuilder, Publisher,
    PublisherBuilder, Site, SiteBuilder, User, UserBuilder, Video, VideoBuilder,
};
pub use response::{Bid, BidBuilder, BidResponse, BidResponseBuilder, SeatBid, SeatBidBuilder};
