pub mod sovrn;
pub mod sovrn_xsp;
pub mod verizon_media;
