use crate::core::openrtb::Imp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The ad format category a bid was made for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MediaType {
    Banner,
    Video,
    Native,
    Audio,
}

impl MediaType {
    /// Declared resolution priority when an impression
    /// carries more than one media object
    pub const PRIORITY: [MediaType; 4] = [
        MediaType::Banner,
        MediaType::Video,
        MediaType::Native,
        MediaType::Audio,
    ];

    /// Whether the impression declares this media object
    pub fn declared_on(&self, imp: &Imp) -> bool {
        match self {
            MediaType::Banner => imp.banner.is_some(),
            MediaType::Video => imp.video.is_some(),
            MediaType::Native => imp.native.is_some(),
            MediaType::Audio => imp.audio.is_some(),
        }
    }

    /// Every media type declared on the imp, in priority order
    pub fn declared(imp: &Imp) -> Vec<MediaType> {
        Self::PRIORITY
            .into_iter()
            .filter(|media_type| media_type.declared_on(imp))
            .collect()
    }
}

/// Media formats a partner accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFormats {
    pub banner: bool,
    pub video: bool,
    pub native: bool,
    pub audio: bool,
}

impl Default for SupportedFormats {
    fn default() -> Self {
        Self {
            banner: true,
            video: true,
            native: true,
            audio: true,
        }
    }
}

impl SupportedFormats {
    pub fn supports(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Banner => self.banner,
            MediaType::Video => self.video,
            MediaType::Native => self.native,
            MediaType::Audio => self.audio,
        }
    }

    /// Clears any media objects on the imp this partner does not accept.
    /// Returns the media types which were removed
    pub fn strip_unsupported(&self, imp: &mut Imp) -> Vec<MediaType> {
        let mut stripped = Vec::new();

        if !self.banner && imp.banner.take().is_some() {
            stripped.push(MediaType::Banner);
        }
        if !self.video && imp.video.take().is_some() {
            stripped.push(MediaType::Video);
        }
        if !self.native && imp.native.take().is_some() {
            stripped.push(MediaType::Native);
        }
        if !self.audio && imp.audio.take().is_some() {
            stripped.push(MediaType::Audio);
        }

        stripped
    }
}
