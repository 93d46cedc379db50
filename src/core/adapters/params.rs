use crate::core::adapters::AdapterKind;
use crate::core::adapters::bidders::sovrn::SovrnParams;
use crate::core::adapters::bidders::sovrn_xsp::SovrnXspParams;
use crate::core::adapters::bidders::verizon_media::VerizonMediaParams;
use crate::core::adapters::error::AdapterError;
use crate::core::openrtb::{BidRequest, Imp, Publisher};
use serde::de::DeserializeOwned;

/// A bidder's typed view of the `imp.ext.bidder` blob
pub trait BidderParams: DeserializeOwned {
    /// Semantic checks which decoding alone cannot express,
    /// e.g. a required identifier being present and non empty
    fn validate(&self) -> Result<(), String>;

    /// Rewrites the outgoing copy of the impression
    fn apply(&self, imp: &mut Imp) -> Result<(), String>;

    fn overrides(&self) -> RequestOverrides {
        RequestOverrides::default()
    }
}

/// Request level identifiers an impression wants to override.
/// Impressions with differing overrides can never share a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RequestOverrides {
    /// Written to `site.id`, or `app.id` when the request has no site
    pub inventory_id: Option<String>,
    /// Written to the publisher of the site or app
    pub publisher_id: Option<String>,
}

impl RequestOverrides {
    pub fn is_empty(&self) -> bool {
        self.inventory_id.is_none() && self.publisher_id.is_none()
    }

    /// Applies the overrides to an owned, per envelope copy of the request
    pub fn apply(&self, req: &mut BidRequest) {
        if let Some(id) = &self.inventory_id {
            if let Some(site) = req.site.as_mut() {
                site.id = Some(id.clone());
            } else if let Some(app) = req.app.as_mut() {
                app.id = Some(id.clone());
            }
        }

        if let Some(id) = &self.publisher_id {
            let publisher = if let Some(site) = req.site.as_mut() {
                Some(site.publisher.get_or_insert_with(Publisher::default))
            } else {
                req.app
                    .as_mut()
                    .map(|app| app.publisher.get_or_insert_with(Publisher::default))
            };

            if let Some(publisher) = publisher {
                publisher.id = Some(id.clone());
            }
        }
    }
}

/// Decoded parameters for one impression, tagged by bidder
#[derive(Debug, Clone)]
pub enum AdapterParams {
    Sovrn(SovrnParams),
    SovrnXsp(SovrnXspParams),
    VerizonMedia(VerizonMediaParams),
}

impl AdapterParams {
    /// Decodes and validates the bidder blob of the impression at `index`.
    /// Failures are reported against that index only
    pub fn parse(kind: AdapterKind, index: usize, imp: &Imp) -> Result<Self, AdapterError> {
        Ok(match kind {
            AdapterKind::Sovrn => AdapterParams::Sovrn(parse_bidder_ext(index, imp)?),
            AdapterKind::SovrnXsp => AdapterParams::SovrnXsp(parse_bidder_ext(index, imp)?),
            AdapterKind::VerizonMedia => {
                AdapterParams::VerizonMedia(parse_bidder_ext(index, imp)?)
            }
        })
    }

    pub fn apply(&self, index: usize, imp: &mut Imp) -> Result<(), AdapterError> {
        let res = match self {
            AdapterParams::Sovrn(p) => p.apply(imp),
            AdapterParams::SovrnXsp(p) => p.apply(imp),
            AdapterParams::VerizonMedia(p) => p.apply(imp),
        };

        res.map_err(|e| AdapterError::bad_imp(index, e))
    }

    pub fn overrides(&self) -> RequestOverrides {
        match self {
            AdapterParams::Sovrn(p) => p.overrides(),
            AdapterParams::SovrnXsp(p) => p.overrides(),
            AdapterParams::VerizonMedia(p) => p.overrides(),
        }
    }
}

/// Decodes `imp.ext.bidder` into the bidder's param type and validates it.
/// Unknown fields are ignored
pub fn parse_bidder_ext<T: BidderParams>(index: usize, imp: &Imp) -> Result<T, AdapterError> {
    let bidder = imp
        .ext
        .as_ref()
        .and_then(|ext| ext.get("bidder"))
        .ok_or_else(|| AdapterError::bad_imp(index, "ext.bidder not provided"))?;

    let params = T::deserialize(bidder).map_err(|e| AdapterError::bad_imp(index, e.to_string()))?;

    params
        .validate()
        .map_err(|e| AdapterError::bad_imp(index, e))?;

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::error::Scope;
    use crate::core::openrtb::{AppBuilder, BidRequestBuilder, ImpBuilder, SiteBuilder};
    use serde_json::json;

    fn imp_with_ext(ext: serde_json::Value) -> Imp {
        ImpBuilder::default().id("1").ext(ext).build().unwrap()
    }

    #[test]
    fn test_missing_ext_is_bad_input_at_index() {
        let imp = ImpBuilder::default().id("1").build().unwrap();

        let err = parse_bidder_ext::<VerizonMediaParams>(2, &imp).unwrap_err();

        assert_eq!(err.scope(), Scope::Imp(2));
        assert_eq!(err.to_string(), "imp #2: ext.bidder not provided");
    }

    #[test]
    fn test_malformed_blob_is_bad_input() {
        let imp = imp_with_ext(json!({"bidder": {"dcn": 42, "pos": "p"}}));

        let err = parse_bidder_ext::<VerizonMediaParams>(0, &imp).unwrap_err();

        assert!(err.is_bad_input());
        assert!(err.to_string().starts_with("imp #0: "));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let imp = imp_with_ext(json!({"bidder": {"dcn": "d", "pos": "p", "other": [1, 2]}}));

        let params = parse_bidder_ext::<VerizonMediaParams>(0, &imp).unwrap();

        assert_eq!(params.dcn, "d");
        assert_eq!(params.pos, "p");
    }

    #[test]
    fn test_overrides_prefer_site_then_app() {
        let overrides = RequestOverrides {
            inventory_id: Some("inv".to_string()),
            publisher_id: Some("pub".to_string()),
        };

        let mut site_req = BidRequestBuilder::default()
            .site(SiteBuilder::default().id("orig").build().unwrap())
            .app(AppBuilder::default().id("app").build().unwrap())
            .build()
            .unwrap();
        overrides.apply(&mut site_req);

        let site = site_req.site.as_ref().unwrap();
        assert_eq!(site.id.as_deref(), Some("inv"));
        assert_eq!(site.publisher.as_ref().unwrap().id.as_deref(), Some("pub"));
        assert_eq!(site_req.app.as_ref().unwrap().id.as_deref(), Some("app"));

        let mut app_req = BidRequestBuilder::default()
            .app(AppBuilder::default().build().unwrap())
            .build()
            .unwrap();
        overrides.apply(&mut app_req);

        let app = app_req.app.as_ref().unwrap();
        assert_eq!(app.id.as_deref(), Some("inv"));
        assert_eq!(app.publisher.as_ref().unwrap().id.as_deref(), Some("pub"));
    }
}
