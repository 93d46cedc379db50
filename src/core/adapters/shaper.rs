use crate::child_span_debug;
use crate::core::adapters::error::AdapterError;
use crate::core::adapters::params::{AdapterParams, RequestOverrides};
use crate::core::adapters::{Adapter, ChannelRequirement, RequestPolicy};
use crate::core::openrtb::{Banner, BidRequest, Imp};
use crate::core::spec::{Channel, MediaType};
use tracing::{debug, trace};

/// A partner request built from a copy of the canonical request,
/// along with which canonical impressions it carries
#[derive(Debug, Clone)]
pub struct ShapedRequest {
    pub request: BidRequest,
    /// Indexes into the canonical `imp` list, in request order
    pub imps: Vec<usize>,
}

struct Survivor {
    index: usize,
    imp: Imp,
    overrides: RequestOverrides,
}

/// App partners only need an app object, a site alongside it is ignored
fn check_channel(requirement: ChannelRequirement, req: &BidRequest) -> Result<(), AdapterError> {
    match requirement {
        ChannelRequirement::Any => Ok(()),
        ChannelRequirement::App if req.app.is_some() => Ok(()),
        ChannelRequirement::App => Err(AdapterError::bad_request("non-app request")),
        ChannelRequirement::SiteOrApp if Channel::of(req) == Channel::Unknown => Err(
            AdapterError::bad_request("request must carry a site or app object"),
        ),
        ChannelRequirement::SiteOrApp => Ok(()),
    }
}

/// Gives the banner an explicit size, taking the first declared format
/// when `w`/`h` are absent
pub fn normalize_banner_size(banner: &mut Banner) -> Result<(), String> {
    if let (Some(w), Some(h)) = (banner.w, banner.h) {
        if w == 0 || h == 0 {
            return Err(format!("Invalid sizes provided for Banner {}x{}", w, h));
        }
        return Ok(());
    }

    match banner.format.first() {
        Some(format) => {
            banner.w = Some(format.w);
            banner.h = Some(format.h);
            Ok(())
        }
        None => Err("No sizes provided for Banner".to_string()),
    }
}

/// Parses params and rewrites a copy of one impression. Never
/// touches the canonical imp
fn shape_imp(adapter: &Adapter, index: usize, imp: &Imp) -> Result<Survivor, AdapterError> {
    let profile = adapter.profile();
    let declared = MediaType::declared(imp);

    if declared.is_empty() {
        return Err(AdapterError::bad_imp(
            index,
            format!("no banner, video, native or audio object. Ignoring imp id={}", imp.id),
        ));
    }

    if !declared.iter().any(|m| profile.formats.supports(*m)) {
        let names: Vec<&str> = declared.iter().map(|m| m.as_ref()).collect();
        return Err(AdapterError::bad_imp(
            index,
            format!(
                "{} does not support {} impressions. Ignoring imp id={}",
                adapter.name(),
                names.join("/"),
                imp.id
            ),
        ));
    }

    let params = AdapterParams::parse(adapter.kind(), index, imp)?;

    let mut shaped = imp.clone();
    let stripped = profile.formats.strip_unsupported(&mut shaped);
    if !stripped.is_empty() {
        debug!(
            "{}: stripped unsupported {:?} from imp {}",
            adapter.name(),
            stripped,
            imp.id
        );
    }

    params.apply(index, &mut shaped)?;

    if profile.explicit_banner_size {
        if let Some(banner) = shaped.banner.as_mut() {
            normalize_banner_size(banner).map_err(|e| AdapterError::bad_imp(index, e))?;
        }
    }

    Ok(Survivor {
        index,
        imp: shaped,
        overrides: params.overrides(),
    })
}

/// Everything but the impressions, so copies never clone imps twice
fn without_imps(req: &BidRequest) -> BidRequest {
    BidRequest {
        id: req.id.clone(),
        imp: Vec::new(),
        site: req.site.clone(),
        app: req.app.clone(),
        device: req.device.clone(),
        user: req.user.clone(),
        test: req.test,
        tmax: req.tmax,
        cur: req.cur.clone(),
        ext: req.ext.clone(),
        extra: req.extra.clone(),
    }
}

/// Groups survivors sharing identical overrides, in first seen order
fn group_by_overrides(survivors: Vec<Survivor>) -> Vec<(RequestOverrides, Vec<Survivor>)> {
    let mut groups: Vec<(RequestOverrides, Vec<Survivor>)> = Vec::new();

    for survivor in survivors {
        match groups.iter_mut().find(|(o, _)| *o == survivor.overrides) {
            Some((_, members)) => members.push(survivor),
            None => groups.push((survivor.overrides.clone(), vec![survivor])),
        }
    }

    groups
}

fn build_request(
    template: &BidRequest,
    overrides: &RequestOverrides,
    members: Vec<Survivor>,
) -> ShapedRequest {
    let mut request = template.clone();
    overrides.apply(&mut request);

    let mut imps = Vec::with_capacity(members.len());
    request.imp.reserve(members.len());

    for member in members {
        imps.push(member.index);
        request.imp.push(member.imp);
    }

    ShapedRequest { request, imps }
}

/// Shapes the canonical request into partner requests per the adapter
/// profile, collecting one failure per rejected impression
pub fn shape(adapter: &Adapter, req: &BidRequest) -> (Vec<ShapedRequest>, Vec<AdapterError>) {
    let _span = child_span_debug!("shape_requests", adapter = %adapter.name()).entered();
    let profile = adapter.profile();

    if req.imp.is_empty() {
        return (
            Vec::new(),
            vec![AdapterError::bad_request("No impression in the bid request")],
        );
    }

    if let Err(e) = check_channel(profile.channel, req) {
        return (Vec::new(), vec![e]);
    }

    let mut errors = Vec::new();
    let mut survivors = Vec::with_capacity(req.imp.len());

    for (index, imp) in req.imp.iter().enumerate() {
        match shape_imp(adapter, index, imp) {
            Ok(survivor) => survivors.push(survivor),
            Err(e) => {
                debug!("{}: dropping imp {}: {}", adapter.name(), imp.id, e);
                errors.push(e);
            }
        }
    }

    if survivors.is_empty() {
        trace!("{}: no imps survived shaping, skipping callout", adapter.name());
        return (Vec::new(), errors);
    }

    let template = without_imps(req);

    let shaped: Vec<ShapedRequest> = match profile.policy {
        RequestPolicy::Split => survivors
            .into_iter()
            .map(|s| {
                let overrides = s.overrides.clone();
                build_request(&template, &overrides, vec![s])
            })
            .collect(),
        RequestPolicy::Batched => group_by_overrides(survivors)
            .into_iter()
            .map(|(overrides, members)| build_request(&template, &overrides, members))
            .collect(),
    };

    (shaped, errors)
}
