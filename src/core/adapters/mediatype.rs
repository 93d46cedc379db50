use crate::core::adapters::error::AdapterError;
use crate::core::openrtb::{Bid, Imp};
use crate::core::spec::MediaType;

/// Finds the impression a returned bid refers to. The imp id is the only
/// join key between request and response, so a miss is a broken protocol
/// rather than a droppable bid
pub fn find_imp<'a>(imp_id: &str, imps: &[&'a Imp]) -> Result<&'a Imp, AdapterError> {
    imps.iter()
        .find(|imp| imp.id == imp_id)
        .copied()
        .ok_or_else(|| AdapterError::bad_response(format!("Unknown ad unit code '{}'", imp_id)))
}

/// Media type of a bid on `imp`. An explicit partner signal wins, then the
/// first declared media object in priority order. Imps declaring nothing
/// resolve to banner for compatibility with banner only partners
pub fn resolve(imp: &Imp, explicit: Option<MediaType>) -> MediaType {
    explicit
        .or_else(|| MediaType::declared(imp).first().copied())
        .unwrap_or(MediaType::Banner)
}

/// Reads `bid.ext.creative_type`. Absent means no explicit signal,
/// an unrecognized value is a bad response for this bid only
pub fn creative_type(bid: &Bid) -> Result<Option<MediaType>, AdapterError> {
    let value = match bid.ext.as_ref().and_then(|ext| ext.get("creative_type")) {
        Some(value) => value,
        None => return Ok(None),
    };

    match value.as_i64() {
        Some(0) => Ok(Some(MediaType::Banner)),
        Some(1) => Ok(Some(MediaType::Video)),
        Some(2) => Ok(Some(MediaType::Native)),
        _ => Err(AdapterError::bad_response(format!(
            "Unsupported creative type: {}",
            value
        ))),
    }
}
