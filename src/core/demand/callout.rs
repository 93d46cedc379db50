use crate::core::adapters::Adapter;
use crate::core::adapters::envelope::Envelope;
use crate::core::adapters::error::AdapterError;
use crate::core::adapters::normalizer::{BidsOutcome, TypedBid};
use crate::core::demand::client::Transport;
use crate::core::openrtb::BidRequest;
use crate::sample_or_attach_root_span;
use futures_util::future::join_all;
use std::time::Duration;
use tracing::{Instrument, debug, warn};

/// Aggregated result of one adapter across all its envelopes. The caller
/// decides whether bids with errors still make a usable outcome
#[derive(Debug, Default)]
pub struct CalloutOutcome {
    pub bids: Vec<TypedBid>,
    pub errors: Vec<AdapterError>,
}

impl CalloutOutcome {
    pub fn is_no_bid(&self) -> bool {
        self.bids.is_empty() && self.errors.is_empty()
    }
}

async fn exchange(
    adapter: &Adapter,
    transport: &dyn Transport,
    req: &BidRequest,
    envelope: &Envelope,
    timeout: Duration,
) -> BidsOutcome {
    let response = match tokio::time::timeout(timeout, transport.send(envelope)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!("{}: transport failure: {}", adapter.name(), e);
            return BidsOutcome {
                response: None,
                errors: vec![AdapterError::transport(e.to_string())],
            };
        }
        Err(_) => {
            debug!("{}: timed out after {:?}", adapter.name(), timeout);
            return BidsOutcome {
                response: None,
                errors: vec![AdapterError::transport(format!(
                    "timed out after {}ms",
                    timeout.as_millis()
                ))],
            };
        }
    };

    adapter.make_bids(req, envelope, &response)
}

/// Shapes the request for one adapter, sends every envelope concurrently
/// and normalizes each response independently. A failed envelope never
/// affects its siblings
pub async fn run(
    adapter: &Adapter,
    transport: &dyn Transport,
    req: &BidRequest,
    timeout: Duration,
) -> CalloutOutcome {
    let span = sample_or_attach_root_span!(0.01, "adapter_callout");

    async move {
        let requests = adapter.make_requests(req);
        let mut outcome = CalloutOutcome {
            bids: Vec::new(),
            errors: requests.errors,
        };

        if requests.envelopes.is_empty() {
            debug!("{}: nothing to send for {}", adapter.name(), req.id);
            return outcome;
        }

        let exchanges = requests
            .envelopes
            .iter()
            .map(|envelope| exchange(adapter, transport, req, envelope, timeout));

        for bids_outcome in join_all(exchanges).await {
            if let Some(response) = bids_outcome.response {
                outcome.bids.extend(response.into_bids());
            }
            outcome.errors.extend(bids_outcome.errors);
        }

        outcome
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::adapters::AdapterKind;
    use crate::core::adapters::normalizer::ResponseData;
    use crate::core::openrtb::{BannerBuilder, BidRequestBuilder, Format, ImpBuilder, SiteBuilder};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Answers each envelope from a canned function and records what it saw
    struct MockTransport<F: Fn(&Envelope) -> Result<ResponseData, anyhow::Error> + Send + Sync> {
        respond: F,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl<F> MockTransport<F>
    where
        F: Fn(&Envelope) -> Result<ResponseData, anyhow::Error> + Send + Sync,
    {
        fn new(respond: F) -> Self {
            Self {
                respond,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl<F> Transport for MockTransport<F>
    where
        F: Fn(&Envelope) -> Result<ResponseData, anyhow::Error> + Send + Sync,
    {
        async fn send(&self, envelope: &Envelope) -> Result<ResponseData, anyhow::Error> {
            self.seen.lock().push(envelope.imp_ids.clone());
            (self.respond)(envelope)
        }
    }

    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _envelope: &Envelope) -> Result<ResponseData, anyhow::Error> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ResponseData::new(204, ""))
        }
    }

    fn request(ids: &[&str]) -> BidRequest {
        let imps = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                ImpBuilder::default()
                    .id(*id)
                    .banner(
                        BannerBuilder::default()
                            .format(vec![Format { w: 300, h: 250 }])
                            .build()
                            .unwrap(),
                    )
                    .ext(json!({"bidder": {"dcn": "dcn", "pos": format!("{}", 111 + i)}}))
                    .build()
                    .unwrap()
            })
            .collect::<Vec<_>>();

        BidRequestBuilder::default()
            .id("req")
            .site(SiteBuilder::default().build().unwrap())
            .imp(imps)
            .build()
            .unwrap()
    }

    fn bid_for(imp_id: &str) -> ResponseData {
        let body = json!({
            "id": "req",
            "seatbid": [{"bid": [{"id": format!("bid-{}", imp_id), "impid": imp_id, "price": 0.5}]}]
        });
        ResponseData::new(200, body.to_string())
    }

    #[tokio::test]
    async fn test_split_envelopes_bid_for_first_only() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://vzm.test");
        let transport = MockTransport::new(|env: &Envelope| {
            if env.imp_ids == ["A"] {
                Ok(bid_for("A"))
            } else {
                Ok(ResponseData::new(204, ""))
            }
        });

        let outcome = run(
            &adapter,
            &transport,
            &request(&["A", "B"]),
            Duration::from_millis(200),
        )
        .await;

        assert_eq!(transport.seen.lock().len(), 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.bids.len(), 1);
        assert_eq!(outcome.bids[0].bid.impid, "A");
    }

    #[tokio::test]
    async fn test_failed_envelope_does_not_affect_sibling() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://vzm.test");
        let transport = MockTransport::new(|env: &Envelope| {
            if env.imp_ids == ["A"] {
                Err(anyhow!("connection refused"))
            } else {
                Ok(bid_for("B"))
            }
        });

        let outcome = run(
            &adapter,
            &transport,
            &request(&["A", "B"]),
            Duration::from_millis(200),
        )
        .await;

        assert_eq!(outcome.bids.len(), 1);
        assert_eq!(outcome.bids[0].bid.impid, "B");
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], AdapterError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_no_call_when_nothing_survives() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://vzm.test");
        let transport = MockTransport::new(|_: &Envelope| Ok(ResponseData::new(204, "")));
        let mut req = request(&["A"]);
        req.imp[0].ext = None;

        let outcome = run(
            &adapter,
            &transport,
            &req,
            Duration::from_millis(200),
        )
        .await;

        assert!(transport.seen.lock().is_empty());
        assert!(outcome.bids.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].is_bad_input());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://vzm.test");

        let outcome = run(
            &adapter,
            &SlowTransport,
            &request(&["A"]),
            Duration::from_millis(20),
        )
        .await;

        assert!(outcome.bids.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], AdapterError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_all_no_bid() {
        let adapter = Adapter::new("vzm", AdapterKind::VerizonMedia, "http://vzm.test");
        let transport = MockTransport::new(|_: &Envelope| Ok(ResponseData::new(204, "")));

        let outcome = run(
            &adapter,
            &transport,
            &request(&["A", "B"]),
            Duration::from_millis(200),
        )
        .await;

        assert!(outcome.is_no_bid());
    }
}
