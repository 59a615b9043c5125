use std::fmt;

use tracing::{info, warn};

use crate::external::price_source::PriceSource;
use crate::external::spot::SpotEstimator;

/// Where the resolved price came from.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceOrigin {
    Source(String),
    SpotEstimate,
    Fallback,
    /// Supplied by the operator rather than resolved.
    Manual,
}

impl fmt::Display for PriceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceOrigin::Source(name) => write!(f, "{}", name),
            PriceOrigin::SpotEstimate => f.write_str("spot estimate"),
            PriceOrigin::Fallback => f.write_str("fallback constant"),
            PriceOrigin::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrice {
    pub price: f64,
    pub origin: PriceOrigin,
}

/// Tries each source in priority order and stops at the first usable price.
///
/// Strategy:
/// 1. Scraped sources in declared order (GoodReturns, then BankBazaar)
/// 2. Spot price plus retail markup, when configured
/// 3. The configured fallback constant
///
/// `resolve` never fails; a stale constant is preferred over no price in a
/// scheduled run.
pub struct MultiSourceResolver {
    sources: Vec<Box<dyn PriceSource>>,
    spot: Option<SpotEstimator>,
    fallback_price: f64,
}

impl MultiSourceResolver {
    pub fn new(sources: Vec<Box<dyn PriceSource>>, fallback_price: f64) -> Self {
        Self {
            sources,
            spot: None,
            fallback_price,
        }
    }

    pub fn with_spot_estimator(mut self, spot: SpotEstimator) -> Self {
        self.spot = Some(spot);
        self
    }

    pub async fn resolve(&self) -> ResolvedPrice {
        for source in &self.sources {
            let name = source.name();
            match source.fetch_price().await {
                Ok(price) => {
                    info!("✓ Got price {:.2} from {}", price, name);
                    return ResolvedPrice {
                        price,
                        origin: PriceOrigin::Source(name),
                    };
                }
                Err(e) => {
                    warn!("{} failed: {}. Trying next source.", name, e);
                }
            }
        }

        if let Some(spot) = &self.spot {
            match spot.estimate().await {
                Ok(price) => {
                    info!("✓ Using spot estimate {:.2}", price);
                    return ResolvedPrice {
                        price,
                        origin: PriceOrigin::SpotEstimate,
                    };
                }
                Err(e) => {
                    warn!("Spot estimate failed: {}", e);
                }
            }
        }

        warn!(
            "All sources failed, using fallback price {:.2}",
            self.fallback_price
        );
        ResolvedPrice {
            price: self.fallback_price,
            origin: PriceOrigin::Fallback,
        }
    }
}
