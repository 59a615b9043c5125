use thiserror::Error;

use crate::external::html;
use crate::external::price_source::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("price not found in page")]
    NotFound,
}

/// What to look for on a page: the karat heading marker and the city name.
#[derive(Debug, Clone)]
pub struct ExtractTarget {
    pub karat_marker: String,
    pub city: String,
}

impl ExtractTarget {
    /// `karat` is the stored tag ("22K"); pages label it "22 Carat".
    pub fn new(karat: &str, city: &str) -> Self {
        let purity = karat.trim().trim_end_matches(['K', 'k']).trim();
        Self {
            karat_marker: format!("{} Carat", purity),
            city: city.to_string(),
        }
    }
}

/// Pull the 10-gram price out of one source's page.
pub fn extract(html: &str, kind: SourceKind, target: &ExtractTarget) -> Result<f64, ExtractError> {
    match kind {
        SourceKind::GoodReturns => extract_good_returns(html, target),
        SourceKind::BankBazaar => extract_bank_bazaar(html),
    }
}

// The rate table sits under a heading such as
// "22 Carat Gold Rate In Hyderabad (INR)" with rows keyed by gram count.
fn extract_good_returns(html: &str, target: &ExtractTarget) -> Result<f64, ExtractError> {
    let marker = target.karat_marker.to_lowercase();
    let city = target.city.to_lowercase();

    for section in html::sections(html) {
        let heading = section.heading.to_lowercase();
        if !(heading.contains(&marker) && heading.contains(&city)) {
            continue;
        }

        for row in html::rows(section.body) {
            let cells = html::cells(row);
            if cells.first().map(|c| c.trim()) != Some("10") {
                continue;
            }
            return cells.get(1).ok_or(ExtractError::NotFound).and_then(|c| positive_price(c));
        }
    }

    Err(ExtractError::NotFound)
}

// One table lists "1 gram", "8 grams", "10 grams" rows; the "1 gram" exclusion
// keeps the per-gram row from matching.
fn extract_bank_bazaar(html: &str) -> Result<f64, ExtractError> {
    for row in html::rows(html) {
        let cells = html::cells(row);
        if cells.len() < 2 {
            continue;
        }

        let row_text = html::text_of(row);
        if !row_text.contains("10 grams") || row_text.contains("1 gram") {
            continue;
        }
        if !cells[0].contains("10 grams") {
            continue;
        }

        return positive_price(&cells[1]);
    }

    Err(ExtractError::NotFound)
}

fn positive_price(cell: &str) -> Result<f64, ExtractError> {
    match clean_price(cell)? {
        p if p > 0.0 => Ok(p),
        _ => Err(ExtractError::NotFound),
    }
}

/// Parse the leading number out of a price cell.
///
/// Currency symbols and other leading noise are skipped, thousands separators
/// inside the number are dropped, and collection stops at the first other
/// character once digits have started, so `"₹ 1,32,800 (+100)"` is `132800.0`.
pub fn clean_price(text: &str) -> Result<f64, ExtractError> {
    let mut digits = String::with_capacity(text.len());
    let mut started = false;
    let mut seen_dot = false;

    for ch in text.chars() {
        match ch {
            '0'..='9' => {
                digits.push(ch);
                started = true;
            }
            ',' if started => {}
            '.' if started && !seen_dot => {
                digits.push(ch);
                seen_dot = true;
            }
            _ if started => break,
            _ => {}
        }
    }

    let digits = digits.trim_end_matches('.');
    if digits.is_empty() {
        return Err(ExtractError::NotFound);
    }

    digits.parse::<f64>().map_err(|_| ExtractError::NotFound)
}
