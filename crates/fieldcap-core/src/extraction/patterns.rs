//! Static regex tables: locale postal-code signatures and address line shapes.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Postal-code signatures per locale, tried in order.
    static ref POSTAL_CODES: HashMap<&'static str, Vec<Regex>> = {
        let mut table = HashMap::new();
        table.insert(
            "Australia",
            [
                r"VIC[\s]*[0-9]{4}$",
                r"NSW[\s]*[0-9]{4}$",
                r"QLD[\s]*[0-9]{4}$",
                r"NT[\s]*[0-9]{4}$",
                r"WA[\s]*[0-9]{4}$",
                r"SA[\s]*[0-9]{4}$",
                r"TAS[\s]*[0-9]{4}$",
            ]
            .iter()
            .map(|p| Regex::new(p).unwrap())
            .collect(),
        );
        table
    };

    /// A unit made only of digits and punctuation, e.g. a bare postcode.
    pub static ref NUMERIC_LINE: Regex = Regex::new(r"^[0-9,.\s]+$").unwrap();

    /// A unit that reads like one address line.
    pub static ref ADDRESS_LINE: Regex = Regex::new(r"(?i)^[a-z0-9,.\s]+$").unwrap();
}

/// Postal-code signatures for a locale, or `None` if the locale is unknown.
pub fn postal_signatures(country: &str) -> Option<&'static [Regex]> {
    POSTAL_CODES.get(country).map(Vec::as_slice)
}
