use crate::models::address::Address;
use crate::pricing::{PricingTable, Zone};

pub struct ZoneClassifier<'a> {
    rules: &'a [Zone],
    fallback: &'a Zone,
}

impl<'a> ZoneClassifier<'a> {
    pub fn new(table: &'a PricingTable) -> Self {
        Self {
            rules: &table.zones,
            fallback: &table.fallback_zone,
        }
    }

    /// Case-insensitive substring match, first rule wins, unmatched input
    /// resolves to the fallback zone.
    pub fn classify(&self, province_or_city: &str) -> &'a Zone {
        self.match_rule(province_or_city).unwrap_or(self.fallback)
    }

    /// Classifies by province. The city is only consulted when no province
    /// was given; an unmatched province stays in the fallback zone.
    pub fn classify_address(&self, address: &Address) -> &'a Zone {
        if address.province.trim().is_empty() {
            self.classify(&address.city)
        } else {
            self.classify(&address.province)
        }
    }

    fn match_rule(&self, input: &str) -> Option<&'a Zone> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.rules.iter().find(|zone| {
            zone.keywords
                .iter()
                .any(|keyword| needle.contains(&keyword.to_lowercase()))
        })
    }
}
