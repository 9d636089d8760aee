use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hotel {
    pub display_name: String,
    pub provider_id: String,
}

impl Hotel {
    pub fn new(display_name: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            provider_id: provider_id.into(),
        }
    }
}

impl Display for Hotel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.provider_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HotelSet {
    pub baseline: Hotel,
    #[serde(default)]
    pub competitors: Vec<Hotel>,
}

impl HotelSet {
    pub fn len(&self) -> usize {
        1 + self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hotel> {
        std::iter::once(&self.baseline).chain(self.competitors.iter())
    }

    pub fn display_names(&self) -> Vec<String> {
        self.iter().map(|h| h.display_name.clone()).collect()
    }
}

impl Default for HotelSet {
    fn default() -> Self {
        Self {
            baseline: Hotel::new("Quality Inn Richfield", "g50892-d95503"),
            competitors: vec![
                Hotel::new("Comfort Inn Richfield", "g50892-d256944"),
                Hotel::new("Holiday Inn Richfield", "g50892-d631380"),
                Hotel::new("La Quinta Macedonia", "g50587-d226031"),
                Hotel::new("Comfort Inn Independence", "g50470-d95403"),
            ],
        }
    }
}
