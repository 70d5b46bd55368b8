//! Regional growing tips
//!
//! A static catalog filtered by country, region, plant type and season.
//! Regions without their own list fall back to the country's default region.

use serde::Serialize;

use crate::models::{CountryCode, PlantType, Region, Season};

/// One piece of regional growing advice
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GrowingTip {
    pub text: &'static str,
    /// Plant types the tip applies to
    pub applies_to: &'static [PlantType],
    /// Seasons the tip applies to; empty means year-round
    pub seasons: &'static [Season],
}

const VEG: &[PlantType] = &[PlantType::Vegetable];
const VEG_HERB: &[PlantType] = &[PlantType::Vegetable, PlantType::Herb];
const ALL_TYPES: &[PlantType] = &[
    PlantType::Vegetable,
    PlantType::Herb,
    PlantType::Flower,
    PlantType::Other,
];

const US_NORTHEAST: &[GrowingTip] = &[
    GrowingTip {
        text: "Start seeds indoors 6-8 weeks before the last frost to make up for the short season",
        applies_to: VEG,
        seasons: &[Season::Winter, Season::Spring],
    },
    GrowingTip {
        text: "Use row covers through May; late frosts are common even after warm spells",
        applies_to: VEG_HERB,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Mulch beds heavily before the ground freezes to protect perennials",
        applies_to: ALL_TYPES,
        seasons: &[Season::Fall],
    },
    GrowingTip {
        text: "Test soil pH every few years; northeastern soils tend toward acidic",
        applies_to: ALL_TYPES,
        seasons: &[],
    },
];

const US_SOUTHEAST: &[GrowingTip] = &[
    GrowingTip {
        text: "Plant a second round of warm-season crops in midsummer for a fall harvest",
        applies_to: VEG,
        seasons: &[Season::Summer],
    },
    GrowingTip {
        text: "Provide afternoon shade for greens; summer heat bolts them quickly",
        applies_to: VEG_HERB,
        seasons: &[Season::Summer],
    },
    GrowingTip {
        text: "Grow cool-season vegetables straight through the mild winter",
        applies_to: VEG,
        seasons: &[Season::Winter],
    },
];

const US_MIDWEST: &[GrowingTip] = &[
    GrowingTip {
        text: "Wait for soil to dry before working beds; heavy spring rains compact clay soils",
        applies_to: VEG,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Windbreaks help young transplants establish on open ground",
        applies_to: ALL_TYPES,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Harvest root crops after the first light frost for better flavor",
        applies_to: VEG,
        seasons: &[Season::Fall],
    },
];

const US_NORTHWEST: &[GrowingTip] = &[
    GrowingTip {
        text: "Choose short-season tomato varieties; cool cloudy summers slow ripening",
        applies_to: VEG,
        seasons: &[Season::Spring, Season::Summer],
    },
    GrowingTip {
        text: "Raised beds drain faster during the long wet season",
        applies_to: ALL_TYPES,
        seasons: &[],
    },
];

const UK_NORTH: &[GrowingTip] = &[
    GrowingTip {
        text: "A cold frame or cloche extends the short northern season at both ends",
        applies_to: VEG_HERB,
        seasons: &[Season::Spring, Season::Fall],
    },
    GrowingTip {
        text: "Choose hardy varieties bred for Scottish conditions where possible",
        applies_to: VEG,
        seasons: &[],
    },
];

const UK_MIDLANDS: &[GrowingTip] = &[
    GrowingTip {
        text: "Delay tender transplants until late May; frost pockets linger inland",
        applies_to: VEG,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Net brassicas early; pigeons strip seedlings over winter",
        applies_to: VEG,
        seasons: &[Season::Fall, Season::Winter],
    },
];

const UK_SOUTH: &[GrowingTip] = &[
    GrowingTip {
        text: "Autumn sowings of broad beans and garlic overwinter well in the mild south",
        applies_to: VEG,
        seasons: &[Season::Fall],
    },
    GrowingTip {
        text: "Water consistently in summer; southern dry spells stress shallow-rooted crops",
        applies_to: VEG_HERB,
        seasons: &[Season::Summer],
    },
    GrowingTip {
        text: "Most Mediterranean herbs thrive outdoors year-round here",
        applies_to: &[PlantType::Herb],
        seasons: &[],
    },
];

const CA_WEST_COAST: &[GrowingTip] = &[
    GrowingTip {
        text: "Mild wet winters allow overwintering greens without protection",
        applies_to: VEG,
        seasons: &[Season::Winter],
    },
    GrowingTip {
        text: "Improve drainage before the rains; waterlogged roots kill more plants than cold",
        applies_to: ALL_TYPES,
        seasons: &[Season::Fall],
    },
];

const CA_PRAIRIE: &[GrowingTip] = &[
    GrowingTip {
        text: "Wait for the June frost-free date; prairie springs turn cold overnight",
        applies_to: VEG,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Choose early-maturing varieties rated for under 100 days",
        applies_to: VEG,
        seasons: &[],
    },
];

const CA_CENTRAL: &[GrowingTip] = &[
    GrowingTip {
        text: "Start heat-loving crops indoors; the frost-free window is short",
        applies_to: VEG,
        seasons: &[Season::Winter, Season::Spring],
    },
    GrowingTip {
        text: "Snow cover is good insulation; avoid clearing it off perennial beds",
        applies_to: &[PlantType::Flower],
        seasons: &[Season::Winter],
    },
    GrowingTip {
        text: "Harden off transplants for a full week before setting out",
        applies_to: VEG_HERB,
        seasons: &[Season::Spring],
    },
];

const AU_NORTHERN: &[GrowingTip] = &[
    GrowingTip {
        text: "Grow through the dry season; the wet season drowns most vegetables",
        applies_to: VEG,
        seasons: &[],
    },
    GrowingTip {
        text: "Shade cloth is essential for leafy greens in the tropics",
        applies_to: VEG_HERB,
        seasons: &[Season::Summer],
    },
];

const AU_CENTRAL: &[GrowingTip] = &[
    GrowingTip {
        text: "Mulch deeply and water at dawn to cope with arid summers",
        applies_to: ALL_TYPES,
        seasons: &[Season::Summer],
    },
    GrowingTip {
        text: "Autumn is the main planting season once the heat breaks",
        applies_to: VEG,
        seasons: &[Season::Fall],
    },
];

const AU_SOUTHERN: &[GrowingTip] = &[
    GrowingTip {
        text: "Sow cool-season crops in autumn for harvest through the mild winter",
        applies_to: VEG,
        seasons: &[Season::Fall],
    },
    GrowingTip {
        text: "Protect seedlings from hot northerly winds in spring",
        applies_to: VEG_HERB,
        seasons: &[Season::Spring],
    },
    GrowingTip {
        text: "Frost-tender plants need cover on clear winter nights inland",
        applies_to: ALL_TYPES,
        seasons: &[Season::Winter],
    },
];

/// Region assumed for a country when no tips exist for the resolved bucket
fn default_region(country: CountryCode) -> Region {
    match country {
        CountryCode::Us => Region::Northeast,
        CountryCode::Uk => Region::South,
        CountryCode::Ca => Region::Central,
        CountryCode::Au => Region::Southern,
    }
}

fn tips_for(country: CountryCode, region: Region) -> &'static [GrowingTip] {
    match (country, region) {
        (CountryCode::Us, Region::Northeast) => US_NORTHEAST,
        (CountryCode::Us, Region::Southeast) => US_SOUTHEAST,
        (CountryCode::Us, Region::Midwest) => US_MIDWEST,
        (CountryCode::Us, Region::Northwest) => US_NORTHWEST,
        (CountryCode::Uk, Region::North) => UK_NORTH,
        (CountryCode::Uk, Region::Midlands) => UK_MIDLANDS,
        (CountryCode::Uk, Region::South) => UK_SOUTH,
        (CountryCode::Ca, Region::WestCoast) => CA_WEST_COAST,
        (CountryCode::Ca, Region::Prairie) => CA_PRAIRIE,
        (CountryCode::Ca, Region::Central) => CA_CENTRAL,
        (CountryCode::Au, Region::Northern) => AU_NORTHERN,
        (CountryCode::Au, Region::Central) => AU_CENTRAL,
        (CountryCode::Au, Region::Southern) => AU_SOUTHERN,
        _ => &[],
    }
}

/// Look up growing tips for a region, filtered by plant type and season.
///
/// Regions with no list of their own borrow the country default's.
#[must_use]
pub fn regional_tips(
    country: CountryCode,
    region: Region,
    plant_type: Option<PlantType>,
    season: Option<Season>,
) -> Vec<GrowingTip> {
    let mut tips = tips_for(country, region);
    if tips.is_empty() {
        tips = tips_for(country, default_region(country));
    }

    tips.iter()
        .filter(|tip| {
            let matches_type = plant_type.is_none_or(|t| tip.applies_to.contains(&t));
            let matches_season =
                season.is_none_or(|s| tip.seasons.is_empty() || tip.seasons.contains(&s));
            matches_type && matches_season
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_by_plant_type() {
        let tips = regional_tips(
            CountryCode::Uk,
            Region::South,
            Some(PlantType::Herb),
            None,
        );
        assert!(!tips.is_empty());
        assert!(tips.iter().all(|t| t.applies_to.contains(&PlantType::Herb)));
    }

    #[test]
    fn test_filters_by_season() {
        let tips = regional_tips(
            CountryCode::Us,
            Region::Northeast,
            Some(PlantType::Vegetable),
            Some(Season::Spring),
        );
        assert!(!tips.is_empty());
        for tip in &tips {
            assert!(tip.seasons.is_empty() || tip.seasons.contains(&Season::Spring));
        }
    }

    #[test]
    fn test_year_round_tips_match_any_season() {
        let tips = regional_tips(
            CountryCode::Us,
            Region::Northeast,
            None,
            Some(Season::Summer),
        );
        assert!(tips.iter().any(|t| t.seasons.is_empty()));
    }

    #[test]
    fn test_unlisted_region_falls_back_to_country_default() {
        // No dedicated list for the US southwest; northeast tips stand in
        let fallback = regional_tips(CountryCode::Us, Region::Southwest, None, None);
        let default = regional_tips(CountryCode::Us, Region::Northeast, None, None);
        assert_eq!(fallback, default);
        assert!(!fallback.is_empty());
    }

    #[test]
    fn test_au_southern_autumn_vegetable_tips() {
        let tips = regional_tips(
            CountryCode::Au,
            Region::Southern,
            Some(PlantType::Vegetable),
            Some(Season::Fall),
        );
        assert!(tips.iter().any(|t| t.text.contains("autumn")));
    }
}
