//! Static emote and free-item catalogs.
//!
//! Both tables are fixed at build time and read-only at runtime. Emote lookup
//! keys are normalized by lowercasing and stripping spaces so that chat input
//! like `/Heart Eyes` resolves the same as `/hearteyes`.

use std::collections::HashMap;

/// Display name → platform emote id.
const EMOTES: &[(&str, &str)] = &[
    ("Sit", "idle-loop-sitfloor"),
    ("Enthused", "idle-enthusiastic"),
    ("Yes", "emote-yes"),
    ("The Wave", "emote-wave"),
    ("Tired", "emote-tired"),
    ("Snowball Fight!", "emote-snowball"),
    ("Snow Angel", "emote-snowangel"),
    ("Shy", "emote-shy"),
    ("Sad", "emote-sad"),
    ("No", "emote-no"),
    ("Model", "emote-model"),
    ("Flirty Wave", "emote-lust"),
    ("Laugh", "emote-laughing"),
    ("Kiss", "emote-kiss"),
    ("Sweating", "emote-hot"),
    ("Hello", "emote-hello"),
    ("Face Palm", "emote-exasperatedb"),
    ("Curtsy", "emote-curtsy"),
    ("Confusion", "emote-confused"),
    ("Charging", "emote-charging"),
    ("Bow", "emote-bow"),
    ("Thumbs Up", "emoji-thumbsup"),
    ("Flex", "emoji-flex"),
    ("Raise The Roof", "emoji-celebrate"),
    ("Angry", "emoji-angry"),
    ("Savage Dance", "dance-tiktok8"),
    ("Don't Start Now", "dance-tiktok2"),
    ("Let's Go Shopping", "dance-shoppingcart"),
    ("Russian Dance", "dance-russian"),
    ("Macarena", "dance-macarena"),
    ("K-Pop Dance", "dance-blackpink"),
    ("Hyped", "emote-hyped"),
    ("Jinglebell", "dance-jinglebell"),
    ("Nervous", "idle-nervous"),
    ("Astronaut", "emote-astronaut"),
    ("Dance Zombie", "dance-zombie"),
    ("Heart Eyes", "emote-hearteyes"),
    ("Swordfight", "emote-swordfight"),
    ("Snake", "emote-snake"),
    ("Heart Fingers", "emote-heartfingers"),
    ("Float", "emote-float"),
    ("Telekinesis", "emote-telekinesis"),
    ("Penguin Dance", "dance-pinguin"),
    ("Sleigh", "emote-sleigh"),
    ("Energy Ball", "emote-energyball"),
    ("Singing", "idle_singing"),
    ("Frog", "emote-frog"),
    ("Cute", "emote-cute"),
    ("Casual Dance", "idle-dance-casual"),
    ("Punk Guitar", "emote-punkguitar"),
    ("Fashionista", "emote-fashionista"),
    ("Gravity", "emote-gravity"),
    ("Ice Cream Dance", "dance-icecream"),
    ("UwU", "idle-uwu"),
    ("Anime Dance", "dance-anime"),
    ("Kawaii", "dance-kawai"),
    ("Ice Skating", "emote-iceskating"),
    ("Celebration Step", "emote-celebrationstep"),
    ("Boxer", "emote-boxer"),
    ("Teleporting", "emote-teleporting"),
    ("Air Guitar", "idle-guitar"),
    ("This Is For You", "emote-gift"),
    ("Push It", "dance-employee"),
];

/// Free starter items per category: category → (item id, display name).
pub const FREE_ITEMS: &[(&str, &[(&str, &str)])] = &[
    (
        "top",
        &[
            ("shirt-n_starteritems2019tankwhite", "Tank - White"),
            ("shirt-n_starteritems2019tankblack", "Tank - Black"),
            ("shirt-n_starteritems2019raglanwhite", "Raglan - White"),
            ("shirt-n_starteritems2019raglanblack", "Raglan - Black"),
            ("shirt-n_starteritems2019pulloverwhite", "Pullover - White"),
            ("shirt-n_starteritems2019pulloverblack", "Pullover - Black"),
            ("shirt-n_room32019hoodiered", "Red Raglan Hoodie"),
            ("shirt-n_room22109denimjacket", "Classic Denim Jacket"),
            ("shirt-n_room22019tuckedtstripes", "Striped Shirt"),
            ("shirt-n_room12019buttondownblack", "Black Button Down"),
            ("shirt-f_skullsweaterblack", "Black Skull Sweater"),
            ("shirt-f_marchingband", "Marching Band Top"),
        ],
    ),
    (
        "bottom",
        &[
            ("pants-n_starteritems2019jeansblack", "Jeans - Black"),
            ("pants-n_starteritems2019jeansblue", "Jeans - Blue"),
            ("pants-n_starteritems2019shortsblack", "Shorts - Black"),
            ("pants-n_starteritems2019skirtblue", "Skirt - Blue"),
            ("pants-n_room32019trackpantsblack", "Black Track Pants"),
            ("pants-n_room22019denimshorts", "Denim Shorts"),
        ],
    ),
    (
        "shoes",
        &[
            ("shoes-n_starteritems2019sneakerswhite", "Sneakers - White"),
            ("shoes-n_starteritems2019sneakersblack", "Sneakers - Black"),
            ("shoes-n_starteritems2019highheelsblack", "High Heels - Black"),
            ("shoes-n_room32019sneakersred", "Red Sneakers"),
            ("shoes-n_room22019bootsblack", "Black Boots"),
        ],
    ),
    (
        "hair_front",
        &[
            ("hair_front-n_malenew10", "Buzz Cut"),
            ("hair_front-n_malenew24", "Tight Curls"),
            ("hair_front-n_malenew32", "Box Braids"),
            ("hair_front-n_basic2020overshoulderwavy", "Over Shoulder Wavy Long"),
            ("hair_front-n_basic2020overshoulderpony", "Over Shoulder Pony"),
            ("hair_front-n_basic2018topknot", "Top Knot"),
            ("hair_front-n_basic2018straightfullbangs", "Straight Full Bangs"),
        ],
    ),
    (
        "hair_back",
        &[
            ("hair_back-n_malenew10", "Buzz Cut"),
            ("hair_back-n_malenew24", "Tight Curls"),
            ("hair_back-n_malenew32", "Box Braids"),
            ("hair_back-n_basic2020overshoulderwavy", "Over Shoulder Wavy Long"),
            ("hair_back-n_basic2020overshoulderpony", "Over Shoulder Pony"),
            ("hair_back-n_basic2018topknotback", "Top Knot Back"),
            ("hair_back-n_basic2018straightlong", "Straight Long"),
        ],
    ),
    (
        "accessories",
        &[
            ("glasses-n_basic2018round", "Round Glasses"),
            ("glasses-n_basic2018aviator", "Aviator Glasses"),
            ("hat-n_basic2018beanie", "Beanie"),
            ("hat-n_basic2018cap", "Cap"),
            ("earrings-n_basic2018studs", "Stud Earrings"),
            ("earrings-n_basic2018hoops", "Hoop Earrings"),
        ],
    ),
];

/// Clothing categories accepted by `/remove` and `/color`.
pub const OUTFIT_CATEGORIES: &[&str] = &[
    "aura", "bag", "blush", "body", "dress", "earrings", "eye", "eyebrow", "freckle", "fullsuit",
    "glasses", "gloves", "hair_back", "hair_front", "handbag", "hat", "jacket", "lashes", "mole",
    "mouth", "necklace", "nose", "shirt", "shoes", "shorts", "skirt", "sock", "tattoo", "watch",
];

/// Emote lookup table with normalized keys.
pub struct EmoteCatalog {
    index: HashMap<String, &'static str>,
}

impl EmoteCatalog {
    pub fn new() -> Self {
        let index = EMOTES
            .iter()
            .map(|(name, id)| (Self::normalize(name), *id))
            .collect();
        Self { index }
    }

    /// Lowercase and strip whitespace: `"Heart Eyes"` → `"hearteyes"`.
    pub fn normalize(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.index.get(&Self::normalize(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&Self::normalize(name))
    }

    /// Display names in catalog order, for `/emotes` listings.
    pub fn display_names() -> impl Iterator<Item = &'static str> {
        EMOTES.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for EmoteCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Items of a free-item category, if the category exists.
pub fn free_items_in(category: &str) -> Option<&'static [(&'static str, &'static str)]> {
    FREE_ITEMS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, items)| *items)
}

/// Free-item category names in table order.
pub fn free_item_categories() -> impl Iterator<Item = &'static str> {
    FREE_ITEMS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(EmoteCatalog::normalize("Heart Eyes"), "hearteyes");
        assert_eq!(EmoteCatalog::normalize("  The Wave "), "thewave");
        assert_eq!(EmoteCatalog::normalize("bow"), "bow");
    }

    #[test]
    fn test_lookup_by_display_name_variants() {
        let catalog = EmoteCatalog::new();
        assert_eq!(catalog.get("Heart Eyes"), Some("emote-hearteyes"));
        assert_eq!(catalog.get("hearteyes"), Some("emote-hearteyes"));
        assert_eq!(catalog.get("HEARTEYES"), Some("emote-hearteyes"));
        assert!(catalog.get("notanemote").is_none());
    }

    #[test]
    fn test_catalog_is_fully_indexed() {
        let catalog = EmoteCatalog::new();
        assert_eq!(catalog.len(), EMOTES.len());
        for name in EmoteCatalog::display_names() {
            assert!(catalog.contains(name), "missing emote: {}", name);
        }
    }

    #[test]
    fn test_free_items_lookup() {
        let tops = free_items_in("top").unwrap();
        assert!(!tops.is_empty());
        assert!(tops.iter().all(|(id, _)| id.starts_with("shirt-")));
        assert!(free_items_in("spaceship").is_none());
    }

    #[test]
    fn test_free_item_categories() {
        let categories: Vec<_> = free_item_categories().collect();
        assert!(categories.contains(&"top"));
        assert!(categories.contains(&"shoes"));
    }

    #[test]
    fn test_outfit_categories_include_basics() {
        assert!(OUTFIT_CATEGORIES.contains(&"shirt"));
        assert!(OUTFIT_CATEGORIES.contains(&"hair_front"));
        assert!(!OUTFIT_CATEGORIES.contains(&"top"));
    }
}
