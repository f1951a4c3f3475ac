//! Healing potions and how to pick one.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Potion {
    pub id: u32,
    pub name: &'static str,
    pub heal: i32,
}

const fn potion(id: u32, name: &'static str, heal: i32) -> Potion {
    Potion { id, name, heal }
}

pub const HEALING_POTIONS: [Potion; 16] = [
    potion(30011, "Healing Vial", 15),
    potion(30012, "Healing Flask", 25),
    potion(30013, "Healing Potion", 35),
    potion(30014, "Healing Bottle", 50),
    potion(30021, "Potion of Regeneration", 60),
    potion(30022, "Potion of Fortitude", 70),
    potion(30023, "Potion of Growth", 80),
    potion(30031, "Potion of Potent Health", 90),
    potion(30032, "Potion of Greater Health", 100),
    potion(30033, "Potion of Abundant Health", 110),
    potion(30041, "Vitality Potion", 120),
    potion(30042, "Stamina Potion", 130),
    potion(30043, "Constitution Potion", 140),
    potion(30051, "Faerie's Gift Potion", 150),
    potion(30052, "Fyora's Blessing Potion", 160),
    potion(30053, "Jhudora's Lifeforce Potion", 170),
];

pub const DEFAULT_HEAL_THRESHOLD: f64 = 0.55;

/// Every potion, least wasted healing first. Ties keep table order.
pub fn rank_by_efficiency(current_hp: i32, max_hp: i32) -> Vec<Potion> {
    let missing = max_hp - current_hp;
    let mut ranked = HEALING_POTIONS.to_vec();
    // sort_by_key is stable
    ranked.sort_by_key(|p| (p.heal - missing).abs());
    ranked
}

pub fn needs_healing(current_hp: i32, max_hp: i32, threshold: f64) -> bool {
    if max_hp <= 0 {
        return false;
    }
    f64::from(current_hp) / f64::from(max_hp) < threshold
}

/// The best ranked potion whose name is in `available` (case-insensitive).
pub fn best_available<S: AsRef<str>>(current_hp: i32, max_hp: i32, available: &[S]) -> Option<Potion> {
    let available: Vec<String> = available
        .iter()
        .map(|name| name.as_ref().to_lowercase())
        .collect();
    rank_by_efficiency(current_hp, max_hp)
        .into_iter()
        .find(|p| available.contains(&p.name.to_lowercase()))
}

/// Names of the healing potions mentioned anywhere in `html`.
pub fn potions_in_page(html: &str) -> Vec<&'static str> {
    let text = crate::html::decode_entities(html);
    HEALING_POTIONS
        .iter()
        .filter(|p| text.contains(p.name))
        .map(|p| p.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(current: i32, max: i32) -> (u32, &'static str) {
        let best = rank_by_efficiency(current, max)[0];
        (best.id, best.name)
    }

    #[test]
    fn test_standard_case() {
        // 65 missing sits between Regeneration (60) and Fortitude (70)
        assert!(matches!(first(35, 100).0, 30021 | 30022));
    }

    #[test]
    fn test_full_and_nearly_full_health() {
        assert_eq!(first(100, 100), (30011, "Healing Vial"));
        assert_eq!(first(99, 100), (30011, "Healing Vial"));
        assert_eq!(first(85, 100), (30011, "Healing Vial"));
    }

    #[test]
    fn test_fully_missing_health() {
        assert_eq!(first(0, 100), (30032, "Potion of Greater Health"));
    }

    #[test]
    fn test_negative_hp_still_ranks_everything() {
        let ranked = rank_by_efficiency(-10, 100);
        assert_eq!(ranked.len(), HEALING_POTIONS.len());
        assert!(ranked.iter().any(|p| p.id == 30014));
    }

    #[test]
    fn test_ordering_with_ties() {
        // missing = 130: Stamina exact, then Vitality/Constitution tie in table order
        let ids: Vec<u32> = rank_by_efficiency(70, 200).iter().map(|p| p.id).collect();
        assert_eq!(&ids[..3], &[30042, 30041, 30043]);

        let mut expected = HEALING_POTIONS.to_vec();
        expected.sort_by_key(|p| (p.heal - 130).abs());
        assert_eq!(ids, expected.iter().map(|p| p.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_needs_healing() {
        assert!(needs_healing(54, 100, DEFAULT_HEAL_THRESHOLD));
        assert!(!needs_healing(55, 100, DEFAULT_HEAL_THRESHOLD));
        assert!(!needs_healing(0, 0, DEFAULT_HEAL_THRESHOLD));
    }

    #[test]
    fn test_best_available() {
        let bag = ["healing flask", "Potion of Growth"];
        // 75 missing: Growth (80) beats Flask (25)
        assert_eq!(best_available(25, 100, &bag).map(|p| p.id), Some(30023));
        // 20 missing: Flask (25) beats Growth
        assert_eq!(best_available(80, 100, &bag).map(|p| p.id), Some(30012));
        assert_eq!(best_available::<&str>(10, 100, &[]), None);
    }

    #[test]
    fn test_potions_in_page() {
        let html = "<select><option>Healing Vial x3</option><option>Faerie&#39;s Gift Potion x1</option></select>";
        assert_eq!(potions_in_page(html), vec!["Healing Vial", "Faerie's Gift Potion"]);
    }

    #[test]
    fn test_potions_in_page_with_other_apostrophe_escapes() {
        let html = "<option>Fyora&apos;s Blessing Potion (1)</option><option>Jhudora&#039;s Lifeforce Potion (2)</option>";
        assert_eq!(
            potions_in_page(html),
            vec!["Fyora's Blessing Potion", "Jhudora's Lifeforce Potion"]
        );
    }
}
