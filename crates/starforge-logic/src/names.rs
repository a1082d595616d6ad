//! Name tables for generated systems, planets and NPC ships.

use rand::seq::SliceRandom;
use rand::Rng;

const SYSTEM_PREFIXES: &[&str] = &[
    "Alpha", "Beta", "Gamma", "Delta", "Epsilon", "Zeta", "Eta", "Theta", "Iota", "Kappa",
];

const SYSTEM_SUFFIXES: &[&str] = &[
    "Centauri", "Draconis", "Herculis", "Pegasi", "Vega", "Sirius", "Proxima", "Sol",
];

const PIRATE_PREFIXES: &[&str] = &[
    "Crimson", "Shadow", "Void", "Rogue", "Dark", "Steel", "Iron", "Blood",
];

const PIRATE_SUFFIXES: &[&str] = &[
    "Raider", "Marauder", "Reaver", "Corsair", "Brigand", "Bandit", "Pirate",
];

fn pick<'a>(table: &[&'a str], rng: &mut impl Rng) -> &'a str {
    table.choose(rng).copied().unwrap_or("Unknown")
}

pub fn system_name(rng: &mut impl Rng) -> String {
    format!("{} {}", pick(SYSTEM_PREFIXES, rng), pick(SYSTEM_SUFFIXES, rng))
}

/// Planets are lettered from `I` onward within their system.
pub fn planet_name(system_name: &str, index: usize) -> String {
    let letter = char::from_u32('I' as u32 + index as u32).unwrap_or('X');
    format!("{} {}", system_name, letter)
}

pub fn pirate_name(rng: &mut impl Rng) -> String {
    format!("{} {}", pick(PIRATE_PREFIXES, rng), pick(PIRATE_SUFFIXES, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_planet_letters() {
        assert_eq!(planet_name("Vega Prime", 0), "Vega Prime I");
        assert_eq!(planet_name("Vega Prime", 1), "Vega Prime J");
    }

    #[test]
    fn test_generated_names_use_tables() {
        let mut rng = StdRng::seed_from_u64(3);
        let name = system_name(&mut rng);
        let (prefix, suffix) = name.split_once(' ').unwrap();
        assert!(SYSTEM_PREFIXES.contains(&prefix));
        assert!(SYSTEM_SUFFIXES.contains(&suffix));

        let pirate = pirate_name(&mut rng);
        let (prefix, suffix) = pirate.split_once(' ').unwrap();
        assert!(PIRATE_PREFIXES.contains(&prefix));
        assert!(PIRATE_SUFFIXES.contains(&suffix));
    }
}
