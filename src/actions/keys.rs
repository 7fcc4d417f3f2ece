use rand::seq::SliceRandom;
use rand::Rng;

use crate::input::keyboard::KeyTiming;

const SPACE: &str = "space";
const SKILL_CHANCE: f64 = 0.4;
const SKILL_KEYS: [&str; 2] = ["1", "2"];

/// Short walks, turns and jumps for the anti-idle mode.
pub const MOVEMENT_PATTERNS: [&[&str]; 20] = [
    // forward
    &["w", "w", "w", "space"],
    &["w", "w", "d", "w"],
    &["w", "a", "w", "w"],
    &["w", "w", "space", "w"],
    // backward
    &["s", "s", "s", "space"],
    &["s", "a", "s", "s"],
    &["s", "d", "s", "s"],
    // strafe
    &["a", "a", "space", "a"],
    &["d", "d", "space", "d"],
    &["a", "w", "a", "w"],
    &["d", "w", "d", "w"],
    // combos
    &["w", "space", "d", "w", "w"],
    &["w", "space", "a", "w", "w"],
    &["w", "d", "space", "w"],
    &["w", "a", "space", "w"],
    &["s", "space", "a", "s"],
    &["s", "space", "d", "s"],
    // jump in place
    &["space", "a", "a", "space"],
    &["space", "d", "d", "space"],
    &["space", "w", "w", "space"],
];

/// Splits a key string left to right. `"space"` is taken as one key wherever
/// it appears; every other character is its own key. A word that happens to
/// contain "space" is split the same way.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        if rest.starts_with(SPACE) {
            keys.push(SPACE.to_string());
            rest = &rest[SPACE.len()..];
        } else {
            keys.push(ch.to_string());
            rest = &rest[ch.len_utf8()..];
        }
    }

    keys
}

/// What one firing presses.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionMode {
    /// A random movement pattern, sometimes followed by a skill key.
    Random,
    /// The same tokenized keys every time.
    Literal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub keys: Vec<String>,
    pub timing: KeyTiming,
    pub description: String,
}

impl ActionPlan {
    pub fn draw<R: Rng + ?Sized>(mode: &ActionMode, rng: &mut R) -> Self {
        match mode {
            ActionMode::Random => Self::random(rng),
            ActionMode::Literal(keys) => Self {
                keys: keys.clone(),
                timing: KeyTiming::literal(),
                description: format!("sequence {}", describe(keys)),
            },
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pattern = MOVEMENT_PATTERNS
            .choose(rng)
            .copied()
            .unwrap_or(MOVEMENT_PATTERNS[0]);
        let mut keys: Vec<String> = pattern.iter().map(|key| key.to_string()).collect();
        let mut description = describe(&keys);

        if rng.gen_bool(SKILL_CHANCE) {
            if let Some(skill) = SKILL_KEYS.choose(rng) {
                keys.push(skill.to_string());
                description.push_str(&format!(" + skill {skill}"));
            }
        }

        Self {
            keys,
            timing: KeyTiming::movement(),
            description,
        }
    }
}

fn describe(keys: &[String]) -> String {
    keys.iter()
        .map(|key| {
            if key == SPACE {
                "JUMP".to_string()
            } else {
                key.to_uppercase()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keycodes::key_code;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tokenize_single_characters() {
        let keys = tokenize("wwadss1122");
        assert_eq!(keys.len(), 10);
        assert_eq!(keys, vec!["w", "w", "a", "d", "s", "s", "1", "1", "2", "2"]);
    }

    #[test]
    fn test_tokenize_space_keyword() {
        assert_eq!(tokenize("wwspacea"), vec!["w", "w", "space", "a"]);
        assert_eq!(tokenize("spacespace"), vec!["space", "space"]);
        assert_eq!(tokenize("spac"), vec!["s", "p", "a", "c"]);
    }

    #[test]
    fn test_tokenize_space_inside_word_is_greedy() {
        assert_eq!(tokenize("aspaces"), vec!["a", "space", "s"]);
    }

    #[test]
    fn test_tokenize_multibyte_and_empty() {
        assert!(tokenize("").is_empty());
        assert_eq!(tokenize("w确"), vec!["w", "确"]);
    }

    #[test]
    fn test_movement_patterns_use_known_keys() {
        for pattern in MOVEMENT_PATTERNS {
            assert!((4..=5).contains(&pattern.len()));
            for key in pattern {
                assert!(["w", "a", "s", "d", "space"].contains(key));
                assert!(key_code(key).is_some());
            }
        }
    }

    #[test]
    fn test_random_plans_sometimes_add_one_skill_key() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut with_skill = 0;

        for _ in 0..1000 {
            let plan = ActionPlan::draw(&ActionMode::Random, &mut rng);
            assert_eq!(plan.timing, KeyTiming::movement());

            let movement = &plan.keys[..];
            let is_pattern = |keys: &[String]| {
                MOVEMENT_PATTERNS
                    .iter()
                    .any(|pattern| pattern.iter().copied().eq(keys.iter().map(String::as_str)))
            };

            if is_pattern(movement) {
                continue;
            }
            let (last, head) = movement.split_last().unwrap();
            assert!(SKILL_KEYS.contains(&last.as_str()));
            assert!(is_pattern(head));
            assert!(plan.description.ends_with(&format!("skill {last}")));
            with_skill += 1;
        }

        assert!((300..=500).contains(&with_skill), "{with_skill}");
    }

    #[test]
    fn test_literal_plan_is_fixed() {
        let mut rng = StdRng::seed_from_u64(3);
        let mode = ActionMode::Literal(tokenize("wspace1"));

        let plan = ActionPlan::draw(&mode, &mut rng);

        assert_eq!(plan.keys, vec!["w", "space", "1"]);
        assert_eq!(plan.timing, KeyTiming::literal());
        assert_eq!(plan.description, "sequence W-JUMP-1");
    }
}
