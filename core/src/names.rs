//! Deterministic display-name generation from an email address.
//!
//! The local part of the email is split into a first-name token and a
//! surname token, then mapped through curated transliteration tables to
//! Hebrew display names. Tokens without a mapping draw from localized
//! name pools, so the display name is always localized.
//! All generation is deterministic (same RNG stream = same names).

use crate::rng::SeededRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Latin tokens parsed from an email's local part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub first: String,
    pub last:  String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedName {
    pub first: String,
    pub last:  String,
    pub latin: String,
}

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Split `yossi.cohen+hr@x.com` into `yossi` / `cohen`.
    /// A missing surname token reuses the first-name token.
    pub fn parse_email(email: &str) -> ParsedName {
        let local = email.split('@').next().unwrap_or_default().to_lowercase();
        let local = local.split('+').next().unwrap_or_default();
        let tokens: Vec<String> = local
            .split(['.', '_', '-'])
            .map(|t| t.chars().filter(|c| c.is_alphabetic()).collect::<String>())
            .filter(|t| !t.is_empty())
            .collect();

        let first = tokens.first().cloned().unwrap_or_default();
        let last = tokens.get(1).cloned().unwrap_or_else(|| first.clone());
        ParsedName { first, last }
    }

    /// Heuristic gender guess from a Latin first-name token.
    pub fn guess_gender(token: &str) -> Gender {
        if let Some((_, _, gender)) = FIRST_NAMES.iter().find(|(latin, _, _)| *latin == token) {
            return *gender;
        }
        if token.ends_with('a') || token.ends_with("it") || token.ends_with("ah") {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    /// Localized first + last name for `email`.
    pub fn localize(email: &str, rng: &mut SeededRng) -> LocalizedName {
        let parsed = Self::parse_email(email);
        let gender = Self::guess_gender(&parsed.first);

        let first = match lookup_first(&parsed.first) {
            Some(name) => name.to_string(),
            None       => Self::random_first_name(gender, rng).to_string(),
        };
        let last = match lookup_last(&parsed.last).or_else(|| lookup_first(&parsed.last)) {
            Some(name) => name.to_string(),
            None       => Self::random_last_name(rng).to_string(),
        };

        LocalizedName {
            first,
            last,
            latin: latin_display(&parsed),
        }
    }

    pub fn random_first_name(gender: Gender, rng: &mut SeededRng) -> &'static str {
        let pool = match gender {
            Gender::Male   => MALE_POOL,
            Gender::Female => FEMALE_POOL,
        };
        pool.get(rng.next_below(pool.len())).copied().unwrap_or("דני")
    }

    /// A referred candidate: localized display name plus a Latin email.
    pub fn random_candidate(rng: &mut SeededRng) -> (String, String) {
        let (first_latin, first_local, _) = FIRST_NAMES[rng.next_below(FIRST_NAMES.len())];
        let (last_latin, last_local) = LAST_NAMES[rng.next_below(LAST_NAMES.len())];
        (
            format!("{first_local} {last_local}"),
            format!("{first_latin}.{last_latin}@example.com"),
        )
    }

    pub fn random_last_name(rng: &mut SeededRng) -> &'static str {
        SURNAME_POOL
            .get(rng.next_below(SURNAME_POOL.len()))
            .copied()
            .unwrap_or("כהן")
    }
}

fn lookup_first(token: &str) -> Option<&'static str> {
    FIRST_NAMES
        .iter()
        .find(|(latin, _, _)| *latin == token)
        .map(|(_, local, _)| *local)
}

fn lookup_last(token: &str) -> Option<&'static str> {
    LAST_NAMES
        .iter()
        .find(|(latin, _)| *latin == token)
        .map(|(_, local)| *local)
}

fn latin_display(parsed: &ParsedName) -> String {
    if parsed.first.is_empty() {
        return "Guest".to_string();
    }
    if parsed.first == parsed.last {
        return capitalize(&parsed.first);
    }
    format!("{} {}", capitalize(&parsed.first), capitalize(&parsed.last))
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None    => String::new(),
    }
}

/// Latin first-name token → Hebrew display name.
const FIRST_NAMES: &[(&str, &str, Gender)] = &[
    ("yossi", "יוסי", Gender::Male),
    ("yosef", "יוסף", Gender::Male),
    ("david", "דוד", Gender::Male),
    ("moshe", "משה", Gender::Male),
    ("avi", "אבי", Gender::Male),
    ("eli", "אלי", Gender::Male),
    ("daniel", "דניאל", Gender::Male),
    ("dani", "דני", Gender::Male),
    ("itai", "איתי", Gender::Male),
    ("omer", "עומר", Gender::Male),
    ("amit", "עמית", Gender::Male),
    ("yonatan", "יונתן", Gender::Male),
    ("jonathan", "יונתן", Gender::Male),
    ("noam", "נועם", Gender::Male),
    ("ariel", "אריאל", Gender::Male),
    ("uri", "אורי", Gender::Male),
    ("guy", "גיא", Gender::Male),
    ("ido", "עידו", Gender::Male),
    ("tomer", "תומר", Gender::Male),
    ("ron", "רון", Gender::Male),
    ("gal", "גל", Gender::Male),
    ("nir", "ניר", Gender::Male),
    ("eyal", "אייל", Gender::Male),
    ("michael", "מיכאל", Gender::Male),
    ("john", "יוחנן", Gender::Male),
    ("sarah", "שרה", Gender::Female),
    ("sara", "שרה", Gender::Female),
    ("rachel", "רחל", Gender::Female),
    ("michal", "מיכל", Gender::Female),
    ("noa", "נועה", Gender::Female),
    ("tamar", "תמר", Gender::Female),
    ("maya", "מאיה", Gender::Female),
    ("shira", "שירה", Gender::Female),
    ("yael", "יעל", Gender::Female),
    ("dana", "דנה", Gender::Female),
    ("hila", "הילה", Gender::Female),
    ("orit", "אורית", Gender::Female),
    ("liat", "ליאת", Gender::Female),
    ("adi", "עדי", Gender::Female),
    ("keren", "קרן", Gender::Female),
    ("ronit", "רונית", Gender::Female),
    ("efrat", "אפרת", Gender::Female),
    ("anna", "אנה", Gender::Female),
];

/// Latin surname token → Hebrew display name.
const LAST_NAMES: &[(&str, &str)] = &[
    ("cohen", "כהן"),
    ("kohen", "כהן"),
    ("levi", "לוי"),
    ("levy", "לוי"),
    ("mizrahi", "מזרחי"),
    ("peretz", "פרץ"),
    ("biton", "ביטון"),
    ("dahan", "דהן"),
    ("avraham", "אברהם"),
    ("friedman", "פרידמן"),
    ("azulay", "אזולאי"),
    ("malka", "מלכה"),
    ("katz", "כץ"),
    ("yosef", "יוסף"),
    ("david", "דוד"),
    ("amar", "עמר"),
    ("ohana", "אוחנה"),
    ("hadad", "חדד"),
    ("gabay", "גבאי"),
    ("shapira", "שפירא"),
    ("goldberg", "גולדברג"),
    ("rosenberg", "רוזנברג"),
    ("shalom", "שלום"),
    ("sasson", "ששון"),
    ("segal", "סגל"),
    ("weiss", "וייס"),
    ("smith", "סמית"),
];

const MALE_POOL: &[&str] = &[
    "אבי", "אורי", "איתי", "אלון", "גיא", "דוד", "דניאל", "יונתן", "יוסי",
    "נועם", "עומר", "עידו", "רון", "שחר", "תומר", "משה", "אריאל", "ניר",
];

const FEMALE_POOL: &[&str] = &[
    "אורית", "דנה", "הילה", "יעל", "מאיה", "מיכל", "נועה", "עדי", "רחל",
    "שירה", "שרה", "תמר", "ליאת", "קרן", "רונית", "אפרת",
];

const SURNAME_POOL: &[&str] = &[
    "כהן", "לוי", "מזרחי", "פרץ", "ביטון", "דהן", "אברהם", "פרידמן",
    "אזולאי", "מלכה", "כץ", "עמר", "אוחנה", "חדד", "גבאי", "שפירא",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_local_part() {
        let parsed = NameGenerator::parse_email("Yossi.Cohen@example.com");
        assert_eq!(parsed.first, "yossi");
        assert_eq!(parsed.last, "cohen");
    }

    #[test]
    fn missing_surname_reuses_first_token() {
        let parsed = NameGenerator::parse_email("david42@example.com");
        assert_eq!(parsed.first, "david");
        assert_eq!(parsed.last, "david");
    }

    #[test]
    fn mapped_names_are_transliterated() {
        let mut rng = SeededRng::from_seed_str("yossi.cohen@example.com");
        let name = NameGenerator::localize("yossi.cohen@example.com", &mut rng);
        assert_eq!(name.first, "יוסי");
        assert_eq!(name.last, "כהן");
        assert_eq!(name.latin, "Yossi Cohen");
    }

    #[test]
    fn unmapped_names_fall_back_to_localized_pool() {
        let mut rng = SeededRng::from_seed_str("zbigniew.qwerty@example.com");
        let name = NameGenerator::localize("zbigniew.qwerty@example.com", &mut rng);
        assert!(MALE_POOL.contains(&name.first.as_str()), "got {}", name.first);
        assert!(SURNAME_POOL.contains(&name.last.as_str()), "got {}", name.last);
    }

    #[test]
    fn gender_heuristic_uses_table_then_suffix() {
        assert_eq!(NameGenerator::guess_gender("michal"), Gender::Female);
        assert_eq!(NameGenerator::guess_gender("zofia"), Gender::Female);
        assert_eq!(NameGenerator::guess_gender("bartholomew"), Gender::Male);
    }

    #[test]
    fn name_generation_is_deterministic() {
        let mut rng1 = SeededRng::from_seed_str("x.y@z.com");
        let mut rng2 = SeededRng::from_seed_str("x.y@z.com");
        assert_eq!(
            NameGenerator::localize("x.y@z.com", &mut rng1),
            NameGenerator::localize("x.y@z.com", &mut rng2),
        );
    }
}
