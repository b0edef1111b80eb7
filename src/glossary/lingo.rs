//! Built-in Malaysian lingo catalog
//!
//! The static list of categories and terms shipped with the binary, in the
//! order they are presented in the UI.

/// A category of the built-in catalog
///
/// Uses `&'static str` so the catalog can be initialized statically. Convert
/// to an owned [`super::Category`] through [`super::Glossary::builtin`].
#[derive(Debug, Clone, Copy)]
pub struct StaticCategory {
    /// Display name of the category
    pub name: &'static str,
    /// Terms in display order
    pub terms: &'static [&'static str],
}

/// Static array of all built-in lingo categories
pub static LINGO: [StaticCategory; 6] = [
    StaticCategory {
        name: "Everyday Conversation Emphasis & Fillers",
        terms: &[
            "Lah",
            "Meh",
            "Lor",
            "Leh",
            "Aiyoh / Aiyah",
            "Walao / Walao Eh",
            "Alamak",
            "Fuyoh / Pergh",
            "Cheh",
        ],
    },
    StaticCategory {
        name: "Ordering Food & Drinks",
        terms: &[
            "Tapau / Bungkus",
            "Makan",
            "Minum",
            "Boss",
            "Kosong",
            "Siu Dai",
            "Ga Dai",
            "Kurang Manis",
            "Tambah Manis",
            "Peng",
            "Gah",
            "Pok",
            "Ikat Tepi",
            "Belanja",
            "Tambah",
            "Yam Cha",
        ],
    },
    StaticCategory {
        name: "Social Interactions & Getting Around",
        terms: &[
            "Jom",
            "Member",
            "Uncle / Auntie",
            "Paiseh",
            "Bo Jio",
            "Steady",
            "Onz",
            "Cabut",
            "Gostan",
            "Chup / Chop",
            "Lepak",
            "Kacau",
            "Potong Stim",
        ],
    },
    StaticCategory {
        name: "Describing People, Things & Situations",
        terms: &[
            "Kiasu",
            "Kaypoh",
            "Sotong",
            "Gempak / Power",
            "Syok / Shiok",
            "Kantoi",
            "Cincai",
            "Mat Salleh",
            "Action / Poyo",
            "Sian",
            "Pokai",
            "Giler",
            "Best",
            "Ang Moh",
            "Wayang",
        ],
    },
    StaticCategory {
        name: "Work & Study Related",
        terms: &[
            "OT",
            "MC",
            "Fly Aeroplane / Pangseh",
            "Goreng",
            "Kabel",
            "Carry Ball",
        ],
    },
    StaticCategory {
        name: "Sabah Lingo",
        terms: &[
            "Bah",
            "Bosku / Bossku",
            "Siring",
            "Limpas",
            "Ampai",
            "Buli bah kalau kau",
            "Sandi",
            "Gumuk",
            "Kupi",
            "Ping",
            "Tomborong",
            "Bertagar",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_categories_have_terms() {
        for category in LINGO.iter() {
            assert!(
                !category.terms.is_empty(),
                "{} should list at least one term",
                category.name
            );
        }
    }

    #[test]
    fn test_category_names_are_unique() {
        let names: HashSet<_> = LINGO.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), LINGO.len());
    }

    #[test]
    fn test_first_category_starts_with_lah() {
        assert_eq!(LINGO[0].terms[0], "Lah");
        assert_eq!(LINGO[0].terms[1], "Meh");
    }
}
