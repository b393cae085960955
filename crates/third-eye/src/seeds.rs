//! The fixed seed texts the dialectic runs over.
//!
//! Four deliberately different registers: plain instructions, a love poem,
//! a true mathematical claim, and grammatical noise. The set is read-only
//! and runs in declaration order.

/// An input text to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedCase {
    pub name: &'static str,
    pub text: &'static str,
}

/// The seed set, in run order.
pub const SEED_CASES: [SeedCase; 4] = [
    SeedCase {
        name: "recipe",
        text: "Combine two cups of flour with one teaspoon of salt. Cut in cold butter \
               until the mixture resembles coarse crumbs.",
    },
    SeedCase {
        name: "love_poem",
        text: "I carry your heart with me, I carry it in my heart. I am never without \
               it, anywhere I go you go.",
    },
    SeedCase {
        name: "math",
        text: "There are more real numbers between 0 and 1 than there are integers in \
               all of infinity.",
    },
    SeedCase {
        name: "noise",
        text: "Purple telephone sandwich calculus morning the of whisper. Forty-seven \
               geese explained their bankruptcy.",
    },
];
