/*!
The compiled form of a single gitignore pattern: a [`crate::translate::Regex`]
with its regex source actually compiled.
*/

use regex::bytes::{Regex as ByteRegex, RegexBuilder};

use crate::translate::Regex as GlobRegex;

/// Size limit applied to every compiled pattern, mirroring the bound
/// `globset::new_regex` applies to its own `RegexBuilder` so a pathological
/// pattern cannot exhaust memory at compile time.
const SIZE_LIMIT: usize = 10 * (1 << 20);

/// A single compiled gitignore rule.
///
/// Produced by [`crate::compile`]; see [`crate::Ruleset`] for how a
/// collection of these is evaluated against a path.
#[derive(Clone, Debug)]
pub struct Rule {
    pattern: Vec<u8>,
    matcher: ByteRegex,
    negative: bool,
    dir_only: bool,
    ignorecase: bool,
}

impl Rule {
    pub(crate) fn compile(glob: GlobRegex) -> Rule {
        let matcher = RegexBuilder::new(glob.regex())
            .size_limit(SIZE_LIMIT)
            .dfa_size_limit(SIZE_LIMIT)
            .build()
            // The translator only ever emits regex source built from a fixed
            // set of known-valid fragments, so compilation cannot fail.
            .expect("translator emits only valid regex source");
        Rule {
            pattern: glob.pattern().to_vec(),
            matcher,
            negative: glob.negative(),
            dir_only: glob.dir_only(),
            ignorecase: glob.ignorecase(),
        }
    }

    /// The original pattern text, with trailing whitespace trimmed.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// Whether this is a negation (`!`-prefixed) rule.
    pub fn negative(&self) -> bool {
        self.negative
    }

    /// Whether this rule only matches directories.
    pub fn dir_only(&self) -> bool {
        self.dir_only
    }

    /// Whether this rule matches case-insensitively.
    pub fn ignorecase(&self) -> bool {
        self.ignorecase
    }

    /// Test whether this rule matches `segment`, a single path or ancestor
    /// path (not necessarily the whole path passed to [`crate::Ruleset::matched`]).
    pub(crate) fn matches(&self, segment: &[u8], is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        // The regex source is wrapped in \A...\z by the translator, so a
        // partial-match API behaves like a full match here.
        self.matcher.is_match(segment)
    }
}
