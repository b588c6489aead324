/*!
The matcher itself: a compiled, ordered collection of rules, and the
ancestor-walk algorithm that decides whether a given path is ignored.
*/

use log::debug;

use crate::normalize::{normalize, InvalidPath, IntoPathSource};
use crate::rule::Rule;
use crate::translate::translate;
use crate::util::{chomp, pathway};

/// Compile an ordered collection of gitignore patterns into a [`Ruleset`].
///
/// Any pattern that is empty, a comment, or otherwise invalid is silently
/// dropped — exactly as `git` itself ignores malformed lines in a
/// `.gitignore` file. Trailing newlines are stripped from each pattern
/// before translation, so a ruleset can be compiled directly from the lines
/// of a `.gitignore` file (including its final, possibly-unterminated line).
pub fn compile<I, P>(patterns: I, ignorecase: bool) -> Ruleset
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut rules = Vec::new();
    for pat in patterns {
        let chomped = chomp(pat.as_ref());
        match translate(chomped, ignorecase) {
            Ok(Some(glob)) => rules.push(Rule::compile(glob)),
            Ok(None) => {}
            Err(_) => {}
        }
    }
    debug!("compiled gitignore ruleset with {} rule(s)", rules.len());
    Ruleset { rules }
}

/// A compiled, ordered collection of gitignore rules.
///
/// Thread-safe to share: `Ruleset` is `Clone + Send + Sync`, just like
/// `globset::Set` and `gitignore::Gitignore` are in the crates this one
/// draws its matching algorithm from.
#[derive(Clone, Debug)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Ruleset {
    /// The compiled rules, in the order they were given to [`compile`].
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Test whether `path` is matched by the ruleset.
    ///
    /// `path` is treated as a directory if `is_dir` is true or if it ends in
    /// a slash; otherwise it is treated as a file. If a match is found, a
    /// [`Match`] is returned describing the matching rule and the ancestor
    /// path that matched (which may be a parent of `path` itself). If no
    /// rule matches, returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`] if `path` is empty, absolute, not normalized
    /// (aside from an optional trailing slash), contains a NUL byte, or
    /// starts with `..`.
    pub fn matched<'a>(
        &'a self,
        path: impl IntoPathSource,
        is_dir: bool,
    ) -> Result<Option<Match<'a>>, InvalidPath> {
        let (full_path, is_dir) = normalize(path, is_dir)?;
        if full_path == b"." {
            return Ok(None);
        }
        for ancestor in pathway(&full_path) {
            let is_leaf = ancestor == full_path;
            let effective_is_dir = if is_leaf { is_dir } else { true };
            for rule in self.rules.iter().rev() {
                if rule.matches(&ancestor, effective_is_dir) {
                    if !rule.negative() {
                        return Ok(Some(Match { rule, path: ancestor }));
                    } else if is_leaf {
                        return Ok(Some(Match { rule, path: ancestor }));
                    } else {
                        break;
                    }
                }
            }
        }
        Ok(None)
    }
}

/// A successful match of a path against a [`Ruleset`].
///
/// Whether the match is affirmative (the path is ignored) or not (a
/// negation rule un-ignored it) is available via [`Match::is_affirmative`];
/// there is no implicit boolean conversion since Rust has none for
/// user-defined types.
#[derive(Clone, Debug)]
pub struct Match<'a> {
    rule: &'a Rule,
    path: Vec<u8>,
}

impl<'a> Match<'a> {
    /// The rule that matched.
    pub fn rule(&self) -> &Rule {
        self.rule
    }

    /// The path that matched. This may be a parent path of the value
    /// originally passed to [`Ruleset::matched`].
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// The original pattern text that produced the matching rule.
    pub fn pattern(&self) -> &[u8] {
        self.rule.pattern()
    }

    /// True unless the matching rule was a negation (`!`-prefixed) rule.
    pub fn is_affirmative(&self) -> bool {
        !self.rule.negative()
    }
}
