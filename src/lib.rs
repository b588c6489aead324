/*!
Gitignore-style path matching.

`gimatch` compiles an ordered sequence of `.gitignore`-syntax patterns into a
[`Ruleset`] once, then tests relative paths against it with the same
negation, directory-only, and anchoring semantics `git` itself uses. The
design mirrors `globset`: pattern text is translated into an equivalent
regular expression up front (regex engines are fast and well-tested, so
there's no reason to hand-roll a glob matcher when a translation step gets
you a `regex::bytes::Regex` for free) and matching is then just running that
expression against each ancestor of the path in turn.

Everything here operates on bytes internally ([`regex::bytes::Regex`]),
with `&str`, `&[u8]`, and `std::path::Path` convenience entry points at the
boundary — the same shape as `ignore`'s `Candidate` type.

```
let rules = gimatch::compile(vec!["*.log", "!important.log"], false);
assert!(rules.matched("debug.log", false).unwrap().unwrap().is_affirmative());
assert!(!rules.matched("important.log", false).unwrap().unwrap().is_affirmative());
assert!(rules.matched("src/main.rs", false).unwrap().is_none());
```
*/

mod normalize;
mod rule;
mod ruleset;
mod translate;
mod util;

pub use normalize::{InvalidPath, IntoPathSource, PosixPath, WindowsPath};
pub use rule::Rule;
pub use ruleset::{compile, Match, Ruleset};
pub use translate::{translate, InvalidPattern, Regex};
pub use util::{chomp, pathway, trim_trailing_spaces};
