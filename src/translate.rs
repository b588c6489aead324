/*!
The pattern translator: turns a single gitignore-syntax line into an
equivalent anchored regular expression.

This is a hand-rolled byte scanner rather than a "meta-regex" built by
composing smaller regexes — the same approach `globset`'s own pattern
compiler takes, and the approach is dictated by the grammar itself: several
tokens (trailing `/**`, interior `/**/` runs, POSIX character classes) need
lookahead and backtracking that's easier to express directly than to encode
as a regex-of-regexes.
*/

use std::fmt;

/// A gitignore pattern that has been converted to a regular expression.
///
/// This is an intermediate value: [`crate::compile`] takes a batch of these
/// (or the raw patterns it derives them from) and turns them into compiled
/// [`crate::Rule`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regex {
    pattern: Vec<u8>,
    regex: String,
    negative: bool,
    dir_only: bool,
    ignorecase: bool,
}

impl Regex {
    /// The original pattern text, with trailing whitespace trimmed.
    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    /// The regex source equivalent to the pattern.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// Whether the pattern is a negation (`!`-prefixed) rule.
    pub fn negative(&self) -> bool {
        self.negative
    }

    /// Whether the pattern only matches directories.
    pub fn dir_only(&self) -> bool {
        self.dir_only
    }

    /// Whether the pattern matches case-insensitively.
    pub fn ignorecase(&self) -> bool {
        self.ignorecase
    }
}

/// A gitignore pattern could not be translated to a regular expression.
///
/// Carries the exact pattern text (pre-trim) that was rejected, for
/// diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidPattern(Vec<u8>);

impl InvalidPattern {
    /// The pattern that failed to translate.
    pub fn pattern(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for InvalidPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid gitignore pattern: {:?}", String::from_utf8_lossy(&self.0))
    }
}

impl std::error::Error for InvalidPattern {}

/// Convert a single gitignore pattern line into a [`Regex`].
///
/// Returns `Ok(None)` if the pattern is empty, a comment, or a dangling
/// negation/directory marker with nothing left to match. `pattern` is taken
/// as anything byte-representable, so both `&str` and `&[u8]` work directly.
pub fn translate<P: AsRef<[u8]>>(pattern: P, ignorecase: bool) -> Result<Option<Regex>, InvalidPattern> {
    translate_bytes(pattern.as_ref(), ignorecase)
}

fn translate_bytes(pattern: &[u8], ignorecase: bool) -> Result<Option<Regex>, InvalidPattern> {
    let orig = pattern;
    let source = crate::util::trim_trailing_spaces(pattern);
    if source.first() == Some(&b'#') {
        return Ok(None);
    }
    let mut body = source;
    let negative = if body.first() == Some(&b'!') {
        body = &body[1..];
        if body.is_empty() {
            return Ok(None);
        }
        true
    } else {
        false
    };
    let dir_only = if body.last() == Some(&b'/') {
        body = &body[..body.len() - 1];
        true
    } else {
        false
    };
    if body.is_empty() {
        return Ok(None);
    }

    let mut regex = String::new();
    let mut pos = 0usize;

    let leading_globstar = match_globstar_slash(body, 0);
    if let Some(n) = leading_globstar {
        regex.push_str(UNANCHORED_START);
        pos = n;
    } else if !has_internal_slash(body) {
        regex.push_str(UNANCHORED_START);
    } else if body.first() == Some(&b'/') {
        pos = 1;
    }

    while pos < body.len() {
        if let Some(n) = match_slash_globstar_end(body, pos) {
            regex.push_str(SLASH_GLOBSTAR);
            pos += n;
        } else if let Some(n) = match_slash_globstar_slash(body, pos) {
            regex.push_str(SLASH_GLOBSTAR_SLASH);
            pos += n;
        } else if let Some(n) = match_globstar_slash(body, pos) {
            regex.push_str(GLOBSTAR_SLASH);
            pos += n;
        } else if body[pos] == b'?' {
            regex.push_str(QM);
            pos += 1;
        } else if let Some(n) = match_star(body, pos) {
            regex.push_str(STAR);
            pos += n;
        } else if body[pos] == b'[' {
            regex.push_str(OPENRANGE);
            let (frag, newpos) = parse_class(body, pos + 1, orig)?;
            regex.push_str(&frag);
            pos = newpos;
        } else if let Some((c, n)) = parse_char(body, pos, false) {
            push_hex_byte(&mut regex, c);
            pos += n;
        } else {
            return Err(InvalidPattern(orig.to_vec()));
        }
    }

    let flags = if ignorecase { "i-u" } else { "-u" };
    let full = format!("\\A(?{}:{})\\z", flags, regex);

    Ok(Some(Regex {
        pattern: source.to_vec(),
        regex: full,
        negative,
        dir_only,
        ignorecase,
    }))
}

const UNANCHORED_START: &str = r"(?:[^/\x00]+/)*";
const SLASH_GLOBSTAR: &str = r"(?:(?:/[^/\x00]+)+/?|/)";
const SLASH_GLOBSTAR_SLASH: &str = r"/(?:[^/\x00]+/)*";
const GLOBSTAR_SLASH: &str = r"(?:[^/\x00]*/)?(?:[^/\x00]+/)*";
const QM: &str = r"[^/\x00]";
const STAR: &str = r"[^/\x00]*";
const OPENRANGE: &str = r"(?![/\x00])[";

/// `^/|/.` — true iff `body` has an "internal" slash: a leading slash, or a
/// slash anywhere that is followed by at least one more character. A lone
/// trailing slash (nothing after it) does not count, so a pattern like
/// `foo/` (after the directory-only marker has already been stripped,
/// e.g. from `foo//`) is still unanchored.
fn has_internal_slash(body: &[u8]) -> bool {
    if body.first() == Some(&b'/') {
        return true;
    }
    body.iter().enumerate().any(|(i, &b)| b == b'/' && i + 1 < body.len())
}

/// `/\*\*\Z` — a trailing `/**` consuming the rest of the pattern.
fn match_slash_globstar_end(body: &[u8], pos: usize) -> Option<usize> {
    if body.len() - pos == 3 && &body[pos..] == b"/**" {
        Some(3)
    } else {
        None
    }
}

/// `/\*\*(/\*\*)*/` — one or more `/**` groups followed by a closing `/`.
fn match_slash_globstar_slash(body: &[u8], pos: usize) -> Option<usize> {
    if !body[pos..].starts_with(b"/**") {
        return None;
    }
    let mut i = pos + 3;
    while body[i..].starts_with(b"/**") {
        i += 3;
    }
    if body[i..].starts_with(b"/") {
        Some(i + 1 - pos)
    } else {
        None
    }
}

/// `\*\*/(\*\*/)*` — one or more `**/` groups.
fn match_globstar_slash(body: &[u8], pos: usize) -> Option<usize> {
    if !body[pos..].starts_with(b"**/") {
        return None;
    }
    let mut i = pos + 3;
    while body[i..].starts_with(b"**/") {
        i += 3;
    }
    Some(i - pos)
}

/// `\*\*?` — one or two stars, preferring two.
fn match_star(body: &[u8], pos: usize) -> Option<usize> {
    if body.get(pos) != Some(&b'*') {
        return None;
    }
    if body.get(pos + 1) == Some(&b'*') {
        Some(2)
    } else {
        Some(1)
    }
}

/// A plain character, or a backslash-escaped one (`\X`). Both forms exclude
/// NUL. When `exclude_close_bracket` is set, a bare `]` is refused (used for
/// the "right" side of a range and for ordinary members of a class, so the
/// class-closing `]` can be recognized separately).
fn parse_char(body: &[u8], pos: usize, exclude_close_bracket: bool) -> Option<(u8, usize)> {
    let c = *body.get(pos)?;
    if c == 0 {
        return None;
    }
    if c == b'\\' {
        let next = *body.get(pos + 1)?;
        if next == 0 {
            return None;
        }
        Some((next, 2))
    } else if exclude_close_bracket && c == b']' {
        None
    } else {
        Some((c, 1))
    }
}

/// `\](?!-[^\]])` — a `]` immediately after `[` (or `[^`/`[!`) that is not
/// itself the start of a range like `]-x`; such a `]` denotes the character
/// `]` as a member of the class rather than closing it.
fn is_leading_close_bracket(body: &[u8], pos: usize) -> bool {
    if body.get(pos) != Some(&b']') {
        return false;
    }
    let looks_like_range_start =
        body.get(pos + 1) == Some(&b'-') && body.get(pos + 2).map_or(false, |&c| c != b']');
    !looks_like_range_start
}

fn try_range(body: &[u8], pos: usize) -> Option<(u8, u8, usize)> {
    let (l, llen) = parse_char(body, pos, false)?;
    let mut p = pos + llen;
    if body.get(p) != Some(&b'-') {
        return None;
    }
    p += 1;
    let (r, rlen) = parse_char(body, p, true)?;
    Some((l, r, (p + rlen) - pos))
}

fn try_posix_class(body: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    if body.get(pos) != Some(&b'[') || body.get(pos + 1) != Some(&b':') {
        return None;
    }
    let start = pos + 2;
    let rel_close = body[start..].iter().position(|&b| b == b']')?;
    let close = start + rel_close;
    let between = &body[start..close];
    if between.last() == Some(&b':') {
        Some((&between[..between.len() - 1], close + 1 - pos))
    } else {
        None
    }
}

fn posix_class_expansion(name: &[u8]) -> Option<&'static str> {
    Some(match name {
        b"alpha" => r"A-Za-z",
        b"alnum" => r"A-Za-z0-9",
        b"blank" => r" \t",
        b"cntrl" => r"\x00-\x1F\x7F",
        b"digit" => r"0-9",
        b"graph" => r"!-~",
        b"lower" => r"a-z",
        b"print" => r" -~",
        // The `[` must be escaped here, unlike every other expansion: this
        // string is spliced directly into an already-open `regex::bytes`
        // character class, and that crate (unlike Python's `re`) treats an
        // unescaped `[` inside `[...]` as opening a *nested* class.
        b"punct" => r"!-/:-@\[-`{-~",
        b"space" => r"\t\n\r ",
        b"upper" => r"A-Z",
        b"xdigit" => r"0-9A-Fa-f",
        _ => return None,
    })
}

fn push_hex_byte(out: &mut String, b: u8) {
    out.push_str(&format!("\\x{:02x}", b));
}

fn parse_class(body: &[u8], mut pos: usize, orig: &[u8]) -> Result<(String, usize), InvalidPattern> {
    let mut frag = String::new();
    if let Some(&c) = body.get(pos) {
        if c == b'^' || c == b'!' {
            frag.push('^');
            pos += 1;
        }
    }
    if is_leading_close_bracket(body, pos) {
        frag.push_str("\\x5d");
        pos += 1;
    }
    loop {
        if let Some((l, r, consumed)) = try_range(body, pos) {
            if l > r {
                return Err(InvalidPattern(orig.to_vec()));
            }
            push_hex_byte(&mut frag, l);
            frag.push('-');
            push_hex_byte(&mut frag, r);
            pos += consumed;
            continue;
        }
        if let Some((name, consumed)) = try_posix_class(body, pos) {
            let expansion = posix_class_expansion(name).ok_or_else(|| InvalidPattern(orig.to_vec()))?;
            frag.push_str(expansion);
            pos += consumed;
            continue;
        }
        if let Some((c, consumed)) = parse_char(body, pos, true) {
            push_hex_byte(&mut frag, c);
            pos += consumed;
            continue;
        }
        if body.get(pos) == Some(&b']') {
            frag.push(']');
            pos += 1;
            break;
        }
        return Err(InvalidPattern(orig.to_vec()));
    }
    Ok((frag, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::bytes::RegexBuilder;

    fn fullmatch(re: &Regex, s: &[u8]) -> bool {
        RegexBuilder::new(re.regex())
            .size_limit(10 * (1 << 20))
            .build()
            .unwrap()
            .is_match(s)
    }

    macro_rules! ignored {
        ($name:ident, $pat:expr, $path:expr) => {
            #[test]
            fn $name() {
                let re = translate($pat, false).unwrap().expect("pattern should translate");
                assert!(fullmatch(&re, $path), "{:?} should match {:?}", $pat, $path);
            }
        };
    }

    macro_rules! not_ignored {
        ($name:ident, $pat:expr, $path:expr) => {
            #[test]
            fn $name() {
                let re = translate($pat, false).unwrap().expect("pattern should translate");
                assert!(!fullmatch(&re, $path), "{:?} should not match {:?}", $pat, $path);
            }
        };
    }

    ignored!(literal_basename, "foo", b"foo");
    not_ignored!(literal_basename_no_match, "foo", b"bar");
    ignored!(star_matches_basename, "*.txt", b"a.txt");
    not_ignored!(star_does_not_cross_slash, "*.txt", b"a/b.txt");
    ignored!(unanchored_matches_anywhere, "foo", b"a/b/foo");
    ignored!(anchored_only_at_root, "/foo", b"foo");
    not_ignored!(anchored_not_nested, "/foo", b"a/foo");
    ignored!(trailing_globstar_matches_everything_below, "foo/**", b"foo/bar/baz");
    not_ignored!(trailing_globstar_does_not_match_self, "foo/**", b"foo");
    ignored!(interior_globstar_zero_dirs, "a/**/b", b"a/b");
    ignored!(interior_globstar_many_dirs, "a/**/b", b"a/x/y/b");
    ignored!(leading_globstar_slash_anchors_everywhere, "**/foo", b"a/b/foo");
    ignored!(qm_single_char, "fo?", b"foo");
    not_ignored!(qm_does_not_cross_slash, "fo?", b"fo/");
    ignored!(char_class_range, "[a-c]", b"b");
    not_ignored!(char_class_range_no_match, "[a-c]", b"d");
    ignored!(char_class_negated, "[!a-c]", b"d");
    ignored!(posix_class_digit, "[[:digit:]]", b"5");
    not_ignored!(posix_class_digit_no_match, "[[:digit:]]", b"x");
    ignored!(posix_class_punct_star, "[[:punct:]]", b"*");
    ignored!(posix_class_punct_underscore, "[[:punct:]]", b"_");
    ignored!(posix_class_punct_tilde, "[[:punct:]]", b"~");
    not_ignored!(posix_class_punct_no_match, "[[:punct:]]", b"0");
    ignored!(posix_class_punct_in_context, "foo[[:punct:]]bar", b"foo_bar");
    ignored!(posix_class_graph, "[[:graph:]]", b"!");
    ignored!(posix_class_print, "[[:print:]]", b" ");
    ignored!(posix_class_cntrl, "[[:cntrl:]]", b"\x01");
    ignored!(posix_class_space, "[[:space:]]", b"\t");
    ignored!(escaped_metachar, r"\*foo", b"*foo");
    ignored!(leading_close_bracket_member, "[]ab]", b"]");

    #[test]
    fn comment_is_none() {
        assert_eq!(translate("# comment", false).unwrap(), None);
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(translate("", false).unwrap(), None);
    }

    #[test]
    fn dangling_negation_is_none() {
        assert_eq!(translate("!", false).unwrap(), None);
    }

    #[test]
    fn dangling_negated_dir_only_is_none() {
        assert_eq!(translate("!/", false).unwrap(), None);
    }

    #[test]
    fn negation_sets_flag() {
        let re = translate("!foo", false).unwrap().unwrap();
        assert!(re.negative());
        assert_eq!(re.pattern(), b"!foo");
    }

    #[test]
    fn dir_only_sets_flag() {
        let re = translate("foo/", false).unwrap().unwrap();
        assert!(re.dir_only());
    }

    #[test]
    fn unterminated_class_is_invalid() {
        assert!(translate("[ab", false).is_err());
    }

    #[test]
    fn unterminated_class_after_leading_close_bracket_is_invalid() {
        assert!(translate("a[]b", false).is_err());
    }

    #[test]
    fn reversed_range_is_invalid() {
        assert!(translate("[z-a]", false).is_err());
    }

    #[test]
    fn unknown_posix_class_is_invalid() {
        assert!(translate("[[:glarch:]]", false).is_err());
    }

    #[test]
    fn uppercase_posix_class_name_is_invalid() {
        assert!(translate("[[:XDIGIT:]]", false).is_err());
    }

    #[test]
    fn empty_posix_class_name_is_invalid() {
        assert!(translate("[[::]ab]", false).is_err());
    }

    #[test]
    fn trailing_escape_with_nothing_after_is_invalid() {
        assert!(translate("foo\\", false).is_err());
    }

    #[test]
    fn nul_byte_is_invalid() {
        assert!(translate(&b"fo\0o"[..], false).is_err());
    }

    #[test]
    fn ignorecase_matches_different_case() {
        let re = translate("FOO", true).unwrap().unwrap();
        assert!(fullmatch(&re, b"foo"));
    }

    #[test]
    fn not_ignorecase_keeps_case_sensitivity() {
        let re = translate("FOO", false).unwrap().unwrap();
        assert!(!fullmatch(&re, b"foo"));
    }

    #[test]
    fn quirk_globstar_without_surrounding_slash_allows_zero_components() {
        // foo**/bar matches both foobar and foo/anything/bar -- a preserved
        // oddity of the underlying glob grammar, not a bug.
        let re = translate("foo**/bar", false).unwrap().unwrap();
        assert!(fullmatch(&re, b"foobar"));
        assert!(fullmatch(&re, b"foo/glarch/bar"));
    }

    #[test]
    fn lone_trailing_slash_is_not_an_internal_slash() {
        // `^/|/.`: a slash only counts as "internal" if it leads (anchors
        // at root) or is followed by at least one more character. A slash
        // at the very end of `body` (e.g. what's left of `foo//` after the
        // directory-only marker strips one trailing `/`) has nothing after
        // it, so it doesn't count -- the pattern stays unanchored.
        assert!(!has_internal_slash(b"foo/"));
        assert!(has_internal_slash(b"/foo"));
        assert!(has_internal_slash(b"a/b"));
        assert!(!has_internal_slash(b"foo"));
    }
}
