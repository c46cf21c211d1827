//! Ranking of (separator, quote) combinations and guessing of the comment
//! prefix and the escape byte.

use super::temp_stats::TempStats;
use crate::dialect::Quote;
use crate::metadata::SepQuoteScore;
use crate::sniffer::EscapeCandidate;

/// Bonus when the sample starts with the comment prefix.
const COMMENT_START_BONUS: usize = 10;
/// Bonus per line starting with the prefix.
const COMMENT_LINE_BONUS: usize = 1;
/// Extra bonus per line starting with the prefix and a space.
const COMMENT_SPACE_BONUS: usize = 2;

/// Rank every (separator, quote) combination by decreasing score.
///
/// Candidates without any occurrence are left out. When no separator (or no
/// quote) remains, the first configured one stands in, or none in strict
/// mode. Equal scores keep the configured order, separators first. The
/// result is never empty.
pub(crate) fn rank_sep_quote(
    data: &[u8],
    separators: &[u8],
    quotes: &[u8],
    strict: bool,
) -> Vec<SepQuoteScore> {
    let stats = TempStats::from_sample(data, separators, quotes);

    let fallback = |candidates: &[u8]| -> Vec<(Option<u8>, usize)> {
        match candidates.first() {
            Some(&c) if !strict => vec![(Some(c), 0)],
            _ => vec![(None, 0)],
        }
    };
    let present = |candidates: &[u8], scores: &foldhash::HashMap<u8, usize>| {
        let mut seen: Vec<(Option<u8>, usize)> = Vec::with_capacity(candidates.len());
        for &c in candidates {
            if let Some(&score) = scores.get(&c)
                && !seen.iter().any(|&(s, _)| s == Some(c))
            {
                seen.push((Some(c), score));
            }
        }
        seen
    };

    let mut seps = present(separators, &stats.seps);
    if seps.is_empty() {
        seps = fallback(separators);
    }
    let mut quote_scores = present(quotes, &stats.quotes);
    if quote_scores.is_empty() {
        quote_scores = fallback(quotes);
    }

    let mut ranked = Vec::with_capacity(seps.len() * quote_scores.len());
    for &(sep, sep_score) in &seps {
        for &(quote, quote_score) in &quote_scores {
            let pair_score = match (sep, quote) {
                (Some(s), Some(q)) => stats.pairs.get(&(s, q)).copied().unwrap_or(0),
                _ => 0,
            };
            ranked.push(SepQuoteScore {
                separator: sep,
                quote: Quote::from(quote),
                score: sep_score + quote_score + pair_score,
            });
        }
    }
    // stable: ties stay in enumeration order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Score of one comment prefix on `data`.
pub(crate) fn comment_score(data: &[u8], prefix: &[u8]) -> usize {
    if prefix.is_empty() {
        return 0;
    }
    let mut score = 0;
    if data.starts_with(prefix) {
        score += COMMENT_START_BONUS;
    }
    let mut needle = Vec::with_capacity(prefix.len() + 2);
    needle.push(b'\n');
    needle.extend_from_slice(prefix);
    score += count_occurrences(data, &needle) * COMMENT_LINE_BONUS;
    needle.push(b' ');
    score += count_occurrences(data, &needle) * COMMENT_SPACE_BONUS;
    score
}

/// Non-overlapping occurrences of `needle` in `data`.
fn count_occurrences(data: &[u8], needle: &[u8]) -> usize {
    memchr::memmem::find_iter(data, needle).count()
}

/// Pick the best comment prefix, the first one on ties.
///
/// With no evidence at all, strict mode answers `None` and lenient mode the
/// first candidate.
pub(crate) fn guess_comment<'c>(
    data: &[u8],
    candidates: &'c [Vec<u8>],
    strict: bool,
) -> Option<&'c [u8]> {
    let mut best: Option<(&[u8], usize)> = None;
    for prefix in candidates {
        let score = comment_score(data, prefix);
        tracing::trace!(prefix = %String::from_utf8_lossy(prefix), score, "comment candidate");
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((prefix.as_slice(), score));
        }
    }
    match best {
        Some((prefix, _)) => Some(prefix),
        None if strict => None,
        None => candidates.first().map(Vec::as_slice),
    }
}

/// Pick the escape byte for `quote` by counting the bytes found right before
/// each quote, among the candidates.
///
/// With no candidate there is no escape. A single candidate is taken as is
/// in lenient mode. Otherwise the best tally wins, the first candidate on
/// ties. A zero tally means no escape in strict mode and the first candidate
/// in lenient mode.
pub(crate) fn guess_escape(
    data: &[u8],
    quote: Quote,
    candidates: &[EscapeCandidate],
    strict: bool,
) -> Option<u8> {
    let quote = quote.char()?;
    let first = candidates.first()?.resolve(quote);
    if candidates.len() == 1 && !strict {
        return Some(first);
    }

    let mut tallies: Vec<(u8, usize)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let escape = candidate.resolve(quote);
        if !tallies.iter().any(|&(e, _)| e == escape) {
            tallies.push((escape, 0));
        }
    }
    for w in data.windows(2) {
        if w[1] == quote
            && let Some(tally) = tallies.iter_mut().find(|(e, _)| *e == w[0])
        {
            tally.1 += 1;
        }
    }

    let mut best = (first, 0);
    for &(escape, tally) in &tallies {
        if tally > best.1 {
            best = (escape, tally);
        }
    }
    if best.1 == 0 && strict {
        return None;
    }
    Some(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking() {
        let data = b"a; \"b|c\" ; \" d' \";e\n1,1;2,2;3,3;4,4\n";
        let ranked = rank_sep_quote(data, b",;|\t", b"\"'`", false);
        let got: Vec<_> = ranked
            .iter()
            .map(|s| (s.separator, s.quote, s.score))
            .collect();
        assert_eq!(
            got,
            vec![
                (Some(b';'), Quote::Some(b'"'), 26),
                (Some(b','), Quote::Some(b'"'), 10),
                (Some(b'|'), Quote::Some(b'"'), 7),
            ]
        );
    }

    #[test]
    fn test_ranking_fallbacks() {
        for data in [&b""[..], b"    ", b" a b c "] {
            let ranked = rank_sep_quote(data, b",;|\t", b"\"'`", false);
            assert_eq!(ranked.len(), 1);
            assert_eq!(ranked[0].separator, Some(b','));
            assert_eq!(ranked[0].quote, Quote::Some(b'"'));

            let ranked = rank_sep_quote(data, b",;|\t", b"\"'`", true);
            assert_eq!(ranked.len(), 1);
            assert_eq!(ranked[0].separator, None);
            assert_eq!(ranked[0].quote, Quote::None);
        }
    }

    #[test]
    fn test_best_pair() {
        let cases: &[(&[u8], &[u8], &[u8], u8, u8)] = &[
            (b"a,b,c", b",;", b"\"'", b',', b'"'),
            (b"a,b,c", b",;", b"'\"", b',', b'\''),
            (b"a;\"b\"\"c\"\"\";\"d\n\\e\"", b",;", b"\"'", b';', b'"'),
        ];
        for &(data, seps, quotes, sep, quote) in cases {
            let best = &rank_sep_quote(data, seps, quotes, false)[0];
            assert_eq!(best.separator, Some(sep));
            assert_eq!(best.quote, Quote::Some(quote));
        }
        let best = &rank_sep_quote(b"a;\"b\"\"c\"\"\";\"d\n\\e\"", b",;", b"\"'", false)[0];
        assert_eq!(best.score, 28);
    }

    #[test]
    fn test_ties_follow_configured_order() {
        // ',' gets the first-separator bonus, ';' occurs four more times
        let data = b"a,b;c;c;c;c;c";
        let ranked = rank_sep_quote(data, b";,", b"\"", false);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].separator, Some(b';'));
        assert_eq!(ranked[1].separator, Some(b','));

        let ranked = rank_sep_quote(data, b",;", b"\"", false);
        assert_eq!(ranked[0].separator, Some(b','));
    }

    fn prefixes(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|p| p.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_guess_comment() {
        let candidates = prefixes(&["#", "%", "//"]);
        let cases: &[(&[u8], bool, Option<&[u8]>)] = &[
            (b"a,b,c", true, None),
            (b"a,b,c", false, Some(b"#")),
            // first comment line wins
            (b"a,b,c\n\n//\n%", true, Some(b"%")),
            // a comment followed by a space wins
            (b"a,b,c\n\n// \n%", true, Some(b"//")),
            // starting with a comment wins
            (b"#a,b,c\n\n// \n%", true, Some(b"#")),
        ];
        for &(data, strict, want) in cases {
            assert_eq!(
                guess_comment(data, &candidates, strict),
                want,
                "comment of {:?}",
                String::from_utf8_lossy(data)
            );
        }
    }

    #[test]
    fn test_guess_comment_no_data() {
        let candidates = prefixes(&["#", "//"]);
        for data in [&b""[..], b"    ", b" a b c "] {
            assert_eq!(guess_comment(data, &candidates, true), None);
            assert_eq!(guess_comment(data, &candidates, false), Some(&b"#"[..]));
        }
        assert_eq!(guess_comment(b"#a", &[], false), None);
    }

    #[test]
    fn test_comment_score() {
        assert_eq!(comment_score(b"# a\n#b\n# c", b"#"), 10 + 2 + 2);
        assert_eq!(comment_score(b"# a", b""), 0);
    }

    #[test]
    fn test_guess_escape() {
        use EscapeCandidate::{Byte, SameAsQuote};

        let doubled = b"a,\"b\"\"c\"\"\",\"d\n\\e";
        let cases: &[(&[u8], u8, &[EscapeCandidate], Option<u8>)] = &[
            (doubled, b'"', &[], None),
            (doubled, b'"', &[SameAsQuote], Some(b'"')),
            (doubled, b'"', &[SameAsQuote, Byte(b'\\')], Some(b'"')),
            (b"a,'b''c''','d\n\\e", b'\'', &[SameAsQuote, Byte(b'\\')], Some(b'\'')),
            (
                b"a,\"b\\\"c\\\"\",\"d\n\\e",
                b'"',
                &[SameAsQuote, Byte(b'\\'), Byte(b'\'')],
                Some(b'\\'),
            ),
        ];
        for &(data, quote, candidates, want) in cases {
            assert_eq!(
                guess_escape(data, Quote::Some(quote), candidates, false),
                want,
                "escape of {:?}",
                String::from_utf8_lossy(data)
            );
        }
    }

    #[test]
    fn test_guess_escape_strict() {
        let candidates = [EscapeCandidate::SameAsQuote, EscapeCandidate::Byte(b'\\')];
        assert_eq!(guess_escape(b"a,b", Quote::Some(b'"'), &candidates, true), None);
        assert_eq!(
            guess_escape(b"a,b", Quote::Some(b'"'), &candidates, false),
            Some(b'"')
        );
        assert_eq!(
            guess_escape(b"\"a\"\"b\"", Quote::Some(b'"'), &candidates[..1], true),
            Some(b'"')
        );
        assert_eq!(guess_escape(b"a", Quote::None, &candidates, false), None);
    }
}
