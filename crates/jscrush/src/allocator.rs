//! # Token Allocator (post-pass)
//!
//! Takes the ordered, provisionally-tokened replacement list produced by
//! a search strategy and binds each replacement to a concrete byte drawn
//! from a regular-expression character class, picking the class that
//! buys the most one-byte tokens for the fewest class-string bytes.

use ahash::AHashSet;

use crate::scorer;
use crate::strategies::Binding;

/// A contiguous interval of byte values, every one of which is absent
/// from the original text and printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    /// First byte in the interval, inclusive.
    pub first: u8,
    /// Last byte in the interval, inclusive.
    pub last: u8,
}

impl TokenRange {
    /// Number of bytes covered by this range.
    pub fn count(&self) -> usize {
        self.last as usize - self.first as usize + 1
    }

    /// True if this range contains the backslash byte.
    pub fn contains_backslash(&self) -> bool {
        self.first <= b'\\' && b'\\' <= self.last
    }

    /// Number of tokens in this range that cost only one output byte
    /// (every byte except an included backslash, which costs two).
    pub fn one_byte_token_count(&self) -> usize {
        self.count() - if self.contains_backslash() { 1 } else { 0 }
    }

    /// Byte cost of this range's regex character-class serialisation.
    pub fn cost(&self) -> usize {
        match self.count() {
            1 => escape_cost(self.first),
            2 => escape_cost(self.first) + escape_cost(self.last),
            _ => escape_cost(self.first) + 1 + escape_cost(self.last),
        }
    }

    /// Render this range as a fragment of a regex character class.
    pub fn render(&self) -> String {
        match self.count() {
            1 => render_byte(self.first),
            2 => format!("{}{}", render_byte(self.first), render_byte(self.last)),
            _ => format!("{}-{}", render_byte(self.first), render_byte(self.last)),
        }
    }
}

/// Byte cost of a single byte rendered inside a regex character class:
/// `]` and `\` need a backslash escape (2 bytes); everything else is 1.
fn escape_cost(b: u8) -> usize {
    if b == b']' || b == b'\\' {
        2
    } else {
        1
    }
}

/// Render a single byte as it would appear inside a regex character
/// class.
fn render_byte(b: u8) -> String {
    if b == b']' || b == b'\\' {
        format!("\\{}", b as char)
    } else {
        (b as char).to_string()
    }
}

/// Scan ASCII bytes `1..=126` for maximal contiguous runs of bytes
/// absent from `original_text` (and not equal to `delimiter`), trimming
/// CR/LF from range boundaries since neither survives a JS template
/// literal or regex character class intact.
///
/// ## Arguments
/// * `original_text` - the input text tokens must stay absent from.
/// * `delimiter` - the configured string delimiter byte.
///
/// ## Returns
/// The discovered ranges, unordered.
pub fn discover_ranges(
    original_text: &str,
    delimiter: u8,
) -> Vec<TokenRange> {
    let present: AHashSet<u8> = original_text.bytes().collect();
    let is_free = |b: u8| b != delimiter && !present.contains(&b);

    let mut ranges = Vec::new();
    let mut run_start: Option<u8> = None;

    // Printable ASCII only (0x20..=0x7E): the Data Model's TokenRange
    // invariant requires printable bytes, which rules out the control
    // range below 0x20 even though it is nominally "free".
    for b in 0x20u8..=0x7E {
        if is_free(b) {
            if run_start.is_none() {
                run_start = Some(b);
            }
        } else if let Some(start) = run_start.take() {
            push_trimmed_range(&mut ranges, start, b - 1);
        }
    }
    if let Some(start) = run_start {
        push_trimmed_range(&mut ranges, start, 0x7E);
    }
    ranges
}

fn push_trimmed_range(
    ranges: &mut Vec<TokenRange>,
    mut first: u8,
    mut last: u8,
) {
    while first <= last && (first == b'\r' || first == b'\n') {
        first += 1;
    }
    while last >= first && (last == b'\r' || last == b'\n') {
        if last == 0 {
            return;
        }
        last -= 1;
    }
    if first <= last {
        ranges.push(TokenRange { first, last });
    }
}

/// Sort ranges by one-byte token yield against class-string cost,
/// descending, and repair a leading `^` range that would need a lone
/// leading caret escaped in the character class.
///
/// ## Arguments
/// * `ranges` - the discovered ranges, consumed by value.
/// * `replacement_count` - number of provisional replacements to bind.
///
/// ## Returns
/// The ordered, repaired ranges.
pub fn order_and_repair_ranges(
    mut ranges: Vec<TokenRange>,
    replacement_count: usize,
) -> Vec<TokenRange> {
    ranges.sort_by(|a, b| {
        let key = |r: &TokenRange| {
            10.0 * r.one_byte_token_count() as f64 - r.cost() as f64 + r.first as f64 / 1000.0
        };
        key(b).partial_cmp(&key(a)).unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(first_range) = ranges.first().copied() {
        if first_range.first == b'^'
            && (replacement_count < first_range.count() || ranges.len() == 1)
        {
            let repaired = TokenRange {
                first: first_range.first + 1,
                last: first_range.last,
            };
            if repaired.first <= repaired.last {
                ranges[0] = repaired;
            } else {
                ranges.remove(0);
            }
        }
    }
    ranges
}

/// Build the ordered token supply: every one-byte token from every range
/// in order, followed by the two-byte backslash token if one of the
/// ranges contains it.
///
/// ## Arguments
/// * `ranges` - the ordered, repaired ranges.
///
/// ## Returns
/// `(tokens, backslash_included)` where `tokens` holds the one-byte
/// tokens in supply order and `backslash_included` says whether `\` is
/// additionally available (always last, at cost 2).
pub fn build_token_supply(ranges: &[TokenRange]) -> (Vec<u8>, bool) {
    let mut tokens = Vec::new();
    let mut backslash_included = false;
    for range in ranges {
        for b in range.first..=range.last {
            if b == b'\\' {
                backslash_included = true;
            } else {
                tokens.push(b);
            }
        }
    }
    (tokens, backslash_included)
}

/// A replacement with its final allocator-assigned token.
#[derive(Debug, Clone)]
pub struct AllocatedReplacement {
    /// Index into the original `bindings` slice this came from.
    pub source_index: usize,
    /// The original binding produced by the search strategy.
    pub binding: Binding,
    /// The replacement's fully-expanded original text (tokens occurring
    /// in it resolved back to their source substrings).
    pub original: String,
    /// The final token byte bound by the allocator.
    pub token: u8,
    /// Cost in output bytes of `token` (1, or 2 for `\`).
    pub token_cost: usize,
    /// Recomputed gain using the token-cost-aware formula.
    pub gain: i64,
    /// The order in which this replacement was finally bound.
    pub new_order: usize,
}

/// The full outcome of a binding pass: the replacements that survived
/// with final tokens, and every binding's fully-expanded `original` text
/// (including dropped ones, needed to splice their text back in).
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    /// Surviving replacements, in allocator bind order.
    pub bound: Vec<AllocatedReplacement>,
    /// `originals[i]` is `bindings[i]`'s fully-expanded original text,
    /// for every input binding regardless of whether it survived.
    pub originals: Vec<String>,
}

/// Recursively expand each binding's pattern back through earlier
/// bindings' tokens to recover its fully-expanded original text.
pub fn expand_originals(bindings: &[Binding]) -> Vec<String> {
    let mut originals: Vec<String> = Vec::with_capacity(bindings.len());
    for (i, binding) in bindings.iter().enumerate() {
        let mut text = binding.pattern.clone();
        for (j, earlier) in bindings[..i].iter().enumerate() {
            let token_str = (earlier.token as char).to_string();
            if text.contains(&token_str) {
                text = text.replace(&token_str, &originals[j]);
            }
        }
        originals.push(text);
    }
    originals
}

/// Build the `depends`/`used_by` containment graph: if replacement
/// `j`'s original contains replacement `i`'s original, `j` depends on
/// `i` and `i` is used by `j`.
fn build_dependency_graph(originals: &[String]) -> (Vec<AHashSet<usize>>, Vec<AHashSet<usize>>) {
    let n = originals.len();
    let mut depends = vec![AHashSet::new(); n];
    let mut used_by = vec![AHashSet::new(); n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if originals[j].contains(&originals[i]) {
                depends[j].insert(i);
                used_by[i].insert(j);
            }
        }
    }
    (depends, used_by)
}

/// Run the full binding loop: build the dependency graph, then
/// repeatedly bind the best eligible (no outstanding
/// dependents) replacement to the next token in `tokens`, clearing any
/// whose recomputed gain is not positive.
///
/// ## Arguments
/// * `bindings` - the ordered, provisionally-tokened replacement list
///   from the search strategy.
/// * `current_text` - the fully-rewritten text produced by the search.
/// * `tokens` - the one-byte token supply, in preference order.
/// * `backslash_available` - whether the two-byte backslash token is
///   additionally available once `tokens` is exhausted.
/// * `weights` - scorer weights used to choose among eligible
///   candidates.
///
/// ## Returns
/// An [`AllocationOutcome`] with the bound replacements (in bind order)
/// and every binding's expanded original text.
pub fn bind(
    bindings: &[Binding],
    current_text: &str,
    tokens: &[u8],
    backslash_available: bool,
    weights: &scorer::ScorerWeights,
) -> AllocationOutcome {
    let originals = expand_originals(bindings);
    let (depends, mut used_by) = build_dependency_graph(&originals);

    let n = bindings.len();
    let mut cleared = vec![false; n];
    let mut bound = vec![false; n];
    let mut out = Vec::new();

    let mut token_cursor = 0usize;
    let mut backslash_taken = false;
    let mut order_counter = 0usize;

    loop {
        let eligible: Vec<usize> = (0..n)
            .filter(|&i| !cleared[i] && !bound[i] && used_by[i].is_empty())
            .collect();
        if eligible.is_empty() {
            break;
        }

        let best = eligible
            .into_iter()
            .max_by(|&a, &b| {
                let sa = scorer::score(bindings[a].gain, bindings[a].pattern.len(), bindings[a].copies, weights);
                let sb = scorer::score(bindings[b].gain, bindings[b].pattern.len(), bindings[b].copies, weights);
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("eligible set checked non-empty above");

        let (token, token_cost) = if token_cursor < tokens.len() {
            let t = tokens[token_cursor];
            token_cursor += 1;
            (t, 1)
        } else if backslash_available && !backslash_taken {
            backslash_taken = true;
            (b'\\', 2)
        } else {
            break;
        };

        let len = crate::text::escaped_byte_len(&bindings[best].pattern, b'`');
        let copies = crate::text::count_non_overlapping(current_text, &bindings[best].pattern);
        let gain = scorer::gain_with_token_cost(copies.max(bindings[best].copies), len, token_cost);

        if gain <= 0 {
            cleared[best] = true;
            for &dependency in &depends[best] {
                used_by[dependency].remove(&best);
            }
            continue;
        }

        bound[best] = true;
        for &dependency in &depends[best] {
            used_by[dependency].remove(&best);
        }
        out.push(AllocatedReplacement {
            source_index: best,
            binding: bindings[best].clone(),
            original: originals[best].clone(),
            token,
            token_cost,
            gain,
            new_order: order_counter,
        });
        order_counter += 1;
    }

    AllocationOutcome {
        bound: out,
        originals,
    }
}

/// Concatenate ordered range strings into the final character-class
/// body, special-casing a lone `-` range so it renders as a literal
/// hyphen at the front of the class.
///
/// ## Arguments
/// * `ranges` - the ordered, repaired, trimmed ranges.
///
/// ## Returns
/// The character-class body (without the surrounding `[`/`]`).
pub fn render_char_class(ranges: &[TokenRange]) -> String {
    let mut dash_first = String::new();
    let mut rest = String::new();
    for range in ranges {
        if range.first == b'-' && range.last == b'-' {
            dash_first.push('-');
        } else {
            rest.push_str(&range.render());
        }
    }
    format!("{dash_first}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_ranges_finds_free_bytes() {
        let ranges = discover_ranges("abc", b'`');
        assert!(!ranges.is_empty());
        let covers_t = ranges.iter().any(|r| r.first <= b'T' && b'T' <= r.last);
        assert!(covers_t);
    }

    #[test]
    fn test_discover_ranges_trims_crlf_from_boundary() {
        // Byte 0x0C (form feed) through 0x0E (shift out) is free if
        // absent; 0x0D (CR) sits in the middle and must be trimmed out
        // as a boundary, not merely skipped as absent-from-text.
        let text: String = (1u8..=126)
            .filter(|&b| b != 0x0B && b != 0x0C && b != 0x0D)
            .map(|b| b as char)
            .collect();
        let ranges = discover_ranges(&text, b'`');
        for r in &ranges {
            assert_ne!(r.first, b'\r');
            assert_ne!(r.last, b'\r');
        }
    }

    #[test]
    fn test_range_cost_and_render() {
        let r = TokenRange { first: b'a', last: b'z' };
        assert_eq!(r.count(), 26);
        assert_eq!(r.render(), "a-z");
        assert_eq!(r.cost(), 3);
    }

    #[test]
    fn test_range_with_backslash_costs_extra() {
        let r = TokenRange { first: b'[', last: b']' };
        assert!(r.contains_backslash() == false);
        assert_eq!(r.cost(), escape_cost(b'[') + 1 + escape_cost(b']'));
    }

    #[test]
    fn test_build_token_supply_separates_backslash() {
        let ranges = vec![TokenRange { first: b'Z', last: b'\\' }];
        let (tokens, backslash) = build_token_supply(&ranges);
        assert!(backslash);
        assert!(!tokens.contains(&b'\\'));
    }

    #[test]
    fn test_bind_single_replacement() {
        let bindings = vec![Binding {
            token: b'T',
            pattern: "abc".to_string(),
            copies: 3,
            gain: 1,
            score: 1.0,
        }];
        let tokens: Vec<u8> = (b'A'..=b'Z').collect();
        let weights = scorer::ScorerWeights::default();
        let outcome = bind(&bindings, "TTT", &tokens, false, &weights);
        assert_eq!(outcome.bound.len(), 1);
        assert_eq!(outcome.bound[0].original, "abc");
        assert_eq!(outcome.bound[0].token_cost, 1);
    }

    #[test]
    fn test_bind_drops_negative_gain_candidate() {
        let bindings = vec![Binding {
            token: b'T',
            pattern: "ab".to_string(),
            copies: 2,
            gain: -2,
            score: -2.0,
        }];
        let tokens: Vec<u8> = vec![b'A'];
        let weights = scorer::ScorerWeights::default();
        let outcome = bind(&bindings, "TT", &tokens, false, &weights);
        assert!(outcome.bound.is_empty());
    }

    #[test]
    fn test_render_char_class_promotes_lone_dash() {
        let ranges = vec![
            TokenRange { first: b'A', last: b'Z' },
            TokenRange { first: b'-', last: b'-' },
        ];
        let class = render_char_class(&ranges);
        assert!(class.starts_with('-'));
    }
}
