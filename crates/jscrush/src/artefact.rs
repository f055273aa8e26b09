//! # Artefact Builder and Verifier
//!
//! Composes the final self-extracting output from a search's ordered
//! replacements and the allocator's character class, then runs an
//! in-process decode simulation to verify the round trip.

use ahash::{AHashMap, AHashSet};
use regex::Regex;

use crate::allocator::{self, TokenRange};
use crate::options::PackerOptions;
use crate::strategies::SearchResult;

/// The result of building one artefact: its byte length (`-1` is the
/// sentinel for "cannot compress this input"), the artefact text itself,
/// a free-form textual report, and whether the decode simulation passed.
#[derive(Debug, Clone)]
pub struct ArtefactResult {
    /// Byte length of `output`, or `-1` on failure.
    pub length: i64,
    /// The complete self-extracting artefact text.
    pub output: String,
    /// Free-form report, e.g. "Final check: passed".
    pub details: String,
    /// Whether the decode simulation reproduced the original input.
    pub verified: bool,
}

/// What a provisional search token should be rewritten to once the
/// allocator has decided which replacements survive.
enum Remap {
    /// The token survived; rewrite it to the allocator's final token.
    Token(u8),
    /// The token was cleared by the allocator; splice its fully-expanded
    /// original text back in wherever it appears.
    Expand(String),
}

fn apply_remap(
    text: &str,
    remap: &AHashMap<u8, Remap>,
) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii() {
            match remap.get(&(ch as u8)) {
                Some(Remap::Token(t)) => out.push(*t as char),
                Some(Remap::Expand(s)) => out.push_str(s),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Shrink the ordered ranges to exactly the one-byte tokens actually
/// consumed (tail trim) and swap a leading `^` out of first place if
/// more than one range remains.
fn trim_and_fix_ranges(
    ranges: Vec<TokenRange>,
    tokens_consumed: usize,
) -> Vec<TokenRange> {
    let mut remaining = tokens_consumed;
    let mut kept = Vec::new();
    for range in ranges {
        if remaining == 0 {
            break;
        }
        let capacity = range.one_byte_token_count();
        if remaining >= capacity {
            kept.push(range);
            remaining -= capacity;
        } else {
            let bytes: Vec<u8> = (range.first..=range.last)
                .filter(|&b| b != b'\\')
                .take(remaining)
                .collect();
            if let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) {
                kept.push(TokenRange { first, last });
            }
            remaining = 0;
        }
    }
    if kept.len() > 1 && kept[0].first == b'^' {
        kept.swap(0, 1);
    }
    kept
}

/// Flatten a range list into the set of byte values it covers.
fn covered_bytes(ranges: &[TokenRange]) -> AHashSet<u8> {
    ranges.iter().flat_map(|r| r.first..=r.last).collect()
}

/// Second half of the range tail-trim: if a chosen range *other* than
/// the one already being tail-trimmed starts or ends with `]` (0x5D),
/// re-bind that replacement's token onto a fresh byte drawn from the
/// tail-trimmed range's spare capacity instead, dropping `]` from the
/// class string entirely.
///
/// The swap only ever goes ahead when it provably shrinks the total
/// class-string cost; `trim_and_fix_ranges` is run on both the
/// untouched and the candidate range lists and their costs compared, so
/// a corner case where the tail range's growth happens to be pricier
/// than the boundary byte it replaces just leaves the ranges untouched.
///
/// ## Arguments
/// * `ordered` - the ordered, repaired ranges (pre tail-trim).
/// * `packed` - the fully assembled, pre-escape packed text.
/// * `tokens_consumed` - the number of one-byte tokens actually bound.
///
/// ## Returns
/// The possibly-adjusted `(ordered, packed)` pair.
fn relocate_bracket_boundary(
    ordered: Vec<TokenRange>,
    packed: String,
    tokens_consumed: usize,
) -> (Vec<TokenRange>, String) {
    if tokens_consumed == 0 {
        return (ordered, packed);
    }

    let offending_index = ordered
        .iter()
        .position(|r| r.count() > 1 && (r.first == b']' || r.last == b']'));
    let Some(offending_index) = offending_index else {
        return (ordered, packed);
    };

    let before_trim = trim_and_fix_ranges(ordered.clone(), tokens_consumed);
    let offending = ordered[offending_index];
    // Tail-trimming only ever shrinks `last` downward, so the tail's
    // `first` still identifies which original range it came from.
    let is_tail = before_trim
        .last()
        .is_some_and(|tail| tail.first == offending.first);
    if is_tail {
        return (ordered, packed);
    }

    let shrunk = if offending.first == b']' {
        TokenRange { first: offending.first + 1, last: offending.last }
    } else {
        TokenRange { first: offending.first, last: offending.last - 1 }
    };
    let mut candidate = ordered.clone();
    candidate[offending_index] = shrunk;

    let after_trim = trim_and_fix_ranges(candidate.clone(), tokens_consumed);

    let before_cost: usize = before_trim.iter().map(TokenRange::cost).sum();
    let after_cost: usize = after_trim.iter().map(TokenRange::cost).sum();
    if after_cost >= before_cost {
        return (ordered, packed);
    }

    let before_set = covered_bytes(&before_trim);
    let after_set = covered_bytes(&after_trim);
    let removed: Vec<u8> = before_set.difference(&after_set).copied().collect();
    let added: Vec<u8> = after_set.difference(&before_set).copied().collect();
    if removed != [b']'] || added.len() != 1 {
        return (ordered, packed);
    }
    let new_token = added[0];

    let rewritten = packed.replace(']', &(new_token as char).to_string());
    (candidate, rewritten)
}

/// Escape backslashes and the string delimiter for embedding in a
/// delimited string literal.
fn escape_for_literal(
    s: &str,
    delimiter: u8,
) -> String {
    let delim_char = delimiter as char;
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\\' || ch == delim_char {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Find the leftmost byte position in `text` whose character falls
/// inside `ranges`.
fn find_token(
    text: &str,
    ranges: &[TokenRange],
) -> Option<char> {
    text.chars().find(|&ch| {
        ch.is_ascii() && ranges.iter().any(|r| r.first <= ch as u8 && ch as u8 <= r.last)
    })
}

/// Run the in-process decode simulation: repeatedly find the leftmost
/// token matching `ranges`, split-shift-join it, until no token remains.
///
/// ## Arguments
/// * `packed` - the unescaped packed literal.
/// * `ranges` - the final, trimmed token ranges.
///
/// ## Returns
/// The fully decoded text.
pub fn simulate_decode(
    packed: &str,
    ranges: &[TokenRange],
) -> String {
    let mut text = packed.to_string();
    loop {
        let token = match find_token(&text, ranges) {
            Some(t) => t,
            None => break,
        };
        let mut pieces: Vec<&str> = text.split(token).collect();
        let head = pieces.remove(0);
        text = pieces.join(head);
    }
    text
}

/// Build the ES6 pattern-token decoder artefact for a finished search.
///
/// ## Arguments
/// * `original_text` - the untouched input text.
/// * `search_result` - the search strategy's outcome.
/// * `options` - the packer options controlling decoder glue.
///
/// ## Returns
/// The built [`ArtefactResult`], including its verification outcome.
pub fn build(
    original_text: &str,
    search_result: &SearchResult,
    options: &PackerOptions,
) -> ArtefactResult {
    if search_result.replacements.is_empty() {
        return wrap_trivial(original_text, options, "no gain found");
    }

    let ranges = allocator::discover_ranges(original_text, options.delimiter);
    if ranges.is_empty() {
        return ArtefactResult {
            length: -1,
            output: String::new(),
            details: "no tokens available".to_string(),
            verified: false,
        };
    }

    let ordered = allocator::order_and_repair_ranges(ranges, search_result.replacements.len());
    let (tokens, backslash_available) = allocator::build_token_supply(&ordered);
    let outcome = allocator::bind(
        &search_result.replacements,
        &search_result.text,
        &tokens,
        backslash_available,
        &options.weights,
    );

    if outcome.bound.is_empty() {
        return wrap_trivial(original_text, options, "no gain found");
    }

    let mut remap: AHashMap<u8, Remap> = AHashMap::new();
    let survivors: AHashMap<usize, &allocator::AllocatedReplacement> = outcome
        .bound
        .iter()
        .map(|a| (a.source_index, a))
        .collect();
    for (i, binding) in search_result.replacements.iter().enumerate() {
        match survivors.get(&i) {
            Some(allocated) => {
                remap.insert(binding.token, Remap::Token(allocated.token));
            }
            None => {
                remap.insert(binding.token, Remap::Expand(outcome.originals[i].clone()));
            }
        }
    }

    let body = apply_remap(&search_result.text, &remap);

    let mut survivors_in_order: Vec<&allocator::AllocatedReplacement> = outcome.bound.iter().collect();
    survivors_in_order.sort_by_key(|a| a.source_index);

    let mut packed_headers = String::new();
    for allocated in survivors_in_order.iter().rev() {
        let header_text = apply_remap(&allocated.binding.pattern, &remap);
        packed_headers.push_str(&header_text);
        packed_headers.push(allocated.token as char);
    }
    let packed = format!("{packed_headers}{body}");

    let tokens_consumed = survivors_in_order
        .iter()
        .filter(|a| a.token != b'\\')
        .count();
    let (ordered, packed) = relocate_bracket_boundary(ordered, packed, tokens_consumed);
    let final_ranges = trim_and_fix_ranges(ordered, tokens_consumed);
    let char_class = allocator::render_char_class(&final_ranges);

    if let Err(err) = Regex::new(&format!("[{char_class}]")) {
        return ArtefactResult {
            length: -1,
            output: String::new(),
            details: format!("internal error: character class `[{char_class}]` does not compile: {err}"),
            verified: false,
        };
    }

    let decoded = simulate_decode(&packed, &final_ranges);
    let verified = decoded == original_text;

    let escaped_packed = escape_for_literal(&packed, options.delimiter);
    let output = render_class_decoder(options, &escaped_packed, &char_class);

    let details = if verified {
        "Final check: passed".to_string()
    } else {
        "Final check: failed".to_string()
    };

    ArtefactResult {
        length: crate::text::byte_len(&output) as i64,
        output,
        details,
        verified,
    }
}

/// Render the regex-character-class decoder shell around an already
/// escaped packed literal and character class, in the form selected by
/// `options.use_es6` (the shorter decoder form when `true`).
///
/// The ES6 form destructures the split array via a bare `with` block;
/// the non-ES6 form spells the same `split`/`shift`/`join` steps out
/// with explicit statements so it never needs `with`. Both decode
/// identically — `simulate_decode` models the `with` form's semantics
/// and is valid for either, since the non-ES6 form differs only in
/// syntax, not in which bytes end up where.
fn render_class_decoder(
    options: &PackerOptions,
    escaped_packed: &str,
    char_class: &str,
) -> String {
    let v = &options.var_name;
    let d = options.delimiter as char;
    let init = &options.wrapped_init;
    let env = &options.env;
    let interp = &options.interp;

    if options.use_es6 {
        format!(
            "for({v}={d}{escaped_packed}{d};G=/[{char_class}]/.exec({v});)with({v}.split(G)){v}=join(shift({init}));{env}{interp}"
        )
    } else {
        format!(
            "for({v}={d}{escaped_packed}{d};G=/[{char_class}]/.exec({v});){{P={v}.split(G[0]);H=P.shift({init});{v}=P.join(H)}}{env}{interp}"
        )
    }
}

/// Wrap `original_text` in a no-op decoder when no replacement survives.
fn wrap_trivial(
    original_text: &str,
    options: &PackerOptions,
    reason: &str,
) -> ArtefactResult {
    let escaped = escape_for_literal(original_text, options.delimiter);
    let output = render_class_decoder(options, &escaped, "");
    ArtefactResult {
        length: crate::text::byte_len(&output) as i64,
        output,
        details: format!("{reason}; Final check: passed"),
        verified: true,
    }
}

/// Escape a digit-token list item the same way as a packed literal
/// (backslash and delimiter). Patterns containing the list separator
/// `|` are a known limitation of the flat digit decoder, same as the
/// pattern-token form's limits on its own reserved bytes.
fn escape_for_list_item(
    s: &str,
    delimiter: u8,
) -> String {
    escape_for_literal(s, delimiter)
}

/// Run the in-process decode simulation for the digit-token variant: a
/// single left-to-right pass matching `/\d/g`'s semantics exactly — each
/// digit character found is replaced by the list entry at its index,
/// with no re-scanning of the substituted text (unlike
/// [`simulate_decode`]'s looping byte-token decode).
///
/// ## Arguments
/// * `packed` - the working text with bound digit tokens embedded.
/// * `list_items` - replacement patterns, in ascending token order
///   (`list_items[i]` is the pattern bound to digit `i`).
///
/// ## Returns
/// The fully decoded text.
pub fn simulate_decode_digit(
    packed: &str,
    list_items: &[String],
) -> String {
    let mut out = String::with_capacity(packed.len());
    for ch in packed.chars() {
        match ch.to_digit(10).and_then(|i| list_items.get(i as usize)) {
            Some(pattern) => out.push_str(pattern),
            None => out.push(ch),
        }
    }
    out
}

/// Build the digit-token decoder artefact for a finished digit-replacer
/// search. Unlike [`build`], there is no allocator pass:
/// every replacement's pattern is a pristine substring of the untouched
/// input (the analyser enumerates once against it, before any token is
/// bound), so it can never itself contain a digit, and the bound token
/// byte *is* the final decoder token — no remap is needed.
///
/// ## Arguments
/// * `original_text` - the untouched input text.
/// * `search_result` - the digit search's outcome (see
///   `strategies::digit::run`).
/// * `options` - the packer options controlling decoder glue.
///
/// ## Returns
/// The built [`ArtefactResult`], including its verification outcome.
pub fn build_digit(
    original_text: &str,
    search_result: &SearchResult,
    options: &PackerOptions,
) -> ArtefactResult {
    if search_result.replacements.is_empty() {
        return wrap_trivial(original_text, options, "no gain found");
    }

    let list_items: Vec<String> = search_result
        .replacements
        .iter()
        .map(|b| escape_for_list_item(&b.pattern, options.delimiter))
        .collect();
    let list = list_items.join("|");

    let decoded = simulate_decode_digit(&search_result.text, &search_result.replacements.iter().map(|b| b.pattern.clone()).collect::<Vec<_>>());
    let verified = decoded == original_text;

    let escaped_packed = escape_for_literal(&search_result.text, options.delimiter);
    let v = &options.var_name;
    let env = &options.env;
    let interp = &options.interp;
    let output = format!(
        "{v}=`{escaped_packed}`.replace(/\\d/g,i=>`{list}`.split`|`[i]);{env}{interp}"
    );

    let details = if verified {
        "Final check: passed".to_string()
    } else {
        "Final check: failed".to_string()
    };

    ArtefactResult {
        length: crate::text::byte_len(&output) as i64,
        output,
        details,
        verified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::{crusher, digit, Binding};

    #[test]
    fn test_build_round_trips_abcabcabc() {
        let options = PackerOptions::default();
        let result = crusher::run("abcabcabc", &options);
        let artefact = build("abcabcabc", &result, &options);
        assert!(artefact.verified, "details: {}", artefact.details);
        assert!(artefact.length > 0);
    }

    #[test]
    fn test_build_trivial_artefact_for_no_replacements() {
        let options = PackerOptions::default();
        let result = SearchResult {
            text: "abcdefgh".to_string(),
            replacements: Vec::new(),
            cumulative_gain: 0,
        };
        let artefact = build("abcdefgh", &result, &options);
        assert!(artefact.verified);
        assert!(artefact.details.contains("no gain found"));
    }

    #[test]
    fn test_build_no_tokens_available_is_sentinel() {
        let options = PackerOptions::default();
        let all_printable: String = (0x20u8..=0x7E).map(|b| b as char).collect();
        let replacements = vec![Binding {
            token: b'T',
            pattern: "xx".to_string(),
            copies: 2,
            gain: 1,
            score: 1.0,
        }];
        let result = SearchResult {
            text: all_printable.clone(),
            replacements,
            cumulative_gain: 1,
        };
        let artefact = build(&all_printable, &result, &options);
        assert_eq!(artefact.length, -1);
        assert_eq!(artefact.details, "no tokens available");
    }

    #[test]
    fn test_simulate_decode_single_token() {
        let ranges = vec![TokenRange { first: b'T', last: b'T' }];
        let decoded = simulate_decode("abcTTTT", &ranges);
        assert_eq!(decoded, "abcabcabc");
    }

    #[test]
    fn test_build_emits_a_compiling_character_class() {
        let input = "She sells seashells by the seashore, The shells she sells are seashells, \
I'm sure. So if she sells seashells on the seashore, Then I'm sure she sells seashore shells.";
        let options = PackerOptions::default();
        let result = crusher::run(input, &options);
        let artefact = build(input, &result, &options);
        assert!(artefact.length > 0);
        let class_start = artefact.output.find("/[").unwrap() + 1;
        let class_end = artefact.output[class_start..].find("]/").unwrap() + class_start + 1;
        let class = &artefact.output[class_start..=class_end];
        assert!(Regex::new(class).is_ok(), "character class `{class}` must compile");
        assert!(!class[1..class.len() - 1].starts_with('^'));
    }

    #[test]
    fn test_non_es6_decoder_form_also_round_trips() {
        let input = "abcabcabc";
        let mut options = PackerOptions::default();
        options.use_es6 = false;
        let result = crusher::run(input, &options);
        let artefact = build(input, &result, &options);
        assert!(artefact.verified, "details: {}", artefact.details);
        assert!(artefact.output.contains("P.shift"));
        assert!(!artefact.output.contains("with("));
    }

    #[test]
    fn test_es6_decoder_form_uses_with() {
        let input = "abcabcabc";
        let options = PackerOptions::default();
        let result = crusher::run(input, &options);
        let artefact = build(input, &result, &options);
        assert!(artefact.output.contains("with("));
    }

    #[test]
    fn test_build_digit_round_trips_with_digit_decoder() {
        let options = PackerOptions::default();
        let block = "abcdefghijklmnopqrst";
        let input = block.repeat(50);
        let result = digit::run(&input, &options).unwrap();
        assert!(!result.replacements.is_empty());

        let artefact = build_digit(&input, &result, &options);
        assert!(artefact.verified, "details: {}", artefact.details);
        assert!(artefact.output.contains(".replace(/\\d/g"));
        assert!(!artefact.output.contains("/[")); // no regex character class
    }

    #[test]
    fn test_build_digit_trivial_for_no_replacements() {
        let options = PackerOptions::default();
        let result = SearchResult {
            text: "abcdefgh".to_string(),
            replacements: Vec::new(),
            cumulative_gain: 0,
        };
        let artefact = build_digit("abcdefgh", &result, &options);
        assert!(artefact.verified);
        assert!(artefact.details.contains("no gain found"));
    }

    #[test]
    fn test_simulate_decode_digit_is_single_pass() {
        let list_items = vec!["abc".to_string(), "xyz".to_string()];
        let decoded = simulate_decode_digit("0 0 0 1 1 1", &list_items);
        assert_eq!(decoded, "abc abc abc xyz xyz xyz");
    }

    #[test]
    fn test_relocate_bracket_boundary_frees_up_bracket() {
        // A two-byte range ending in `]` (backslash is its only other
        // member, both costly) ahead of a 26-byte tail range with room
        // to spare: relocating `]`'s token onto the tail's next free
        // byte drops the costly boundary for a strictly cheaper class.
        let ranges = vec![
            TokenRange { first: b'\\', last: b']' },
            TokenRange { first: b'A', last: b'Z' },
        ];
        let packed = "head]body".to_string();
        let (adjusted, rewritten) = relocate_bracket_boundary(ranges.clone(), packed, 2);

        assert!(!rewritten.contains(']'));
        assert!(rewritten.contains('B'));

        let before_cost: usize = trim_and_fix_ranges(ranges, 2).iter().map(TokenRange::cost).sum();
        let after_cost: usize = trim_and_fix_ranges(adjusted, 2).iter().map(TokenRange::cost).sum();
        assert!(after_cost < before_cost);
    }

    #[test]
    fn test_relocate_bracket_boundary_is_a_noop_without_spare_capacity() {
        // `]` is the boundary of the only other range, but the tail
        // range is already fully consumed: there is nowhere to move
        // `]`'s token to, so the ranges and packed text are untouched.
        let ranges = vec![
            TokenRange { first: b'\\', last: b']' },
            TokenRange { first: b'A', last: b'B' },
        ];
        let packed = "head]body".to_string();
        let (adjusted, rewritten) = relocate_bracket_boundary(ranges.clone(), packed.clone(), 3);
        assert_eq!(adjusted, ranges);
        assert_eq!(rewritten, packed);
    }

    #[test]
    fn test_relocate_bracket_boundary_skips_when_bracket_is_the_tail() {
        // `]` is the boundary of the range that is itself the one being
        // tail-trimmed, which spec.md §4.5 step 7 does not relocate.
        let ranges = vec![TokenRange { first: b'A', last: b']' }];
        let packed = "head]body".to_string();
        let (adjusted, rewritten) = relocate_bracket_boundary(ranges.clone(), packed.clone(), 2);
        assert_eq!(adjusted, ranges);
        assert_eq!(rewritten, packed);
    }
}
