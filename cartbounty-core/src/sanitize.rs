//! Sanitizers applied to every legacy value before it is written.
//!
//! They follow the WordPress helpers the plugin used to clean user supplied
//! checkout fields, so transferred carts look exactly like carts captured by
//! the current version.

use std::sync::LazyLock;

use regex::Regex;

const TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

static SCRIPT_OR_STYLE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?is)<script[^>]*?>.*?</script>").expect("valid script regex"),
        Regex::new(r"(?is)<style[^>]*?>.*?</style>").expect("valid style regex"),
    ]
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\t ]+").expect("valid whitespace regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid spaces regex"));
static OCTET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("valid octet regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);")
        .expect("valid entity regex")
});
static DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").expect("valid dots regex"));
static LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-zA-Z0-9!#$%&'*+/=?^_`{|}~.\-]").expect("valid local part regex")
});
static SUBDOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^a-z0-9\-]+").expect("valid subdomain regex"));

/// Cleans a single line of user supplied text.
///
/// Text starting at a lone `<` is HTML-escaped, markup is stripped
/// (including the body of `script` and `style` elements), runs of whitespace
/// collapse to one space, percent-encoded octets are removed and the result
/// is trimmed.
pub fn sanitize_text_field(value: &str) -> String {
    let mut filtered = if value.contains('<') {
        let escaped = escape_lone_less_than(value);
        let mut stripped = escaped;
        for re in SCRIPT_OR_STYLE.iter() {
            stripped = re.replace_all(&stripped, "").into_owned();
        }

        TAG.replace_all(&stripped, "")
            .trim_matches(TRIM)
            .to_owned()
    } else {
        value.to_owned()
    };

    filtered = WHITESPACE.replace_all(&filtered, " ").into_owned();
    filtered = filtered.trim_matches(TRIM).to_owned();

    let mut found = false;
    while OCTET.is_match(&filtered) {
        filtered = OCTET.replace_all(&filtered, "").into_owned();
        found = true;
    }

    if found {
        filtered = SPACES
            .replace_all(&filtered, " ")
            .trim_matches(TRIM)
            .to_owned();
    }

    filtered
}

/// Strips every character not allowed in an e-mail address.
///
/// Returns an empty string when what remains cannot be an address: shorter
/// than six characters, no `@` after the first character, empty local part or
/// fewer than two domain labels.
pub fn sanitize_email(value: &str) -> String {
    if value.len() < 6 {
        return String::new();
    }

    let Some((local, domain)) = value
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '@')
        .map(|(at, _)| (&value[..at], &value[at + 1..]))
    else {
        return String::new();
    };

    let local = LOCAL_PART.replace_all(local, "");
    if local.is_empty() {
        return String::new();
    }

    let domain = DOTS.replace_all(domain, "");
    let domain = domain.trim_matches(|c: char| TRIM.contains(&c) || c == '.');
    if domain.is_empty() {
        return String::new();
    }

    let labels = domain.split('.').collect::<Vec<_>>();
    if labels.len() < 2 {
        return String::new();
    }

    let labels = labels
        .into_iter()
        .map(|label| {
            let label = label.trim_matches(|c: char| TRIM.contains(&c) || c == '-');
            SUBDOMAIN.replace_all(label, "").into_owned()
        })
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>();

    if labels.len() < 2 {
        return String::new();
    }

    format!("{local}@{}", labels.join("."))
}

/// Rounds a monetary amount to two fractional digits.
pub fn round_total(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    format!("{value:.2}").parse().unwrap_or(0.0)
}

/// Formats a cart total followed by its currency, e.g. `12.50 EUR`.
pub fn format_total(total: Option<f64>, currency: Option<&str>) -> String {
    let total = total.unwrap_or_default();

    match currency.filter(|c| !c.is_empty()) {
        Some(currency) => format!("{total:.2} {currency}"),
        None => format!("{total:.2}"),
    }
}

// A `<` that is not closed by `>` before the next `<` or the end of the text
// is not markup. The run it starts is HTML-escaped so that it survives tag
// stripping.
fn escape_lone_less_than(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        match tail.find(['<', '>']) {
            Some(end) if tail.as_bytes()[end] == b'>' => {
                out.push_str(&rest[start..start + 1 + end + 1]);
                rest = &tail[end + 1..];
            }
            Some(end) => {
                out.push_str(&escape_html(&rest[start..start + 1 + end]));
                rest = &tail[end..];
            }
            None => {
                out.push_str(&escape_html(&rest[start..]));
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

// Escapes markup characters, leaving existing entities as they are.
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());

    for (index, c) in value.char_indices() {
        match c {
            '&' if ENTITY.is_match(&value[index..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(sanitize_text_field("  John  "), "John");
        assert_eq!(sanitize_text_field("New\nYork\t City"), "New York City");
        assert_eq!(sanitize_text_field("<b>Bold</b> move"), "Bold move");
        assert_eq!(
            sanitize_text_field("hi<script>alert(1)</script> there"),
            "hi there"
        );
        assert_eq!(sanitize_text_field("1 < 2"), "1 &lt; 2");
        assert_eq!(sanitize_text_field("1 < 2 & 3"), "1 &lt; 2 &amp; 3");
        assert_eq!(sanitize_text_field(r#"a < "b's""#), "a &lt; &quot;b&#039;s&quot;");
        assert_eq!(sanitize_text_field("x < &amp; y"), "x &lt; &amp; y");
        assert_eq!(sanitize_text_field("a < b <i>c</i> & d"), "a &lt; b c & d");
        assert_eq!(sanitize_text_field("50%20off"), "50off");
        assert_eq!(sanitize_text_field("a %41 b"), "a b");
        assert_eq!(sanitize_text_field(""), "");
    }

    #[test]
    fn test_sanitize_text_field_keeps_plain_text() {
        let value = r#"[{"product_id":12,"product_title":"Mug","quantity":2}]"#;

        assert_eq!(sanitize_text_field(value), value);
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email("john@example.com"), "john@example.com");
        assert_eq!(sanitize_email("jo hn@exa mple.com"), "john@example.com");
        assert_eq!(sanitize_email("john@example..com"), "");
        assert_eq!(sanitize_email("john@.example.com."), "john@example.com");
        assert_eq!(sanitize_email("a@b.c"), "");
        assert_eq!(sanitize_email("@example.com"), "");
        assert_eq!(sanitize_email("john@localhost"), "");
        assert_eq!(sanitize_email("()<>@example.com"), "");
    }

    #[test]
    fn test_round_total() {
        assert_eq!(round_total(12.346), 12.35);
        assert_eq!(round_total(10.0), 10.0);
        assert_eq!(round_total(f64::NAN), 0.0);
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(Some(12.5), Some("EUR")), "12.50 EUR");
        assert_eq!(format_total(None, Some("USD")), "0.00 USD");
        assert_eq!(format_total(Some(3.0), None), "3.00");
    }
}
