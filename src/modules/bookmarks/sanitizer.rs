//! Read-time XSS filter for free-text bookmark fields.
//!
//! Allow-listed tags are re-emitted with allow-listed attributes only; every
//! other tag and every stray angle bracket is escaped. Event handler
//! attributes never survive, and `href`/`src` keep only relative URLs or an
//! allow-listed scheme, judged after decoding character references. The output contains no
//! raw `<` except at the start of an allow-listed tag, so sanitizing twice
//! gives the same text as sanitizing once.

use super::models::Bookmark;

const ALLOWED_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target"]),
    ("b", &[]),
    ("blockquote", &[]),
    ("br", &[]),
    ("code", &[]),
    ("em", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("li", &[]),
    ("ol", &[]),
    ("p", &[]),
    ("pre", &[]),
    ("span", &[]),
    ("strong", &[]),
    ("u", &[]),
    ("ul", &[]),
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];
const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Named references that can spell out a scheme separator or be stripped from
/// a URL by the browser.
const NAMED_CHAR_REFS: &[(&str, char)] = &[
    ("Tab", '\t'),
    ("NewLine", '\n'),
    ("colon", ':'),
    ("sol", '/'),
    ("quest", '?'),
    ("num", '#'),
    ("period", '.'),
    ("lpar", '('),
    ("rpar", ')'),
    ("amp", '&'),
    ("quot", '"'),
    ("apos", '\''),
    ("lt", '<'),
    ("gt", '>'),
];

/// Clean the client-visible text fields of a stored bookmark.
pub fn sanitize_bookmark(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        title: sanitize(&bookmark.title),
        description: bookmark.description.as_deref().map(sanitize),
        ..bookmark
    }
}

/// Escape or strip active markup from `text`.
pub fn sanitize(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(['<', '>']) {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];

        if candidate.starts_with('>') {
            output.push_str("&gt;");
            rest = &candidate[1..];
            continue;
        }

        match Tag::parse(candidate) {
            Some((tag, consumed)) => {
                match tag.render_allowed() {
                    Some(rendered) => output.push_str(&rendered),
                    None => output.push_str(&escape_brackets(&candidate[..consumed])),
                }
                rest = &candidate[consumed..];
            }
            None => {
                output.push_str("&lt;");
                rest = &candidate[1..];
            }
        }
    }

    output.push_str(rest);
    output
}

fn escape_brackets(raw: &str) -> String {
    raw.replace('<', "&lt;").replace('>', "&gt;")
}

#[derive(Debug)]
struct Tag<'a> {
    name: String,
    closing: bool,
    self_closing: bool,
    attributes: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> Tag<'a> {
    /// Parse a tag at the start of `input` (which begins with `<`).
    ///
    /// Returns the tag and the number of bytes it spans, or `None` when the
    /// text is not a well-formed tag.
    fn parse(input: &'a str) -> Option<(Self, usize)> {
        let bytes = input.as_bytes();
        let mut pos = 1;

        let closing = bytes.get(pos) == Some(&b'/');
        if closing {
            pos += 1;
        }

        let name_start = pos;
        if !bytes.get(pos)?.is_ascii_alphabetic() {
            return None;
        }
        while bytes.get(pos).is_some_and(|byte| byte.is_ascii_alphanumeric()) {
            pos += 1;
        }
        let name = input[name_start..pos].to_ascii_lowercase();

        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            while bytes.get(pos).is_some_and(|byte| byte.is_ascii_whitespace()) {
                pos += 1;
            }

            match *bytes.get(pos)? {
                b'>' => {
                    pos += 1;
                    break;
                }
                b'/' => {
                    pos += 1;
                    if bytes.get(pos) == Some(&b'>') {
                        self_closing = true;
                    }
                    continue;
                }
                b'<' => return None,
                _ => {}
            }

            let attr_start = pos;
            while bytes
                .get(pos)
                .is_some_and(|byte| !byte.is_ascii_whitespace() && !b"=/><\"'".contains(byte))
            {
                pos += 1;
            }
            if pos == attr_start {
                // Stray quote or '=' where a name should be.
                return None;
            }
            let attr_name = &input[attr_start..pos];

            while bytes.get(pos).is_some_and(|byte| byte.is_ascii_whitespace()) {
                pos += 1;
            }

            if bytes.get(pos) != Some(&b'=') {
                attributes.push((attr_name, None));
                continue;
            }
            pos += 1;
            while bytes.get(pos).is_some_and(|byte| byte.is_ascii_whitespace()) {
                pos += 1;
            }

            let value = match *bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let value_start = pos + 1;
                    let len = input[value_start..].find(quote as char)?;
                    pos = value_start + len + 1;
                    &input[value_start..value_start + len]
                }
                _ => {
                    let value_start = pos;
                    while bytes
                        .get(pos)
                        .is_some_and(|byte| !byte.is_ascii_whitespace() && *byte != b'>')
                    {
                        pos += 1;
                    }
                    &input[value_start..pos]
                }
            };
            attributes.push((attr_name, Some(value)));
        }

        Some((
            Tag {
                name,
                closing,
                self_closing,
                attributes,
            },
            pos,
        ))
    }

    /// Re-emit the tag in canonical form if it is allow-listed.
    fn render_allowed(&self) -> Option<String> {
        let allowed_attributes = ALLOWED_TAGS
            .iter()
            .find(|(name, _)| *name == self.name)
            .map(|(_, attributes)| *attributes)?;

        if self.closing {
            return Some(format!("</{}>", self.name));
        }

        let mut rendered = format!("<{}", self.name);
        for (name, value) in &self.attributes {
            let name = name.to_ascii_lowercase();
            if !allowed_attributes.contains(&name.as_str()) {
                continue;
            }
            match value {
                Some(value) if URL_ATTRIBUTES.contains(&name.as_str()) && !is_safe_url(value) => {}
                Some(value) => {
                    rendered.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
                }
                None => {
                    rendered.push(' ');
                    rendered.push_str(&name);
                }
            }
        }
        rendered.push_str(if self.self_closing { " />" } else { ">" });

        Some(rendered)
    }
}

/// Relative URLs and allow-listed schemes only.
fn is_safe_url(value: &str) -> bool {
    let compact = decode_char_refs(value)
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.find([':', '/', '?', '#']) {
        Some(end) if compact[end..].starts_with(':') => ALLOWED_URL_SCHEMES.contains(&&compact[..end]),
        _ => true,
    }
}

/// Single-pass decode of `&#NN;`, `&#xNN;` and the named references above.
/// Unknown references are kept verbatim.
fn decode_char_refs(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let reference = &rest[start + 1..];

        match decode_char_ref(reference) {
            Some((ch, consumed)) => {
                decoded.push(ch);
                rest = &reference[consumed..];
            }
            None => {
                decoded.push('&');
                rest = reference;
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

/// Decode the reference at the start of `input` (just past the `&`).
fn decode_char_ref(input: &str) -> Option<(char, usize)> {
    if let Some(numeric) = input.strip_prefix('#') {
        let (prefix_len, radix) = match numeric.as_bytes().first() {
            Some(b'x' | b'X') => (1, 16),
            _ => (0, 10),
        };
        let digits = &numeric[prefix_len..];
        let len = digits
            .find(|ch: char| !ch.is_digit(radix))
            .unwrap_or(digits.len());
        if len == 0 {
            return None;
        }

        // Browsers accept a missing `;` after numeric references.
        let code = u32::from_str_radix(&digits[..len], radix).ok()?;
        let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
        let mut consumed = 1 + prefix_len + len;
        if input[consumed..].starts_with(';') {
            consumed += 1;
        }
        return Some((ch, consumed));
    }

    let end = input.find(';')?;
    NAMED_CHAR_REFS
        .iter()
        .find(|(name, _)| *name == &input[..end])
        .map(|(_, ch)| (*ch, end + 1))
}

/// Entities already present are left alone so a second pass is a no-op.
fn escape_attribute(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
