//! Metric names derived from struct field identifiers.

/// The separator used between tokens of a snake case identifier.
pub const SNAKE_CASE_SEPARATOR: char = '_';

/// Wildcard in a `name` tag that is replaced by the snake case of the field name.
pub const NAME_WILDCARD: &str = "*";

#[derive(Default)]
struct Snakifier {
    output: String,
    parsing_upper: bool,
    token: Vec<char>,
}

impl Snakifier {
    fn push(&mut self, ch: char) {
        match ch {
            // separators are kept only between tokens
            SNAKE_CASE_SEPARATOR => self.flush(),

            _ if self.token.is_empty() => {
                self.parsing_upper = ch.is_uppercase();
                self.token.extend(ch.to_lowercase());
            }

            _ if ch.is_lowercase() => {
                if self.parsing_upper {
                    self.parsing_upper = false;

                    // A run of capitals ends here. Its last letter starts the next token.
                    if self.token.len() > 1 {
                        if let Some(last) = self.token.pop() {
                            self.flush();
                            self.token.push(last);
                        }
                    }
                }

                self.token.push(ch);
            }

            _ if ch.is_uppercase() => {
                if !self.parsing_upper {
                    self.flush();
                    self.parsing_upper = true;
                }

                self.token.extend(ch.to_lowercase());
            }

            _ => self.token.push(ch),
        }
    }

    fn flush(&mut self) {
        if self.token.is_empty() {
            return;
        }

        if !self.output.is_empty() {
            self.output.push(SNAKE_CASE_SEPARATOR);
        }

        self.output.extend(self.token.drain(..));
    }

    fn finish(mut self) -> String {
        self.flush();
        self.output
    }
}

/// Converts an identifier, e.g. a struct field name, into snake case.
///
/// Runs of capitals are kept together as one token, except for the last capital
/// when it begins a lowercase word:
///
/// ```
/// use touchstone_core::to_snake_case;
///
/// assert_eq!(to_snake_case("RequestURI"), "request_uri");
/// assert_eq!(to_snake_case("SomethingABCDoit"), "something_abc_doit");
/// assert_eq!(to_snake_case("request_count"), "request_count");
/// ```
pub fn to_snake_case(identifier: &str) -> String {
    let mut s = Snakifier::default();
    for ch in identifier.chars() {
        s.push(ch);
    }

    s.finish()
}

/// Determines the metric name of a field from its identifier and an optional `name` tag.
///
/// The first `*` in the tag is replaced with the snake case of the identifier, which
/// allows easy prefixes and suffixes. A tag without a wildcard is used verbatim. An
/// absent or empty tag yields the snake case of the identifier.
pub fn metric_name(identifier: &str, name_tag: Option<&str>) -> String {
    let snake_case = to_snake_case(identifier);
    match name_tag {
        Some(tag) if !tag.is_empty() => tag.replacen(NAME_WILDCARD, &snake_case, 1),
        _ => snake_case,
    }
}
