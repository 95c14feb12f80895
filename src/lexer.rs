//! Word splitting for command lines handed to external processes.
//!
//! This is deliberately much simpler than a shell lexer: no escapes, no
//! nesting, no substitution syntax (variables are expanded before any line
//! reaches this module).

/// Split one command line into words.
///
/// A word is either a maximal run of characters containing no whitespace and
/// no double quote, or the content between a pair of double quotes (quotes
/// stripped, embedded whitespace preserved). An unmatched opening quote takes
/// the rest of the line as literal content; it is not an error.
///
/// The first word is the program name, the rest are its arguments.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut buf = String::new();
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if !buf.is_empty() {
                    words.push(std::mem::take(&mut buf));
                }
            }
            '"' => {
                // A quote also terminates a bare word, so `a"b c"` yields
                // two words.
                if !buf.is_empty() {
                    words.push(std::mem::take(&mut buf));
                }
                let mut quoted = String::new();
                let mut closed = false;
                for qc in chars.by_ref() {
                    if qc == '"' {
                        closed = true;
                        break;
                    }
                    quoted.push(qc);
                }
                if closed {
                    words.push(quoted);
                } else {
                    // Unmatched quote: keep the remainder as literal content.
                    buf = quoted;
                }
            }
            c => buf.push(c),
        }
    }

    if !buf.is_empty() {
        words.push(buf);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_words(line)
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("ls -la /tmp"), ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn quoted_argument_is_one_word() {
        assert_eq!(words("rm \"my file.txt\""), ["rm", "my file.txt"]);
    }

    #[test]
    fn empty_quotes_produce_empty_word() {
        assert_eq!(words("touch \"\""), ["touch", ""]);
    }

    #[test]
    fn quote_terminates_bare_word() {
        assert_eq!(words("a\"b c\""), ["a", "b c"]);
    }

    #[test]
    fn unmatched_quote_takes_rest_of_line() {
        assert_eq!(words("say \"hi there"), ["say", "hi there"]);
    }

    #[test]
    fn repeated_whitespace_collapses() {
        assert_eq!(words("  echo   hello \t world "), ["echo", "hello", "world"]);
    }

    #[test]
    fn empty_line_has_no_words() {
        assert!(words("").is_empty());
        assert!(words("   ").is_empty());
    }
}
