//! Whitespace tokenizer with `"`-quoting and `\`-escaping, shared by the
//! script lexer and the scenario INI reader so both handle embedded quotes
//! and escapes the same way.

/// Splits `text` on whitespace, honoring `"..."` quoted spans (which may
/// contain escaped `\"` and `\\`) as single tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        let mut token = String::new();
        if chars[i] == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    i += 1;
                    token.push(match chars[i] {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                } else {
                    token.push(chars[i]);
                }
                i += 1;
            }
            i += 1; // consume closing quote, if any
        } else {
            while i < chars.len() && !chars[i].is_whitespace() {
                token.push(chars[i]);
                i += 1;
            }
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("foo bar  baz"), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn honors_quotes() {
        assert_eq!(tokenize(r#"foo "bar baz" qux"#), vec!["foo", "bar baz", "qux"]);
    }

    #[test]
    fn honors_escapes_inside_quotes() {
        assert_eq!(tokenize(r#""a\"b\\c""#), vec![r#"a"b\c"#]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }
}
