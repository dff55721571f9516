//! Best-effort code highlighting.
//!
//! There is no grammar here. Each line is scanned left to right against an
//! ordered rule table; the first rule that matches at the current position
//! wins. Anything unmatched falls back to an identifier run or a single
//! character, so the tokens of a line always concatenate back to the line.

use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    Builtin,
    Number,
    Operator,
    Bracket,
    Identifier,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

pub type HighlightedLine = Vec<Token>;

const KEYWORDS: &str = "const|let|var|function|return|if|else|for|while|class|import|export|from|async|await|try|catch|throw|new|this|super|extends|implements|interface|type|enum|def|print|elif|except|finally|with|as|lambda|yield|pass|break|continue|in|is|not|and|or|True|False|None";

const BUILTINS: &str = "console|document|window|alert|parseInt|parseFloat|Math|Array|Object|String|Number|Boolean|JSON|Promise|fetch|setTimeout|setInterval|getElementById|innerHTML|querySelector|addEventListener";

/// Rule table, tried in order. Every pattern is anchored at the scan position.
static RULES: LazyLock<Vec<(Regex, TokenKind)>> = LazyLock::new(|| {
    let rule = |pattern: String, kind| (Regex::new(&format!("^(?:{})", pattern)).unwrap(), kind);
    vec![
        rule(r"//.*".into(), TokenKind::Comment),
        rule(r"#.*".into(), TokenKind::Comment),
        rule(
            r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`"#.into(),
            TokenKind::String,
        ),
        rule(format!(r"\b(?:{})\b", KEYWORDS), TokenKind::Keyword),
        rule(format!(r"\b(?:{})\b", BUILTINS), TokenKind::Builtin),
        rule(r"\b\d+\.?\d*\b".into(), TokenKind::Number),
        rule(
            r"===|!==|==|!=|<=|>=|&&|\|\||[+\-*/%=<>!&|^~]".into(),
            TokenKind::Operator,
        ),
        rule(r"[{}\[\]().,;:]".into(), TokenKind::Bracket),
    ]
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+").unwrap());

/// Tokenize `code` line by line. `language` is accepted for labelling only;
/// the same rules apply to every language.
pub fn highlight(code: &str, _language: &str) -> Vec<HighlightedLine> {
    code.split('\n').map(highlight_line).collect()
}

fn highlight_line(line: &str) -> HighlightedLine {
    let mut tokens: HighlightedLine = Vec::new();
    let mut rest = line;

    while !rest.is_empty() {
        let (kind, len) = next_token(rest);
        push(&mut tokens, kind, &rest[..len]);
        rest = &rest[len..];
    }
    tokens
}

fn next_token(rest: &str) -> (TokenKind, usize) {
    for (re, kind) in RULES.iter() {
        if let Some(m) = re.find(rest) {
            if !m.as_str().is_empty() {
                return (*kind, m.end());
            }
        }
    }
    if let Some(m) = WORD.find(rest) {
        return (TokenKind::Identifier, m.end());
    }
    let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
    (TokenKind::Plain, width)
}

/// Runs of plain characters are merged into one token.
fn push(tokens: &mut HighlightedLine, kind: TokenKind, text: &str) {
    if kind == TokenKind::Plain {
        if let Some(last) = tokens.last_mut().filter(|t| t.kind == TokenKind::Plain) {
            last.text.push_str(text);
            return;
        }
    }
    tokens.push(Token {
        kind,
        text: text.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &HighlightedLine) -> Vec<(TokenKind, &str)> {
        line.iter().map(|t| (t.kind, t.text.as_str())).collect()
    }

    #[test]
    fn test_js_line() {
        let lines = highlight("const x = fetch(\"a\");", "js");
        assert_eq!(
            kinds(&lines[0]),
            vec![
                (TokenKind::Keyword, "const"),
                (TokenKind::Plain, " "),
                (TokenKind::Identifier, "x"),
                (TokenKind::Plain, " "),
                (TokenKind::Operator, "="),
                (TokenKind::Plain, " "),
                (TokenKind::Builtin, "fetch"),
                (TokenKind::Bracket, "("),
                (TokenKind::String, "\"a\""),
                (TokenKind::Bracket, ")"),
                (TokenKind::Bracket, ";"),
            ]
        );
    }

    #[test]
    fn test_comment_takes_rest_of_line() {
        let lines = highlight("# print(1)\n// done", "python");
        assert_eq!(kinds(&lines[0]), vec![(TokenKind::Comment, "# print(1)")]);
        assert_eq!(kinds(&lines[1]), vec![(TokenKind::Comment, "// done")]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let lines = highlight("constant", "js");
        assert_eq!(kinds(&lines[0]), vec![(TokenKind::Identifier, "constant")]);
    }

    #[test]
    fn test_numbers_and_operators() {
        let lines = highlight("a >= 3.14", "js");
        assert_eq!(
            kinds(&lines[0]),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Plain, " "),
                (TokenKind::Operator, ">="),
                (TokenKind::Plain, " "),
                (TokenKind::Number, "3.14"),
            ]
        );
    }

    #[test]
    fn test_tokens_rebuild_each_line() {
        let code = "def f(x):\n    return x * 2  # double\n\n  señal = 'ü'";
        let lines = highlight(code, "python");
        assert_eq!(lines.len(), 4);
        let rebuilt: Vec<String> = lines
            .iter()
            .map(|l| l.iter().map(|t| t.text.as_str()).collect())
            .collect();
        assert_eq!(rebuilt.join("\n"), code);
    }
}
