//! Declaration scanner for preprocessed C.
//!
//! Works on `clang -E` output: line markers give source locations, the
//! versioning macros have already expanded to `annotate` attributes, and
//! conditional blocks for the configuration have been resolved. Only
//! top-level function and variable declarations are extracted; type
//! definitions, typedefs and static assertions are skipped.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::ParsedDeclaration;
use crate::database::Location;

static LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*(?:line\s+)?(\d+)\s+"((?:[^"\\]|\\.)*)""#).expect("valid regex")
});

// The versioning macros stringify their argument, so one annotation may be
// several adjacent literals: `annotate("introduced_in=" "21")`.
static ANNOTATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bannotate\s*\(\s*((?:"(?:[^"\\]|\\.)*"\s*)+)\)"#).expect("valid regex")
});

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));

static ATTRIBUTE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:__attribute__|__attribute|__asm__|__asm|asm|__declspec)\s*\(")
        .expect("valid regex")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const KEYWORDS: &[&str] = &[
    "_Alignas", "_Atomic", "_Bool", "_Complex", "_Noreturn", "_Static_assert", "__extension__",
    "__inline", "__inline__", "__restrict", "__restrict__", "__typeof__", "auto", "char", "const",
    "double", "enum", "extern", "float", "inline", "int", "long", "register", "restrict", "short",
    "signed", "sizeof", "static", "static_assert", "struct", "typedef", "typeof", "union",
    "unsigned", "void", "volatile",
];

/// Scan preprocessed text, keeping declarations located under `header_root`.
pub fn scan(text: &str, header_root: &Path) -> Vec<ParsedDeclaration> {
    let mut scanner = Scanner::new(header_root);
    for line in text.lines() {
        scanner.feed_line(line);
    }
    scanner.declarations
}

struct Scanner<'a> {
    header_root: &'a Path,
    file: PathBuf,
    line: u32,
    stmt: String,
    start: Option<Location>,
    paren_depth: usize,
    brace_depth: usize,
    /// Non-zero while skipping a function body.
    body_depth: usize,
    quote: Option<char>,
    escaped: bool,
    declarations: Vec<ParsedDeclaration>,
}

impl<'a> Scanner<'a> {
    fn new(header_root: &'a Path) -> Self {
        Scanner {
            header_root,
            file: PathBuf::new(),
            line: 1,
            stmt: String::new(),
            start: None,
            paren_depth: 0,
            brace_depth: 0,
            body_depth: 0,
            quote: None,
            escaped: false,
            declarations: Vec::new(),
        }
    }

    fn feed_line(&mut self, line: &str) {
        if line.trim_start().starts_with('#') {
            // A line marker names the file and line of the *next* line.
            if let Some(caps) = LINE_MARKER.captures(line) {
                self.line = caps[1].parse().unwrap_or(self.line);
                self.file = PathBuf::from(caps[2].replace("\\\\", "\\"));
                return;
            }
            // Surviving directives (#pragma, #ident) carry no declarations.
            self.line += 1;
            return;
        }

        for (idx, c) in line.chars().enumerate() {
            self.feed_char(c, idx as u32 + 1);
        }

        // Literals never span lines in preprocessed output.
        self.quote = None;
        self.escaped = false;
        if self.start.is_some() && self.body_depth == 0 {
            self.stmt.push(' ');
        }
        self.line += 1;
    }

    fn feed_char(&mut self, c: char, column: u32) {
        if self.body_depth > 0 {
            self.skip_body_char(c);
            return;
        }

        if let Some(quote) = self.quote {
            self.stmt.push(c);
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return;
        }

        if self.start.is_none() {
            if c.is_whitespace() {
                return;
            }
            self.start = Some(Location::new(self.file.clone(), self.line, column));
        }

        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                self.stmt.push(c);
            }
            '(' => {
                self.paren_depth += 1;
                self.stmt.push(c);
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.stmt.push(c);
            }
            '{' if self.paren_depth == 0 && self.brace_depth == 0 => {
                if self.stmt.trim() == "extern \"C\"" {
                    self.reset();
                } else if looks_like_function_header(&self.stmt) {
                    self.finish_statement(true);
                    self.body_depth = 1;
                } else {
                    self.brace_depth = 1;
                    self.stmt.push(c);
                }
            }
            '{' => {
                self.brace_depth += 1;
                self.stmt.push(c);
            }
            '}' if self.brace_depth == 0 => {
                // Closes a linkage block; nothing pending belongs to it.
                self.reset();
            }
            '}' => {
                self.brace_depth -= 1;
                self.stmt.push(c);
            }
            ';' if self.paren_depth == 0 && self.brace_depth == 0 => {
                self.finish_statement(false);
            }
            _ => self.stmt.push(c),
        }
    }

    fn skip_body_char(&mut self, c: char) {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return;
        }

        match c {
            '"' | '\'' => self.quote = Some(c),
            '{' => self.body_depth += 1,
            '}' => self.body_depth -= 1,
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.stmt.clear();
        self.start = None;
        self.paren_depth = 0;
        self.brace_depth = 0;
    }

    fn finish_statement(&mut self, is_definition: bool) {
        let text = std::mem::take(&mut self.stmt);
        let start = self.start.take();
        self.reset();

        let Some(location) = start else {
            return;
        };
        if !location.file.starts_with(self.header_root) {
            return;
        }

        self.declarations
            .extend(parse_declaration(&text, location, is_definition));
    }
}

/// Index just past the parenthesis group opening at `open`.
fn skip_parens(text: &str, open: usize) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return open + idx + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

/// Remove attribute, asm-label and declspec groups.
fn strip_groups(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(m) = ATTRIBUTE_GROUP.find_at(text, pos) {
        out.push_str(&text[pos..m.start()]);
        out.push(' ');
        pos = skip_parens(text, m.end() - 1);
    }
    out.push_str(&text[pos..]);
    out
}

fn looks_like_function_header(stmt: &str) -> bool {
    let stripped = strip_groups(stmt);
    let s = stripped.trim();
    !s.starts_with("typedef") && !s.contains('=') && s.ends_with(')')
}

fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

/// Concatenate adjacent string literals the way the C translator does.
fn concat_literals(literals: &str) -> String {
    STRING_LITERAL
        .captures_iter(literals)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Split at commas outside any parentheses or brackets.
fn split_declarators(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[begin..idx]);
                begin = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[begin..]);
    parts
}

/// Every name declared by one statement; they share its annotations and location.
fn parse_declaration(text: &str, location: Location, is_definition: bool) -> Vec<ParsedDeclaration> {
    let annotations: Vec<String> = ANNOTATE
        .captures_iter(text)
        .map(|caps| concat_literals(&caps[1]))
        .collect();

    let stripped = strip_groups(text);
    let normalized = WHITESPACE.replace_all(stripped.trim(), " ");
    let mut s: &str = &normalized;
    while let Some(rest) = s.strip_prefix("__extension__") {
        s = rest.trim_start();
    }

    if s.is_empty() || s.contains('{') {
        return Vec::new();
    }
    match IDENTIFIER.find(s) {
        None => return Vec::new(),
        Some(first) if matches!(first.as_str(), "typedef" | "_Static_assert" | "static_assert") => {
            return Vec::new()
        }
        Some(_) => {}
    }

    let declarators = split_declarators(s);
    let Some((name, type_end)) = declarator_name(declarators[0]) else {
        return Vec::new();
    };

    // `int *a, b[4]`: later declarators reuse the specifiers before the first name.
    let specifiers = declarators[0][..type_end].trim_end_matches(['*', ' ']);
    let mut names = vec![name];
    for declarator in &declarators[1..] {
        let full = format!("{} {}", specifiers, declarator.trim());
        if let Some((name, _)) = declarator_name(&full) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .map(|name| ParsedDeclaration {
            name,
            location: location.clone(),
            is_definition,
            annotations: annotations.clone(),
        })
        .collect()
}

/// Find the declared name in a single declarator with attributes removed,
/// plus the offset where the declarator starts.
fn declarator_name(s: &str) -> Option<(String, usize)> {
    let (prefix, name, type_end) = match s.find('(') {
        // `int (*handler)(int)` or `void (*signal(int, ...))(int)`
        Some(open) if s[open + 1..].trim_start().starts_with('*') => {
            let inner = &s[open + 1..];
            let end = inner.find(['(', ')']).unwrap_or(inner.len());
            let name = last_identifier(&inner[..end])?;
            (&s[..open], name.as_str(), open)
        }
        Some(open) => {
            let prefix = &s[..open];
            let name = last_identifier(prefix)?;
            (prefix, name.as_str(), name.start())
        }
        None => {
            let end = s.find(['=', '[']).unwrap_or(s.len());
            let prefix = &s[..end];
            let name = last_identifier(prefix)?;
            (prefix, name.as_str(), name.start())
        }
    };

    if is_keyword(name) {
        return None;
    }

    // Needs a type before the name, and `struct tag;` declares no object.
    let idents: Vec<&str> = IDENTIFIER.find_iter(prefix).map(|m| m.as_str()).collect();
    let type_idents = if idents.last() == Some(&name) {
        &idents[..idents.len() - 1]
    } else {
        &idents[..]
    };
    match type_idents.last() {
        None => None,
        Some(&prev) if matches!(prev, "struct" | "union" | "enum") && !prefix.contains('*') => None,
        Some(_) => Some((name.to_string(), type_end)),
    }
}

fn last_identifier(s: &str) -> Option<regex::Match<'_>> {
    IDENTIFIER
        .find_iter(s)
        .filter(|m| !matches!(m.as_str(), "const" | "volatile" | "restrict" | "__restrict"))
        .last()
}
