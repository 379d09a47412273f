//! Annotation scanner.
//!
//! Recognizes the one-line form
//!
//! ```text
//! //dynabi:sym LIB_VAR symbol_name
//! static mut NAME: Option<unsafe extern "C" fn(args) -> ret> = None;
//! ```
//!
//! and extracts the declared shape from the static's own type. The scanner
//! is deliberately forgiving: malformed annotations and declarations it
//! cannot make sense of are logged and skipped, never fatal, so a stray
//! comment in an input file cannot break a build step.

/// One declared argument: a name (given or synthesized `a0`, `a1`, ...)
/// and its verbatim type spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    pub name: String,
    pub ty: String,
}

/// One annotated symbol and the shape of its declared function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Name of the annotated static.
    pub var_name: String,
    /// Library variable named by the annotation.
    pub lib_var: String,
    /// Exported symbol name to resolve.
    pub sym_name: String,
    pub args: Vec<ArgDecl>,
    /// Verbatim return type spelling; `None` for unit.
    pub ret: Option<String>,
    /// Whether the static wraps the function type in `Option<..>` and so
    /// has a slot the binder should fill with the generated thunk.
    pub has_slot: bool,
}

/// Scan `source` for annotated declarations, in source order.
pub fn parse_source(source: &str) -> Vec<FuncDecl> {
    let mut decls = Vec::new();
    let mut lines = source.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("//dynabi:sym") else {
            continue;
        };
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let [lib_var, sym_name] = parts.as_slice() else {
            log::warn!("skipping malformed annotation '{trimmed}'");
            continue;
        };

        // Join the following declaration through its terminating ';'.
        let mut decl = String::new();
        for l in lines.by_ref() {
            let lt = l.trim();
            if decl.is_empty() && (lt.is_empty() || lt.starts_with("//")) {
                continue;
            }
            decl.push_str(lt);
            decl.push(' ');
            if lt.contains(';') {
                break;
            }
        }

        match parse_decl(&decl, lib_var, sym_name) {
            Some(d) => decls.push(d),
            None => log::warn!(
                "skipping annotation '{trimmed}': cannot parse declaration '{}'",
                decl.trim()
            ),
        }
    }
    decls
}

fn parse_decl(decl: &str, lib_var: &str, sym_name: &str) -> Option<FuncDecl> {
    let mut toks = decl.split_whitespace();
    loop {
        let tok = toks.next()?;
        if tok == "static" {
            break;
        }
        if !(tok == "pub" || tok.starts_with("pub(")) {
            return None;
        }
    }
    let mut name_tok = toks.next()?;
    if name_tok == "mut" {
        name_tok = toks.next()?;
    }
    let var_name = name_tok.split(':').next()?.trim();
    if var_name.is_empty() || !var_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let fn_pos = decl.find("fn(").or_else(|| decl.find("fn ("))?;
    let open = fn_pos + decl[fn_pos..].find('(')?;
    let close = matching_paren(decl, open)?;
    let args = parse_args(&decl[open + 1..close]);
    let ret = parse_ret(decl[close + 1..].trim_start());
    let has_slot = decl[..fn_pos].contains("Option");

    Some(FuncDecl {
        var_name: var_name.to_string(),
        lib_var: lib_var.to_string(),
        sym_name: sym_name.to_string(),
        args,
        ret,
        has_slot,
    })
}

fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in s.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_args(list: &str) -> Vec<ArgDecl> {
    let mut args = Vec::new();
    for piece in split_top_level(list, ',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let idx = args.len();
        match top_level_colon(piece) {
            Some(pos) => args.push(ArgDecl {
                name: piece[..pos].trim().to_string(),
                ty: piece[pos + 1..].trim().to_string(),
            }),
            None => args.push(ArgDecl {
                name: format!("a{idx}"),
                ty: piece.to_string(),
            }),
        }
    }
    args
}

fn parse_ret(tail: &str) -> Option<String> {
    let r = tail.strip_prefix("->")?.trim_start();
    let mut depth = 0i32;
    let mut end = r.len();
    for (i, c) in r.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            '>' if depth > 0 => depth -= 1,
            '>' | '=' | ';' => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let r = r[..end].trim().trim_end_matches(',').trim_end();
    if r.is_empty() || r == "()" {
        None
    } else {
        Some(r.to_string())
    }
}

/// Split at `sep` occurrences outside any `<>`/`()`/`[]` nesting.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

/// Position of a top-level `:` that is not part of a `::` path, if any.
fn top_level_colon(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth -= 1,
            b':' if depth == 0 => {
                if i + 1 < bytes.len() && bytes[i + 1] == b':' {
                    i += 2;
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}
