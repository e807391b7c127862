//! Canonical signature erasure, shared between the harness (which attaches
//! signatures to Method/Constructor nodes as they are extracted) and core
//! (which builds the same keys to look nodes back up). Keeping this in one
//! place is the only way to guarantee the two halves never drift.

/// Erase generics, collapse whitespace, and normalize a single parameter
/// type string to its canonical form. Varargs (`T...`) become `T[]`.
pub fn erase_type(raw: &str) -> String {
    let raw = raw.trim();
    let raw = if let Some(stripped) = raw.strip_suffix("...") {
        return format!("{}[]", erase_type(stripped));
    } else {
        raw
    };

    let mut array_suffix = String::new();
    let mut base = raw;
    while let Some(stripped) = base.strip_suffix("[]") {
        array_suffix.push_str("[]");
        base = stripped.trim();
    }

    let erased = strip_generics(base);
    let collapsed = collapse_whitespace(&erased);
    format!("{}{}", collapsed, array_suffix)
}

/// Strip a single top-level `<...>` generic argument list, if present.
/// Nested angle brackets (`Map<String, List<Integer>>`) are handled by
/// bracket-depth counting rather than a naive first/last-`<` split.
fn strip_generics(s: &str) -> String {
    let Some(start) = s.find('<') else {
        return s.to_string();
    };
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        match b {
            b'<' => depth += 1,
            b'>' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    match end {
        Some(end) => format!("{}{}", &s[..start], &s[end + 1..]),
        None => s[..start].to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical signature: comma-joined erased parameter types, or `()` when
/// there are none. This is the disambiguator half of the method lookup key.
pub fn build_signature(param_types: &[String]) -> String {
    if param_types.is_empty() {
        return "()".to_string();
    }
    let erased: Vec<String> = param_types.iter().map(|t| erase_type(t)).collect();
    format!("({})", erased.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erases_simple_generic() {
        assert_eq!(erase_type("List<String>"), "List");
    }

    #[test]
    fn erases_nested_generic() {
        assert_eq!(erase_type("Map<String, List<Integer>>"), "Map");
    }

    #[test]
    fn keeps_array_suffix() {
        assert_eq!(erase_type("String[]"), "String[]");
        assert_eq!(erase_type("List<String>[]"), "List[]");
    }

    #[test]
    fn normalizes_varargs() {
        assert_eq!(erase_type("String..."), "String[]");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(erase_type("  int   "), "int");
    }

    #[test]
    fn builds_empty_signature() {
        assert_eq!(build_signature(&[]), "()");
    }

    #[test]
    fn builds_multi_param_signature() {
        let params = vec!["String".to_string(), "List<Integer>".to_string()];
        assert_eq!(build_signature(&params), "(String,List)");
    }
}
