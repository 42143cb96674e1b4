pub fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Quote a string for use as a Graphviz ID or attribute value.
pub fn dot_quote(s: &str) -> String {
    let mut res = String::with_capacity(s.len() + 2);
    res.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            res.push('\\');
        }
        res.push(c);
    }
    res.push('"');
    res
}

pub mod ansi {
    pub const ANSI_RESET: &str = "\x1b[0m";
    pub const ANSI_RED: &str = "\x1b[31m";
    pub const ANSI_GREEN: &str = "\x1b[32m";
    pub const ANSI_YELLOW: &str = "\x1b[33m";
    pub const ANSI_GRAY: &str = "\x1b[90m";
    pub const ANSI_BOLD: &str = "\x1b[1m";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_names() {
        assert_eq!(dot_quote("subs_comm_0"), "\"subs_comm_0\"");
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(dot_quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn plural_suffix() {
        assert_eq!(plural(1), "");
        assert_eq!(plural(0), "s");
        assert_eq!(plural(3), "s");
    }
}
