/// Lowercases, replaces runs of non `[a-z0-9]` with a single `-`, and trims
/// leading/trailing `-`. Idempotent: `slugify(slugify(s)) == slugify(s)`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_dash = false;
    for ch in input.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            out.push(lower);
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        for s in ["My Project!!", "  already-slug  ", "", "---", "a_b/c"] {
            let once = slugify(s);
            let twice = slugify(&once);
            assert_eq!(once, twice, "input={s:?}");
        }
    }

    #[test]
    fn only_lowercase_alnum_and_dash() {
        let s = slugify("Hello, World! 123");
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        assert!(!s.starts_with('-'));
        assert!(!s.ends_with('-'));
        assert_eq!(s, "hello-world-123");
    }
}
