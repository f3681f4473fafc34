/// Expand `${NAME}` and `${NAME:-fallback}` references in raw config text.
///
/// A reference whose variable is unset and has no fallback is kept verbatim,
/// so the bot token check in validation reports it instead of an empty value.
pub fn substitute_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated reference: copy the remainder untouched.
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match (name.is_empty(), lookup(name), fallback) {
            (false, Some(value), _) => out.push_str(&value),
            (false, None, Some(fallback)) => out.push_str(fallback),
            _ => {
                out.push_str("${");
                out.push_str(body);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "REELPOST_TEST_TOKEN" => Some("123:abc".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_known_variable() {
        assert_eq!(
            expand_with(r#"token = "${REELPOST_TEST_TOKEN}""#, lookup),
            r#"token = "123:abc""#
        );
    }

    #[test]
    fn keeps_unknown_variable() {
        assert_eq!(expand_with("${REELPOST_MISSING}", lookup), "${REELPOST_MISSING}");
    }

    #[test]
    fn uses_fallback_for_unknown_variable() {
        assert_eq!(expand_with("${REELPOST_MISSING:-300}", lookup), "300");
        assert_eq!(expand_with("${REELPOST_TEST_TOKEN:-x}", lookup), "123:abc");
    }

    #[test]
    fn unterminated_reference_is_literal() {
        assert_eq!(expand_with("a ${OPEN", lookup), "a ${OPEN");
    }

    #[test]
    fn caption_placeholders_are_untouched() {
        let raw = "{title} S{season}E{episode} - {quality}";
        assert_eq!(substitute_env(raw), raw);
    }
}
