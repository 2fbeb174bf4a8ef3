//! Template - ワーカー名とトランザクションノートの書式
//!
//! `{class_name}` のようなプレースホルダを値に置き換えます。
//! 未知のプレースホルダはそのまま残し、`{{` / `}}` はリテラルの波括弧になります。

/// Default worker description. The rendered text becomes the thread name.
pub const DEFAULT_DESCRIPTION: &str = "background worker thread ({class_name}) for {site_name}";

/// Default note for the work transaction.
pub const DEFAULT_WORK_NOTE: &str = "{thread_name}";

/// Default note for the cleanup transaction.
pub const DEFAULT_CLEANUP_NOTE: &str = "{thread_name} cleanup";

/// Values available to templates.
///
/// `thread_name` is empty while the description itself is rendered.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub thread_name: &'a str,
    pub class_name: &'a str,
    pub site_name: &'a str,
    pub user_name: &'a str,
}

impl TemplateVars<'_> {
    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "thread_name" => Some(self.thread_name),
            "class_name" => Some(self.class_name),
            "site_name" => Some(self.site_name),
            "user_name" => Some(self.user_name),
            _ => None,
        }
    }
}

/// Render `template` with `vars`.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail.find('}') {
                Some(end) => {
                    let key = &tail[1..end];
                    match vars.lookup(key) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&tail[..=end]),
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const VARS: TemplateVars<'static> = TemplateVars {
        thread_name: "my thread",
        class_name: "Publish",
        site_name: "testsite",
        user_name: "someuser",
    };

    #[rstest]
    #[case(DEFAULT_DESCRIPTION, "background worker thread (Publish) for testsite")]
    #[case(DEFAULT_WORK_NOTE, "my thread")]
    #[case(DEFAULT_CLEANUP_NOTE, "my thread cleanup")]
    #[case(
        "work for {site_name} on behalf of {user_name}",
        "work for testsite on behalf of someuser"
    )]
    #[case("{unknown} stays", "{unknown} stays")]
    #[case("{{literal}} braces", "{literal} braces")]
    #[case("dangling {site_name", "dangling {site_name")]
    #[case("no placeholders", "no placeholders")]
    fn renders_templates(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(render(template, &VARS), expected);
    }
}
