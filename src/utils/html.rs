// src/utils/html.rs

/// Sanitizes author-supplied rich text (category and test descriptions).
///
/// Whitelist-based: safe formatting tags such as `<b>` and `<p>` survive,
/// `<script>`/`<iframe>` and event-handler attributes are removed.
/// Question and answer texts are stored verbatim since they often quote code.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
