/// Small cleaner for scraped article bodies.
/// - Removes `<script>` and `<style>` blocks (case-insensitive)
/// - Strips remaining tags
/// - Collapses whitespace and trims ends
pub fn strip_html_basic(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut buf = input.to_string();
    for tag in ["script", "style"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        loop {
            // ASCII lowercasing keeps byte offsets aligned with `buf`
            let lower = buf.to_ascii_lowercase();
            let Some(start) = lower.find(&open) else {
                break;
            };
            match lower[start..].find(&close) {
                Some(end_rel) => {
                    let end = start + end_rel + close.len();
                    buf.replace_range(start..end, "");
                }
                None => {
                    buf.truncate(start);
                    break;
                }
            }
        }
    }

    let mut out = String::with_capacity(buf.len());
    let mut in_tag = false;
    for ch in buf.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
