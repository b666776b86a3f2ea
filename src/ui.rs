//! HTML page and fragments.
//!
//! The chat page posts the `query` form field to `/chat` with HTMX and
//! appends the returned fragment to the message list.

use crate::domain::Turn;

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one turn as the "You" and "Bot" message blocks.
pub fn render_turn(turn: &Turn) -> String {
    format!(
        r#"
    <div class="message user-message">
        <strong>You:</strong> {}
    </div>
    <div class="message bot-message">
        <strong>Bot:</strong> {}
    </div>
    "#,
        escape_html(&turn.user_query),
        escape_html(&turn.response)
    )
}

/// The full chat page.
pub fn chat_page() -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Story continuation chat">
    <title>Story Weaver</title>
    <script src="https://unpkg.com/htmx.org@2.0.8"></script>
    <style>{STYLE}</style>
</head>
<body>
    <main class="chat">
        <h1>Story Weaver</h1>
        <div id="messages" class="messages"></div>
        <form
            hx-post="/chat"
            hx-target="#messages"
            hx-swap="beforeend"
            hx-on::after-request="this.reset()"
        >
            <input type="text" name="query" placeholder="What happens next?" autocomplete="off" required>
            <button type="submit">Send</button>
        </form>
    </main>
</body>
</html>"##
    )
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; background: #111; color: #eee; margin: 0; }
.chat { max-width: 48rem; margin: 0 auto; padding: 2rem 1rem; }
.messages { display: flex; flex-direction: column; gap: .75rem; margin-bottom: 1rem; }
.message { padding: .75rem 1rem; border-radius: .75rem; white-space: pre-wrap; }
.user-message { background: #2a3b55; align-self: flex-end; }
.bot-message { background: #262626; }
form { display: flex; gap: .5rem; }
input { flex: 1; padding: .75rem; border-radius: .5rem; border: none; }
button { padding: .75rem 1.25rem; border-radius: .5rem; border: none; cursor: pointer; }
";
