//! HTML adapter for [`VisibleOutput`]: a self-contained fragment using the
//! same bubble classes as the web build. Every piece of message text goes
//! through [`escape_html`], so content is always shown literally.

use std::fmt::Write;

use crate::ui::render::{Alignment, Icon, UnitBody, VisibleOutput, VisibleUnit};

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn icon_html(icon: Icon) -> &'static str {
    match icon {
        Icon::Bot => {
            r#"<div class="avatar avatar-bot"><i data-lucide="bot"></i></div>"#
        }
        Icon::User => {
            r#"<div class="avatar avatar-user"><i data-lucide="user"></i></div>"#
        }
    }
}

fn unit_html(out: &mut String, unit: &VisibleUnit) {
    let justify = match unit.alignment {
        Alignment::Start => "justify-start",
        Alignment::End => "justify-end",
    };
    let bubble = match unit.icon {
        Icon::Bot => "bubble bubble-assistant",
        Icon::User => "bubble bubble-user",
    };

    let _ = write!(
        out,
        r#"<div class="message {justify}" data-key="{}">"#,
        escape_html(&unit.key)
    );
    if unit.alignment == Alignment::Start {
        out.push_str(icon_html(unit.icon));
    }

    match &unit.body {
        UnitBody::Text(text) => {
            let _ = write!(
                out,
                r#"<div class="{bubble}"><div class="body">{}</div>"#,
                escape_html(text)
            );
            if let Some(time) = &unit.time {
                let _ = write!(out, r#"<div class="time">{}</div>"#, escape_html(time));
            }
            out.push_str("</div>");
        }
        UnitBody::Typing => {
            let _ = write!(
                out,
                r#"<div class="{bubble} typing"><span class="dot"></span><span class="dot"></span><span class="dot"></span></div>"#
            );
        }
    }

    if unit.alignment == Alignment::End {
        out.push_str(icon_html(unit.icon));
    }
    out.push_str("</div>\n");
}

/// Render the whole surface. The container is marked so a host page can
/// scroll it to the end after insertion.
pub fn to_html(output: &VisibleOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<div id="chat-container" data-scroll-to-end="{}">"#,
        output.scroll_to_end
    );
    for unit in &output.units {
        unit_html(&mut out, unit);
    }
    out.push_str("</div>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::ui::render::TranscriptRenderer;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn script_content_is_never_emitted_as_markup() {
        let messages = vec![Message::user("<script>alert(1)</script>", 0)];
        let output = TranscriptRenderer::utc().render_messages(&messages, false);
        let html = to_html(&output);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn user_icon_follows_bubble_and_assistant_icon_precedes_it() {
        let messages = vec![Message::welcome(0), Message::user("hi", 0)];
        let html = to_html(&TranscriptRenderer::utc().render_messages(&messages, false));
        let lines: Vec<&str> = html.lines().collect();

        assert!(lines[1].contains("justify-start"));
        assert!(lines[1].find("data-lucide=\"bot\"") < lines[1].find("class=\"body\""));
        assert!(lines[2].contains("justify-end"));
        assert!(lines[2].find("class=\"body\"") < lines[2].find("data-lucide=\"user\""));
    }

    #[test]
    fn typing_unit_renders_dots() {
        let html = to_html(&TranscriptRenderer::utc().render_messages(&[], true));
        assert!(html.contains("typing"));
        assert_eq!(html.matches("class=\"dot\"").count(), 3);
    }

    #[test]
    fn same_input_same_html() {
        let messages = vec![Message::welcome(5), Message::assistant("x & y", 6)];
        let renderer = TranscriptRenderer::utc();
        assert_eq!(
            to_html(&renderer.render_messages(&messages, true)),
            to_html(&renderer.render_messages(&messages, true))
        );
    }
}
