use super::document_content::{DocumentContent, EMPTY_SECTION_TEXT, format_timestamp};

pub fn render_html(content: &DocumentContent) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(&content.title)));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(&content.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} &middot; {} &middot; revision {}</p>\n",
        content.doc_type,
        content.doc_level,
        content.revision
    ));
    html.push_str(&format!("<p class=\"summary\">{}</p>\n", escape(&content.summary)));

    for section in &content.sections {
        html.push_str(&format!("<section>\n<h2>{}</h2>\n", escape(&section.heading)));
        if section.entries.is_empty() {
            html.push_str(&format!("<p><em>{}</em></p>\n", EMPTY_SECTION_TEXT));
        } else {
            html.push_str("<ul>\n");
            for entry in &section.entries {
                html.push_str("<li>");
                if content.show_timestamps {
                    html.push_str(&format!(
                        "<span class=\"ts\">[{}&ndash;{}]</span> ",
                        format_timestamp(entry.start),
                        format_timestamp(entry.end)
                    ));
                }
                if let Some(speaker) = &entry.speaker {
                    html.push_str(&format!("<strong>{}:</strong> ", escape(speaker)));
                }
                html.push_str(&escape(&entry.text));
                html.push_str("</li>\n");
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
