//! HTML pages. Everything that came from a user goes through [`escape`].

use ansi_to_html::Esc;

/// The submission form.
pub const INDEX_PAGE: &str = include_str!("../assets/index.html");

/// HTML-escape text. Terminal colour sequences become styled spans; text
/// with sequences that don't parse is escaped as is.
fn escape(text: &str) -> String {
    ansi_to_html::convert_escaped(text).unwrap_or_else(|_| Esc(text).to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         </head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// A paste's plaintext with its share link.
pub fn paste(base_url: &str, id: &str, content: &[u8]) -> String {
    let link = escape(&format!("{base_url}/paste/{id}"));
    let content = escape(&String::from_utf8_lossy(content));

    layout(
        "pastebox",
        &format!(
            "<p><a href=\"{link}\">{link}</a> | <a href=\"/\">new paste</a></p>\n\
             <pre>{content}</pre>"
        ),
    )
}

/// Password prompt for a protected paste, optionally flagging a failed try.
pub fn password_prompt(id: &str, failed: bool) -> String {
    let id = escape(id);
    let error = if failed {
        "<p class=\"error\">Incorrect password.</p>\n"
    } else {
        ""
    };

    layout(
        "pastebox: password required",
        &format!(
            "<p>This paste is password protected.</p>\n{error}\
             <form method=\"post\" action=\"/paste/{id}\">\n\
             <input type=\"password\" name=\"password\" autofocus>\n\
             <button type=\"submit\">Unlock</button>\n\
             </form>"
        ),
    )
}
