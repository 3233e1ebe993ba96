//! Wire format for registry replies.
//!
//! Register replies are a small XML document:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <Nodes>
//! <Node CID="..." I4="..." U4="..." />
//! </Nodes>
//! ```
//!
//! Liveness refresh and deregistration answer with fixed plain-text lines.

use std::fmt::Write as _;

use crate::peer::PeerContact;

pub const LIVE_OK: &str = "Live OK!";
pub const SHUTDOWN_OK: &str = "Shutdown OK!";

pub const XML_CONTENT_TYPE: &str = "text/xml";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Render a bootstrap sample. One `Node` per contact, in input order.
pub fn render_nodes(contacts: &[PeerContact]) -> String {
    let mut xml = String::with_capacity(XML_HEADER.len() + 24 + contacts.len() * 80);
    xml.push_str(XML_HEADER);
    xml.push_str("<Nodes>\n");
    for contact in contacts {
        xml.push_str("<Node CID=\"");
        push_attr(&mut xml, contact.identifier.as_str());
        xml.push_str("\" I4=\"");
        push_attr(&mut xml, &contact.address.to_string());
        // infallible for String
        let _ = writeln!(xml, "\" U4=\"{}\" />", contact.port);
    }
    xml.push_str("</Nodes>");
    xml
}

/// Body of a terminated request, in status-line form.
pub fn terminate_line(status: u16, message: &str) -> String {
    format!("HTTP/1.1 {} {}", status, message)
}

/// Append `value` escaped for a double-quoted attribute.
/// Control characters and the noncharacters XML 1.0 cannot carry are dropped.
fn push_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\u{FFFE}' | '\u{FFFF}' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
}
