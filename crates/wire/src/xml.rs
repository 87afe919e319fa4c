// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! XML envelopes for the form and object-store dialects.
//!
//! Adapters assemble responses from a small element tree; rendering
//! goes through quick-xml's writer so text is always escaped.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// A buildable XML element.
#[derive(Debug, Clone)]
pub struct Xml {
    name: String,
    text: Option<String>,
    children: Vec<Xml>,
}

impl Xml {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), text: None, children: Vec::new() }
    }

    /// Leaf element with text content.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), text: Some(value.into()), children: Vec::new() }
    }

    pub fn child(mut self, child: Xml) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Xml>) -> Self {
        self.children.extend(children);
        self
    }

    /// Render the tree as an XML document string.
    pub fn render(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer);
        String::from_utf8(writer.into_inner()).unwrap_or_default()
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) {
        // The writer over a Vec cannot fail; errors collapse to an
        // empty render.
        let _ = writer.write_event(Event::Start(BytesStart::new(&self.name)));
        if let Some(text) = &self.text {
            let _ = writer.write_event(Event::Text(BytesText::new(text)));
        }
        for child in &self.children {
            child.write_into(writer);
        }
        let _ = writer.write_event(Event::End(BytesEnd::new(&self.name)));
    }
}

/// Standard `<Action>Response` envelope of the form dialect:
/// a result element wrapped with request-id metadata.
pub fn action_response(action: &str, result_children: Vec<Xml>, request_id: &str) -> String {
    Xml::new(format!("{action}Response"))
        .child(Xml::new(format!("{action}Result")).children(result_children))
        .child(
            Xml::new("ResponseMetadata").child(Xml::text("RequestId", request_id)),
        )
        .render()
}

/// Object-store error document.
pub fn object_store_error(code: &str, message: &str) -> String {
    let doc = Xml::new("Error")
        .child(Xml::text("Code", code))
        .child(Xml::text("Message", message))
        .child(Xml::text("Resource", "/"))
        .child(Xml::text("RequestId", "00000000-0000-0000-0000-000000000000"))
        .render();
    format!("<?xml version='1.0' encoding='UTF-8'?>{doc}")
}

/// Read `<Tagging><TagSet><Tag><Key>…</Key><Value>…</Value>` pairs.
/// Malformed documents yield the pairs read so far.
pub fn parse_tagging(input: &str) -> Vec<(String, String)> {
    let mut reader = quick_xml::Reader::from_str(input);
    let mut pairs = Vec::new();
    let mut field: Option<&'static str> = None;
    let mut key = String::new();
    let mut value = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                field = match start.name().as_ref() {
                    b"Key" => Some("key"),
                    b"Value" => Some("value"),
                    _ => None,
                };
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().unwrap_or_default().into_owned();
                match field {
                    Some("key") => key = text,
                    Some("value") => value = text,
                    _ => {}
                }
            }
            Ok(Event::End(end)) => {
                if end.name().as_ref() == b"Tag" {
                    pairs.push((std::mem::take(&mut key), std::mem::take(&mut value)));
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
    pairs
}

/// Identity-dialect error document.
pub fn identity_error(code: &str, message: &str) -> String {
    Xml::new("ErrorResponse")
        .child(
            Xml::new("Error")
                .child(Xml::text("Type", "Sender"))
                .child(Xml::text("Code", code))
                .child(Xml::text("Message", message)),
        )
        .child(Xml::text("RequestId", "00000000-0000-0000-0000-000000000000"))
        .render()
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
