//! Response assembly: structured element construction via `quick_xml`'s
//! writer, never string concatenation, so attribute values are escaped
//! correctly no matter what an account id or symbol contains.

use engine::OrderStatus;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use std::io::Cursor;

pub struct ResponseBuilder {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Start(BytesStart::new("results")))
            .expect("writing to an in-memory buffer cannot fail");
        Self { writer }
    }

    pub fn finish(mut self) -> String {
        self.writer
            .write_event(Event::End(BytesEnd::new("results")))
            .expect("writing to an in-memory buffer cannot fail");
        String::from_utf8(self.writer.into_inner().into_inner()).expect("writer only emits valid UTF-8")
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        let mut start = BytesStart::new(tag);
        start.extend_attributes(attrs.iter().map(|(k, v)| (*k, *v)));
        self.writer
            .write_event(Event::Empty(start))
            .expect("writing to an in-memory buffer cannot fail");
    }

    pub fn created_account(&mut self, id: &str) {
        self.empty("created", &[("id", id)]);
    }

    pub fn created_symbol(&mut self, sym: &str, id: &str) {
        self.empty("created", &[("sym", sym), ("id", id)]);
    }

    pub fn opened(&mut self, sym: &str, amount: &str, limit: &str, id: &str) {
        self.empty("opened", &[("sym", sym), ("amount", amount), ("limit", limit), ("id", id)]);
    }

    pub fn error(&mut self, attrs: &[(&str, &str)], message: &str) {
        let mut start = BytesStart::new("error");
        start.extend_attributes(attrs.iter().map(|(k, v)| (*k, *v)));
        self.writer
            .write_event(Event::Start(start))
            .expect("writing to an in-memory buffer cannot fail");
        self.writer
            .write_event(Event::Text(BytesText::new(message)))
            .expect("writing to an in-memory buffer cannot fail");
        self.writer
            .write_event(Event::End(BytesEnd::new("error")))
            .expect("writing to an in-memory buffer cannot fail");
    }

    /// `tag` is `"status"` for a query reply or `"canceled"` for a
    /// cancel reply; both share the same body shape.
    pub fn status(&mut self, tag: &str, id: &str, status: &OrderStatus) {
        let mut start = BytesStart::new(tag);
        start.push_attribute(("id", id));
        self.writer
            .write_event(Event::Start(start))
            .expect("writing to an in-memory buffer cannot fail");

        if let Some(open_shares) = status.open_shares {
            let shares = open_shares.to_string();
            self.empty("open", &[("shares", shares.as_str())]);
        }
        for exec in &status.executions {
            let shares = exec.shares.to_string();
            let price = exec.price.to_string();
            let time = exec.executed_at.timestamp().to_string();
            self.empty("executed", &[("shares", shares.as_str()), ("price", price.as_str()), ("time", time.as_str())]);
        }
        if let Some((shares, at)) = &status.canceled {
            let shares = shares.to_string();
            let time = at.timestamp().to_string();
            self.empty("canceled", &[("shares", shares.as_str()), ("time", time.as_str())]);
        }

        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .expect("writing to an in-memory buffer cannot fail");
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
