//! Request grammar and its parser.
//!
//! `<create>` holds zero or more account creations and symbol credits;
//! a `<symbol>` block's nested `<account>` children are flattened into
//! individual `SymbolCredit` items up front, so each one can be its own
//! atomic sub-scope exactly like a top-level `<account>` item.
//!
//! `<transactions id="ACCT">` holds zero or more orders, queries, and
//! cancels, all attributed to the wrapping account id.

use crate::error::ProtocolError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rust_decimal::Decimal;
use std::str;

#[derive(Debug, Clone, PartialEq)]
pub enum CreateItem {
    Account { id: String, balance: Decimal },
    SymbolCredit { sym: String, account_id: String, amount: Decimal },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxItem {
    /// `amount_raw`/`limit_raw` preserve the exact attribute text so a
    /// successful `<opened>` reply can echo it verbatim, per the wire
    /// grammar, rather than a reformatted decimal.
    Order {
        sym: String,
        amount: Decimal,
        limit: Decimal,
        amount_raw: String,
        limit_raw: String,
    },
    Query { id: u64 },
    Cancel { id: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create(Vec<CreateItem>),
    Transactions { account_id: String, items: Vec<TxItem> },
}

fn attr_str(tag: &BytesStart, name: &'static str) -> Result<String, ProtocolError> {
    for attr in tag.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return attr
                .unescape_value()
                .map(|v| v.into_owned())
                .map_err(|_| ProtocolError::InvalidUtf8);
        }
    }
    Err(ProtocolError::MissingAttribute(name))
}

fn attr_decimal(tag: &BytesStart, name: &'static str) -> Result<Decimal, ProtocolError> {
    attr_str(tag, name)?
        .parse::<Decimal>()
        .map_err(|_| ProtocolError::NotNumeric(name))
}

fn attr_u64(tag: &BytesStart, name: &'static str) -> Result<u64, ProtocolError> {
    attr_str(tag, name)?
        .parse::<u64>()
        .map_err(|_| ProtocolError::NotNumeric(name))
}

fn local_name(tag: &BytesStart) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).into_owned()
}

pub fn parse(xml: &str) -> Result<Request, ProtocolError> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(tag) => {
                let name = local_name(&tag);
                return match name.as_str() {
                    "create" => Ok(Request::Create(parse_create_body(&mut reader)?)),
                    "transactions" => {
                        let account_id = attr_str(&tag, "id")?;
                        let items = parse_transactions_body(&mut reader)?;
                        Ok(Request::Transactions { account_id, items })
                    }
                    other => Err(ProtocolError::UnknownRoot(other.to_string())),
                };
            }
            Event::Empty(tag) => {
                let name = local_name(&tag);
                return match name.as_str() {
                    "create" => Ok(Request::Create(Vec::new())),
                    "transactions" => {
                        let account_id = attr_str(&tag, "id")?;
                        Ok(Request::Transactions { account_id, items: Vec::new() })
                    }
                    other => Err(ProtocolError::UnknownRoot(other.to_string())),
                };
            }
            Event::Eof => return Err(ProtocolError::UnknownRoot(String::new())),
            _ => continue,
        }
    }
}

fn parse_create_body(reader: &mut Reader<&[u8]>) -> Result<Vec<CreateItem>, ProtocolError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(tag) if local_name(&tag) == "account" => {
                items.push(CreateItem::Account {
                    id: attr_str(&tag, "id")?,
                    balance: attr_decimal(&tag, "balance")?,
                });
            }
            Event::Start(tag) if local_name(&tag) == "account" => {
                let id = attr_str(&tag, "id")?;
                let balance = attr_decimal(&tag, "balance")?;
                skip_to_end(reader, "account")?;
                items.push(CreateItem::Account { id, balance });
            }
            Event::Start(tag) if local_name(&tag) == "symbol" => {
                let sym = attr_str(&tag, "sym")?;
                items.extend(parse_symbol_body(reader, &sym)?);
            }
            Event::Empty(tag) if local_name(&tag) == "symbol" => {
                let _ = attr_str(&tag, "sym")?;
            }
            Event::End(tag) if local_name(&tag) == "create" => break,
            Event::Eof => return Err(ProtocolError::UnknownRoot("create".to_string())),
            _ => continue,
        }
    }
    Ok(items)
}

fn parse_symbol_body(reader: &mut Reader<&[u8]>, sym: &str) -> Result<Vec<CreateItem>, ProtocolError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(tag) if local_name(&tag) == "account" => {
                let account_id = attr_str(&tag, "id")?;
                let text = read_text(reader)?;
                let amount = text.parse::<Decimal>().map_err(|_| ProtocolError::NotNumeric("amount"))?;
                skip_to_end(reader, "account")?;
                items.push(CreateItem::SymbolCredit {
                    sym: sym.to_string(),
                    account_id,
                    amount,
                });
            }
            Event::End(tag) if local_name(&tag) == "symbol" => break,
            Event::Eof => return Err(ProtocolError::UnknownRoot("symbol".to_string())),
            _ => continue,
        }
    }
    Ok(items)
}

fn parse_transactions_body(reader: &mut Reader<&[u8]>) -> Result<Vec<TxItem>, ProtocolError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Empty(tag) => {
                let name = local_name(&tag);
                match name.as_str() {
                    "order" => {
                        let amount_raw = attr_str(&tag, "amount")?;
                        let limit_raw = attr_str(&tag, "limit")?;
                        let amount = amount_raw.parse::<Decimal>().map_err(|_| ProtocolError::NotNumeric("amount"))?;
                        let limit = limit_raw.parse::<Decimal>().map_err(|_| ProtocolError::NotNumeric("limit"))?;
                        items.push(TxItem::Order {
                            sym: attr_str(&tag, "sym")?,
                            amount,
                            limit,
                            amount_raw,
                            limit_raw,
                        });
                    }
                    "query" => items.push(TxItem::Query { id: attr_u64(&tag, "id")? }),
                    "cancel" => items.push(TxItem::Cancel { id: attr_u64(&tag, "id")? }),
                    _ => {}
                }
            }
            Event::Start(tag) => {
                let name = local_name(&tag);
                match name.as_str() {
                    "order" => {
                        let amount_raw = attr_str(&tag, "amount")?;
                        let limit_raw = attr_str(&tag, "limit")?;
                        let amount = amount_raw.parse::<Decimal>().map_err(|_| ProtocolError::NotNumeric("amount"))?;
                        let limit = limit_raw.parse::<Decimal>().map_err(|_| ProtocolError::NotNumeric("limit"))?;
                        let item = TxItem::Order {
                            sym: attr_str(&tag, "sym")?,
                            amount,
                            limit,
                            amount_raw,
                            limit_raw,
                        };
                        skip_to_end(reader, "order")?;
                        items.push(item);
                    }
                    "query" => {
                        let item = TxItem::Query { id: attr_u64(&tag, "id")? };
                        skip_to_end(reader, "query")?;
                        items.push(item);
                    }
                    "cancel" => {
                        let item = TxItem::Cancel { id: attr_u64(&tag, "id")? };
                        skip_to_end(reader, "cancel")?;
                        items.push(item);
                    }
                    _ => skip_to_end(reader, &name)?,
                }
            }
            Event::End(tag) if local_name(&tag) == "transactions" => break,
            Event::Eof => return Err(ProtocolError::UnknownRoot("transactions".to_string())),
            _ => continue,
        }
    }
    Ok(items)
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, ProtocolError> {
    match reader.read_event()? {
        Event::Text(t) => Ok(t.unescape()?.trim().to_string()),
        _ => Ok(String::new()),
    }
}

fn skip_to_end(reader: &mut Reader<&[u8]>, tag: &str) -> Result<(), ProtocolError> {
    let mut depth = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(t) if local_name(&t) == tag => depth += 1,
            Event::End(t) if local_name(&t) == tag => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(ProtocolError::UnknownRoot(tag.to_string())),
            _ => continue,
        }
    }
}
