//! Dispatches a parsed request to `store`/`engine` and assembles the
//! reply. Every child of `<create>` or `<transactions>` is handled as
//! its own unit: one child's failure never prevents siblings already
//! processed (or yet to come) from succeeding.

use crate::request::{self, CreateItem, Request, TxItem};
use crate::response::ResponseBuilder;
use engine::Engine;
use orderbook::OrderId;
use tracing::{info, instrument, warn};

pub async fn handle(xml: &str, engine: &Engine) -> String {
    let mut rb = ResponseBuilder::new();

    match request::parse(xml) {
        Ok(Request::Create(items)) => {
            for item in items {
                handle_create_item(&mut rb, engine, item).await;
            }
        }
        Ok(Request::Transactions { account_id, items }) => {
            for item in items {
                handle_tx_item(&mut rb, engine, &account_id, item).await;
            }
        }
        Err(e) => {
            warn!(error = %e, "rejecting malformed request");
            rb.error(&[], &e.to_string());
        }
    }

    rb.finish()
}

async fn handle_create_item(rb: &mut ResponseBuilder, engine: &Engine, item: CreateItem) {
    match item {
        CreateItem::Account { id, balance } => match engine.store().create_account(&id, balance) {
            Ok(()) => rb.created_account(&id),
            Err(e) => rb.error(&[("id", &id)], &e.to_string()),
        },
        CreateItem::SymbolCredit { sym, account_id, amount } => {
            match engine.store().create_symbol(&sym, &account_id, amount).await {
                Ok(()) => rb.created_symbol(&sym, &account_id),
                Err(e) => rb.error(&[("sym", &sym), ("id", &account_id)], &e.to_string()),
            }
        }
    }
}

#[instrument(skip(rb, engine, item))]
async fn handle_tx_item(rb: &mut ResponseBuilder, engine: &Engine, account_id: &str, item: TxItem) {
    match item {
        TxItem::Order { sym, amount, limit, amount_raw, limit_raw } => {
            match engine.place_order(account_id, &sym, amount, limit).await {
                Ok(order_id) => rb.opened(&sym, &amount_raw, &limit_raw, &order_id.0.to_string()),
                Err(e) => {
                    warn!(account_id, sym = sym.as_str(), error = %e, "order rejected");
                    rb.error(
                        &[("sym", sym.as_str()), ("amount", amount_raw.as_str()), ("limit", limit_raw.as_str())],
                        &e.to_string(),
                    );
                }
            }
        }
        TxItem::Query { id } => {
            let id_str = id.to_string();
            match engine.status(OrderId(id), account_id).await {
                Ok(status) => rb.status("status", &id_str, &status),
                Err(e) => rb.error(&[("id", id_str.as_str())], &e.to_string()),
            }
        }
        TxItem::Cancel { id } => {
            let id_str = id.to_string();
            match engine.cancel(OrderId(id), account_id).await {
                Ok(status) => {
                    info!(account_id, order_id = id, "order canceled");
                    rb.status("canceled", &id_str, &status);
                }
                Err(e) => rb.error(&[("id", id_str.as_str())], &e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use store::Store;

    fn new_engine() -> Engine {
        Engine::new(Arc::new(Store::new()))
    }

    #[tokio::test]
    async fn duplicate_account_create_yields_error_on_second_child() {
        let engine = new_engine();
        let xml = r#"<create><account id="123" balance="100"/></create>"#;
        let first = handle(xml, &engine).await;
        assert!(first.contains(r#"<created id="123"/>"#));

        let second = handle(xml, &engine).await;
        assert!(second.contains(r#"<error id="123">Account already exists</error>"#));
    }

    #[tokio::test]
    async fn insufficient_funds_reports_error_without_state_change() {
        let engine = new_engine();
        handle(r#"<create><account id="1" balance="50"/></create>"#, &engine).await;

        let reply = handle(
            r#"<transactions id="1"><order sym="SPY" amount="10" limit="100"/></transactions>"#,
            &engine,
        )
        .await;
        assert!(reply.contains("Insufficient funds"));
        assert_eq!(
            engine.store().account_snapshot("1").await.unwrap().balance,
            Decimal::new(50, 0)
        );
    }

    #[tokio::test]
    async fn query_by_non_owner_is_permission_denied() {
        let engine = new_engine();
        handle(r#"<create><account id="1" balance="200000"/></create>"#, &engine).await;
        handle(r#"<create><account id="2" balance="0"/></create>"#, &engine).await;
        let opened = handle(
            r#"<transactions id="1"><order sym="GOOG" amount="100" limit="123"/></transactions>"#,
            &engine,
        )
        .await;
        assert!(opened.contains("<opened"));

        let reply = handle(r#"<transactions id="2"><query id="1"/></transactions>"#, &engine).await;
        assert!(reply.contains("Permission denied"));
    }
}
