// src/page.rs
// Server-rendered wallet page for a stored link

use crate::catalog::{find_token, ERC20_ABI, SEPOLIA_CHAIN_ID};
use crate::config::Config;
use crate::storage::StoredRecord;
use serde_json::json;

const TEMPLATE: &str = include_str!("../assets/transaction.html");

const NOT_FOUND: &str = "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Transaction not found</title></head><body style=\"font-family: system-ui, sans-serif; \
text-align: center; padding: 40px\"><p>Transaction not found or expired</p></body></html>";

pub fn render_not_found() -> String {
    NOT_FOUND.to_string()
}

fn network_name(chain_id: u64) -> String {
    if chain_id == SEPOLIA_CHAIN_ID {
        "Sepolia Testnet".to_string()
    } else {
        format!("chain {}", chain_id)
    }
}

/// Minimal HTML escaping for text nodes.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// JSON placed inside a <script> element must not be able to close it.
fn script_safe_json(v: &serde_json::Value) -> String {
    v.to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

pub fn render_transaction_page(config: &Config, record: &StoredRecord) -> String {
    let payload = &record.payload;
    let action = payload.action;
    let label = {
        let s = action.as_str();
        let mut c = s.chars();
        match c.next() {
            Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
            None => String::new(),
        }
    };

    let token = payload
        .asset()
        .map(|a| match find_token(&a) {
            Some(t) => format!("{} ({})", a.to_checksum(None), t.symbol),
            None => a.to_checksum(None),
        })
        .unwrap_or_default();
    let amount = payload.amount().map(|v| v.to_string()).unwrap_or_default();
    let network = network_name(config.chain_id);

    let page_config = json!({
        "id": record.id,
        "action": action,
        "requiresApproval": payload.requires_approval(),
        "chainId": config.chain_id,
        "network": network,
        "explorerUrl": config.explorer_url,
        "erc20Abi": &*ERC20_ABI,
    });

    TEMPLATE
        .replace("{{TITLE}}", &escape_html(&format!("Aave V3 {}", label)))
        .replace("{{HEADING}}", &escape_html(&format!("Aave V3 {}", label)))
        .replace("{{ACTION}}", &escape_html(&label))
        .replace("{{DESCRIPTION}}", &escape_html(&payload.description))
        .replace("{{TOKEN}}", &escape_html(&token))
        .replace("{{AMOUNT}}", &escape_html(&amount))
        .replace("{{FUNCTION}}", &escape_html(&payload.function_name))
        .replace(
            "{{REQUIRES_APPROVAL}}",
            if payload.requires_approval() { "Yes" } else { "No" },
        )
        .replace("{{NETWORK}}", &escape_html(&network))
        .replace("{{CONFIG_JSON}}", &script_safe_json(&page_config))
}
