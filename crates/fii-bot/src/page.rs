//! Summary page rendering

use fii_watch::report::{money, percent, signed};
use fii_watch::{FundRecord, PortfolioSummary, TrackedTargets};

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;background:#0f172a;color:#e2e8f0}\
table{border-collapse:collapse;width:100%;margin-bottom:2rem}\
th,td{padding:.4rem .8rem;border-bottom:1px solid #334155;text-align:right}\
th:first-child,td:first-child{text-align:left}\
.up{color:#4ade80}.down{color:#f87171}.hit{background:#1e3a2f}";

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

fn class_for(value: rust_decimal::Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "down"
    } else {
        "up"
    }
}

/// Full HTML page: totals, holdings and the watch list
pub fn render(records: &[FundRecord], summary: &PortfolioSummary, targets: &TrackedTargets) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>FII Watch</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body><h1>🏢 FII Watch</h1>"));

    if summary.is_empty() {
        html.push_str("<p>📭 Portfolio is empty.</p>");
    } else {
        html.push_str(&format!(
            "<p>Invested <b>R$ {}</b> · Value <b>R$ {}</b> · Result <b class=\"{}\">R$ {} ({}%)</b> · \
             Monthly income <b>R$ {}</b></p>",
            money(summary.total_invested),
            money(summary.current_value),
            class_for(summary.profit),
            signed(summary.profit, 2),
            signed(summary.profit_percent, 2),
            money(summary.monthly_income),
        ));

        html.push_str("<h2>Holdings</h2><table><tr><th>Fund</th><th>Kind</th><th>Shares</th>\
            <th>Invested</th><th>Value</th><th>Profit</th><th>Income</th></tr>");
        for line in &summary.holdings {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>R$ {}</td><td>R$ {}</td>\
                 <td class=\"{}\">{}%</td><td>R$ {}</td></tr>",
                escape(&line.ticker),
                escape(&line.kind),
                line.quantity,
                money(line.invested),
                money(line.market_value),
                class_for(line.profit),
                signed(line.profit_percent, 1),
                money(line.monthly_income),
            ));
        }
        html.push_str("</table>");
    }

    html.push_str("<h2>Watch list</h2><table><tr><th>Fund</th><th>Price</th><th>Change</th>\
        <th>Target</th><th>Yield</th><th>P/VP</th><th>Magic number</th></tr>");
    for (ticker, target) in targets.iter() {
        let record = records.iter().find(|r| r.ticker == ticker);
        let price = record.map(|r| r.current_price).unwrap_or_default();
        let hit = price.is_sign_positive() && !price.is_zero() && price <= target;

        html.push_str(&format!(
            "<tr{}><td>{}</td><td>R$ {}</td>",
            if hit { " class=\"hit\"" } else { "" },
            escape(ticker),
            money(price),
        ));
        let rest = match record {
            Some(r) => format!(
                "<td class=\"{}\">{}%</td><td>R$ {}</td><td>{}%</td><td>{}</td><td>{} ({}%)</td></tr>",
                class_for(r.change_percent),
                signed(r.change_percent, 2),
                money(target),
                percent(r.dividend_yield(), 2),
                percent(r.price_to_book(), 2),
                r.magic_number(),
                percent(r.magic_progress(), 0),
            ),
            None => format!("<td>-</td><td>R$ {}</td><td>-</td><td>-</td><td>-</td></tr>", money(target)),
        };
        html.push_str(&rest);
    }
    html.push_str("</table></body></html>");
    html
}
