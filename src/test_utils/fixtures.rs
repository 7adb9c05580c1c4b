//! Listing page fixtures shaped like the live site's markup
//!
//! Record rows nest a one-cell link table in their first cell, so every
//! record contributes two `tr` elements to the listing table.

const LAYOUT_MARKER: &str = "Remote host web service";

#[derive(Debug, Clone)]
pub struct FixtureRow {
    pub ip_address: String,
    pub name: String,
    pub admin_text: String,
    pub owned_text: String,
}

impl FixtureRow {
    pub fn new(ip_address: &str, name: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            name: name.to_string(),
            admin_text: "No".to_string(),
            owned_text: String::new(),
        }
    }

    #[must_use]
    pub fn admin(self) -> Self {
        self.with_admin_text("Yes")
    }

    #[must_use]
    pub fn gateway(self) -> Self {
        self.with_owned_text("Gateway")
    }

    #[must_use]
    pub fn with_admin_text(mut self, text: &str) -> Self {
        self.admin_text = text.to_string();
        self
    }

    #[must_use]
    pub fn with_owned_text(mut self, text: &str) -> Self {
        self.owned_text = text.to_string();
        self
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn record_link(ip_address: &str) -> String {
    format!("index.php?action=ip_db&amp;a=view&amp;ipaddr={}", escape(ip_address))
}

fn record_row(row: &FixtureRow) -> String {
    format!(
        "<tr><td><table><tr><td><a href=\"{link}\">{ip}</a></td></tr></table></td>\
         <td>*</td><td>-</td><td>-</td><td>{name}</td><td>{admin}</td><td>{owned}</td></tr>\n",
        link = record_link(&row.ip_address),
        ip = escape(&row.ip_address),
        name = escape(&row.name),
        admin = escape(&row.admin_text),
        owned = escape(&row.owned_text),
    )
}

/// A record row whose first cell lost its nested link table
fn broken_row(row: &FixtureRow) -> String {
    format!(
        "<tr><td>{ip}</td><td>*</td><td>-</td><td>-</td>\
         <td>{name}</td><td>{admin}</td><td>{owned}</td></tr>\n",
        ip = escape(&row.ip_address),
        name = escape(&row.name),
        admin = escape(&row.admin_text),
        owned = escape(&row.owned_text),
    )
}

fn listing_table_with(body: &str) -> String {
    format!(
        "<table class=\"ipdb\">\n\
         <tr><th>IP</th><th></th><th></th><th></th><th></th>\
         <th>Name</th><th>Admin</th><th>Gateway</th></tr>\n\
         <tr><td colspan=\"8\"><hr></td></tr>\n\
         {body}\
         <tr><td colspan=\"8\">End of listing</td></tr>\n\
         </table>\n"
    )
}

pub fn listing_table(rows: &[FixtureRow]) -> String {
    listing_table_with(&rows.iter().map(record_row).collect::<String>())
}

fn filler_tables(count: usize) -> String {
    (0..count)
        .map(|i| format!("<table class=\"chrome\"><tr><td>menu {i}</td></tr></table>\n"))
        .collect()
}

fn standard_document(listing: &str) -> String {
    format!(
        "<html><head><title>IP Database</title></head><body>\n\
         {fillers}\
         <table class=\"frame\"><tr><td>\n{inner}{listing}</td></tr></table>\n\
         </body></html>",
        fillers = filler_tables(9),
        inner = filler_tables(3),
    )
}

/// Listing at the standard position: 10th table, 4th table inside it
pub fn standard_page(rows: &[FixtureRow]) -> String {
    standard_document(&listing_table(rows))
}

/// Listing at the extended position (17th table) behind the layout marker
pub fn extended_page(rows: &[FixtureRow]) -> String {
    format!(
        "<html><head><title>IP Database</title></head><body>\n\
         <p>{LAYOUT_MARKER}: online</p>\n\
         {fillers}{listing}\
         </body></html>",
        fillers = filler_tables(16),
        listing = listing_table(rows),
    )
}

/// The listing table alone, so neither positional path resolves
pub fn bare_listing_page(rows: &[FixtureRow]) -> String {
    format!("<html><body>\n{}</body></html>", listing_table(rows))
}

/// Standard page whose first record row has no record link
pub fn malformed_standard_page(rows: &[FixtureRow]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, row)| if i == 0 { broken_row(row) } else { record_row(row) })
        .collect();
    standard_document(&listing_table_with(&body))
}
