//! Monitor row display models

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use super::common::{or_dash, truncate_string};
use crate::dataset::Row;

/// One dataset row as a table line.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct MonitorRowDisplay {
    #[tabled(rename = "SUIT")]
    pub suit: String,

    #[tabled(rename = "MONITOR")]
    pub monitor: String,

    /// Watchlist, agent type or "Monitor"
    #[tabled(rename = "TYPE")]
    pub monitor_type: String,

    #[tabled(rename = "CHAIN")]
    pub chain: String,

    #[tabled(rename = "CHANNEL")]
    pub channel: String,

    #[tabled(rename = "CLIENT")]
    pub client: String,
}

impl From<&Row> for MonitorRowDisplay {
    fn from(row: &Row) -> Self {
        Self {
            suit: truncate_string(&row.full_suite_name, 30),
            monitor: truncate_string(&row.full_monitor_name, 40),
            monitor_type: or_dash(&row.monitor_type),
            chain: or_dash(&row.monitor_blockchain),
            channel: truncate_string(&row.monitor_alert_channel, 25),
            client: row.client.clone(),
        }
    }
}

/// Rows grouped under their suit, in first-seen suit order.
pub fn format_pretty(rows: &[Row]) -> String {
    if rows.is_empty() {
        return "No monitors found.".to_string();
    }

    let mut groups: Vec<(&str, Vec<&Row>)> = Vec::new();
    for row in rows {
        match groups
            .iter_mut()
            .find(|(suit, _)| *suit == row.full_suite_name)
        {
            Some((_, members)) => members.push(row),
            None => groups.push((row.full_suite_name.as_str(), vec![row])),
        }
    }

    let mut output = String::new();
    for (suit, members) in groups {
        output.push_str(&format!(
            "{} {}\n",
            suit.bold(),
            format!("({} rows)", members.len()).dimmed()
        ));
        for row in members {
            let channel = if row.monitor_alert_channel == row.client {
                row.monitor_alert_channel.yellow().to_string()
            } else {
                row.monitor_alert_channel.normal().to_string()
            };
            output.push_str(&format!(
                "  {} [{}] {} -> {} ({})\n",
                row.full_monitor_name.cyan(),
                or_dash(&row.monitor_type),
                or_dash(&row.monitor_blockchain),
                channel,
                row.client.green()
            ));
            if !row.monitor_link.is_empty() {
                output.push_str(&format!("      {}\n", row.monitor_link.dimmed()));
            }
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(suit: &str, monitor: &str, channel: &str, client: &str) -> Row {
        Row {
            full_suite_name: suit.to_string(),
            full_monitor_name: monitor.to_string(),
            monitor_type: "Watchlist".to_string(),
            monitor_alert_channel: channel.to_string(),
            client: client.to_string(),
            ..Row::default()
        }
    }

    #[test]
    fn test_display_from_row() {
        let display = MonitorRowDisplay::from(&row("Acme_ETH", "WL_ETH", "acme-slack", "Acme"));
        assert_eq!(display.suit, "Acme_ETH");
        assert_eq!(display.monitor_type, "Watchlist");
        assert_eq!(display.chain, "--");
        assert_eq!(display.client, "Acme");
    }

    #[test]
    fn test_pretty_groups_by_suit() {
        let rows = vec![
            row("Acme_ETH", "WL_A", "acme-slack", "Acme"),
            row("Globex_SOL", "WL_B", "None", "None"),
            row("Acme_ETH", "WL_C", "pager", "Acme"),
        ];
        let output = format_pretty(&rows);

        assert_eq!(output.matches("Acme_ETH").count(), 1);
        assert!(output.contains("(2 rows)"));
        assert!(output.contains("(1 rows)"));
        let acme = output.find("Acme_ETH").unwrap();
        let globex = output.find("Globex_SOL").unwrap();
        assert!(acme < globex);
        assert!(output.contains("WL_C"));
    }

    #[test]
    fn test_pretty_empty() {
        assert_eq!(format_pretty(&[]), "No monitors found.");
    }
}
