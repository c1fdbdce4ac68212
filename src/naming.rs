//! Structured resource names
//!
//! Suits, watchlists and custom agents encode their metadata in the display
//! name, e.g. `[TOKEN] ethereum 0xabc USDC Circle USD` or
//! `R-12 [POOL] arbitrum uniswap 0xdef main pool`. Names that don't follow a
//! known grammar yield `None` and the resource is skipped.

/// Fields encoded in a suit name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuitName {
    pub contract_type: String,
    pub blockchain: String,
    pub protocol: String,
    pub address: String,
    pub symbol: String,
    pub label: String,
}

/// Fields encoded in a watchlist, custom agent or monitor name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorName {
    pub risk_id: String,
    pub contract_type: String,
    pub blockchain: String,
    pub protocol: String,
    pub address: String,
    pub symbol: String,
    pub label: String,
}

const SUIT_TYPES: [&str; 4] = ["[TOKEN]", "[POOL]", "[VAULT]", "[BRIDGE]"];

const AGENT_TYPES: [&str; 8] = [
    "[VAULT]",
    "[EOA]",
    "[MULTISIG]",
    "[POOL]",
    "[OTHER]",
    "[ORACLE]",
    "[BRIDGE]",
    "[TIMELOCK]",
];

/// Positional access that treats missing parts as empty.
struct Parts<'a>(Vec<&'a str>);

impl<'a> Parts<'a> {
    fn new(name: &'a str) -> Self {
        Self(name.split(' ').collect())
    }

    fn at(&self, idx: usize) -> String {
        self.0.get(idx).copied().unwrap_or_default().to_string()
    }

    fn rest(&self, from: usize) -> String {
        self.0.get(from..).map(|p| p.join(" ")).unwrap_or_default()
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// Parse a suit name. Only TOKEN, POOL, VAULT and BRIDGE suits are tracked.
pub fn parse_suit_name(name: &str) -> Option<SuitName> {
    let parts = Parts::new(name);
    let contract_type = parts.at(0);
    if !SUIT_TYPES.contains(&contract_type.as_str()) {
        return None;
    }

    let parsed = if contract_type == "[TOKEN]" {
        SuitName {
            blockchain: parts.at(1),
            address: parts.at(2),
            symbol: parts.at(3),
            label: parts.rest(4),
            protocol: String::new(),
            contract_type,
        }
    } else {
        SuitName {
            blockchain: parts.at(1),
            protocol: parts.at(2),
            address: parts.at(3),
            label: parts.rest(4),
            symbol: String::new(),
            contract_type,
        }
    };
    Some(parsed)
}

/// Parse a watchlist name: `riskId [TYPE] ...`.
pub fn parse_watchlist_name(name: &str) -> Option<MonitorName> {
    let parts = Parts::new(name);
    if parts.len() < 2 {
        return None;
    }
    let risk_id = parts.at(0);
    let contract_type = parts.at(1);

    let mut parsed = MonitorName {
        risk_id,
        ..MonitorName::default()
    };
    match contract_type.as_str() {
        "[PROTOCOL]" => {
            parsed.blockchain = parts.at(2);
            parsed.protocol = parts.at(3);
            parsed.label = parsed.protocol.clone();
        }
        "[TOKEN]" => {
            parsed.blockchain = parts.at(2);
            parsed.address = parts.at(3);
            parsed.label = parts.rest(4);
        }
        "[CONSENSUSLAYER]" => {
            parsed.blockchain = parts.at(2);
            parsed.label = parts.rest(3);
        }
        "[MULTISIG]" | "[POOL]" => {
            parsed.blockchain = parts.at(2);
            parsed.protocol = parts.at(3);
            parsed.address = parts.at(4);
            parsed.label = parts.rest(5);
        }
        "[L2]" => {
            parsed.label = parts.rest(2);
        }
        _ => return None,
    }
    parsed.contract_type = contract_type;
    Some(parsed)
}

/// Parse a custom agent (or monitor) name.
///
/// This grammar is lenient: a bare word (even an empty one) becomes an
/// `[OTHER]` agent and unknown types with enough parts are read positionally
/// as `[OTHER]`. Names are split on single spaces as-is, so a trailing space
/// adds an empty part.
pub fn parse_custom_agent_name(name: &str) -> Option<MonitorName> {
    let parts = Parts::new(name);
    if parts.len() == 1 {
        return Some(MonitorName {
            risk_id: parts.at(0),
            contract_type: "[OTHER]".to_string(),
            ..MonitorName::default()
        });
    }

    let risk_id = parts.at(0);
    let contract_type = parts.at(1);
    let upper = contract_type.to_uppercase();

    if AGENT_TYPES.contains(&upper.as_str()) {
        Some(MonitorName {
            risk_id,
            contract_type,
            blockchain: parts.at(2),
            protocol: parts.at(3),
            address: parts.at(4),
            symbol: parts.at(5),
            label: parts.rest(6),
        })
    } else if upper == "[TOKEN]" {
        Some(MonitorName {
            risk_id,
            contract_type,
            blockchain: parts.at(2),
            protocol: String::new(),
            address: parts.at(3),
            symbol: parts.at(4),
            label: parts.rest(5),
        })
    } else if parts.len() >= 4 {
        Some(MonitorName {
            risk_id,
            contract_type: "[OTHER]".to_string(),
            blockchain: parts.at(1),
            protocol: parts.at(2),
            address: parts.at(3),
            symbol: parts.at(4),
            label: parts.rest(5),
        })
    } else {
        None
    }
}
