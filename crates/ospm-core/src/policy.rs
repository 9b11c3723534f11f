//! Client IP policy for destructive and privileged operations
//!
//! Each guarded operation has its own comma-separated whitelist. An entry is
//! either a CIDR block (`10.0.0.0/8`, `fd00::/8`) or a literal address string
//! compared verbatim. An empty whitelist permits nobody.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::Serialize;

use crate::config::WhitelistConfig;
use crate::error::AppError;

/// Operations that are only allowed from whitelisted client addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ListAll,
    SoftDelete,
    HardDelete,
    RecoverUndo,
}

impl OperationKind {
    /// Environment variable holding this operation's whitelist
    pub fn whitelist_env_var(&self) -> &'static str {
        match self {
            OperationKind::ListAll => "ORGANIZATION_LIST_ALL_CLIENT_WHITELIST_IP",
            OperationKind::SoftDelete => "ORGANIZATION_SOFT_DELETE_CLIENT_WHITELIST_IP",
            OperationKind::HardDelete => "ORGANIZATION_HARD_DELETE_CLIENT_WHITELIST_IP",
            OperationKind::RecoverUndo => "UNDO_ORGANIZATION_SOFT_DELETE_CLIENT_WHITELIST_IP",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OperationKind::ListAll => write!(f, "list_all"),
            OperationKind::SoftDelete => write!(f, "soft_delete"),
            OperationKind::HardDelete => write!(f, "hard_delete"),
            OperationKind::RecoverUndo => write!(f, "recover_undo"),
        }
    }
}

/// A parsed `address/prefix` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CidrBlock {
    network: IpAddr,
    prefix: u8,
}

impl CidrBlock {
    fn parse(entry: &str) -> Option<Self> {
        let (address, prefix) = entry.split_once('/')?;
        let network: IpAddr = address.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;

        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max {
            return None;
        }

        Some(Self { network, prefix })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => v4_prefix_eq(net, ip, self.prefix),
            (IpAddr::V4(net), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|ip| v4_prefix_eq(net, ip, self.prefix)),
            (IpAddr::V6(net), IpAddr::V6(ip)) => v6_prefix_eq(net, ip, self.prefix),
            (IpAddr::V6(_), IpAddr::V4(_)) => false,
        }
    }
}

fn v4_prefix_eq(net: Ipv4Addr, ip: Ipv4Addr, prefix: u8) -> bool {
    if prefix == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - u32::from(prefix));
    (u32::from(net) & mask) == (u32::from(ip) & mask)
}

fn v6_prefix_eq(net: Ipv6Addr, ip: Ipv6Addr, prefix: u8) -> bool {
    if prefix == 0 {
        return true;
    }
    let mask = u128::MAX << (128 - u32::from(prefix));
    (u128::from(net) & mask) == (u128::from(ip) & mask)
}

/// Whitelist entry matching
pub struct IpRangeMatcher;

impl IpRangeMatcher {
    /// True when `ip` falls inside `entry` (CIDR) or equals it (anything else).
    ///
    /// An `ip` that is not an address is never inside a block, but can still
    /// equal a literal entry.
    pub fn contains(ip: &str, entry: &str) -> bool {
        match CidrBlock::parse(entry) {
            Some(block) => ip
                .parse::<IpAddr>()
                .map(|ip| block.contains(ip))
                .unwrap_or(false),
            None => ip == entry,
        }
    }
}

/// A parsed, whitespace-free list of whitelist entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: Vec<String>,
}

impl Whitelist {
    /// Split on commas, strip all whitespace, drop empty entries.
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(|entry| entry.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn permits(&self, client_ip: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| IpRangeMatcher::contains(client_ip, entry))
    }
}

/// Decides whether a client address may run a guarded operation.
#[derive(Debug, Clone, Default)]
pub struct PolicyGate {
    whitelists: WhitelistConfig,
}

impl PolicyGate {
    pub fn new(whitelists: WhitelistConfig) -> Self {
        Self { whitelists }
    }

    pub fn whitelist(&self, operation: OperationKind) -> &Whitelist {
        match operation {
            OperationKind::ListAll => &self.whitelists.list_all,
            OperationKind::SoftDelete => &self.whitelists.soft_delete,
            OperationKind::HardDelete => &self.whitelists.hard_delete,
            OperationKind::RecoverUndo => &self.whitelists.recover_undo,
        }
    }

    pub fn is_permitted(&self, operation: OperationKind, client_ip: &str) -> bool {
        self.whitelist(operation).permits(client_ip)
    }

    pub fn check(&self, operation: OperationKind, client_ip: &str) -> Result<(), AppError> {
        if self.is_permitted(operation, client_ip) {
            Ok(())
        } else {
            Err(AppError::PolicyDenied {
                operation,
                client_ip: client_ip.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cidr_and_exact_entries() {
        let list = Whitelist::parse("172.16.1.5/32,192.168.1.12");
        assert!(list.permits("192.168.1.12"));
        assert!(list.permits("172.16.1.5"));
        assert!(!list.permits("172.16.1.6"));

        let list = Whitelist::parse("172.16.1.5/32,192.168.1.13/32");
        assert!(!list.permits("192.168.1.12"));
    }

    #[test]
    fn whitespace_and_empty_entries_are_dropped() {
        let list = Whitelist::parse(" 10.0.0.0/8 , ,\t192.168.0.1 ,");
        assert_eq!(list.entries(), &["10.0.0.0/8", "192.168.0.1"]);
        assert!(list.permits("10.200.3.4"));
    }

    #[test]
    fn empty_whitelist_denies_everyone() {
        for raw in ["", "   ", ",,"] {
            let list = Whitelist::parse(raw);
            assert!(list.is_empty());
            assert!(!list.permits("127.0.0.1"));
            assert!(!list.permits(""));
        }
    }

    #[test]
    fn cidr_masks_host_bits_of_the_network() {
        assert!(IpRangeMatcher::contains("192.168.1.200", "192.168.1.12/24"));
        assert!(!IpRangeMatcher::contains("192.168.2.1", "192.168.1.12/24"));
        assert!(IpRangeMatcher::contains("8.8.8.8", "0.0.0.0/0"));
    }

    #[test]
    fn ipv6_blocks() {
        assert!(IpRangeMatcher::contains("fd00::1", "fd00::/8"));
        assert!(!IpRangeMatcher::contains("fe80::1", "fd00::/8"));
        assert!(!IpRangeMatcher::contains("10.0.0.1", "::/0"));
        assert!(IpRangeMatcher::contains("::ffff:10.0.0.1", "10.0.0.0/8"));
    }

    #[test]
    fn unparseable_input() {
        assert!(!IpRangeMatcher::contains("unknown", "10.0.0.0/8"));
        // Not a valid block, so it is compared as a literal
        assert!(!IpRangeMatcher::contains("10.0.0.1", "10.0.0.0/33"));
        assert!(IpRangeMatcher::contains("10.0.0.0/33", "10.0.0.0/33"));
    }

    #[test]
    fn gate_uses_the_operation_whitelist() {
        let gate = PolicyGate::new(WhitelistConfig {
            soft_delete: Whitelist::parse("10.0.0.0/8"),
            hard_delete: Whitelist::parse("10.0.0.1"),
            ..Default::default()
        });

        assert!(gate.check(OperationKind::SoftDelete, "10.9.9.9").is_ok());
        assert!(gate.check(OperationKind::HardDelete, "10.9.9.9").is_err());
        assert!(gate.check(OperationKind::HardDelete, "10.0.0.1").is_ok());

        match gate.check(OperationKind::ListAll, "10.0.0.1") {
            Err(AppError::PolicyDenied {
                operation,
                client_ip,
            }) => {
                assert_eq!(operation, OperationKind::ListAll);
                assert_eq!(client_ip, "10.0.0.1");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
