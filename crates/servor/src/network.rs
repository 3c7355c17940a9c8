//! Local network address discovery.

use std::net::Ipv4Addr;

/// Non-loopback IPv4 addresses of this machine, in interface order.
pub(crate) fn local_ipv4s() -> Vec<Ipv4Addr> {
    let Ok(interfaces) = if_addrs::get_if_addrs() else {
        return Vec::new();
    };

    interfaces
        .into_iter()
        .filter_map(|iface| match iface.addr {
            if_addrs::IfAddr::V4(addr) if is_external(addr.ip) => Some(addr.ip),
            _ => None,
        })
        .collect()
}

fn is_external(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified()
}

/// URL a page is reachable at from other machines.
pub(crate) fn network_url(ip: Ipv4Addr, port: u16) -> String {
    format!("https://{ip}:{port}")
}
