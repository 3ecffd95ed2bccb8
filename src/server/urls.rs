//! Printable server URLs.

use owo_colors::OwoColorize;

/// URLs a browser can use to reach a server bound to `host:port`.
///
/// An unspecified host lists `localhost` followed by every non-loopback
/// IPv4 interface.
pub fn server_urls(host: &str, port: u16) -> Vec<String> {
    if !is_unspecified(host) {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        return vec![format!("http://{host}:{port}")];
    }

    let mut urls = vec![format!("http://localhost:{port}")];
    if let Ok(interfaces) = if_addrs::get_if_addrs() {
        for iface in interfaces {
            if let if_addrs::IfAddr::V4(addr) = iface.addr
                && !addr.ip.is_loopback()
            {
                urls.push(format!("http://{}:{port}", addr.ip));
            }
        }
    }
    urls
}

fn is_unspecified(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Print URLs with terminal hyperlinks
pub fn print_urls(name: &str, urls: &[String]) {
    println!("\n  {} {}\n", name.bold(), "dev server running at:".dimmed());
    for url in urls {
        println!("  {} {}", "→".cyan(), terminal_link(url));
    }
    println!();
}

/// Create an OSC 8 terminal hyperlink
fn terminal_link(url: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{}\x1b]8;;\x1b\\", url.blue().underline())
}
