//! Utility functions

use std::str::FromStr;

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn split_comma_list(value: &str) -> Vec<&str> {
	value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Parse a comma-separated list of integers.
///
/// Returns `None` if any item fails to parse. An empty or blank input yields an
/// empty list.
pub fn parse_id_list<T: FromStr>(value: &str) -> Option<Vec<T>> {
	split_comma_list(value).into_iter().map(|item| item.parse::<T>().ok()).collect()
}

/// Extract the host part of a URL, lowercased (`https://Site.Example.com:443/x` -> `site.example.com`).
pub fn url_host(url: &str) -> Option<String> {
	let rest = url.trim().split_once("://").map_or(url.trim(), |(_, rest)| rest);
	let host = rest.split(['/', '?', '#']).next()?;
	let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
	let host = host.split(':').next()?;
	if host.is_empty() { None } else { Some(host.to_lowercase()) }
}


// vim: ts=4
