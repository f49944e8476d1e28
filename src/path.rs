//! URL template resolution: path-variable substitution and base URL joining.
//!
//! Templates name placeholders either as `:name` or `{name}`, where a name is one or more ASCII
//! letters, digits, or underscores. Every occurrence is substituted. A placeholder without a
//! value fails with [`ConfigError::MissingPathVariable`] rather than reaching the wire. The scheme
//! and authority of absolute templates are never scanned, so `http://host:8080/:id` only treats
//! `:id` as a placeholder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Substitutes every placeholder in `template` using `vars`.
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> Result<String, ConfigError> {
	let (head, mut rest) = split_authority(template);
	let mut resolved = String::with_capacity(template.len());

	resolved.push_str(head);

	while let Some(pos) = rest.find([':', '{']) {
		resolved.push_str(&rest[..pos]);

		let tail = &rest[pos..];

		match placeholder(tail) {
			Some((name, consumed)) => {
				let value = vars.get(name).ok_or_else(|| ConfigError::MissingPathVariable {
					name: name.to_owned(),
					template: template.to_owned(),
				})?;

				resolved.push_str(value);
				rest = &tail[consumed..];
			},
			None => {
				resolved.push_str(&tail[..1]);
				rest = &tail[1..];
			},
		}
	}

	resolved.push_str(rest);

	Ok(resolved)
}

/// Joins a resolved path onto `base`; absolute URLs are returned unchanged.
pub fn join(base: Option<&Url>, path: &str) -> Result<Url, ConfigError> {
	let combined = match base {
		_ if scheme_end(path).is_some() => path.to_owned(),
		Some(base) if path.is_empty() => base.as_str().to_owned(),
		Some(base) => format!(
			"{}/{}",
			base.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		),
		None => path.to_owned(),
	};

	Url::parse(&combined).map_err(|source| ConfigError::InvalidUrl { url: combined, source })
}

/// Byte offset just past `://`, if `s` starts with a scheme.
///
/// A `://` after the first `/`, `?`, or `#` belongs to the path, query, or fragment.
fn scheme_end(s: &str) -> Option<usize> {
	let idx = s.find("://")?;

	(!s[..idx].contains(['/', '?', '#'])).then_some(idx + 3)
}

fn split_authority(template: &str) -> (&str, &str) {
	let Some(scheme_end) = scheme_end(template) else {
		return ("", template);
	};

	match template[scheme_end..].find('/') {
		Some(slash) => template.split_at(scheme_end + slash),
		None => (template, ""),
	}
}

/// Parses a placeholder at the start of `tail`, returning its name and byte length.
fn placeholder(tail: &str) -> Option<(&str, usize)> {
	let body = &tail[1..];
	let len = body.bytes().take_while(|b| b.is_ascii_alphanumeric() || *b == b'_').count();

	if len == 0 {
		return None;
	}

	let name = &body[..len];

	if tail.starts_with(':') {
		Some((name, len + 1))
	} else if body[len..].starts_with('}') {
		Some((name, len + 2))
	} else {
		None
	}
}
